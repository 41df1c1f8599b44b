use super::run_detached;
use std::path::PathBuf;
use std::time::Duration;

/// Copies the focused window's selection to the clipboard before a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCopier {
    /// `xdotool key ctrl+c`, using the resolved binary.
    Xdotool(PathBuf),
    /// No tool available, or copying turned off.
    Disabled,
}

impl SelectionCopier {
    pub fn detect(enabled: bool) -> Self {
        if !enabled {
            return Self::Disabled;
        }
        which::which("xdotool").map_or(Self::Disabled, Self::Xdotool)
    }

    /// Send the copy keystroke and give the target app `settle` to react.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn copy(&self, settle: Duration) {
        match self {
            Self::Xdotool(xdotool) => {
                if let Err(e) = run_detached(xdotool, &["key", "ctrl+c"], None).await {
                    tracing::debug!("xdotool copy failed: {e:#}");
                }
                tokio::time::sleep(settle).await;
            }
            Self::Disabled => {}
        }
    }
}
