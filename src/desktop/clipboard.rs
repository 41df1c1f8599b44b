//! Clipboard strategies, tried in priority order.

use super::{command_exists, run_detached, run_tool};
use crate::signal::{write_atomic, SignalError};
use std::path::{Path, PathBuf};

/// A clipboard command-line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardTool {
    /// X11 `xclip`.
    Xclip,
    /// Wayland `wl-clipboard`.
    WlCopy,
    /// macOS.
    Pbcopy,
    /// Windows (write only).
    Clip,
}

impl ClipboardTool {
    /// Priority order for writing.
    pub const ALL: [Self; 4] = [Self::Xclip, Self::WlCopy, Self::Pbcopy, Self::Clip];

    pub fn name(self) -> &'static str {
        match self {
            Self::Xclip => "xclip",
            Self::WlCopy => "wl-copy",
            Self::Pbcopy => "pbcopy",
            Self::Clip => "clip",
        }
    }

    fn copy_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Xclip => ("xclip", &["-selection", "clipboard"]),
            Self::WlCopy => ("wl-copy", &[]),
            Self::Pbcopy => ("pbcopy", &[]),
            Self::Clip => ("clip", &[]),
        }
    }

    /// The matching read command; `clip` has none.
    fn paste_command(self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            Self::Xclip => Some(("xclip", &["-selection", "clipboard", "-o"])),
            Self::WlCopy => Some(("wl-paste", &["--no-newline"])),
            Self::Pbcopy => Some(("pbpaste", &[])),
            Self::Clip => None,
        }
    }
}

impl std::fmt::Display for ClipboardTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a piece of text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Clipboard(ClipboardTool),
    File(PathBuf),
}

/// Ordered clipboard tools ending in a file fallback.
#[derive(Debug, Clone)]
pub struct ClipboardChain {
    tools: Vec<ClipboardTool>,
    fallback: PathBuf,
}

impl ClipboardChain {
    /// Probe `PATH` for installed tools.
    pub fn detect(fallback: impl Into<PathBuf>) -> Self {
        let tools: Vec<_> = ClipboardTool::ALL
            .into_iter()
            .filter(|tool| command_exists(tool.copy_command().0))
            .collect();
        if tools.is_empty() {
            tracing::warn!("No clipboard tool found; improved text will be written to a file");
        } else {
            tracing::debug!(?tools, "Clipboard tools detected");
        }
        Self::with_tools(tools, fallback)
    }

    pub fn with_tools(tools: Vec<ClipboardTool>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            fallback: fallback.into(),
        }
    }

    /// No tools at all: every delivery goes to the fallback file.
    pub fn file_only(fallback: impl Into<PathBuf>) -> Self {
        Self::with_tools(Vec::new(), fallback)
    }

    pub fn tools(&self) -> &[ClipboardTool] {
        &self.tools
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    /// Put `text` on the clipboard, or in the fallback file.
    ///
    /// Only fails when the fallback file cannot be written either.
    pub async fn deliver(&self, text: &str) -> Result<Delivery, SignalError> {
        for tool in &self.tools {
            let (program, args) = tool.copy_command();
            match run_detached(program, args, Some(text)).await {
                Ok(()) => return Ok(Delivery::Clipboard(*tool)),
                Err(e) => tracing::warn!(tool = %tool, "Clipboard write failed: {e:#}"),
            }
        }

        write_atomic(&self.fallback, text)?;
        tracing::info!(path = %self.fallback.display(), "Improved text saved to file");
        Ok(Delivery::File(self.fallback.clone()))
    }

    /// Current clipboard text from the first tool that can read it.
    pub async fn read(&self) -> Option<String> {
        for tool in &self.tools {
            let Some((program, args)) = tool.paste_command() else {
                continue;
            };
            if !command_exists(program) {
                continue;
            }
            match run_tool(program, args, None).await {
                Ok(text) => return Some(text),
                Err(e) => tracing::warn!(tool = %program, "Clipboard read failed: {e:#}"),
            }
        }
        None
    }
}
