//! `xinput test-xi2 --root` event stream.
//!
//! XI2 prints one block per event:
//!
//! ```text
//! EVENT type 2 (KeyPress)
//!     device: 3 (3)
//!     detail: 37
//! ```
//!
//! Older builds and some wrappers collapse this onto one line
//! (`KeyPress ... Detail: 37`); both shapes are accepted.

use super::detector::KeyCode;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::{Child, ChildStdout, Command};

static EVENT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*EVENT type \d+ \((\w+)\)").expect("valid EVENT header regex")
});

static DETAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdetail:\s+(\d+)").expect("valid detail regex"));

/// Incremental parser over XI2 output lines.
#[derive(Debug, Default)]
pub struct XiLineParser {
    in_key_press: bool,
}

impl XiLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line; returns the key when it completes a KeyPress.
    pub fn feed(&mut self, line: &str) -> Option<KeyCode> {
        if let Some(caps) = EVENT_HEADER.captures(line) {
            self.in_key_press = &caps[1] == "KeyPress";
            return None;
        }

        let detail = DETAIL
            .captures(line)
            .and_then(|caps| caps[1].parse::<u32>().ok())?;

        if line.contains("KeyPress") {
            self.in_key_press = false;
            return Some(KeyCode::from_x11_detail(detail));
        }

        if self.in_key_press {
            self.in_key_press = false;
            return Some(KeyCode::from_x11_detail(detail));
        }
        None
    }
}

/// Running `xinput` process.
///
/// The child is killed when this is dropped, so a cancelled listener does
/// not leave it orphaned.
pub struct XinputStream {
    child: Child,
}

impl XinputStream {
    pub fn spawn(xinput: &Path) -> Result<(Self, ChildStdout)> {
        let mut child = Command::new(xinput)
            .args(["test-xi2", "--root"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", xinput.display()))?;
        let stdout = child.stdout.take().context("xinput stdout not captured")?;
        Ok((Self { child }, stdout))
    }

    /// Kill the child and reap it.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!("xinput already exited: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(lines: &[&str]) -> Vec<KeyCode> {
        let mut parser = XiLineParser::new();
        lines.iter().filter_map(|l| parser.feed(l)).collect()
    }

    #[test]
    fn multi_line_key_press_block() {
        let keys = parse_all(&[
            "EVENT type 2 (KeyPress)",
            "    device: 3 (3)",
            "    detail: 37",
            "    flags: ",
            "EVENT type 3 (KeyRelease)",
            "    device: 3 (3)",
            "    detail: 37",
            "EVENT type 2 (KeyPress)",
            "    device: 3 (3)",
            "    detail: 105",
        ]);
        assert_eq!(keys, vec![KeyCode::LeftCtrl, KeyCode::RightCtrl]);
    }

    #[test]
    fn single_line_key_press() {
        let keys = parse_all(&[
            "KeyPress event, serial 1, Detail: 37",
            "KeyRelease event, serial 2, Detail: 37",
            "KeyPress event, serial 3, Detail: 38",
        ]);
        assert_eq!(keys, vec![KeyCode::LeftCtrl, KeyCode::Other]);
    }

    #[test]
    fn button_and_motion_events_ignored() {
        let keys = parse_all(&[
            "EVENT type 4 (ButtonPress)",
            "    device: 2 (11)",
            "    detail: 1",
            "EVENT type 6 (Motion)",
            "    detail: 0",
        ]);
        assert!(keys.is_empty());
    }

    #[test]
    fn detail_only_counted_once_per_block() {
        let keys = parse_all(&[
            "EVENT type 2 (KeyPress)",
            "    detail: 37",
            "    detail: 37",
        ]);
        assert_eq!(keys, vec![KeyCode::LeftCtrl]);
    }

    #[test]
    fn raw_key_press_header_variant() {
        let keys = parse_all(&["EVENT type 13 (RawKeyPress)", "    detail: 37"]);
        assert!(keys.is_empty());
    }
}
