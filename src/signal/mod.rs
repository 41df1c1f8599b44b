//! File-based one-shot mailbox between the listener and the worker.
//!
//! The *existence* of the file is the signal; its content is informational
//! (a timestamp for triggers, the captured text for the daemon input).
//! The channel is a single slot, not a queue: signalling twice before the
//! consumer runs leaves one file.
//!
//! ## Handoff
//! - producers write a sibling temp file and `rename` it into place, so a
//!   consumer never observes a half-written payload from this crate
//! - consumers claim the file by renaming it to a per-process name before
//!   reading, so two racing consumers cannot both take the same signal
//!
//! Files written by foreign producers (e.g. a host script filling the shared
//! input) are claimed the same way but may still be caught mid-write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default consumer polling cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("cannot create signal directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("signal I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A filesystem path used as a one-shot mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalChannel {
    path: PathBuf,
}

impl SignalChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an unconsumed signal is present.
    pub fn is_pending(&self) -> bool {
        self.path.is_file()
    }

    /// Raise the signal with a human-readable timestamp payload.
    pub fn signal(&self) -> Result<(), SignalError> {
        self.signal_with(&timestamp_payload())
    }

    /// Raise the signal with an explicit payload, overwriting any pending one.
    pub fn signal_with(&self, payload: &str) -> Result<(), SignalError> {
        write_atomic(&self.path, payload)
    }

    /// Take the pending signal, if any.
    ///
    /// Returns `Ok(None)` when nothing is pending, including for paths that
    /// were never signalled. The file is gone once this returns `Some`.
    pub fn try_consume(&self) -> Result<Option<String>, SignalError> {
        let claimed = self.claimed_path();
        match std::fs::rename(&self.path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SignalError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }

        let read = std::fs::read(&claimed);
        if let Err(e) = std::fs::remove_file(&claimed) {
            tracing::warn!(path = %claimed.display(), "Failed to remove claimed signal: {e}");
        }
        let bytes = read.map_err(|source| SignalError::Io {
            path: claimed.clone(),
            source,
        })?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Drop a stale signal left over from an earlier run.
    ///
    /// Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, SignalError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SignalError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Make sure the directory holding the mailbox exists.
    pub fn ensure_dir(&self) -> Result<(), SignalError> {
        ensure_parent(&self.path)
    }

    /// Poll until a signal is consumed or `cancel` fires.
    ///
    /// I/O errors while consuming are logged and polling continues.
    pub async fn wait(&self, interval: Duration, cancel: &CancellationToken) -> Option<String> {
        loop {
            match self.try_consume() {
                Ok(Some(payload)) => return Some(payload),
                Ok(None) => {}
                Err(e) => tracing::warn!("{e}"),
            }
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    fn claimed_path(&self) -> PathBuf {
        sibling(&self.path, "claimed")
    }
}

/// Overwrite `path` with `contents` via a sibling temp file and `rename`.
///
/// Used for signals and for the daemon's output file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), SignalError> {
    ensure_parent(path)?;
    let tmp = sibling(path, "tmp");
    std::fs::write(&tmp, contents).map_err(|source| SignalError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        SignalError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn ensure_parent(path: &Path) -> Result<(), SignalError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(|source| SignalError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// `.{name}.{pid}.{suffix}` next to `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "signal".into());
    path.with_file_name(format!(".{name}.{}.{suffix}", std::process::id()))
}

fn timestamp_payload() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S %z")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn signal_then_consume_returns_payload_once() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        channel.signal_with("2026-01-01 00:00:00").unwrap();
        assert!(channel.is_pending());

        assert_eq!(
            channel.try_consume().unwrap().as_deref(),
            Some("2026-01-01 00:00:00")
        );
        assert!(!channel.is_pending());
        assert_eq!(channel.try_consume().unwrap(), None);
    }

    #[test]
    fn never_signalled_path_is_empty() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("never"));
        assert_eq!(channel.try_consume().unwrap(), None);
    }

    #[test]
    fn resignal_overwrites_in_place() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        channel.signal_with("first").unwrap();
        channel.signal_with("second").unwrap();

        assert_eq!(channel.try_consume().unwrap().as_deref(), Some("second"));
        assert_eq!(channel.try_consume().unwrap(), None);
    }

    #[test]
    fn timestamp_signal_has_payload() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        channel.signal().unwrap();
        let payload = channel.try_consume().unwrap().unwrap();
        assert!(!payload.trim().is_empty());
    }

    #[test]
    fn no_temp_or_claim_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        channel.signal_with("x").unwrap();
        channel.try_consume().unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[test]
    fn signal_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("nested/dir/trigger"));

        channel.signal_with("x").unwrap();
        assert!(channel.is_pending());
    }

    #[test]
    fn clear_reports_whether_a_file_was_removed() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        assert!(!channel.clear().unwrap());
        channel.signal_with("stale").unwrap();
        assert!(channel.clear().unwrap());
        assert!(!channel.is_pending());
    }

    #[test]
    fn consumes_foreign_non_utf8_payload_lossily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("input");
        std::fs::write(&path, [b'h', b'i', 0xff]).unwrap();

        let payload = SignalChannel::new(&path).try_consume().unwrap().unwrap();
        assert!(payload.starts_with("hi"));
        assert!(!path.exists());
    }

    #[test]
    fn write_atomic_overwrites_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.txt");

        write_atomic(&path, "a much longer first version").unwrap();
        write_atomic(&path, "short").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[tokio::test]
    async fn wait_returns_pending_signal() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));
        channel.signal_with("go").unwrap();

        let cancel = CancellationToken::new();
        let payload = channel.wait(Duration::from_millis(5), &cancel).await;
        assert_eq!(payload.as_deref(), Some("go"));
    }

    #[tokio::test]
    async fn wait_stops_on_cancel() {
        let tmp = TempDir::new().unwrap();
        let channel = SignalChannel::new(tmp.path().join("trigger"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let payload = channel.wait(Duration::from_millis(5), &cancel).await;
        assert_eq!(payload, None);
    }
}
