//! Hotkey listener process: turns Ctrl+Ctrl into a trigger file.

use super::detector::{DoubleTap, GestureDetector, KeyEvent};
use super::xinput::{XiLineParser, XinputStream};
use crate::config::Config;
use crate::desktop::SelectionCopier;
use crate::signal::SignalChannel;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// How key presses are observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionBackend {
    /// `xinput test-xi2 --root` at the given path.
    Xinput(PathBuf),
    /// Poll the manual-trigger file.
    Manual,
}

impl DetectionBackend {
    /// First available backend, in priority order.
    pub fn detect() -> Self {
        match which::which("xinput") {
            Ok(path) => Self::Xinput(path),
            Err(_) => Self::Manual,
        }
    }
}

/// Why an event stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Cancelled,
    Closed,
}

pub struct HotkeyListener {
    timing: DoubleTap,
    trigger: SignalChannel,
    manual: SignalChannel,
    poll_interval: Duration,
    copy_settle: Duration,
    selection: SelectionCopier,
}

impl HotkeyListener {
    pub fn new(config: &Config, selection: SelectionCopier) -> Self {
        Self {
            timing: DoubleTap::from_config(&config.gesture),
            trigger: SignalChannel::new(&config.paths.trigger),
            manual: SignalChannel::new(&config.paths.manual_trigger),
            poll_interval: config.poll_interval(),
            copy_settle: Duration::from_millis(config.gesture.copy_settle_ms),
            selection,
        }
    }

    pub fn trigger_channel(&self) -> &SignalChannel {
        &self.trigger
    }

    /// Run until `cancel` fires.
    ///
    /// Any failure of the event stream drops permanently into manual mode.
    pub async fn run(&self, backend: DetectionBackend, cancel: CancellationToken) -> Result<()> {
        self.trigger.ensure_dir()?;
        if self.trigger.clear()? {
            tracing::debug!(path = %self.trigger.path().display(), "Removed stale trigger");
        }

        if let DetectionBackend::Xinput(xinput) = backend {
            tracing::info!("Listening for Ctrl+Ctrl via xinput");
            match self.run_xinput(&xinput, &cancel).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!(
                    "Hotkey detection failed, falling back to manual trigger mode: {e:#}"
                ),
            }
        } else {
            tracing::warn!("xinput not available, using manual trigger mode");
        }

        self.run_manual(&cancel).await;
        Ok(())
    }

    async fn run_xinput(&self, xinput: &Path, cancel: &CancellationToken) -> Result<()> {
        let (stream, stdout) = XinputStream::spawn(xinput)?;
        let origin = Instant::now();
        let end = self
            .run_events(BufReader::new(stdout), || origin.elapsed().as_secs_f64(), cancel)
            .await;
        stream.shutdown().await;

        match end? {
            StreamEnd::Cancelled => Ok(()),
            StreamEnd::Closed => bail!("xinput event stream closed"),
        }
    }

    /// Drive the detector from an XI2 line stream.
    ///
    /// `clock` returns monotonic seconds for each recognised key press.
    pub async fn run_events<R, C>(
        &self,
        reader: R,
        mut clock: C,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd>
    where
        R: AsyncBufRead + Unpin,
        C: FnMut() -> f64,
    {
        let mut lines = reader.lines();
        let mut parser = XiLineParser::new();
        let mut detector = GestureDetector::new(self.timing);

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                return Ok(StreamEnd::Closed);
            };
            let Some(key) = parser.feed(&line) else {
                continue;
            };
            if let Some(trigger) = detector.on_event(KeyEvent::new(key, clock())) {
                tracing::info!(
                    interval_ms = (trigger.interval * 1000.0).round(),
                    "Ctrl+Ctrl detected"
                );
                self.fire().await;
            }
        }
    }

    /// Reduced mode: a manual-trigger file stands in for the gesture.
    pub async fn run_manual(&self, cancel: &CancellationToken) {
        tracing::info!(
            path = %self.manual.path().display(),
            "Manual trigger mode active; create this file to trigger"
        );
        while self.manual.wait(self.poll_interval, cancel).await.is_some() {
            tracing::info!("Manual trigger detected");
            self.fire().await;
        }
    }

    async fn fire(&self) {
        self.selection.copy(self.copy_settle).await;
        if let Err(e) = self.trigger.signal() {
            tracing::error!("Failed to write trigger: {e}");
        }
    }
}
