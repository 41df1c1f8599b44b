//! Wires capture, rewrite and delivery into the worker loops.
//!
//! One orchestrator, three shapes:
//!
//! | source       | sink        | command       |
//! |--------------|-------------|---------------|
//! | terminal     | clipboard   | `interactive` |
//! | shared input | shared output | `daemon`    |
//! | trigger file | clipboard   | `watch`       |
//!
//! Every cycle is independent: a failed request produces no output and the
//! loop moves on to the next signal.

pub mod interactive;

use crate::config::Config;
use crate::desktop::{ClipboardChain, Delivery};
use crate::improve::{ImprovementClient, PromptStyle};
use crate::signal::{write_atomic, SignalChannel, SignalError, POLL_INTERVAL};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay between health probes while waiting for the endpoint.
pub const HEALTH_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Where text to improve comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Typed at the terminal, ended by two blank lines.
    Interactive,
    /// The content of a shared input file, consumed on read.
    InputFile(SignalChannel),
    /// The clipboard, read whenever the trigger file appears.
    Trigger {
        channel: SignalChannel,
        clipboard: ClipboardChain,
    },
}

/// Where improved text goes.
#[derive(Debug, Clone)]
pub enum OutputSink {
    /// Clipboard tools, then a fallback file.
    Clipboard(ClipboardChain),
    /// A file overwritten on every cycle.
    File(PathBuf),
}

impl OutputSink {
    pub async fn deliver(&self, text: &str) -> Result<Delivery, SignalError> {
        match self {
            Self::Clipboard(chain) => chain.deliver(text).await,
            Self::File(path) => {
                write_atomic(path, text)?;
                Ok(Delivery::File(path.clone()))
            }
        }
    }
}

/// Result of one capture → rewrite → deliver cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was pending.
    Idle,
    /// Nothing to improve: blank input or an unreadable clipboard.
    Skipped,
    /// The request failed; nothing was written.
    Failed,
    Delivered { text: String, delivery: Delivery },
}

pub struct PipelineOrchestrator {
    client: ImprovementClient,
    source: InputSource,
    sink: OutputSink,
    poll_interval: Duration,
    health_retry: Duration,
}

impl PipelineOrchestrator {
    pub fn new(client: ImprovementClient, source: InputSource, sink: OutputSink) -> Self {
        Self {
            client,
            source,
            sink,
            poll_interval: POLL_INTERVAL,
            health_retry: HEALTH_RETRY_INTERVAL,
        }
    }

    pub fn with_intervals(mut self, poll_interval: Duration, health_retry: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.health_retry = health_retry;
        self
    }

    /// Terminal in, clipboard out.
    pub fn interactive(config: &Config) -> Self {
        Self::new(
            ImprovementClient::from_config(&config.ollama),
            InputSource::Interactive,
            OutputSink::Clipboard(ClipboardChain::detect(&config.paths.clipboard_fallback)),
        )
        .with_intervals(config.poll_interval(), config.health_retry_interval())
    }

    /// Shared input file in, shared output file out.
    pub fn daemon(config: &Config) -> Self {
        Self::new(
            ImprovementClient::from_config(&config.ollama).with_style(PromptStyle::Casual),
            InputSource::InputFile(SignalChannel::new(&config.paths.shared_input)),
            OutputSink::File(config.paths.shared_output.clone()),
        )
        .with_intervals(config.poll_interval(), config.health_retry_interval())
    }

    /// Trigger file in, clipboard read and written.
    pub fn watcher(config: &Config) -> Self {
        let clipboard = ClipboardChain::detect(&config.paths.clipboard_fallback);
        Self::new(
            ImprovementClient::from_config(&config.ollama),
            InputSource::Trigger {
                channel: SignalChannel::new(&config.paths.trigger),
                clipboard: clipboard.clone(),
            },
            OutputSink::Clipboard(clipboard),
        )
        .with_intervals(config.poll_interval(), config.health_retry_interval())
    }

    pub fn client(&self) -> &ImprovementClient {
        &self.client
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Run the configured loop until `cancel` fires (or stdin ends, for
    /// the interactive shape).
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        match &self.source {
            InputSource::Interactive => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                self.run_interactive(stdin, std::io::stdout(), &cancel).await
            }
            InputSource::InputFile(_) | InputSource::Trigger { .. } => {
                self.run_polling(&cancel).await;
                Ok(())
            }
        }
    }

    /// Block until the endpoint is healthy, then poll the source.
    pub async fn run_polling(&self, cancel: &CancellationToken) {
        if !self.client.wait_until_ready(self.health_retry, cancel).await {
            return;
        }
        if let Some(channel) = self.watched_channel() {
            tracing::info!(path = %channel.path().display(), "Watching for input");
        }

        loop {
            self.poll_once().await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        tracing::info!("Worker stopped");
    }

    /// Check the source once and run a full cycle if something is pending.
    pub async fn poll_once(&self) -> CycleOutcome {
        let text = match &self.source {
            InputSource::Interactive => return CycleOutcome::Idle,
            InputSource::InputFile(channel) => match channel.try_consume() {
                Ok(Some(text)) => {
                    tracing::info!(chars = text.trim().len(), "Input detected");
                    text
                }
                Ok(None) => return CycleOutcome::Idle,
                Err(e) => {
                    tracing::warn!("{e}");
                    return CycleOutcome::Idle;
                }
            },
            InputSource::Trigger { channel, clipboard } => match channel.try_consume() {
                Ok(Some(_)) => {
                    tracing::info!("Trigger detected, reading clipboard");
                    match clipboard.read().await {
                        Some(text) => text,
                        None => {
                            tracing::warn!("Clipboard is empty or unreadable");
                            return CycleOutcome::Skipped;
                        }
                    }
                }
                Ok(None) => return CycleOutcome::Idle,
                Err(e) => {
                    tracing::warn!("{e}");
                    return CycleOutcome::Idle;
                }
            },
        };

        self.process_text(&text).await
    }

    /// Rewrite `text` and deliver it to the sink.
    pub async fn process_text(&self, text: &str) -> CycleOutcome {
        if text.trim().is_empty() {
            tracing::info!("No text captured, skipping");
            return CycleOutcome::Skipped;
        }

        let response = match self.client.improve(text).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(model = %self.client.model(), "Failed to improve text: {e}");
                return CycleOutcome::Failed;
            }
        };
        if response.is_empty() {
            tracing::warn!("Model returned no usable text, delivering an empty result");
        }

        match self.sink.deliver(&response.sanitized_text).await {
            Ok(delivery) => {
                match &delivery {
                    Delivery::Clipboard(tool) => {
                        tracing::info!(tool = %tool, "Improved text copied to clipboard")
                    }
                    Delivery::File(path) => {
                        tracing::info!(path = %path.display(), "Improved text written")
                    }
                }
                CycleOutcome::Delivered {
                    text: response.sanitized_text,
                    delivery,
                }
            }
            Err(e) => {
                tracing::error!("Failed to deliver improved text: {e}");
                CycleOutcome::Failed
            }
        }
    }

    fn watched_channel(&self) -> Option<&SignalChannel> {
        match &self.source {
            InputSource::Interactive => None,
            InputSource::InputFile(channel) => Some(channel),
            InputSource::Trigger { channel, .. } => Some(channel),
        }
    }
}
