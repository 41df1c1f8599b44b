use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Ollama endpoint (the compose service name).
pub const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";

/// Default model used for rewriting.
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral:7b-instruct";

// ── Top-level config ─────────────────────────────────────────────

/// Full runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub paths: PathsConfig,
    pub gesture: GestureConfig,
    pub daemon: DaemonConfig,
}

// ── Ollama ───────────────────────────────────────────────────────

/// Local LLM endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL, without the `/api/...` suffix.
    pub url: String,
    /// Model tag passed in every request.
    pub model: String,
    /// Read timeout for `/api/generate`. Local inference can be slow.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub temperature: f64,
    /// Sent as `options.num_predict`.
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.into(),
            model: DEFAULT_OLLAMA_MODEL.into(),
            timeout_secs: 120,
            connect_timeout_secs: 5,
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

// ── Paths ────────────────────────────────────────────────────────

/// Well-known files shared between the listener and the worker.
///
/// The path is the contract: both processes must agree on these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Written by the listener on Ctrl+Ctrl.
    pub trigger: PathBuf,
    /// Polled by the listener when no event stream is available.
    pub manual_trigger: PathBuf,
    /// Daemon input, written by the host.
    pub shared_input: PathBuf,
    /// Daemon output, overwritten on every successful cycle.
    pub shared_output: PathBuf,
    /// Where improved text lands when no clipboard tool is installed.
    pub clipboard_fallback: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let tmp = PathBuf::from("/tmp");
        Self {
            trigger: tmp.join("writing_assistant_trigger"),
            manual_trigger: tmp.join("manual_trigger"),
            shared_input: tmp.join("shared_input.txt"),
            shared_output: tmp.join("shared_output.txt"),
            clipboard_fallback: tmp.join("improved_text.txt"),
        }
    }
}

// ── Gesture ──────────────────────────────────────────────────────

/// Double-tap timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Taps closer than this are key-repeat noise.
    pub debounce_secs: f64,
    /// Taps further apart than this are two single taps.
    pub window_secs: f64,
    /// Pause after the copy-selection keystroke before signalling.
    pub copy_settle_ms: u64,
    /// Send Ctrl+C to the focused window before signalling.
    pub copy_selection: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            debounce_secs: 0.05,
            window_secs: 0.5,
            copy_settle_ms: 200,
            copy_selection: true,
        }
    }
}

// ── Daemon ───────────────────────────────────────────────────────

/// Polling cadence for the worker loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub poll_interval_ms: u64,
    /// Delay between health probes while waiting for Ollama.
    pub health_retry_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            health_retry_secs: 2,
        }
    }
}
