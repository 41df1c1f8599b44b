//! tapscribe: double-tap Ctrl to rewrite text with a local LLM.
//!
//! Two cooperating processes talk through plain files:
//!
//! ```text
//! listen ──(trigger file)──▸ watch ──▸ Ollama ──▸ clipboard
//! host   ──(shared input)──▸ daemon ──▸ Ollama ──▸ shared output
//! ```
//!
//! The listener recognises a Ctrl+Ctrl double tap, the worker picks the
//! signal up, sends the captured text to `/api/generate`, strips the model's
//! preamble and delivers the result.

pub mod config;
pub mod desktop;
pub mod gesture;
pub mod improve;
pub mod pipeline;
pub mod signal;

pub use config::Config;
pub use improve::{ImprovementClient, ImprovementError, ImprovementResponse, ResponseSanitizer};
pub use pipeline::{InputSource, OutputSink, PipelineOrchestrator};
pub use signal::SignalChannel;
