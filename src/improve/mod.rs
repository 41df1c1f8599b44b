//! Text improvement through a local Ollama model.
//!
//! ## Design
//! - Native Ollama API: `POST /api/generate` with `stream: false`
//! - One request per rewrite, 120s read timeout, no automatic retry
//! - Blank input never reaches the network
//! - The model's "Here's the improved text:" style preamble is stripped

pub mod client;
pub mod prompt;
pub mod sanitize;

pub use client::{ImprovementClient, ImprovementError, ImprovementRequest, ImprovementResponse};
pub use prompt::PromptStyle;
pub use sanitize::ResponseSanitizer;
