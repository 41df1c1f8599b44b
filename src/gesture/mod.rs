//! Ctrl+Ctrl gesture detection.
//!
//! - `detector`: pure double-tap state machine
//! - `xinput`: XI2 event stream parsing and the `xinput` child process
//! - `listener`: the listener loop, with manual-trigger fallback

pub mod detector;
pub mod listener;
pub mod xinput;

pub use detector::{DoubleTap, GestureDetector, GestureState, KeyCode, KeyEvent, Trigger};
pub use listener::{DetectionBackend, HotkeyListener, StreamEnd};
