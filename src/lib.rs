//! Clipmaster - clipboard history manager with favorites and semantic search
//!
//! This library exports the core modules for testing and potential reuse.

pub mod clipboard;
pub mod logging;
pub mod models;
pub mod search;
pub mod session;
pub mod storage;

pub use clipboard::{ClipboardBackend, create_backend};
pub use models::{Clip, ClipStore};
pub use session::{Session, Tab};
