//! # Models Module
//!
//! Domain models shared across the submission pipeline, the finality tracker
//! and the channel watcher.

mod transaction;
pub use transaction::*;

mod channel;
pub use channel::*;

mod error;
pub use error::*;
