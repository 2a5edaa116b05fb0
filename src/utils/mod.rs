//! # Utils Module
//!
//! Payment-channel helper functions: amount conversion, channel-id
//! derivation, claim and proof encodings.

mod amount;
pub use amount::*;

mod channel;
pub use channel::*;
