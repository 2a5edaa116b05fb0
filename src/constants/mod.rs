//! Constants for payment-channel transaction submission and verification.

mod transaction;
pub use transaction::*;

mod channel;
pub use channel::*;
