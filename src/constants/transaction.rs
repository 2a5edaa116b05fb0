//! Constants for transaction submission and finality tracking.
//!
//! This module contains the reserved store keys and the result-code literals
//! used to classify ledger responses.

/// Reserved store key holding the colon-delimited list of pending transaction ids.
pub const PENDING_TRANSACTIONS_KEY: &str = "tx-submitter:pending";

/// Result code reported by the ledger for a successfully applied transaction.
pub const SUCCESS_RESULT_CODE: &str = "tesSUCCESS";

/// Result-code prefix marking a structurally malformed transaction.
/// A submission with this class of code can never achieve finality.
pub const MALFORMED_RESULT_PREFIX: &str = "tem";
