//! Conversion between drops (the ledger's integer unit) and decimal XRP
//! strings as used by the prepare-builders.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::constants::DROPS_PER_XRP;
use crate::models::SubmitterError;

/// Formats an integer drop amount as a decimal XRP string.
pub fn drops_to_xrp(drops: u64) -> String {
    let xrp = Decimal::from(drops) / Decimal::from(DROPS_PER_XRP);
    xrp.normalize().to_string()
}

/// Parses a decimal XRP string into drops.
///
/// Rejects negative amounts, fractional drops and values that overflow the
/// drop range.
pub fn xrp_to_drops(xrp: &str) -> Result<u64, SubmitterError> {
    let amount = Decimal::from_str(xrp).map_err(|err| {
        SubmitterError::ValidationError(format!("invalid XRP amount {xrp:?}: {err}"))
    })?;
    if amount.is_sign_negative() {
        return Err(SubmitterError::ValidationError(format!(
            "XRP amount must not be negative, got {xrp}"
        )));
    }
    let drops = amount
        .checked_mul(Decimal::from(DROPS_PER_XRP))
        .ok_or_else(|| {
            SubmitterError::ValidationError(format!("XRP amount out of range: {xrp}"))
        })?;
    if drops.fract() != Decimal::ZERO {
        return Err(SubmitterError::ValidationError(format!(
            "XRP amount has sub-drop precision: {xrp}"
        )));
    }
    drops.to_u64().ok_or_else(|| {
        SubmitterError::ValidationError(format!("XRP amount out of range: {xrp}"))
    })
}
