//! The transfer event.
//!
//! A transfer is one directed value movement discovered on chain:
//! "value moved from address A to address B in block N". The feed emits
//! them, the graph maintainer ingests them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when a transfer fails validation.
///
/// Malformed input is refused before it can touch the graph registries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    /// One of the endpoint addresses is the empty string.
    #[error("empty {0} address")]
    EmptyAddress(&'static str),

    /// The value is negative, NaN, or infinite.
    #[error("invalid transfer value: {0}")]
    InvalidValue(f64),
}

/// A single directed transfer between two addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Source address.
    pub from: String,

    /// Destination address.
    pub to: String,

    /// Transferred value, in whole units.
    pub value: f64,

    /// Block the transfer was observed in.
    pub block_number: u64,
}

impl Transfer {
    /// Creates a new transfer event.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        value: f64,
        block_number: u64,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value,
            block_number,
        }
    }

    /// Checks the transfer for malformed fields.
    ///
    /// Addresses must be non-empty and the value must be finite and
    /// non-negative. Block numbers are unsigned by construction, so no
    /// check is needed there.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.from.is_empty() {
            return Err(TransferError::EmptyAddress("from"));
        }
        if self.to.is_empty() {
            return Err(TransferError::EmptyAddress("to"));
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(TransferError::InvalidValue(self.value));
        }
        Ok(())
    }

    /// Whether source and destination are the same address.
    ///
    /// Self-transfers are excluded from the graph model entirely.
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }
}
