//! # Response Envelopes
//!
//! The JSON shapes a transport layer returns for engine results.
//!
//! ```json
//! { "status": true,  "message": "Sale created successfully", "data": { "saleId": 7 } }
//! { "status": false, "message": "Sale not found", "code": 404, "error": "NOT_FOUND" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SaleError, SaleResult};

/// Successful result with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope<T> {
    /// Always `true`.
    pub status: bool,
    pub message: String,
    pub data: T,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        SuccessEnvelope {
            status: true,
            message: message.into(),
            data,
        }
    }
}

/// Failed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub status: bool,
    pub message: String,
    /// HTTP-style status class.
    pub code: u16,
    /// Machine-readable error kind.
    pub error: String,
}

impl From<&SaleError> for ErrorEnvelope {
    fn from(err: &SaleError) -> Self {
        ErrorEnvelope {
            status: false,
            message: err.to_string(),
            code: err.status_code(),
            error: err.kind().to_string(),
        }
    }
}

impl From<SaleError> for ErrorEnvelope {
    fn from(err: SaleError) -> Self {
        ErrorEnvelope::from(&err)
    }
}

/// Wraps an engine result in the matching envelope.
pub fn respond<T>(
    result: SaleResult<T>,
    message: impl Into<String>,
) -> Result<SuccessEnvelope<T>, ErrorEnvelope> {
    result
        .map(|data| SuccessEnvelope::new(message, data))
        .map_err(ErrorEnvelope::from)
}
