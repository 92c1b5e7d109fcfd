//! Error types for MCP x402 payment flows.
//!
//! [`ToolPaymentError`] covers everything that can abort a gated tool call
//! outright: transport failures, missing scheme clients, hook aborts. Flow
//! outcomes the protocol expresses as 402 tool results (missing payment,
//! failed verification, failed settlement) are not errors; they come back
//! as `Ok` results with `is_error` set.

use toolpay::extensions::payment_identifier::PaymentIdentifierError;
use toolpay::facilitator::FacilitatorError;
use toolpay::scheme::SchemeClientError;

/// Errors that can occur during MCP x402 payment operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolPaymentError {
    /// The tool call itself failed (non-payment transport error).
    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    /// No scheme client is registered for the advertised network.
    #[error("No scheme client registered for network {0}")]
    NoSchemeClient(String),

    /// A lifecycle hook aborted the operation.
    #[error("Operation aborted: {0}")]
    Aborted(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error from the facilitator layer.
    #[error(transparent)]
    Facilitator(#[from] FacilitatorError),

    /// Client-side scheme error while building a payment.
    #[error(transparent)]
    Scheme(#[from] SchemeClientError),

    /// A payment identifier failed validation.
    #[error(transparent)]
    PaymentIdentifier(#[from] PaymentIdentifierError),
}
