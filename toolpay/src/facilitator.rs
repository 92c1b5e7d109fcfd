//! Consumer trait for x402 payment facilitators.
//!
//! A facilitator is the external service that verifies payment payloads and
//! settles them on-chain. This crate never implements one; it defines the
//! [`Facilitator`] trait so gating middleware can consume any implementation
//! (a remote HTTP client, an in-process signer, a test double).
//!
//! The trait is dyn-compatible, so heterogeneous facilitator instances can
//! be shared as `Arc<dyn Facilitator>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::proto::v2::{PaymentPayload, PaymentRequirements};
use crate::proto::{SettleResponse, VerifyResponse};

/// Boxed future type alias for dyn-compatible async trait methods.
///
/// Eliminates the verbose `Pin<Box<dyn Future<Output = T> + Send + 'a>>`
/// pattern throughout the codebase.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors that can occur during facilitator operations.
///
/// These are transport-level failures: the facilitator could not be reached
/// or could not produce a verdict. A verdict of "invalid" or "not settled"
/// is not an error; it is carried in the response types.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FacilitatorError {
    /// The facilitator could not be reached or answered malformed.
    #[error("facilitator transport error: {0}")]
    Transport(String),
    /// Any other error not covered by the specific variants.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl FacilitatorError {
    /// Wraps an arbitrary error message in the [`FacilitatorError::Other`] variant.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into().into())
    }
}

/// Asynchronous interface to an x402 payment facilitator.
///
/// Both operations take the payload alongside the requirements the server
/// is enforcing; the facilitator is the authority on whether they match.
/// Implementations must be safe for concurrent use; the same instance is
/// shared across in-flight tool calls.
pub trait Facilitator: Send + Sync {
    /// Verifies a proposed payment payload against the given requirements.
    ///
    /// This includes payload integrity, signature validity, balance
    /// sufficiency, and scheme/network compatibility with `requirement`.
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirement: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, FacilitatorError>>;

    /// Settles a verified payment.
    ///
    /// Called at most once per payload by any given wrapper; idempotency
    /// across calls is the facilitator's responsibility (via nonces or the
    /// payment-identifier extension).
    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirement: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, FacilitatorError>>;
}

impl<T: Facilitator> Facilitator for Arc<T> {
    fn verify<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirement: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<VerifyResponse, FacilitatorError>> {
        self.as_ref().verify(payload, requirement)
    }

    fn settle<'a>(
        &'a self,
        payload: &'a PaymentPayload,
        requirement: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SettleResponse, FacilitatorError>> {
        self.as_ref().settle(payload, requirement)
    }
}
