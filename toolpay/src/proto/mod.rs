//! Wire format types for the x402 tool-call payment protocol.
//!
//! This module defines the JSON messages exchanged between buyers, sellers,
//! and facilitators. All types serialize with camelCase field names; the
//! protocol version is carried as a bare integer in the `x402Version` field
//! and enforced by the [`Version`] marker type.
//!
//! # Key Types
//!
//! - [`v2::PaymentRequirements`] - Payment terms set by the seller
//! - [`v2::PaymentRequired`] - The 402 response body advertising those terms
//! - [`v2::PaymentPayload`] - The buyer's signed payment authorization
//! - [`VerifyResponse`] / [`SettleResponse`] - Facilitator verdicts

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod version;
pub mod v2;

pub use version::Version;

/// Protocol extension data attached to various x402 wire types.
///
/// Keys are extension names; values are arbitrary JSON data specific to each
/// extension. Well-known keys live in [`crate::extensions`].
pub type Extensions = HashMap<String, serde_json::Value>;

/// Verdict returned by a facilitator after checking a payment payload
/// against the payment requirements it was offered for.
///
/// A payload can be rejected for any reason the facilitator sees fit:
/// bad signature, wrong network, insufficient balance, stale authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the payload passed all checks.
    pub is_valid: bool,
    /// Machine-readable reason verification failed, when it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    /// The payer address, if identifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl VerifyResponse {
    /// Constructs a passing verdict with the given payer address.
    #[must_use]
    pub fn valid(payer: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            invalid_reason: None,
            payer: Some(payer.into()),
        }
    }

    /// Constructs a failing verdict with the given reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            invalid_reason: Some(reason.into()),
            payer: None,
        }
    }
}

/// Facilitator acknowledgement of an attempted settlement.
///
/// On success the `transaction` field identifies the on-chain (or off-chain)
/// movement; on failure `error_reason` describes why nothing moved. Embedded
/// verbatim in the tool result's `_meta` as the buyer's receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether the payment settled.
    pub success: bool,
    /// Opaque transaction identifier; empty when settlement failed.
    #[serde(default)]
    pub transaction: String,
    /// The network settlement occurred (or was attempted) on.
    pub network: String,
    /// The address that paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Machine-readable reason for failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    /// Scheme-specific settlement data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl SettleResponse {
    /// Constructs a successful settlement receipt.
    #[must_use]
    pub fn ok(transaction: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction: transaction.into(),
            network: network.into(),
            payer: None,
            error_reason: None,
            extra: None,
        }
    }

    /// Constructs a failed settlement verdict.
    #[must_use]
    pub fn failed(reason: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction: String::new(),
            network: network.into(),
            payer: None,
            error_reason: Some(reason.into()),
            extra: None,
        }
    }

    /// Sets the payer address on the receipt.
    #[must_use]
    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }
}
