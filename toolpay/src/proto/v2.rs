//! Protocol version 2 wire types.
//!
//! V2 uses CAIP-2 chain IDs (e.g. "eip155:84532") for networks and carries
//! resource metadata alongside the payment terms.
//!
//! # Key Types
//!
//! - [`X402Version2`] - Version marker that serializes as `2`
//! - [`PaymentRequirements`] - Payment terms set by the seller
//! - [`PaymentRequired`] - The 402 response body
//! - [`PaymentPayload`] - Signed payment with the accepted terms echoed back
//! - [`ResourceInfo`] - Metadata about the paid resource
//! - [`SplitExtra`] - Scheme-specific extra data for the `split` scheme

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::proto::{self, Extensions};

/// Version marker for x402 protocol version 2.
///
/// Serializes as the integer `2` and rejects other values on deserialization.
/// Use the [`V2`] constant when constructing V2 protocol messages.
pub type X402Version2 = proto::Version<2>;

/// Convenience constant for constructing V2 protocol messages.
pub const V2: X402Version2 = proto::Version;

/// Metadata about the resource being paid for.
///
/// Human-readable information about what the buyer gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// URL of the resource.
    pub url: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource content.
    pub mime_type: String,
}

/// Payment terms set by the seller.
///
/// One acceptable way to pay for a resource. Sellers advertise a list of
/// these; the buyer picks one and echoes it back inside the payload.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g. "exact", "split").
    pub scheme: String,
    /// The CAIP-2 chain ID (e.g. "eip155:84532").
    pub network: ChainId,
    /// The total amount in the smallest unit of the asset, as a decimal string.
    pub amount: String,
    /// The recipient address for payment.
    pub pay_to: String,
    /// The token asset identifier.
    pub asset: String,
    /// Maximum time in seconds for payment validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,
    /// Scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// The 402 response body.
///
/// Returned whenever a call must surface the price: missing payment, failed
/// verification, blocked execution, failed settlement. The `accepts` list is
/// never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 2).
    pub x402_version: X402Version2,
    /// Human-readable explanation of why payment is required.
    #[serde(default)]
    pub error: String,
    /// Information about the resource being paid for.
    pub resource: ResourceInfo,
    /// Ordered list of acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Optional protocol extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

/// A signed payment authorization from the buyer.
///
/// Built by the client, carried in a single tool call, consumed once by the
/// server. The `accepted` field echoes the requirements the buyer agreed to
/// so the facilitator can check the terms match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version (always 2).
    pub x402_version: X402Version2,
    /// The payment requirements the buyer accepted.
    pub accepted: PaymentRequirements,
    /// The scheme-specific signed payload.
    pub payload: serde_json::Value,
    /// Information about the resource being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    /// Optional protocol extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

/// One recipient of a `split` scheme payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRecipient {
    /// The recipient address.
    pub address: String,
    /// Share of the total amount in basis points.
    pub bps: u32,
}

/// Scheme-specific extra data for the `split` scheme.
///
/// Carried in [`PaymentRequirements::extra`]. The shares must cover the
/// whole amount: each `bps` is in `[1, 10000]` and they sum to exactly 10000.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitExtra {
    /// The recipients and their shares.
    pub recipients: Vec<SplitRecipient>,
}

/// Error returned when a [`SplitExtra`] violates the share invariant.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SplitValidationError {
    /// A recipient's share is outside `[1, 10000]`.
    #[error("split recipient {address} has share {bps} bps outside [1, 10000]")]
    ShareOutOfRange {
        /// The offending recipient address.
        address: String,
        /// The offending share.
        bps: u32,
    },
    /// The shares do not sum to exactly 10000.
    #[error("split shares sum to {0} bps, expected exactly 10000")]
    BadTotal(u64),
}

impl SplitExtra {
    /// Checks the share invariant: each `bps` in `[1, 10000]`, sum exactly 10000.
    ///
    /// # Errors
    ///
    /// Returns [`SplitValidationError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), SplitValidationError> {
        let mut total: u64 = 0;
        for recipient in &self.recipients {
            if recipient.bps == 0 || recipient.bps > 10_000 {
                return Err(SplitValidationError::ShareOutOfRange {
                    address: recipient.address.clone(),
                    bps: recipient.bps,
                });
            }
            total += u64::from(recipient.bps);
        }
        if total != 10_000 {
            return Err(SplitValidationError::BadTotal(total));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_owned(),
            network: ChainId::new("eip155", "84532"),
            amount: "100000".to_owned(),
            pay_to: "0xPayee".to_owned(),
            asset: "0xUSDC".to_owned(),
            max_timeout_seconds: None,
            extra: None,
        }
    }

    #[test]
    fn test_requirements_wire_shape() {
        let json = serde_json::to_value(requirements()).unwrap();
        assert_eq!(json["scheme"], "exact");
        assert_eq!(json["network"], "eip155:84532");
        assert_eq!(json["amount"], "100000");
        assert_eq!(json["payTo"], "0xPayee");
        assert_eq!(json["asset"], "0xUSDC");
        assert!(json.get("maxTimeoutSeconds").is_none());
    }

    #[test]
    fn test_payment_required_roundtrip() {
        let pr = PaymentRequired {
            x402_version: V2,
            error: "Payment required".to_owned(),
            resource: ResourceInfo {
                url: "mcp://tool/get_weather".to_owned(),
                description: "Tool: get_weather".to_owned(),
                mime_type: "application/json".to_owned(),
            },
            accepts: vec![requirements()],
            extensions: None,
        };
        let json = serde_json::to_string(&pr).unwrap();
        let parsed: PaymentRequired = serde_json::from_str(&json).unwrap();
        assert_eq!(pr, parsed);
    }

    #[test]
    fn test_payment_payload_rejects_wrong_version() {
        let payload = PaymentPayload {
            x402_version: V2,
            accepted: requirements(),
            payload: serde_json::json!({"signature": "0xsig"}),
            resource: None,
            extensions: None,
        };
        let mut json = serde_json::to_value(&payload).unwrap();
        json["x402Version"] = serde_json::json!(1);
        assert!(serde_json::from_value::<PaymentPayload>(json).is_err());
    }

    #[test]
    fn test_split_shares_must_cover_whole_amount() {
        let extra = SplitExtra {
            recipients: vec![
                SplitRecipient {
                    address: "0xA".to_owned(),
                    bps: 7000,
                },
                SplitRecipient {
                    address: "0xB".to_owned(),
                    bps: 3000,
                },
            ],
        };
        assert!(extra.validate().is_ok());

        let short = SplitExtra {
            recipients: vec![SplitRecipient {
                address: "0xA".to_owned(),
                bps: 9999,
            }],
        };
        assert!(matches!(
            short.validate(),
            Err(SplitValidationError::BadTotal(9999))
        ));
    }

    #[test]
    fn test_split_share_bounds() {
        let zero = SplitExtra {
            recipients: vec![
                SplitRecipient {
                    address: "0xA".to_owned(),
                    bps: 0,
                },
                SplitRecipient {
                    address: "0xB".to_owned(),
                    bps: 10_000,
                },
            ],
        };
        assert!(matches!(
            zero.validate(),
            Err(SplitValidationError::ShareOutOfRange { bps: 0, .. })
        ));

        let over = SplitExtra {
            recipients: vec![SplitRecipient {
                address: "0xA".to_owned(),
                bps: 10_001,
            }],
        };
        assert!(matches!(
            over.validate(),
            Err(SplitValidationError::ShareOutOfRange { bps: 10_001, .. })
        ));

        let whole = SplitExtra {
            recipients: vec![SplitRecipient {
                address: "0xA".to_owned(),
                bps: 10_000,
            }],
        };
        assert!(whole.validate().is_ok());
    }
}
