//! Build the 402 payment-required tool result.
//!
//! MCP has no status codes, so the payment-required signal travels as a
//! tool error result carrying the [`PaymentRequired`] body twice: as
//! `structuredContent` for machine consumption and as the JSON text of
//! `content[0]` for SDKs that only surface text. The builder is pure.

use toolpay::proto::Extensions;
use toolpay::proto::v2::{PaymentRequired, PaymentRequirements, ResourceInfo, V2};

use crate::types::{CallToolResult, ContentItem};

/// Builds the 402-equivalent tool result advertising `accepts`.
///
/// The same shape serves both the initial advertisement and settlement
/// failures; only `error` differs. The result never carries a `_meta` map,
/// so no settlement receipt can leak onto a failure path.
#[must_use]
pub fn payment_required_result(
    accepts: &[PaymentRequirements],
    resource: ResourceInfo,
    error: &str,
    extensions: Option<&Extensions>,
) -> CallToolResult {
    let body = PaymentRequired {
        x402_version: V2,
        error: error.to_owned(),
        resource,
        accepts: accepts.to_vec(),
        extensions: extensions.cloned(),
    };

    let value = serde_json::to_value(&body).unwrap_or_default();
    let text = value.to_string();

    CallToolResult {
        content: vec![ContentItem::text(text)],
        is_error: true,
        structured_content: Some(value),
        meta: None,
    }
}
