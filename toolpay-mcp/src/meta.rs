//! Read and write x402 payment data in MCP `_meta` maps.
//!
//! These helpers operate on [`serde_json::Value`] maps so they compose with
//! any MCP SDK. Malformed inbound values are treated as absent: a request
//! carrying garbage under the payment key takes the same path as one with
//! no payment at all, and the peer receives a 402 advertisement.

use serde_json::Value;

use toolpay::proto::SettleResponse;
use toolpay::proto::v2::{PaymentPayload, PaymentRequired};

use crate::types::{CallToolResult, ContentItem};
use crate::{PAYMENT_META_KEY, PAYMENT_RESPONSE_META_KEY};

/// Extracts an x402 payment payload from a request's `_meta` map.
///
/// Returns `None` if no payment is present or the value does not decode to
/// the [`PaymentPayload`] shape. Never fails.
#[must_use]
pub fn extract_payment(meta: &serde_json::Map<String, Value>) -> Option<PaymentPayload> {
    let value = meta.get(PAYMENT_META_KEY)?;
    serde_json::from_value(value.clone()).ok()
}

/// Attaches an x402 payment payload to a request's `_meta` map.
///
/// Overwrites any existing payment data under the [`PAYMENT_META_KEY`];
/// other keys are preserved.
pub fn attach_payment(meta: &mut serde_json::Map<String, Value>, payment: &PaymentPayload) {
    if let Ok(value) = serde_json::to_value(payment) {
        meta.insert(PAYMENT_META_KEY.to_owned(), value);
    }
}

/// Extracts a settlement response from a result's `_meta` map.
///
/// Returns `None` if no receipt is present or deserialization fails.
#[must_use]
pub fn extract_settlement(meta: &serde_json::Map<String, Value>) -> Option<SettleResponse> {
    let value = meta.get(PAYMENT_RESPONSE_META_KEY)?;
    serde_json::from_value(value.clone()).ok()
}

/// Attaches a settlement response to a tool result's `_meta`.
///
/// Creates the `_meta` map if it doesn't exist; pre-existing keys are
/// preserved.
pub fn attach_settlement(result: &mut CallToolResult, settlement: &SettleResponse) {
    if let Ok(value) = serde_json::to_value(settlement) {
        result
            .meta
            .get_or_insert_with(serde_json::Map::new)
            .insert(PAYMENT_RESPONSE_META_KEY.to_owned(), value);
    }
}

/// Extracts a [`PaymentRequired`] from a tool error result.
///
/// Checks `structuredContent` first; falls back to JSON-decoding the text
/// of each content item in order. A candidate must be an object carrying
/// both an `accepts` array and a numeric `x402Version >= 1`.
///
/// Returns `None` if the result is not an error or carries no payment
/// required body.
#[must_use]
pub fn extract_payment_required(result: &CallToolResult) -> Option<PaymentRequired> {
    if !result.is_error {
        return None;
    }

    if let Some(sc) = &result.structured_content
        && let Some(pr) = parse_payment_required(sc)
    {
        return Some(pr);
    }

    for item in &result.content {
        let ContentItem::Text { text } = item;
        if let Some(pr) = serde_json::from_str::<Value>(text)
            .ok()
            .as_ref()
            .and_then(parse_payment_required)
        {
            return Some(pr);
        }
    }

    None
}

/// Resource URL for an MCP tool: `override` if provided, else
/// `mcp://tool/{tool_name}`.
#[must_use]
pub fn tool_resource_url(tool_name: &str, custom_url: Option<&str>) -> String {
    custom_url.map_or_else(|| format!("mcp://tool/{tool_name}"), str::to_owned)
}

/// Shape probe plus typed parse for a payment required body.
fn parse_payment_required(value: &Value) -> Option<PaymentRequired> {
    let obj = value.as_object()?;

    let version = obj.get("x402Version")?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let version_num = version
        .as_u64()
        .or_else(|| version.as_f64().map(|f| f as u64))?;
    if version_num < 1 {
        return None;
    }

    obj.get("accepts")?.as_array()?;

    serde_json::from_value(value.clone()).ok()
}
