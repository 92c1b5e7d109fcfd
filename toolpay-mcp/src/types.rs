//! Framework-agnostic MCP types for the x402 payment flow.
//!
//! These mirror the MCP `CallToolParams` / `CallToolResult` wire shapes via
//! [`serde_json::Value`]-based maps, so the crate works with any MCP SDK.
//! The `_meta` field on both carries the x402 payment data.

use serde::{Deserialize, Serialize};

use toolpay::proto::{Extensions, SettleResponse};
use toolpay::proto::v2::PaymentRequirements;

use crate::hooks::ServerHooks;

/// Parameters for calling an MCP tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// The tool name to invoke.
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// Optional `_meta` field for protocol extensions (x402 payment data).
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A single content item in a tool call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum ContentItem {
    /// Text content.
    Text {
        /// The text value.
        text: String,
    },
}

impl ContentItem {
    /// Creates a new text content item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text content if this is a text item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}

/// Result of an MCP tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content items returned by the tool.
    #[serde(default)]
    pub content: Vec<ContentItem>,
    /// Whether the tool returned an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
    /// Optional structured content (mirrors the 402 body on payment failures).
    #[serde(
        default,
        rename = "structuredContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<serde_json::Value>,
    /// Optional `_meta` field for protocol extensions.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Result of a paid MCP tool call, with payment metadata summarized.
#[derive(Debug, Clone)]
pub struct PaidToolCallResult {
    /// Content items from the tool response.
    pub content: Vec<ContentItem>,
    /// Whether the tool returned an error.
    pub is_error: bool,
    /// The settlement response, if the server attached a receipt.
    pub payment_response: Option<SettleResponse>,
    /// Whether a payment was made during this call.
    pub payment_made: bool,
    /// The raw tool call result.
    pub raw_result: CallToolResult,
}

/// Per-field overrides for the advertised resource metadata.
///
/// Unset fields fall back to the gate's defaults: `mcp://tool/{name}`,
/// `"Tool: {name}"`, and `"application/json"`.
#[derive(Debug, Clone, Default)]
pub struct ResourceConfig {
    /// Overrides the resource URL.
    pub url: Option<String>,
    /// Overrides the human-readable description.
    pub description: Option<String>,
    /// Overrides the MIME type.
    pub mime_type: Option<String>,
}

/// Configuration for the server-side [`PaymentGate`](crate::server::PaymentGate).
pub struct PaymentGateConfig {
    /// Acceptable payment methods for the wrapped tool. Must be non-empty;
    /// the first entry is authoritative for verify and settle.
    pub accepts: Vec<PaymentRequirements>,
    /// Resource metadata overrides for 402 advertisements.
    pub resource: ResourceConfig,
    /// Optional server-side lifecycle hooks.
    pub hooks: Option<Box<dyn ServerHooks>>,
    /// Protocol extensions advertised alongside the payment requirements.
    pub extensions: Option<Extensions>,
}

#[allow(clippy::derivable_impls)]
impl Default for PaymentGateConfig {
    fn default() -> Self {
        Self {
            accepts: Vec::new(),
            resource: ResourceConfig::default(),
            hooks: None,
            extensions: None,
        }
    }
}

impl std::fmt::Debug for PaymentGateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateConfig")
            .field("accepts", &self.accepts)
            .field("resource", &self.resource)
            .field("hooks", &self.hooks.as_ref().map(|_| "<dyn ServerHooks>"))
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Client-side options for the auto-pay driver.
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    /// Whether to automatically pay when a tool requires it.
    /// Defaults to `true`; when off, 402 results are returned unchanged.
    pub auto_payment: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { auto_payment: true }
    }
}
