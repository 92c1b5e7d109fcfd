#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! MCP (Model Context Protocol) integration for x402 paid tool calls.
//!
//! This crate lets an MCP server gate specific tool invocations behind a
//! cryptographically verifiable payment, and lets an MCP client pay for
//! them transparently. Payment data rides in the tool call's `_meta`
//! envelope; no transport headers are involved.
//!
//! # Server Usage
//!
//! Wrap a tool handler with payment verification and settlement:
//!
//! ```rust,ignore
//! use toolpay_mcp::server::PaymentGate;
//! use toolpay_mcp::types::PaymentGateConfig;
//!
//! let gate = PaymentGate::new(facilitator, PaymentGateConfig {
//!     accepts: vec![requirements],
//!     ..Default::default()
//! });
//!
//! let result = gate.process(request, |req| async { run_tool(req).await }).await?;
//! ```
//!
//! # Client Usage
//!
//! Wrap an MCP session with automatic payment handling:
//!
//! ```rust,ignore
//! use toolpay_mcp::client::PayingToolClient;
//!
//! let client = PayingToolClient::builder(my_mcp_session)
//!     .schemes(scheme_registry)
//!     .build();
//!
//! // 402 responses are paid and retried automatically
//! let result = client.call_tool("get_weather", args).await?;
//! ```
//!
//! # Utility Modules
//!
//! - [`meta`] - Read/write payment data in `_meta` maps
//! - [`response`] - Build the 402 payment-required tool result
//! - [`hooks`] - Lifecycle hooks around execution and settlement
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod client;
pub mod error;
pub mod hooks;
pub mod meta;
pub mod response;
pub mod server;
pub mod types;

/// MCP `_meta` key carrying the payment payload (client → server).
pub const PAYMENT_META_KEY: &str = "x402/payment";

/// MCP `_meta` key carrying the settlement response (server → client).
pub const PAYMENT_RESPONSE_META_KEY: &str = "x402/payment-response";
