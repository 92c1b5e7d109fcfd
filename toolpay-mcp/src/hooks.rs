//! Lifecycle hooks around gated tool execution.
//!
//! Server-side hooks run inside the payment gate, strictly ordered:
//! before-execution → handler → after-execution → settle → after-settlement.
//! The before-execution hook is the only one whose return value affects
//! control flow (`false` aborts with a 402). Contexts are passed by value
//! per phase; mutating one does not affect later phases.
//!
//! Hook errors are not caught by the gate — an `Err` aborts the call and
//! surfaces to the transport as a tool error. Hooks are skipped entirely
//! when the gate short-circuits before their phase (no payment, failed
//! verification).

use toolpay::facilitator::BoxFuture;
use toolpay::proto::SettleResponse;
use toolpay::proto::v2::{PaymentPayload, PaymentRequired, PaymentRequirements};

use crate::error::ToolPaymentError;
use crate::types::CallToolResult;

/// Context provided to server-side hooks during payment processing.
#[derive(Debug, Clone)]
pub struct ServerHookContext {
    /// The tool name being executed.
    pub tool_name: String,
    /// The arguments passed to the tool.
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// The payment requirements being enforced (`accepts[0]`).
    pub requirement: PaymentRequirements,
    /// The verified payment payload from the client.
    pub payload: PaymentPayload,
}

/// Context provided to after-execution hooks.
#[derive(Debug, Clone)]
pub struct AfterExecutionContext {
    /// The base hook context.
    pub base: ServerHookContext,
    /// The tool call result, before any receipt is attached.
    pub result: CallToolResult,
}

/// Context provided to after-settlement hooks.
#[derive(Debug, Clone)]
pub struct SettlementContext {
    /// The base hook context.
    pub base: ServerHookContext,
    /// The successful settlement response.
    pub settlement: SettleResponse,
}

/// Server-side payment lifecycle hooks.
///
/// All methods have default no-op implementations; override only what you
/// need. Implementations must be `Send + Sync`; the gate shares them across
/// in-flight calls.
pub trait ServerHooks: Send + Sync {
    /// Called after payment verification, before tool execution.
    ///
    /// Return `false` to block execution (the caller receives a 402); any
    /// other outcome proceeds. Use this for rate limiting or access checks.
    fn on_before_execution(
        &self,
        _ctx: &ServerHookContext,
    ) -> BoxFuture<'_, Result<bool, ToolPaymentError>> {
        Box::pin(async { Ok(true) })
    }

    /// Called after tool execution, before settlement.
    ///
    /// Observational; the result cannot be altered.
    fn on_after_execution(
        &self,
        _ctx: &AfterExecutionContext,
    ) -> BoxFuture<'_, Result<(), ToolPaymentError>> {
        Box::pin(async { Ok(()) })
    }

    /// Called after successful settlement only.
    fn on_after_settlement(
        &self,
        _ctx: &SettlementContext,
    ) -> BoxFuture<'_, Result<(), ToolPaymentError>> {
        Box::pin(async { Ok(()) })
    }
}

/// No-op implementation of [`ServerHooks`] for when no hooks are needed.
#[derive(Debug, Clone, Copy)]
pub struct NoServerHooks;

impl ServerHooks for NoServerHooks {}

impl<T: ServerHooks + ?Sized> ServerHooks for std::sync::Arc<T> {
    fn on_before_execution(
        &self,
        ctx: &ServerHookContext,
    ) -> BoxFuture<'_, Result<bool, ToolPaymentError>> {
        (**self).on_before_execution(ctx)
    }

    fn on_after_execution(
        &self,
        ctx: &AfterExecutionContext,
    ) -> BoxFuture<'_, Result<(), ToolPaymentError>> {
        (**self).on_after_execution(ctx)
    }

    fn on_after_settlement(
        &self,
        ctx: &SettlementContext,
    ) -> BoxFuture<'_, Result<(), ToolPaymentError>> {
        (**self).on_after_settlement(ctx)
    }
}

/// Context provided to client-side hooks when a tool demands payment.
#[derive(Debug, Clone)]
pub struct PaymentRequiredContext {
    /// The tool name that requires payment.
    pub tool_name: String,
    /// The arguments passed to the tool.
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// The payment required response from the server.
    pub payment_required: PaymentRequired,
}

/// Context provided to client-side after-payment hooks.
#[derive(Debug, Clone)]
pub struct AfterPaymentContext {
    /// The tool name that was paid for.
    pub tool_name: String,
    /// The payment payload that was sent.
    pub payload: PaymentPayload,
    /// The tool call result of the paid retry.
    pub result: CallToolResult,
    /// The settlement response, if the server attached one.
    pub settle_response: Option<SettleResponse>,
}

/// Client-side payment lifecycle hooks.
///
/// All methods have default no-op implementations.
pub trait ClientHooks: Send + Sync {
    /// Called before the driver builds a payment.
    ///
    /// Return `true` to approve; `false` makes the driver hand back the
    /// 402 result unchanged instead of paying.
    fn on_payment_requested(
        &self,
        _ctx: &PaymentRequiredContext,
    ) -> BoxFuture<'_, Result<bool, ToolPaymentError>> {
        Box::pin(async { Ok(true) })
    }

    /// Called after the paid retry returns, whatever its outcome.
    ///
    /// Observational; errors are ignored by the driver.
    fn on_after_payment(
        &self,
        _ctx: &AfterPaymentContext,
    ) -> BoxFuture<'_, Result<(), ToolPaymentError>> {
        Box::pin(async { Ok(()) })
    }
}

/// No-op implementation of [`ClientHooks`] for when no hooks are needed.
#[derive(Debug, Clone, Copy)]
pub struct NoClientHooks;

impl ClientHooks for NoClientHooks {}
