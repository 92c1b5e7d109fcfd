//! Server-side payment gate for MCP tool handlers.
//!
//! [`PaymentGate`] sits between the transport and a tool handler and runs
//! the four-phase x402 flow for every call:
//!
//! 1. Extract `x402/payment` from request `_meta`; absent → 402
//! 2. Verify the payload via the facilitator; invalid → 402
//! 3. `on_before_execution` hook (can block), then run the handler
//! 4. Settle via the facilitator and attach the receipt to result `_meta`
//!
//! Verification runs before the handler so no free work is done on a bad
//! payment; settlement runs after it so buyers are not charged for failed
//! work. A settlement failure after successful work is reported as a 402 to
//! signal non-delivery.

use std::future::Future;
use std::sync::Arc;

use toolpay::extensions::payment_identifier;
use toolpay::facilitator::Facilitator;
use toolpay::proto::v2::ResourceInfo;

use crate::error::ToolPaymentError;
use crate::hooks::{AfterExecutionContext, NoServerHooks, ServerHookContext, ServerHooks, SettlementContext};
use crate::types::{CallToolParams, CallToolResult, PaymentGateConfig};
use crate::{meta, response};

/// Wraps MCP tool handlers with x402 payment verification and settlement.
///
/// The gate is reentrant: one instance serves overlapping calls, with all
/// per-call state on the stack of a single [`process`](Self::process)
/// invocation. The facilitator is shared and must tolerate concurrent use.
///
/// # Examples
///
/// ```rust,ignore
/// let gate = PaymentGate::new(facilitator, PaymentGateConfig {
///     accepts: vec![requirements],
///     ..Default::default()
/// });
///
/// let result = gate.process(request, |req| async {
///     Ok(CallToolResult { content: vec![ContentItem::text("ok")], ..Default::default() })
/// }).await?;
/// ```
pub struct PaymentGate {
    facilitator: Arc<dyn Facilitator>,
    config: PaymentGateConfig,
}

impl std::fmt::Debug for PaymentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PaymentGate {
    /// Creates a new payment gate.
    ///
    /// # Panics
    ///
    /// Panics if `config.accepts` is empty; a gate with nothing to accept
    /// is a configuration bug, caught at construction rather than on the
    /// first call.
    #[must_use]
    pub fn new(facilitator: Arc<dyn Facilitator>, config: PaymentGateConfig) -> Self {
        assert!(
            !config.accepts.is_empty(),
            "PaymentGateConfig.accepts must contain at least one payment requirement"
        );
        Self {
            facilitator,
            config,
        }
    }

    /// Processes a tool call request with payment enforcement.
    ///
    /// The `handler` closure runs only after payment verification succeeds
    /// and the before-execution hook approves. Payment-flow denials come
    /// back as `Ok` results with `is_error` set and a 402 body.
    ///
    /// # Errors
    ///
    /// Hook and handler errors are not caught; they propagate as
    /// [`ToolPaymentError`] for the transport to surface. If the call is
    /// cancelled (the future dropped) between verify and settle, settlement
    /// is never attempted and no receipt is emitted.
    pub async fn process<H, Fut>(
        &self,
        request: CallToolParams,
        handler: H,
    ) -> Result<CallToolResult, ToolPaymentError>
    where
        H: FnOnce(CallToolParams) -> Fut,
        Fut: Future<Output = Result<CallToolResult, ToolPaymentError>>,
    {
        let requirement = &self.config.accepts[0];
        let tool_name = request.name.clone();

        let Some(payment) = request.meta.as_ref().and_then(meta::extract_payment) else {
            #[cfg(feature = "telemetry")]
            tracing::debug!(tool = %tool_name, "no payment attached, advertising requirements");
            return Ok(self.deny(&tool_name, "Payment required to access this tool"));
        };

        if let Err(err) = self.check_payment_identifier(&payment) {
            return Ok(self.deny(&tool_name, &err.to_string()));
        }

        let verdict = match self.facilitator.verify(&payment, requirement).await {
            Ok(verdict) => verdict,
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(tool = %tool_name, error = %err, "payment verification call failed");
                return Ok(self.deny(&tool_name, &format!("Payment verification failed: {err}")));
            }
        };
        if !verdict.is_valid {
            let reason = verdict
                .invalid_reason
                .as_deref()
                .unwrap_or("Payment verification failed");
            return Ok(self.deny(&tool_name, reason));
        }

        let hook_ctx = ServerHookContext {
            tool_name: tool_name.clone(),
            arguments: request.arguments.clone(),
            requirement: requirement.clone(),
            payload: payment.clone(),
        };
        let hooks = self.hooks();

        if !hooks.on_before_execution(&hook_ctx).await? {
            return Ok(self.deny(&tool_name, "Execution blocked by hook"));
        }

        let result = handler(request).await?;

        hooks
            .on_after_execution(&AfterExecutionContext {
                base: hook_ctx.clone(),
                result: result.clone(),
            })
            .await?;

        // Failed work is never charged for.
        if result.is_error {
            return Ok(result);
        }

        let settlement = match self.facilitator.settle(&payment, requirement).await {
            Ok(settlement) => settlement,
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(tool = %tool_name, error = %err, "settlement call failed");
                return Ok(self.deny(&tool_name, &format!("Payment settlement failed: {err}")));
            }
        };
        if !settlement.success {
            let reason = settlement.error_reason.as_deref().unwrap_or("unknown");
            return Ok(self.deny(&tool_name, &format!("Payment settlement failed: {reason}")));
        }

        hooks
            .on_after_settlement(&SettlementContext {
                base: hook_ctx,
                settlement: settlement.clone(),
            })
            .await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(tool = %tool_name, transaction = %settlement.transaction, "payment settled");

        let mut result = result;
        meta::attach_settlement(&mut result, &settlement);
        Ok(result)
    }

    /// Validates the inbound payment identifier when the gate declared the
    /// extension with `required: true`.
    fn check_payment_identifier(
        &self,
        payment: &toolpay::proto::v2::PaymentPayload,
    ) -> Result<(), payment_identifier::PaymentIdentifierError> {
        let declared = self
            .config
            .extensions
            .as_ref()
            .and_then(|ext| ext.get(payment_identifier::PAYMENT_IDENTIFIER_KEY));
        match declared {
            Some(record) => {
                payment_identifier::validate_requirement(payment, payment_identifier::is_required(record))
            }
            None => Ok(()),
        }
    }

    /// Builds the 402 denial for this gate's configuration.
    fn deny(&self, tool_name: &str, error: &str) -> CallToolResult {
        response::payment_required_result(
            &self.config.accepts,
            self.resource_info(tool_name),
            error,
            self.config.extensions.as_ref(),
        )
    }

    /// Resolves the advertised resource metadata, field by field.
    fn resource_info(&self, tool_name: &str) -> ResourceInfo {
        let overrides = &self.config.resource;
        ResourceInfo {
            url: meta::tool_resource_url(tool_name, overrides.url.as_deref()),
            description: overrides
                .description
                .clone()
                .unwrap_or_else(|| format!("Tool: {tool_name}")),
            mime_type: overrides
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/json".to_owned()),
        }
    }

    fn hooks(&self) -> &dyn ServerHooks {
        self.config.hooks.as_deref().unwrap_or(&NoServerHooks)
    }
}
