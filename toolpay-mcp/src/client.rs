//! Client-side auto-pay driver for MCP tool calls.
//!
//! [`PayingToolClient`] wraps an MCP session (via the [`ToolCaller`]
//! abstraction) and pays for gated tools transparently: when a call comes
//! back as a 402, the driver builds a payment through the registered scheme
//! client for the advertised network, attaches it to `_meta`, and retries
//! the call exactly once. A second 402 after paying is handed back
//! verbatim; the caller decides what to do with it.

use std::sync::Arc;

use toolpay::chain::ChainIdPattern;
use toolpay::extensions::payment_identifier;
use toolpay::facilitator::BoxFuture;
use toolpay::proto::v2::{PaymentPayload, PaymentRequired};
use toolpay::scheme::{SchemeClient, SchemeClientRegistry};

use crate::error::ToolPaymentError;
use crate::hooks::{AfterPaymentContext, ClientHooks, NoClientHooks, PaymentRequiredContext};
use crate::meta;
use crate::types::{CallToolParams, CallToolResult, ClientOptions, PaidToolCallResult};

/// Abstraction over MCP tool call capability.
///
/// Implement this for your MCP SDK's session/peer type; the implementation
/// forwards `call_tool` to the underlying transport.
pub trait ToolCaller: Send + Sync {
    /// Calls an MCP tool with the given parameters.
    fn call_tool(
        &self,
        params: CallToolParams,
    ) -> BoxFuture<'_, Result<CallToolResult, ToolPaymentError>>;
}

impl<T: ToolCaller> ToolCaller for Arc<T> {
    fn call_tool(
        &self,
        params: CallToolParams,
    ) -> BoxFuture<'_, Result<CallToolResult, ToolPaymentError>> {
        self.as_ref().call_tool(params)
    }
}

/// An x402-aware MCP client with automatic payment handling.
pub struct PayingToolClient<C: ToolCaller> {
    caller: C,
    schemes: SchemeClientRegistry,
    options: ClientOptions,
    hooks: Box<dyn ClientHooks>,
}

impl<C: ToolCaller> std::fmt::Debug for PayingToolClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayingToolClient")
            .field("schemes", &self.schemes)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: ToolCaller> PayingToolClient<C> {
    /// Creates a builder for configuring a [`PayingToolClient`].
    pub fn builder(caller: C) -> PayingToolClientBuilder<C> {
        PayingToolClientBuilder {
            caller,
            schemes: SchemeClientRegistry::new(),
            options: ClientOptions::default(),
            hooks: None,
        }
    }

    /// Returns a reference to the underlying tool caller.
    pub const fn caller(&self) -> &C {
        &self.caller
    }

    /// Calls a tool, paying for it if the server demands payment.
    ///
    /// The call is attempted once without payment. On a 402 the driver
    /// consults the approval hook, builds a payment for `accepts[0]`, and
    /// retries once with the payment in `_meta`. Declined approval,
    /// disabled auto-payment, and unparseable 402 bodies all hand the
    /// error result back unchanged with `payment_made: false`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolPaymentError`] if the transport fails, no scheme
    /// client matches the advertised network, or payment creation fails.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<PaidToolCallResult, ToolPaymentError> {
        let result = self
            .caller
            .call_tool(CallToolParams {
                name: name.to_owned(),
                arguments: arguments.clone(),
                meta: None,
            })
            .await?;

        if !result.is_error {
            return Ok(build_paid_result(result, false));
        }

        let Some(payment_required) = meta::extract_payment_required(&result) else {
            return Ok(build_paid_result(result, false));
        };
        if payment_required.accepts.is_empty() {
            return Ok(build_paid_result(result, false));
        }

        if !self.options.auto_payment {
            return Ok(build_paid_result(result, false));
        }

        let ctx = PaymentRequiredContext {
            tool_name: name.to_owned(),
            arguments: arguments.clone(),
            payment_required: payment_required.clone(),
        };
        if !self.hooks.on_payment_requested(&ctx).await? {
            #[cfg(feature = "telemetry")]
            tracing::debug!(tool = %name, "payment declined by hook");
            return Ok(build_paid_result(result, false));
        }

        let payload = create_payment(&self.schemes, &payment_required).await?;
        self.retry_with_payment(name, arguments, payload).await
    }

    /// Calls a tool with a pre-built payment payload, without probing first.
    ///
    /// # Errors
    ///
    /// Returns [`ToolPaymentError`] if the transport fails.
    pub async fn call_tool_with_payment(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
        payload: PaymentPayload,
    ) -> Result<PaidToolCallResult, ToolPaymentError> {
        self.retry_with_payment(name, arguments, payload).await
    }

    /// Surfaces a tool's payment requirements without paying.
    ///
    /// Calls the tool once and parses the [`PaymentRequired`] out of the
    /// error response, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ToolPaymentError`] if the transport fails.
    pub async fn get_payment_requirements(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Option<PaymentRequired>, ToolPaymentError> {
        let result = self
            .caller
            .call_tool(CallToolParams {
                name: name.to_owned(),
                arguments,
                meta: None,
            })
            .await?;
        Ok(meta::extract_payment_required(&result))
    }

    async fn retry_with_payment(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
        payload: PaymentPayload,
    ) -> Result<PaidToolCallResult, ToolPaymentError> {
        let mut meta_map = serde_json::Map::new();
        meta::attach_payment(&mut meta_map, &payload);

        let result = self
            .caller
            .call_tool(CallToolParams {
                name: name.to_owned(),
                arguments,
                meta: Some(meta_map),
            })
            .await?;

        let settle_response = result.meta.as_ref().and_then(meta::extract_settlement);
        let after_ctx = AfterPaymentContext {
            tool_name: name.to_owned(),
            payload,
            result: result.clone(),
            settle_response,
        };
        // Observational hook; failures do not disturb the result.
        let _ = self.hooks.on_after_payment(&after_ctx).await;

        Ok(build_paid_result(result, true))
    }
}

/// Builder for configuring a [`PayingToolClient`].
pub struct PayingToolClientBuilder<C: ToolCaller> {
    caller: C,
    schemes: SchemeClientRegistry,
    options: ClientOptions,
    hooks: Option<Box<dyn ClientHooks>>,
}

impl<C: ToolCaller> std::fmt::Debug for PayingToolClientBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayingToolClientBuilder")
            .field("schemes", &self.schemes)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: ToolCaller> PayingToolClientBuilder<C> {
    /// Registers a scheme client for networks matching `pattern`.
    #[must_use]
    pub fn scheme_client(mut self, pattern: ChainIdPattern, client: Arc<dyn SchemeClient>) -> Self {
        self.schemes.register(pattern, client);
        self
    }

    /// Replaces the scheme registry wholesale.
    #[must_use]
    pub fn schemes(mut self, schemes: SchemeClientRegistry) -> Self {
        self.schemes = schemes;
        self
    }

    /// Enables or disables automatic payment handling.
    #[must_use]
    pub const fn auto_payment(mut self, enabled: bool) -> Self {
        self.options.auto_payment = enabled;
        self
    }

    /// Sets lifecycle hooks for payment events.
    #[must_use]
    pub fn hooks(mut self, hooks: Box<dyn ClientHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Builds the configured [`PayingToolClient`].
    #[must_use]
    pub fn build(self) -> PayingToolClient<C> {
        PayingToolClient {
            caller: self.caller,
            schemes: self.schemes,
            options: self.options,
            hooks: self.hooks.unwrap_or_else(|| Box::new(NoClientHooks)),
        }
    }
}

/// Standalone paid tool call for simple use cases.
///
/// Calls the tool, detects a 402, builds a payment for the first accepted
/// requirement via `schemes`, and retries exactly once. No hooks, no
/// options; use [`PayingToolClient`] when you need them.
///
/// # Errors
///
/// Returns [`ToolPaymentError`] if the transport fails, no scheme client
/// matches, or payment creation fails.
pub async fn call_paid_tool(
    caller: &dyn ToolCaller,
    schemes: &SchemeClientRegistry,
    name: &str,
    arguments: serde_json::Map<String, serde_json::Value>,
) -> Result<PaidToolCallResult, ToolPaymentError> {
    let result = caller
        .call_tool(CallToolParams {
            name: name.to_owned(),
            arguments: arguments.clone(),
            meta: None,
        })
        .await?;

    if !result.is_error {
        return Ok(build_paid_result(result, false));
    }

    let Some(payment_required) = meta::extract_payment_required(&result) else {
        return Ok(build_paid_result(result, false));
    };
    if payment_required.accepts.is_empty() {
        return Ok(build_paid_result(result, false));
    }

    let payload = create_payment(schemes, &payment_required).await?;

    let mut meta_map = serde_json::Map::new();
    meta::attach_payment(&mut meta_map, &payload);

    let result = caller
        .call_tool(CallToolParams {
            name: name.to_owned(),
            arguments,
            meta: Some(meta_map),
        })
        .await?;

    Ok(build_paid_result(result, true))
}

/// Builds a payment payload for the first accepted requirement.
///
/// Looks up the scheme client by the advertised network (exact match or
/// wildcard) and merges a generated payment identifier into the extensions
/// when the server declared that extension.
async fn create_payment(
    schemes: &SchemeClientRegistry,
    payment_required: &PaymentRequired,
) -> Result<PaymentPayload, ToolPaymentError> {
    let selected = &payment_required.accepts[0];
    let client = schemes
        .for_network(&selected.network)
        .ok_or_else(|| ToolPaymentError::NoSchemeClient(selected.network.to_string()))?;

    let mut extensions = payment_required.extensions.clone();
    if let Some(ext) = extensions.as_mut() {
        payment_identifier::append(ext, None)?;
    }

    let payload = client
        .create_payment_payload(selected, Some(&payment_required.resource), extensions.as_ref())
        .await?;

    #[cfg(feature = "telemetry")]
    tracing::debug!(network = %selected.network, scheme = %selected.scheme, "payment payload created");

    Ok(payload)
}

/// Converts a [`CallToolResult`] into a [`PaidToolCallResult`].
fn build_paid_result(result: CallToolResult, payment_made: bool) -> PaidToolCallResult {
    let payment_response = result.meta.as_ref().and_then(meta::extract_settlement);

    PaidToolCallResult {
        content: result.content.clone(),
        is_error: result.is_error,
        payment_response,
        payment_made,
        raw_result: result,
    }
}
