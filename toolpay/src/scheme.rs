//! Client-side payment scheme system.
//!
//! A scheme client knows how to build and sign a [`PaymentPayload`] for one
//! payment scheme on one or more networks. Clients register scheme clients
//! in a [`SchemeClientRegistry`] keyed by [`ChainIdPattern`]; the auto-pay
//! driver looks up the client for the network named in `accepts[0]`.
//!
//! Lookup uses longest-match precedence: an exact pattern beats a set
//! pattern, which beats a namespace wildcard (`eip155:*`).

use std::fmt;
use std::sync::Arc;

use crate::chain::{ChainId, ChainIdPattern};
use crate::facilitator::BoxFuture;
use crate::proto::Extensions;
use crate::proto::v2::{PaymentPayload, PaymentRequirements, ResourceInfo};

/// Errors produced by scheme clients while building a payment.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemeClientError {
    /// The requirements cannot be satisfied by this scheme client.
    #[error("unsupported payment requirement: {0}")]
    UnsupportedRequirement(String),
    /// Signing the payment authorization failed.
    #[error("signing failed: {0}")]
    Signing(String),
    /// JSON serialization error while assembling the payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds signed payment payloads for one payment scheme.
///
/// Implementations must be safe for concurrent use; the registry shares
/// them across in-flight calls.
pub trait SchemeClient: Send + Sync {
    /// Builds a [`PaymentPayload`] satisfying `requirement`.
    ///
    /// `resource` and `extensions` are echoed into the payload when given;
    /// the driver passes through whatever the server advertised.
    fn create_payment_payload<'a>(
        &'a self,
        requirement: &'a PaymentRequirements,
        resource: Option<&'a ResourceInfo>,
        extensions: Option<&'a Extensions>,
    ) -> BoxFuture<'a, Result<PaymentPayload, SchemeClientError>>;
}

/// Registry of scheme clients keyed by chain-id pattern.
///
/// Registration order is irrelevant; lookup picks the most specific
/// matching pattern (exact > set > wildcard). Two patterns of equal
/// specificity that both match resolve to the earlier registration.
#[derive(Default)]
pub struct SchemeClientRegistry {
    entries: Vec<(ChainIdPattern, Arc<dyn SchemeClient>)>,
}

impl fmt::Debug for SchemeClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<String> = self.entries.iter().map(|(p, _)| p.to_string()).collect();
        f.debug_tuple("SchemeClientRegistry").field(&patterns).finish()
    }
}

impl SchemeClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a scheme client for all networks matching `pattern`.
    pub fn register(&mut self, pattern: ChainIdPattern, client: Arc<dyn SchemeClient>) {
        self.entries.push((pattern, client));
    }

    /// Registers a scheme client and returns self for chaining.
    #[must_use]
    pub fn and_register(mut self, pattern: ChainIdPattern, client: Arc<dyn SchemeClient>) -> Self {
        self.register(pattern, client);
        self
    }

    /// Looks up the scheme client for the given network.
    ///
    /// Returns the most specific matching registration, or `None` if no
    /// pattern matches.
    #[must_use]
    pub fn for_network(&self, network: &ChainId) -> Option<&dyn SchemeClient> {
        // max_by_key keeps the last of equally specific matches, so scan in
        // reverse to resolve ties toward the earliest registration.
        self.entries
            .iter()
            .rev()
            .filter(|(pattern, _)| pattern.matches(network))
            .max_by_key(|(pattern, _)| pattern.specificity())
            .map(|(_, client)| &**client)
    }

    /// Returns `true` if no scheme clients are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::v2::V2;

    struct StubClient(&'static str);

    impl SchemeClient for StubClient {
        fn create_payment_payload<'a>(
            &'a self,
            requirement: &'a PaymentRequirements,
            resource: Option<&'a ResourceInfo>,
            extensions: Option<&'a Extensions>,
        ) -> BoxFuture<'a, Result<PaymentPayload, SchemeClientError>> {
            let label = self.0;
            Box::pin(async move {
                Ok(PaymentPayload {
                    x402_version: V2,
                    accepted: requirement.clone(),
                    payload: serde_json::json!({ "signer": label }),
                    resource: resource.cloned(),
                    extensions: extensions.cloned(),
                })
            })
        }
    }

    fn requirement(network: ChainId) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_owned(),
            network,
            amount: "100000".to_owned(),
            pay_to: "0xPayee".to_owned(),
            asset: "0xUSDC".to_owned(),
            max_timeout_seconds: None,
            extra: None,
        }
    }

    #[tokio::test]
    async fn test_exact_match_beats_wildcard() {
        let mut registry = SchemeClientRegistry::new();
        registry.register(
            ChainIdPattern::wildcard("eip155"),
            Arc::new(StubClient("any-evm")),
        );
        registry.register(
            ChainIdPattern::exact("eip155", "84532"),
            Arc::new(StubClient("base-sepolia")),
        );

        let client = registry
            .for_network(&ChainId::new("eip155", "84532"))
            .unwrap();
        let req = requirement(ChainId::new("eip155", "84532"));
        let payload = client.create_payment_payload(&req, None, None).await.unwrap();
        assert_eq!(payload.payload["signer"], "base-sepolia");
    }

    #[test]
    fn test_wildcard_covers_whole_namespace() {
        let mut registry = SchemeClientRegistry::new();
        registry.register(
            ChainIdPattern::wildcard("eip155"),
            Arc::new(StubClient("any-evm")),
        );

        assert!(registry.for_network(&ChainId::new("eip155", "1")).is_some());
        assert!(registry.for_network(&ChainId::new("eip155", "8453")).is_some());
        assert!(registry.for_network(&ChainId::new("solana", "devnet")).is_none());
    }

    #[tokio::test]
    async fn test_equal_specificity_resolves_to_earlier_registration() {
        let first: std::collections::HashSet<String> =
            ["1", "8453"].into_iter().map(String::from).collect();
        let second: std::collections::HashSet<String> =
            ["8453", "137"].into_iter().map(String::from).collect();

        let mut registry = SchemeClientRegistry::new();
        registry.register(
            ChainIdPattern::set("eip155", first),
            Arc::new(StubClient("first")),
        );
        registry.register(
            ChainIdPattern::set("eip155", second),
            Arc::new(StubClient("second")),
        );

        let client = registry.for_network(&ChainId::new("eip155", "8453")).unwrap();
        let req = requirement(ChainId::new("eip155", "8453"));
        let payload = client.create_payment_payload(&req, None, None).await.unwrap();
        assert_eq!(payload.payload["signer"], "first");
    }

    #[test]
    fn test_empty_registry_matches_nothing() {
        let registry = SchemeClientRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.for_network(&ChainId::new("eip155", "1")).is_none());
    }
}
