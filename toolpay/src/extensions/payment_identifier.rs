//! The `payment-identifier` extension.
//!
//! An idempotency key the client attaches to its payment payload so the
//! facilitator can deduplicate settlement attempts. The id is opaque to this
//! crate; uniqueness across concurrent generators rests on the UUID v4
//! source.
//!
//! Flow: the server [`declare`]s the extension in its advertised
//! `extensions` map; the client [`append`]s an id (provided or generated)
//! before building the payload; the server [`extract`]s and validates it.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proto::Extensions;
use crate::proto::v2::PaymentPayload;

/// Extensions-map key under which this extension lives.
pub const PAYMENT_IDENTIFIER_KEY: &str = "payment-identifier";

/// Prefix for generated payment identifiers.
pub const DEFAULT_ID_PREFIX: &str = "pay_";

/// Permitted id shape: ASCII `[a-zA-Z0-9_-]`, length 16 to 128.
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9_-]{16,128}$").expect("payment id pattern is valid")
});

/// Errors produced by payment-identifier operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentIdentifierError {
    /// The id does not match `^[a-zA-Z0-9_-]+$` with length 16 to 128.
    #[error("invalid payment identifier: {0:?}")]
    InvalidId(String),
    /// The extension requires an id but the payload carries none.
    #[error("payment identifier required but absent")]
    MissingId,
}

/// The `info` half of the extension record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIdentifierInfo {
    /// Whether the server insists on an id being present.
    pub required: bool,
    /// The id itself, filled in by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The full extension record: `{ info, schema }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIdentifierExtension {
    /// Declaration and (client-side) the chosen id.
    pub info: PaymentIdentifierInfo,
    /// JSON Schema constraining the `info` object.
    pub schema: serde_json::Value,
}

/// Returns `true` if `id` is a well-formed payment identifier.
#[must_use]
pub fn is_valid_payment_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Generates a fresh payment identifier: `pay_` + 32 hex chars (UUID v4).
#[must_use]
pub fn generate_payment_id() -> String {
    format!("{DEFAULT_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Builds the extension record a server advertises.
///
/// The schema constrains `id` to the permitted shape and marks `required`
/// mandatory, so clients on any stack can validate what they fill in.
#[must_use]
pub fn declare(required: bool) -> PaymentIdentifierExtension {
    PaymentIdentifierExtension {
        info: PaymentIdentifierInfo { required, id: None },
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "required": { "type": "boolean" },
                "id": {
                    "type": "string",
                    "pattern": "^[a-zA-Z0-9_-]+$",
                    "minLength": 16,
                    "maxLength": 128
                }
            },
            "required": ["required"]
        }),
    }
}

/// Fills the id into a declared extension record.
///
/// No-op returning `Ok(None)` when the `payment-identifier` key is absent
/// from `extensions` (the server did not declare it). Otherwise sets
/// `info.id` to `id` (validated) or to a freshly generated identifier, and
/// returns the id that was written.
///
/// # Errors
///
/// Returns [`PaymentIdentifierError::InvalidId`] if a provided `id` fails
/// validation. The extensions map is left untouched in that case.
pub fn append(
    extensions: &mut Extensions,
    id: Option<&str>,
) -> Result<Option<String>, PaymentIdentifierError> {
    let Some(entry) = extensions.get_mut(PAYMENT_IDENTIFIER_KEY) else {
        return Ok(None);
    };

    let chosen = match id {
        Some(provided) => {
            if !is_valid_payment_id(provided) {
                return Err(PaymentIdentifierError::InvalidId(provided.to_owned()));
            }
            provided.to_owned()
        }
        None => generate_payment_id(),
    };

    if let Some(serde_json::Value::Object(info)) = entry.get_mut("info") {
        info.insert("id".to_owned(), serde_json::Value::String(chosen.clone()));
    } else if let Some(obj) = entry.as_object_mut() {
        // Tolerate a bare declaration without an info object.
        obj.insert(
            "info".to_owned(),
            serde_json::json!({ "required": false, "id": chosen.clone() }),
        );
    } else {
        *entry = serde_json::json!({ "info": { "required": false, "id": chosen.clone() } });
    }

    Ok(Some(chosen))
}

/// Reads the id carried in a payload's extensions.
///
/// Returns the empty string when the extension (or its id) is absent. With
/// `validate` set, a malformed id is an error; without it, the raw value is
/// returned as-is.
///
/// # Errors
///
/// Returns [`PaymentIdentifierError::InvalidId`] when `validate` is set and
/// the carried id is malformed.
pub fn extract(
    payload: &PaymentPayload,
    validate: bool,
) -> Result<String, PaymentIdentifierError> {
    let id = payload
        .extensions
        .as_ref()
        .and_then(|ext| ext.get(PAYMENT_IDENTIFIER_KEY))
        .and_then(|entry| entry.get("info"))
        .and_then(|info| info.get("id"))
        .and_then(|id| id.as_str())
        .unwrap_or_default();

    if validate && !id.is_empty() && !is_valid_payment_id(id) {
        return Err(PaymentIdentifierError::InvalidId(id.to_owned()));
    }
    Ok(id.to_owned())
}

/// Reads `info.required` from an extension record value.
///
/// Robust against both the typed [`PaymentIdentifierExtension`] shape and a
/// loose map reconstructed from JSON; anything unreadable counts as not
/// required.
#[must_use]
pub fn is_required(extension: &serde_json::Value) -> bool {
    extension
        .get("info")
        .and_then(|info| info.get("required"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Asserts the payload satisfies the declared requirement.
///
/// When `required`, an id must be present and well-formed.
///
/// # Errors
///
/// [`PaymentIdentifierError::MissingId`] when required and absent;
/// [`PaymentIdentifierError::InvalidId`] when present but malformed.
pub fn validate_requirement(
    payload: &PaymentPayload,
    required: bool,
) -> Result<(), PaymentIdentifierError> {
    let id = extract(payload, true)?;
    if required && id.is_empty() {
        return Err(PaymentIdentifierError::MissingId);
    }
    Ok(())
}
