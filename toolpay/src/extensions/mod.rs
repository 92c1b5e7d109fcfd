//! Namespaced protocol extensions.
//!
//! Extensions ride in the `extensions` map of [`PaymentRequired`] and
//! [`PaymentPayload`] under well-known keys. Each extension is self-contained:
//! a server declares it, a client fills it in, and both sides tolerate the
//! loose-map JSON shape the value takes after a wire round trip.
//!
//! [`PaymentRequired`]: crate::proto::v2::PaymentRequired
//! [`PaymentPayload`]: crate::proto::v2::PaymentPayload

pub mod payment_identifier;
