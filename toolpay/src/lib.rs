#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 tool-call payment protocol.
//!
//! This crate provides the foundational types for gating tool invocations
//! behind x402 micropayments. It is transport- and blockchain-agnostic: the
//! facilitator that verifies and settles payments, and the scheme clients
//! that sign them, are consumed as traits and supplied by the embedder.
//!
//! # Overview
//!
//! When a client invokes a paid tool, the server answers with payment
//! requirements. The client signs a payment authorization through a
//! registered scheme client and retries; the server verifies the payload
//! with a facilitator before running the tool and settles it afterwards.
//!
//! # Modules
//!
//! - [`chain`] - CAIP-2 chain identifiers and match patterns
//! - [`extensions`] - Namespaced protocol extensions (payment-identifier)
//! - [`facilitator`] - Consumer trait for payment verification and settlement
//! - [`proto`] - Wire format types for the x402 v2 protocol
//! - [`scheme`] - Client-side payment scheme system and registry
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod chain;
pub mod extensions;
pub mod facilitator;
pub mod proto;
pub mod scheme;
