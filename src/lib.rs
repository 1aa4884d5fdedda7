//! FatBot relay: receives Nansen alert webhooks, rewrites analytics token
//! links into FatBot manual-trading links, and forwards the result to a
//! Discord incoming webhook.
//!
//! Pipeline: inbound POST → HMAC verification ([`signature`]) → payload
//! normalization and link rewriting ([`normalize`], [`rewrite`]) → outbound
//! POST to Discord ([`forwarder`]).

pub mod config;
pub mod error;
pub mod forwarder;
pub mod normalize;
pub mod rewrite;
pub mod server;
pub mod signature;
