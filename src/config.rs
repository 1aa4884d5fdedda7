//! Process configuration, loaded once at startup from the environment.
//!
//! Everything the relay needs is captured here as an immutable value and
//! passed explicitly into the core; business logic never reads the
//! environment directly.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Default inbound body cap in bytes.
pub const DEFAULT_MAX_BODY: usize = 100_000;

/// Forwarding must complete within this many seconds regardless of config.
const FORWARD_TIMEOUT_CAP_SECS: u64 = 5;

const DEFAULT_ALLOWED_CHAINS: &str = "solana,ethereum";
const DEFAULT_CHAIN: &str = "solana";
const DEFAULT_TRADING_BASE: &str = "https://fatbot.fatty.io";

#[derive(Clone)]
pub struct Config {
    /// Shared secret for inbound HMAC verification (`NANSEN_SECRET`).
    /// `None` means unset — verification fails closed.
    pub signing_secret: Option<String>,
    /// Destination Discord incoming-webhook URL (`DISCORD_WEBHOOK`).
    /// `None` disables forwarding; inbound requests are still acknowledged.
    pub discord_webhook: Option<String>,
    /// Inbound body size cap in bytes (`MAX_BODY`).
    pub max_body_bytes: usize,
    /// Chains eligible for link rewriting, lowercase (`ALLOWED_CHAINS`).
    pub allowed_chains: HashSet<String>,
    /// Chain assumed when a link does not name one (`DEFAULT_CHAIN`).
    pub default_chain: String,
    /// Base URL of the manual-trading UI (`TRADING_BASE_URL`), no trailing slash.
    pub trading_base_url: String,
    /// Timeout for the outbound Discord call (`FORWARD_TIMEOUT_SECS`).
    pub forward_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret and webhook URL (which embeds a token) are redacted.
        f.debug_struct("Config")
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("discord_webhook", &self.discord_webhook.as_ref().map(|_| "<redacted>"))
            .field("max_body_bytes", &self.max_body_bytes)
            .field("allowed_chains", &self.allowed_chains)
            .field("default_chain", &self.default_chain)
            .field("trading_base_url", &self.trading_base_url)
            .field("forward_timeout", &self.forward_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Unset or empty string variables fall back to defaults; malformed
    /// numeric values are a startup error rather than a silent default.
    pub fn from_env() -> Result<Self> {
        let max_body_bytes = match non_empty_var("MAX_BODY") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("MAX_BODY is not a valid byte count: {raw:?}"))?,
            None => DEFAULT_MAX_BODY,
        };

        let timeout_secs = match non_empty_var("FORWARD_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("FORWARD_TIMEOUT_SECS is not a valid number: {raw:?}"))?,
            None => FORWARD_TIMEOUT_CAP_SECS,
        };

        let allowed_raw =
            non_empty_var("ALLOWED_CHAINS").unwrap_or_else(|| DEFAULT_ALLOWED_CHAINS.to_owned());

        Ok(Self {
            signing_secret: non_empty_var("NANSEN_SECRET"),
            discord_webhook: non_empty_var("DISCORD_WEBHOOK"),
            max_body_bytes,
            allowed_chains: parse_chain_list(&allowed_raw),
            default_chain: non_empty_var("DEFAULT_CHAIN")
                .unwrap_or_else(|| DEFAULT_CHAIN.to_owned())
                .to_lowercase(),
            trading_base_url: non_empty_var("TRADING_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TRADING_BASE.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            forward_timeout: Duration::from_secs(timeout_secs.min(FORWARD_TIMEOUT_CAP_SECS)),
        })
    }
}

/// Read an environment variable, treating unset and empty as absent.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_chain_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}
