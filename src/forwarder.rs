//! Outbound delivery to the Discord incoming webhook.
//!
//! Forwarding is best-effort: the relay acknowledges the inbound caller as
//! soon as the payload is accepted and processed; Discord's own verdict on
//! the message is logged but never changes that acknowledgement. Only a
//! destination URL that cannot even be parsed surfaces as an error.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use std::time::Duration;

/// Shared HTTP client for forwarding to Discord.
/// Reusing the client enables TCP/TLS connection pooling.
/// Redirects are disabled: a POST should land exactly where configured.
static DISCORD_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .connect_timeout(Duration::from_secs(3))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build Discord HTTP client")
});

/// How much of a Discord error body is worth logging.
const LOGGED_BODY_MAX: usize = 200;

/// The message POSTed to the Discord webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// A Discord embed. Unknown keys from relayed payloads survive in `extra`
/// so a passthrough message keeps its author/footer/thumbnail blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// What happened to one forwarding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Delivered,
    /// No destination configured; nothing was sent.
    Skipped,
    /// The attempt failed (transport error or non-2xx); logged, non-fatal.
    Failed,
}

/// Forward a message to the configured Discord webhook, if any.
///
/// Exactly one attempt, bounded by `timeout`. Returns
/// [`RelayError::Misconfigured`] only when the destination URL cannot be
/// parsed, i.e. the attempt could not be made at all.
pub async fn forward(
    webhook_url: Option<&str>,
    timeout: Duration,
    message: &OutboundMessage,
) -> Result<ForwardOutcome, RelayError> {
    let Some(url) = webhook_url else {
        tracing::info!("no Discord webhook configured, skipping forward");
        return Ok(ForwardOutcome::Skipped);
    };

    let url = reqwest::Url::parse(url).map_err(|e| {
        tracing::error!("Discord webhook URL is not a valid URL: {e}");
        RelayError::Misconfigured
    })?;

    match DISCORD_CLIENT
        .post(url)
        .timeout(timeout)
        .json(message)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => Ok(ForwardOutcome::Delivered),
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(LOGGED_BODY_MAX).collect();
            tracing::warn!("Discord webhook returned {status}: {body}");
            Ok(ForwardOutcome::Failed)
        }
        Err(e) => {
            tracing::error!("failed to reach Discord webhook: {e}");
            Ok(ForwardOutcome::Failed)
        }
    }
}
