//! Alert payload normalization: heterogeneous inbound shapes become one
//! outbound Discord message.
//!
//! Nansen's alert payloads have gone through several shapes over time; no
//! two deployments agree on key names. Every field is read through a
//! priority-ordered list of synonymous keys and renders a placeholder when
//! absent. Normalization is total: structurally valid JSON always produces
//! a message, never an error.

use crate::forwarder::{Embed, EmbedField, OutboundMessage};
use crate::rewrite::{has_link_marker, LinkRewriter};
use serde_json::{Map, Value};

/// Container keys probed for the alert list, in order.
const ALERT_CONTAINER_KEYS: &[&str] = &["alerts", "data", "events"];

/// Synonym lists for alert record fields, highest priority first.
const SYMBOL_KEYS: &[&str] = &["symbol", "token_symbol", "tokenSymbol", "name", "token"];
const URL_KEYS: &[&str] = &["url", "link", "token_url", "tokenUrl", "alert_url"];
const INFLOW_KEYS: &[&str] = &["inflow", "inflow_usd", "inflowUsd", "netflow"];
const RECEIVER_KEYS: &[&str] = &["receivers", "receiver_count", "receiverCount", "wallets"];
const VOLUME_KEYS: &[&str] = &["volume", "volume_usd", "volumeUsd", "volume24h"];
const MARKET_CAP_KEYS: &[&str] = &["market_cap", "marketCap", "mcap", "fdv"];
const AGE_KEYS: &[&str] = &["age", "token_age", "tokenAge"];

const MISSING: &str = "?";
const UNKNOWN_SYMBOL: &str = "Unknown";
const EMBED_TITLE: &str = "Smart Money Inflow";
const EMBED_COLOR: u32 = 0x2ECC71;

/// Hard cap on any outbound free-text string (Discord embed limit).
pub const MAX_TEXT_LEN: usize = 4000;
const ELLIPSIS: &str = "...";

/// Build the outbound message for an inbound payload.
///
/// Alert records are preferred; a payload without any recognizable alert
/// container falls back to relaying its `content` (and any `embeds`) with
/// links rewritten and text sanitized.
pub fn normalize(payload: &Value, rewriter: &LinkRewriter) -> OutboundMessage {
    if let Some(alerts) = find_alerts(payload) {
        if !alerts.is_empty() {
            return alert_message(&alerts, rewriter);
        }
    }
    passthrough_message(payload, rewriter)
}

/// Mass-mention neutralization plus a hard length cap.
///
/// A zero-width space after `@` keeps the text readable while Discord no
/// longer parses it as a mention. Strings over [`MAX_TEXT_LEN`] chars are
/// cut to exactly that length, ellipsis included.
pub fn sanitize_text(text: &str) -> String {
    let out = text
        .replace("@everyone", "@\u{200b}everyone")
        .replace("@here", "@\u{200b}here");
    if out.chars().count() <= MAX_TEXT_LEN {
        return out;
    }
    let mut cut: String = out.chars().take(MAX_TEXT_LEN - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// `1000.5` → `$1,000.50`.
pub fn format_usd(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

// ── Alert path ────────────────────────────────────────────────────────────────

fn find_alerts(payload: &Value) -> Option<Vec<&Map<String, Value>>> {
    ALERT_CONTAINER_KEYS.iter().find_map(|key| {
        payload
            .get(*key)?
            .as_array()
            .map(|list| list.iter().filter_map(Value::as_object).collect())
    })
}

fn alert_message(alerts: &[&Map<String, Value>], rewriter: &LinkRewriter) -> OutboundMessage {
    let fields = alerts
        .iter()
        .map(|alert| alert_field(alert, rewriter))
        .collect();
    OutboundMessage {
        content: None,
        embeds: vec![Embed {
            title: Some(EMBED_TITLE.to_owned()),
            description: None,
            color: Some(EMBED_COLOR),
            fields,
            extra: Map::new(),
        }],
    }
}

/// One embed field per alert record. Every stat is optional and renders
/// `?` when absent rather than being omitted.
fn alert_field(alert: &Map<String, Value>, rewriter: &LinkRewriter) -> EmbedField {
    let symbol = first_string(alert, SYMBOL_KEYS).unwrap_or(UNKNOWN_SYMBOL);
    let link = discover_url(alert).map(|url| rewriter.rewrite_url(url));

    let stats = format!(
        "Inflow: {} | Receivers: {} | Volume: {} | Market cap: {} | Age: {}",
        money_or_text(alert, INFLOW_KEYS),
        text_stat(alert, RECEIVER_KEYS),
        money_or_text(alert, VOLUME_KEYS),
        money_or_text(alert, MARKET_CAP_KEYS),
        text_stat(alert, AGE_KEYS),
    );

    let value = match link {
        Some(link) => format!("{link}\n{stats}"),
        None => stats,
    };

    EmbedField {
        name: sanitize_text(symbol),
        value: sanitize_text(&value),
        inline: false,
    }
}

/// Find the URL carried by an alert record.
///
/// Named candidate keys win first; failing those, every string-valued field
/// is scanned in iteration order for an analytics link marker.
fn discover_url<'a>(alert: &'a Map<String, Value>) -> Option<&'a str> {
    if let Some(url) = first_string(alert, URL_KEYS) {
        return Some(url);
    }
    alert
        .values()
        .filter_map(Value::as_str)
        .find(|value| has_link_marker(value))
}

fn first_string<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(*key)?.as_str())
        .find(|s| !s.is_empty())
}

fn first_value<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

/// Numeric values render as currency, strings pass through, anything else
/// (or nothing) renders the placeholder.
fn money_or_text(map: &Map<String, Value>, keys: &[&str]) -> String {
    match first_value(map, keys) {
        Some(Value::Number(n)) => n.as_f64().map(format_usd).unwrap_or_else(|| MISSING.into()),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => MISSING.into(),
    }
}

fn text_stat(map: &Map<String, Value>, keys: &[&str]) -> String {
    match first_value(map, keys) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => MISSING.into(),
    }
}

// ── Passthrough path ──────────────────────────────────────────────────────────

/// Relay a Discord-native `{content, embeds}` payload (or anything without
/// an alert container), rewriting links and sanitizing all string values.
fn passthrough_message(payload: &Value, rewriter: &LinkRewriter) -> OutboundMessage {
    let content = payload
        .get("content")
        .and_then(Value::as_str)
        .map(|text| clean(text, rewriter))
        .filter(|text| !text.is_empty());

    let embeds = payload
        .get("embeds")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|raw| passthrough_embed(raw, rewriter))
                .collect()
        })
        .unwrap_or_default();

    OutboundMessage { content, embeds }
}

/// Rewrite and sanitize one relayed embed. Embeds that do not deserialize
/// (e.g. non-string field values) are dropped rather than failing the request.
fn passthrough_embed(raw: &Value, rewriter: &LinkRewriter) -> Option<Embed> {
    let mut embed: Embed = serde_json::from_value(raw.clone()).ok()?;
    embed.title = embed.title.map(|text| clean(&text, rewriter));
    embed.description = embed.description.map(|text| clean(&text, rewriter));
    for field in &mut embed.fields {
        field.name = clean(&field.name, rewriter);
        field.value = clean(&field.value, rewriter);
    }
    for value in embed.extra.values_mut() {
        if let Value::String(text) = value {
            *value = Value::String(clean(text, rewriter));
        }
    }
    Some(embed)
}

fn clean(text: &str, rewriter: &LinkRewriter) -> String {
    sanitize_text(&rewriter.rewrite_links_in_text(text))
}
