//! Analytics-link rewriting: Nansen token links become FatBot manual-trading
//! links, `https://<trading-host>/manual-trading/<CHAIN>/<tokenAddress>`.
//!
//! Incoming payloads have carried several historically-evolved URL shapes.
//! Extraction is an ordered list of strategies tried first-match-wins:
//!
//! 1. query form — `?tokenAddress=<tok>&chain=<c>` (chain optional);
//! 2. path-marker form — `/token/<tok>`;
//! 3. lenient heuristic — last path segment of 40+ chars is the token.
//!
//! A chain outside the allow-list, or any parse failure, leaves the original
//! URL untouched. Unknown chains deliberately pass through instead of being
//! dropped so alerts for newly listed chains keep their original link.

use crate::config::Config;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Substrings that mark a field value as carrying an analytics link.
pub const HOST_MARKER: &str = "app.nansen.ai";
pub const QUERY_MARKER: &str = "tokenAddress=";
pub const PATH_MARKER: &str = "/token/";

/// Token identifiers are truncated to this length in rewritten links.
const MAX_TOKEN_LEN: usize = 120;

/// Bounds for tokens extracted from the strict URL shapes.
const STRICT_TOKEN_MAX: usize = 128;
const PATH_TOKEN_MIN: usize = 8;

/// A path segment this long is assumed to be a token address.
const HEURISTIC_TOKEN_MIN: usize = 40;

/// Matches an analytics link embedded in free text, up to the first
/// character that cannot belong to a URL.
static ANALYTICS_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://app\.nansen\.ai/[^\s<>"')\]]+"#).expect("static regex is valid")
});

/// Rewrites analytics token links into manual-trading links.
///
/// Built once from [`Config`] at startup and shared across requests.
pub struct LinkRewriter {
    /// `<trading_base_url>/manual-trading/` — also the idempotence guard.
    canonical_prefix: String,
    allowed_chains: HashSet<String>,
    default_chain: String,
}

/// Token and optional chain pulled out of one URL shape.
struct Extracted {
    token: String,
    chain: Option<String>,
}

/// Extraction strategies in priority order; first match wins.
const STRATEGIES: &[fn(&str) -> Option<Extracted>] =
    &[from_query, from_path_marker, from_long_segment];

impl LinkRewriter {
    pub fn new(config: &Config) -> Self {
        Self {
            canonical_prefix: format!("{}/manual-trading/", config.trading_base_url),
            allowed_chains: config.allowed_chains.clone(),
            default_chain: config.default_chain.clone(),
        }
    }

    /// Rewrite a single URL, or return it unchanged when no strategy
    /// matches, the chain is not allow-listed, or the URL is already
    /// canonical.
    pub fn rewrite_url(&self, url: &str) -> String {
        if url.starts_with(&self.canonical_prefix) {
            return url.to_owned();
        }
        let Some(found) = STRATEGIES.iter().find_map(|extract| extract(url)) else {
            return url.to_owned();
        };

        let chain = found
            .chain
            .unwrap_or_else(|| self.default_chain.clone())
            .to_lowercase();
        if !self.allowed_chains.contains(&chain) {
            tracing::info!("chain not in allow-list, leaving link unchanged: {chain}");
            return url.to_owned();
        }

        let token: String = found.token.chars().take(MAX_TOKEN_LEN).collect();
        format!(
            "{}{}/{}",
            self.canonical_prefix,
            chain.to_uppercase(),
            token
        )
    }

    /// Replace every analytics link occurring inside free text.
    pub fn rewrite_links_in_text(&self, text: &str) -> String {
        if !text.contains(HOST_MARKER) {
            return text.to_owned();
        }
        ANALYTICS_LINK
            .replace_all(text, |caps: &regex::Captures| self.rewrite_url(&caps[0]))
            .into_owned()
    }
}

/// Whether a string value looks like it carries an analytics link.
pub fn has_link_marker(text: &str) -> bool {
    text.contains(HOST_MARKER) || text.contains(QUERY_MARKER) || text.contains(PATH_MARKER)
}

// ── Extraction strategies ─────────────────────────────────────────────────────

/// `?tokenAddress=<tok>&chain=<c>` — the current Nansen link shape.
fn from_query(url: &str) -> Option<Extracted> {
    let token = query_param(url, "tokenAddress")?;
    if token.is_empty() || token.len() > STRICT_TOKEN_MAX || !is_token_charset(token) {
        return None;
    }
    let chain = match query_param(url, "chain") {
        Some(c) if !c.is_empty() => {
            if !is_chain_charset(c) {
                return None;
            }
            Some(c.to_owned())
        }
        _ => None,
    };
    Some(Extracted {
        token: token.to_owned(),
        chain,
    })
}

/// `/token/<tok>` — older path-based link shape; chain was never encoded.
fn from_path_marker(url: &str) -> Option<Extracted> {
    let path = strip_query(url);
    let idx = path.find(PATH_MARKER)?;
    let rest = &path[idx + PATH_MARKER.len()..];
    let token = rest.split('/').next().unwrap_or(rest);
    if token.len() < PATH_TOKEN_MIN || token.len() > STRICT_TOKEN_MAX || !is_token_charset(token) {
        return None;
    }
    Some(Extracted {
        token: token.to_owned(),
        chain: None,
    })
}

/// Last-resort heuristic: scan path segments from the end and treat the
/// first sufficiently long one as the token address.
fn from_long_segment(url: &str) -> Option<Extracted> {
    let path = strip_query(url);
    let path = match path.find("://") {
        Some(scheme_end) => {
            let after_scheme = &path[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(host_end) => &after_scheme[host_end..],
                None => return None,
            }
        }
        None => path,
    };
    let token = path
        .rsplit('/')
        .find(|segment| segment.chars().count() >= HEURISTIC_TOKEN_MIN)?;
    Some(Extracted {
        token: token.to_owned(),
        chain: None,
    })
}

// ── Parsing helpers ───────────────────────────────────────────────────────────

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn is_token_charset(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_chain_charset(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
