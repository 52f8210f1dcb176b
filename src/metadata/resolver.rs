//! Content locator resolution
//!
//! Turns a content locator (`ipfs://...`, a bare CID, or a plain web URL)
//! into the ordered list of URLs the fetcher should try. Content-addressed
//! locators are rewritten against every configured gateway, private gateway
//! first. Anything that cannot be resolved yields an empty list, which
//! callers treat as "no metadata".

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::config::GatewayConfig;
use crate::utils::trim_base_url;

/// A gateway serving content-addressed data over HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    /// Name used in logs and metrics
    pub name: String,

    /// Base URL; content is served under `<base_url>/ipfs/<path>`
    pub base_url: String,

    /// Bearer token for private gateways
    pub token: Option<String>,
}

impl Gateway {
    pub fn public(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            name: gateway_name(&base_url),
            base_url,
            token: None,
        }
    }

    pub fn private(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            name: gateway_name(&base_url),
            base_url,
            token: Some(token.into()),
        }
    }
}

fn gateway_name(base_url: &str) -> String {
    crate::utils::extract_host(base_url).unwrap_or_else(|_| base_url.to_string())
}

/// One URL to try, with the credentials it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,

    /// Gateway name, `None` for direct web locators
    pub gateway: Option<String>,

    pub bearer: Option<String>,
}

impl Candidate {
    /// Label for logs and metrics
    pub fn source(&self) -> &str {
        self.gateway.as_deref().unwrap_or("direct")
    }
}

/// How a locator is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Already fetchable over HTTP(S)
    Direct(Url),

    /// Content path under `/ipfs/`, e.g. `Qm.../metadata.json`
    ContentAddressed(String),
}

impl Locator {
    /// Classify a raw locator. `None` means empty or malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(rest) = strip_prefix_ignore_case(raw, "ipfs://") {
            let rest = rest.trim_start_matches('/');
            let rest = strip_prefix_ignore_case(rest, "ipfs/").unwrap_or(rest);
            return content_path(rest);
        }

        if let Some(rest) = raw.strip_prefix("/ipfs/") {
            return content_path(rest);
        }

        if starts_with_ignore_case(raw, "https://") || starts_with_ignore_case(raw, "http://") {
            return Url::parse(raw)
                .ok()
                .filter(|url| url.host_str().is_some())
                .map(Self::Direct);
        }

        if bare_cid_regex().is_match(raw) {
            return content_path(raw);
        }

        None
    }
}

fn content_path(path: &str) -> Option<Locator> {
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    Some(Locator::ContentAddressed(path.to_string()))
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    starts_with_ignore_case(s, prefix).then(|| &s[prefix.len()..])
}

/// CIDv0 (`Qm` + 44 base58 chars) or CIDv1 base32 (`b` + lowercase base32),
/// optionally followed by a path
fn bare_cid_regex() -> &'static Regex {
    static CID_RE: OnceLock<Regex> = OnceLock::new();
    CID_RE.get_or_init(|| {
        Regex::new(r"^(Qm[1-9A-HJ-NP-Za-km-z]{44}|b[a-z2-7]{58,})(/\S*)?$")
            .expect("Invalid regex pattern")
    })
}

/// Resolves locators against an ordered gateway list
#[derive(Debug, Clone)]
pub struct ContentResolver {
    gateways: Vec<Gateway>,
}

impl ContentResolver {
    /// Create a resolver; gateways are tried in the given order
    pub fn new(gateways: Vec<Gateway>) -> Self {
        Self { gateways }
    }

    /// Private gateway first, then the public ones in configured order
    pub fn from_config(config: &GatewayConfig) -> Self {
        let private = config
            .private
            .iter()
            .map(|p| Gateway::private(p.base_url.clone(), p.token.clone()));
        let public = config.public.iter().map(|base| Gateway::public(base.clone()));

        Self::new(private.chain(public).collect())
    }

    pub fn gateways(&self) -> &[Gateway] {
        &self.gateways
    }

    /// Ordered candidate URLs for a locator, highest preference first
    pub fn resolve(&self, locator: &str) -> Vec<Candidate> {
        match Locator::parse(locator) {
            Some(Locator::Direct(url)) => vec![Candidate {
                url: url.to_string(),
                gateway: None,
                bearer: None,
            }],
            Some(Locator::ContentAddressed(path)) => self
                .gateways
                .iter()
                .map(|gateway| Candidate {
                    url: format!("{}/ipfs/{path}", trim_base_url(&gateway.base_url)),
                    gateway: Some(gateway.name.clone()),
                    bearer: gateway.token.clone(),
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// First candidate a browser can load without credentials
    pub fn display_url(&self, locator: &str) -> Option<String> {
        self.resolve(locator)
            .into_iter()
            .find(|c| c.bearer.is_none())
            .map(|c| c.url)
    }
}
