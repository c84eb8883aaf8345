// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scan target normalization.
//!
//! Turns whatever the user typed into an absolute `http`/`https` address with
//! exactly one scheme prefix. Reachability is not checked here.

use crate::error::{Result, ScanError};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

/// Leading run of one or more `http://` / `https://` tokens.
fn scheme_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:https?://)+").expect("scheme regex is valid"))
}

/// Any other `<scheme>:` left at the front after collapsing, with or
/// without `//`. A `host:port` prefix is not a scheme.
fn foreign_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:(?:[^0-9]|$)").expect("foreign scheme regex is valid")
    })
}

/// The two schemes a scan target may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }

    /// The other scheme.
    pub fn alternate(self) -> Self {
        match self {
            Scheme::Https => Scheme::Http,
            Scheme::Http => Scheme::Https,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An absolute address with a single `http://` or `https://` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    raw: String,
    scheme: Scheme,
    url: Url,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Parsed form, for engines that need host/path access.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Everything after `<scheme>://`.
    pub fn remainder(&self) -> &str {
        &self.raw[self.scheme.as_str().len() + 3..]
    }

    /// The same address under `scheme`.
    pub fn with_scheme(&self, scheme: Scheme) -> Self {
        if scheme == self.scheme {
            return self.clone();
        }
        let raw = format!("{scheme}://{}", self.remainder());
        // Re-parse so an explicit default port (":443") stays attached to the new scheme.
        let url = Url::parse(&raw).unwrap_or_else(|_| {
            let mut url = self.url.clone();
            let _ = url.set_scheme(scheme.as_str());
            url
        });
        Self { raw, scheme, url }
    }

    /// The same address under the other scheme.
    pub fn alternate(&self) -> Self {
        self.with_scheme(self.scheme.alternate())
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for NormalizedUrl {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Canonicalize a user-supplied address.
///
/// Surrounding whitespace is trimmed and a leading run of scheme tokens is
/// collapsed to one. A single token keeps its scheme; a repeated run becomes
/// `https://` when any token in it is `https`, else `http://`. Input without
/// a scheme gets `https://`.
pub fn normalize(input: &str) -> Result<NormalizedUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidInput("empty scan target".to_string()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ScanError::InvalidInput(format!(
            "scan target contains whitespace: {trimmed:?}"
        )));
    }

    let (scheme, rest) = match scheme_run().find(trimmed) {
        Some(run) => {
            let tokens = run.as_str().to_ascii_lowercase();
            let count = tokens.matches("://").count();
            let scheme = if count == 1 {
                if tokens.starts_with("https") {
                    Scheme::Https
                } else {
                    Scheme::Http
                }
            } else if tokens.contains("https://") {
                Scheme::Https
            } else {
                Scheme::Http
            };
            (scheme, &trimmed[run.end()..])
        }
        None => (Scheme::Https, trimmed),
    };

    if rest.is_empty() {
        return Err(ScanError::InvalidInput(format!(
            "scan target has no host: {trimmed:?}"
        )));
    }
    if foreign_scheme().is_match(rest) {
        return Err(ScanError::InvalidInput(format!(
            "unsupported scheme in scan target: {trimmed:?}"
        )));
    }

    let raw = format!("{scheme}://{rest}");
    let url = Url::parse(&raw)
        .map_err(|e| ScanError::InvalidInput(format!("{raw}: {e}")))?;
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("http") || host.eq_ignore_ascii_case("https") => {
            return Err(ScanError::InvalidInput(format!(
                "malformed scheme in scan target: {trimmed:?}"
            )))
        }
        Some(host) if !host.is_empty() => {}
        _ => {
            return Err(ScanError::InvalidInput(format!(
                "scan target has no host: {raw}"
            )))
        }
    }

    Ok(NormalizedUrl { raw, scheme, url })
}
