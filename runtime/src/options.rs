// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scan configuration passed explicitly into the probe and engines.

use crate::error::{Result, ScanError};
use crate::report::IssueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default cap on links HEAD-checked by the `links` runner.
pub const DEFAULT_MAX_LINK_CHECKS: usize = 25;

/// Desktop Chrome user-agent sent with page and link requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// WCAG conformance level of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// Accessibility conformance profile a scan enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Standard {
    #[serde(rename = "WCAG2A")]
    Wcag2A,
    #[default]
    #[serde(rename = "WCAG2AA")]
    Wcag2AA,
    #[serde(rename = "WCAG2AAA")]
    Wcag2AAA,
}

impl Standard {
    pub fn level(self) -> WcagLevel {
        match self {
            Standard::Wcag2A => WcagLevel::A,
            Standard::Wcag2AA => WcagLevel::AA,
            Standard::Wcag2AAA => WcagLevel::AAA,
        }
    }

    /// Whether rules of `level` are enforced under this profile.
    pub fn includes(self, level: WcagLevel) -> bool {
        level <= self.level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Standard::Wcag2A => "WCAG2A",
            Standard::Wcag2AA => "WCAG2AA",
            Standard::Wcag2AAA => "WCAG2AAA",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Standard {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace(['.', ' ', '-'], "").as_str() {
            "WCAG2A" | "WCAG21A" => Ok(Standard::Wcag2A),
            "WCAG2AA" | "WCAG21AA" => Ok(Standard::Wcag2AA),
            "WCAG2AAA" | "WCAG21AAA" => Ok(Standard::Wcag2AAA),
            _ => Err(ScanError::InvalidInput(format!("unknown standard: {s}"))),
        }
    }
}

/// Identifier of a rule runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    /// Structural markup rules; the reference runner.
    Markup,
    /// Inline colour contrast.
    Contrast,
    /// Broken outgoing links.
    Links,
}

impl EngineId {
    pub const ALL: [EngineId; 3] = [EngineId::Markup, EngineId::Contrast, EngineId::Links];

    pub fn as_str(self) -> &'static str {
        match self {
            EngineId::Markup => "markup",
            EngineId::Contrast => "contrast",
            EngineId::Links => "links",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        EngineId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ScanError::InvalidInput(format!(
                    "unknown engine: {s} (expected one of markup, contrast, links)"
                ))
            })
    }
}

/// Options for one probe invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub standard: Standard,
    /// Ordered runner list.
    pub engines: Vec<EngineId>,
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Fetch through headless Chromium instead of plain HTTP.
    pub render: bool,
    /// Warnings and notices are dropped unless asked for, as pa11y does.
    pub include_warnings: bool,
    pub include_notices: bool,
    pub max_link_checks: usize,
    pub user_agent: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            standard: Standard::default(),
            engines: vec![EngineId::Markup],
            timeout_ms: DEFAULT_TIMEOUT_MS,
            render: false,
            include_warnings: false,
            include_notices: false,
            max_link_checks: DEFAULT_MAX_LINK_CHECKS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScanOptions {
    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    /// Replace the runner list, dropping repeats but keeping first-seen order.
    pub fn with_engines(mut self, engines: impl IntoIterator<Item = EngineId>) -> Self {
        let mut ordered = Vec::new();
        for id in engines {
            if !ordered.contains(&id) {
                ordered.push(id);
            }
        }
        self.engines = ordered;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Whether an issue of `kind` survives the warning/notice filters.
    pub fn keeps(&self, kind: IssueType) -> bool {
        match kind {
            IssueType::Error => true,
            IssueType::Warning => self.include_warnings,
            IssueType::Notice => self.include_notices,
        }
    }

    pub fn runs(&self, id: EngineId) -> bool {
        self.engines.contains(&id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engines.is_empty() {
            return Err(ScanError::InvalidInput(
                "at least one engine must be selected".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ScanError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
