// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured scan report.
//!
//! The JSON shape serves two consumers: the flat top-level `issues` array
//! mirrors pa11y's output (read by the backend), while `summary` and `pages`
//! follow the shape the results UI renders.

use crate::options::{EngineId, Standard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Error,
    Warning,
    Notice,
}

impl IssueType {
    /// pa11y's numeric type code.
    pub fn code(self) -> u8 {
        match self {
            IssueType::Error => 1,
            IssueType::Warning => 2,
            IssueType::Notice => 3,
        }
    }
}

/// A single accessibility finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub type_code: u8,
    pub message: String,
    /// Truncated outer HTML of the offending element.
    pub context: Option<String>,
    pub selector: Option<String>,
    pub runner: EngineId,
}

impl Issue {
    pub fn new(runner: EngineId, code: impl Into<String>, kind: IssueType, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind,
            type_code: kind.code(),
            message: message.into(),
            context: None,
            selector: None,
            runner,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// An image found on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    /// `None` when the attribute is missing, `Some("")` when decorative.
    pub alt: Option<String>,
}

/// A link that failed its HEAD check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub href: String,
    /// HTTP status, or `None` when the request itself failed.
    pub status: Option<u16>,
}

/// Auxiliary per-page findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub images: Vec<ImageInfo>,
    pub broken_links: Vec<BrokenLink>,
}

/// Findings for one scanned page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub title: Option<String>,
    pub issues: Vec<Issue>,
    pub data: PageData,
}

/// Counts over every page of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub issues: usize,
    pub total_pages: usize,
    pub errors: usize,
    pub warnings: usize,
    pub notices: usize,
}

impl Summary {
    pub fn of(pages: &[PageReport]) -> Self {
        let mut summary = Summary {
            total_pages: pages.len(),
            ..Summary::default()
        };
        for issue in pages.iter().flat_map(|p| &p.issues) {
            summary.issues += 1;
            match issue.kind {
                IssueType::Error => summary.errors += 1,
                IssueType::Warning => summary.warnings += 1,
                IssueType::Notice => summary.notices += 1,
            }
        }
        summary
    }
}

/// The structured result of a successful scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub document_title: Option<String>,
    pub page_url: String,
    pub standard: Standard,
    pub engines: Vec<EngineId>,
    pub scanned_at: DateTime<Utc>,
    pub summary: Summary,
    /// Every issue of every page, in page order.
    pub issues: Vec<Issue>,
    pub pages: Vec<PageReport>,
}

impl ScanReport {
    /// Build a report whose summary and flat issue list agree with `pages`.
    pub fn from_pages(standard: Standard, engines: Vec<EngineId>, pages: Vec<PageReport>) -> Self {
        let summary = Summary::of(&pages);
        let issues = pages.iter().flat_map(|p| p.issues.iter().cloned()).collect();
        let (document_title, page_url) = pages
            .first()
            .map(|p| (p.title.clone(), p.url.clone()))
            .unwrap_or_default();
        Self {
            document_title,
            page_url,
            standard,
            engines,
            scanned_at: Utc::now(),
            summary,
            issues,
            pages,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.summary.issues == 0
    }
}
