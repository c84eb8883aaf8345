// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Broken outgoing links.
//!
//! The link checks themselves happen before the runners start (they need the
//! network); this runner only turns their findings into issues anchored at
//! the first anchor pointing at each broken URL.

use super::{issue_at, issue_code, selector, PageDocument, Runner};
use crate::options::{EngineId, Standard};
use crate::report::{Issue, IssueType};
use url::Url;

const TECHNIQUE: &str = "Principle2.Guideline2_4.2_4_4.BrokenLink";

/// Runner for broken links.
pub struct LinksRunner;

impl Runner for LinksRunner {
    fn id(&self) -> EngineId {
        EngineId::Links
    }

    fn check(&self, page: &PageDocument<'_>, standard: Standard) -> Vec<Issue> {
        if page.broken_links.is_empty() {
            return Vec::new();
        }

        let anchors = selector("a[href]");
        page.broken_links
            .iter()
            .map(|link| {
                let reason = match link.status {
                    Some(status) => format!("HTTP {status}"),
                    None => "no response".to_string(),
                };
                let issue = Issue::new(
                    EngineId::Links,
                    issue_code(standard, TECHNIQUE),
                    IssueType::Error,
                    format!("Link target {} is broken ({reason}).", link.href),
                );
                let anchor = page.html.select(&anchors).find(|a| {
                    a.value()
                        .attr("href")
                        .and_then(|href| resolve_link(page.base, href))
                        .is_some_and(|resolved| resolved == link.href)
                });
                match anchor {
                    Some(a) => issue_at(issue, a),
                    None => issue,
                }
            })
            .collect()
    }
}

/// Resolve an anchor `href` to the absolute form used for link checks:
/// http(s) only, fragment removed.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BrokenLink;
    use scraper::Html;

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://example.com/docs/index.html").unwrap();
        assert_eq!(
            resolve_link(&base, "guide.html#top").as_deref(),
            Some("https://example.com/docs/guide.html")
        );
        assert_eq!(resolve_link(&base, "mailto:a@b.c"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
    }

    #[test]
    fn test_broken_links_become_anchored_errors() {
        let doc = Html::parse_document(
            r#"<html><body><nav><a href="/ok">ok</a><a href="/gone#x">gone</a></nav></body></html>"#,
        );
        let base = Url::parse("https://example.com/").unwrap();
        let broken = vec![
            BrokenLink {
                href: "https://example.com/gone".to_string(),
                status: Some(404),
            },
            BrokenLink {
                href: "https://down.example.com/".to_string(),
                status: None,
            },
        ];
        let page = PageDocument {
            html: &doc,
            base: &base,
            broken_links: &broken,
        };

        let issues = LinksRunner.check(&page, Standard::Wcag2AA);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueType::Error));
        assert_eq!(
            issues[0].code,
            "WCAG2AA.Principle2.Guideline2_4.2_4_4.BrokenLink"
        );
        assert!(issues[0].message.contains("HTTP 404"));
        assert_eq!(
            issues[0].selector.as_deref(),
            Some("html > body > nav > a:nth-child(2)")
        );
        assert!(issues[1].message.contains("no response"));
        assert!(issues[1].selector.is_none());
    }
}
