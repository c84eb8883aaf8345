// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rule runners applied to a parsed page.
//!
//! Each runner focuses on one family of WCAG checks and reports issues in
//! the HTML_CodeSniffer code shape
//! (`WCAG2AA.Principle1.Guideline1_1.1_1_1.H37`).

pub mod contrast;
pub mod links;
pub mod markup;

use crate::options::{EngineId, Standard};
use crate::report::{BrokenLink, Issue};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Longest element snippet kept as issue context.
const CONTEXT_MAX_CHARS: usize = 300;

/// A parsed page plus what was learned about it before the runners start.
pub struct PageDocument<'a> {
    pub html: &'a Html,
    /// Final URL after redirects; base for relative references.
    pub base: &'a Url,
    /// Links that failed their check (empty unless the `links` runner is on).
    pub broken_links: &'a [BrokenLink],
}

/// Trait implemented by all runners.
pub trait Runner: Send + Sync {
    fn id(&self) -> EngineId;

    /// Check the page and return the issues enforced under `standard`.
    fn check(&self, page: &PageDocument<'_>, standard: Standard) -> Vec<Issue>;
}

/// The runner registered for `id`.
pub fn runner_for(id: EngineId) -> Box<dyn Runner> {
    match id {
        EngineId::Markup => Box::new(markup::MarkupRunner),
        EngineId::Contrast => Box::new(contrast::ContrastRunner),
        EngineId::Links => Box::new(links::LinksRunner),
    }
}

/// Parse a selector known at compile time.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("static selector {css:?} is invalid: {e:?}"))
}

/// Full issue code for `technique` under `standard`.
pub(crate) fn issue_code(standard: Standard, technique: &str) -> String {
    format!("{standard}.{technique}")
}

/// Outer HTML of `element`, cut to a readable length.
pub(crate) fn context(element: ElementRef<'_>) -> String {
    let html = element.html();
    if html.chars().count() <= CONTEXT_MAX_CHARS {
        return html;
    }
    let mut cut: String = html.chars().take(CONTEXT_MAX_CHARS).collect();
    cut.push_str("...");
    cut
}

/// A CSS path that identifies `element`, e.g. `html > body > ul > li:nth-child(2) > a`.
///
/// Stops early at the nearest ancestor with an `id`.
pub(crate) fn css_path(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let name = el.value().name();
        if let Some(id) = el.value().id().filter(|id| is_simple_ident(id)) {
            parts.push(format!("#{id}"));
            break;
        }

        let parent = el.parent().and_then(ElementRef::wrap);
        let part = if parent.is_some() {
            let mut index = 1;
            let mut repeated = false;
            for sibling in el.prev_siblings().filter_map(ElementRef::wrap) {
                index += 1;
                repeated |= sibling.value().name() == name;
            }
            if !repeated {
                repeated = el
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .any(|s| s.value().name() == name);
            }
            if repeated {
                format!("{name}:nth-child({index})")
            } else {
                name.to_string()
            }
        } else {
            name.to_string()
        };
        parts.push(part);
        current = parent;
    }

    parts.reverse();
    parts.join(" > ")
}

fn is_simple_ident(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with(|c: char| c.is_ascii_digit())
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Visible text of an element, whitespace-collapsed.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty, trimmed attribute value.
pub(crate) fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build an issue anchored at `element`.
pub(crate) fn issue_at(issue: Issue, element: ElementRef<'_>) -> Issue {
    issue
        .with_selector(css_path(element))
        .with_context(context(element))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_path_uses_nth_child_for_repeated_tags() {
        let html = Html::parse_document(
            "<html><body><ul><li>a</li><li><a href='/x'>x</a></li></ul></body></html>",
        );
        let link = html.select(&selector("a")).next().unwrap();
        assert_eq!(css_path(link), "html > body > ul > li:nth-child(2) > a");
    }

    #[test]
    fn test_css_path_counts_every_element_sibling() {
        let html = Html::parse_document(
            "<html><body><p>a</p><span>b</span><p><b>c</b></p><div>d</div></body></html>",
        );
        let b = html.select(&selector("b")).next().unwrap();
        assert_eq!(css_path(b), "html > body > p:nth-child(3) > b");
        let first = html.select(&selector("p")).next().unwrap();
        assert_eq!(css_path(first), "html > body > p:nth-child(1)");
        let span = html.select(&selector("span")).next().unwrap();
        assert_eq!(css_path(span), "html > body > span");
    }

    #[test]
    fn test_css_path_stops_at_id() {
        let html = Html::parse_document(
            "<html><body><main id='content'><p><img src='a.png'></p></main></body></html>",
        );
        let img = html.select(&selector("img")).next().unwrap();
        assert_eq!(css_path(img), "#content > p > img");
    }

    #[test]
    fn test_context_is_truncated() {
        let long = "x".repeat(500);
        let html = Html::parse_document(&format!("<p>{long}</p>"));
        let p = html.select(&selector("p")).next().unwrap();
        let ctx = context(p);
        assert!(ctx.ends_with("..."));
        assert_eq!(ctx.chars().count(), CONTEXT_MAX_CHARS + 3);
    }

    #[test]
    fn test_text_of_collapses_whitespace() {
        let html = Html::parse_fragment("<a>  Read \n <b>more</b>  </a>");
        let a = html.select(&selector("a")).next().unwrap();
        assert_eq!(text_of(a), "Read more");
    }

    #[test]
    fn test_runner_registry() {
        for id in EngineId::ALL {
            assert_eq!(runner_for(id).id(), id);
        }
    }
}
