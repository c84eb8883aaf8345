// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inline colour contrast (1.4.3 at AA, 1.4.6 at AAA).
//!
//! Only colours declared in `style` attributes are considered: the text
//! colour must be set on the element itself and the background on the
//! element or one of its ancestors. No stylesheet cascade is computed, so
//! a pair is only judged when both ends are known.

use super::{issue_at, issue_code, selector, PageDocument, Runner};
use crate::options::{EngineId, Standard, WcagLevel};
use crate::report::{Issue, IssueType};
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

type Rgb = (u8, u8, u8);

/// Large-text size thresholds in px (24px = 18pt, 18.66px = 14pt).
const LARGE_TEXT_PX: f64 = 24.0;
const LARGE_BOLD_TEXT_PX: f64 = 18.66;

fn rgb_function() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([\d.]+%?)\s*)?\)$")
            .expect("rgb regex is valid")
    })
}

/// Runner for inline colour contrast.
pub struct ContrastRunner;

impl Runner for ContrastRunner {
    fn id(&self) -> EngineId {
        EngineId::Contrast
    }

    fn check(&self, page: &PageDocument<'_>, standard: Standard) -> Vec<Issue> {
        if !standard.includes(WcagLevel::AA) {
            return Vec::new();
        }

        let mut issues = Vec::new();
        for el in page.html.select(&selector("[style]")) {
            if !has_direct_text(el) {
                continue;
            }
            let Some(fg) = style_value(el, "color").and_then(parse_color) else {
                continue;
            };
            let Some(bg) = background_of(el) else {
                continue;
            };

            let ratio = contrast_ratio(fg, bg);
            let large = is_large_text(el);
            let (required, technique) = required_ratio(standard, large);
            if ratio < required {
                let message = format!(
                    "This element has insufficient contrast at this conformance level. \
                     Expected a contrast ratio of at least {}:1, but text in this element \
                     has a contrast ratio of {}:1.",
                    round2(required),
                    round2(ratio)
                );
                issues.push(issue_at(
                    Issue::new(
                        EngineId::Contrast,
                        issue_code(standard, technique),
                        IssueType::Error,
                        message,
                    ),
                    el,
                ));
            }
        }
        issues
    }
}

/// Minimum ratio and technique code for the profile and text size.
fn required_ratio(standard: Standard, large: bool) -> (f64, &'static str) {
    match (standard.includes(WcagLevel::AAA), large) {
        (true, false) => (7.0, "Principle1.Guideline1_4.1_4_6.G17.Fail"),
        (true, true) => (4.5, "Principle1.Guideline1_4.1_4_6.G18.Fail"),
        (false, false) => (4.5, "Principle1.Guideline1_4.1_4_3.G18.Fail"),
        (false, true) => (3.0, "Principle1.Guideline1_4.1_4_3.G145.Fail"),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn has_direct_text(el: ElementRef<'_>) -> bool {
    el.children()
        .filter_map(|n| n.value().as_text())
        .any(|t| !t.trim().is_empty())
}

/// Value of `property` in the element's own inline style.
fn style_value<'a>(el: ElementRef<'a>, property: &str) -> Option<&'a str> {
    let style = el.value().attr("style")?;
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().trim_end_matches("!important").trim())
        .last()
}

/// Background colour from the nearest ancestor-or-self that declares one.
fn background_of(el: ElementRef<'_>) -> Option<Rgb> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find_map(|node| {
            style_value(node, "background-color")
                .and_then(parse_color)
                .or_else(|| {
                    style_value(node, "background")
                        .and_then(|v| v.split_whitespace().find_map(parse_color))
                })
        })
}

/// Inherited value of `property` from the nearest ancestor-or-self.
fn inherited<'a>(el: ElementRef<'a>, property: &str) -> Option<&'a str> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find_map(|node| style_value(node, property))
}

fn is_large_text(el: ElementRef<'_>) -> bool {
    let Some(px) = inherited(el, "font-size").and_then(font_size_px) else {
        return false;
    };
    let bold = inherited(el, "font-weight").is_some_and(|w| {
        w.eq_ignore_ascii_case("bold")
            || w.eq_ignore_ascii_case("bolder")
            || w.parse::<u16>().is_ok_and(|n| n >= 700)
    }) || matches!(el.value().name(), "b" | "strong" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6");

    px >= LARGE_TEXT_PX || (bold && px >= LARGE_BOLD_TEXT_PX)
}

fn font_size_px(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse().ok();
    }
    if let Some(pt) = value.strip_suffix("pt") {
        return pt.trim().parse::<f64>().ok().map(|pt| pt * 4.0 / 3.0);
    }
    None
}

/// Parse a CSS colour. Translucent colours yield `None` since the
/// composited result is unknown.
pub(crate) fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if value.starts_with("rgb") {
        let caps = rgb_function().captures(&value)?;
        if let Some(alpha) = caps.get(4) {
            let alpha = alpha.as_str();
            let opaque = match alpha.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? >= 100.0,
                None => alpha.parse::<f64>().ok()? >= 1.0,
            };
            if !opaque {
                return None;
            }
        }
        return Some((
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ));
    }
    named_color(&value)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some((
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
        )),
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(rgb)
}

/// Relative luminance as defined by WCAG 2.x.
fn relative_luminance((r, g, b): Rgb) -> f64 {
    let [r, g, b] = [r, g, b].map(|c| {
        let v = f64::from(c) / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Contrast ratio between two colours, from 1.0 to 21.0.
pub(crate) fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use url::Url;

    fn run(body: &str, standard: Standard) -> Vec<Issue> {
        let doc = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        let base = Url::parse("https://example.com/").unwrap();
        let page = PageDocument {
            html: &doc,
            base: &base,
            broken_links: &[],
        };
        ContrastRunner.check(&page, standard)
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#FFF"), Some((255, 255, 255)));
        assert_eq!(parse_color("#1a2b3c"), Some((0x1a, 0x2b, 0x3c)));
        assert_eq!(parse_color("rgb(10, 20, 30)"), Some((10, 20, 30)));
        assert_eq!(parse_color("rgba(10,20,30,1)"), Some((10, 20, 30)));
        assert_eq!(parse_color("rgba(10,20,30,0.5)"), None);
        assert_eq!(parse_color("Navy"), Some((0, 0, 128)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("currentColor"), None);
    }

    #[test]
    fn test_contrast_ratio_extremes() {
        assert!((contrast_ratio((0, 0, 0), (255, 255, 255)) - 21.0).abs() < 0.01);
        assert!((contrast_ratio((10, 10, 10), (10, 10, 10)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_contrast_fails_aa() {
        let issues = run(
            r#"<p style="color:#777777;background-color:#ffffff">Grey on white</p>"#,
            Standard::Wcag2AA,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "WCAG2AA.Principle1.Guideline1_4.1_4_3.G18.Fail");
        assert!(issues[0].message.contains("at least 4.5:1"));
        assert_eq!(issues[0].runner, EngineId::Contrast);
    }

    #[test]
    fn test_large_text_uses_lower_threshold() {
        let html = r#"<p style="color:#777;background:#fff;font-size:32px">Big grey</p>"#;
        assert!(run(html, Standard::Wcag2AA).is_empty());
        let aaa = run(html, Standard::Wcag2AAA);
        assert_eq!(aaa.len(), 1);
        assert_eq!(aaa[0].code, "WCAG2AAA.Principle1.Guideline1_4.1_4_6.G18.Fail");
    }

    #[test]
    fn test_background_inherited_from_ancestor() {
        let issues = run(
            r#"<div style="background: #000 url(bg.png) no-repeat"><span style="color:#222">dark</span></div>"#,
            Standard::Wcag2AA,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].selector.as_deref().unwrap().ends_with("span"));
    }

    #[test]
    fn test_unknown_pairs_and_level_a_are_skipped() {
        assert!(run(r#"<p style="color:#777">no background</p>"#, Standard::Wcag2AA).is_empty());
        assert!(run(
            r#"<p style="color:#000;background:#fff">fine</p>"#,
            Standard::Wcag2AAA
        )
        .is_empty());
        assert!(run(
            r#"<p style="color:#777;background:#fff">grey</p>"#,
            Standard::Wcag2A
        )
        .is_empty());
    }
}
