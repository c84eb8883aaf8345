// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural markup rules — the reference runner.
//!
//! Covers text alternatives (1.1.1), document language (3.1.1), page title
//! (2.4.2), form labels (1.3.1/4.1.2), link and button names (2.4.4/4.1.2),
//! frame titles (2.4.1), duplicate ids (4.1.1), heading structure (1.3.1),
//! autoplaying audio (1.4.2), zoom locking (1.4.4) and, at AAA, link purpose
//! from link text alone (2.4.9).

use super::{attr, issue_at, issue_code, selector, text_of, PageDocument, Runner};
use crate::options::{EngineId, Standard, WcagLevel};
use crate::report::{Issue, IssueType};
use scraper::ElementRef;
use std::collections::{HashMap, HashSet};

/// Alt values that describe nothing.
const GENERIC_ALT_VALUES: &[&str] = &[
    "image",
    "photo",
    "picture",
    "icon",
    "graphic",
    "img",
    "banner",
    "untitled",
    "screenshot",
    "thumbnail",
    "placeholder",
];

/// Link texts that say nothing about the destination.
const AMBIGUOUS_LINK_TEXT: &[&str] = &[
    "click here",
    "here",
    "read more",
    "more",
    "learn more",
    "link",
    "this link",
];

/// Input types that never need a label.
const UNLABELLED_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

type RuleFn = fn(&PageDocument<'_>, Standard, &mut Vec<Issue>);

struct Rule {
    level: WcagLevel,
    check: RuleFn,
}

const RULES: &[Rule] = &[
    Rule { level: WcagLevel::A, check: img_alt },
    Rule { level: WcagLevel::A, check: input_image_alt },
    Rule { level: WcagLevel::A, check: area_alt },
    Rule { level: WcagLevel::A, check: document_language },
    Rule { level: WcagLevel::A, check: document_title },
    Rule { level: WcagLevel::A, check: form_labels },
    Rule { level: WcagLevel::A, check: link_names },
    Rule { level: WcagLevel::A, check: button_names },
    Rule { level: WcagLevel::A, check: frame_titles },
    Rule { level: WcagLevel::A, check: duplicate_ids },
    Rule { level: WcagLevel::A, check: heading_order },
    Rule { level: WcagLevel::A, check: autoplay_media },
    Rule { level: WcagLevel::AA, check: viewport_zoom },
    Rule { level: WcagLevel::AAA, check: ambiguous_link_text },
];

/// Runner for structural markup rules.
pub struct MarkupRunner;

impl Runner for MarkupRunner {
    fn id(&self) -> EngineId {
        EngineId::Markup
    }

    fn check(&self, page: &PageDocument<'_>, standard: Standard) -> Vec<Issue> {
        let mut issues = Vec::new();
        for rule in RULES.iter().filter(|r| standard.includes(r.level)) {
            (rule.check)(page, standard, &mut issues);
        }
        issues
    }
}

fn issue(standard: Standard, technique: &str, kind: IssueType, message: &str) -> Issue {
    Issue::new(EngineId::Markup, issue_code(standard, technique), kind, message)
}

fn is_hidden(el: ElementRef<'_>) -> bool {
    el.value().attr("aria-hidden") == Some("true") || el.value().attr("hidden").is_some()
}

/// Name from aria-label, aria-labelledby or title.
fn has_aria_name(el: ElementRef<'_>) -> bool {
    attr(el, "aria-label").is_some()
        || attr(el, "aria-labelledby").is_some()
        || attr(el, "title").is_some()
}

/// Text content, or the alt text of images inside.
fn has_content_name(el: ElementRef<'_>) -> bool {
    !text_of(el).is_empty()
        || el
            .select(&selector("img[alt]"))
            .any(|img| attr(img, "alt").is_some())
}

fn img_alt(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for img in page.html.select(&selector("img")) {
        if is_hidden(img) {
            continue;
        }
        match img.value().attr("alt") {
            None => out.push(issue_at(
                issue(
                    standard,
                    "Principle1.Guideline1_1.1_1_1.H37",
                    IssueType::Error,
                    "Img element missing an alt attribute. Use the alt attribute to specify a short text alternative.",
                ),
                img,
            )),
            Some(alt) => {
                let alt = alt.trim().to_lowercase();
                if GENERIC_ALT_VALUES.contains(&alt.as_str()) {
                    out.push(issue_at(
                        issue(
                            standard,
                            "Principle1.Guideline1_1.1_1_1.G94.Image",
                            IssueType::Notice,
                            &format!(
                                "Img alt text \"{alt}\" is generic. Ensure the alt text describes the image content."
                            ),
                        ),
                        img,
                    ));
                }
            }
        }
    }
}

fn input_image_alt(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for input in page.html.select(&selector("input[type=\"image\"]")) {
        if attr(input, "alt").is_none() && !has_aria_name(input) {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle1.Guideline1_1.1_1_1.H36",
                    IssueType::Error,
                    "Image submit button missing an alt attribute. Specify a text alternative that describes the button's function.",
                ),
                input,
            ));
        }
    }
}

fn area_alt(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for area in page.html.select(&selector("area[href]")) {
        if attr(area, "alt").is_none() && !has_aria_name(area) {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle1.Guideline1_1.1_1_1.H24",
                    IssueType::Error,
                    "Area element in an image map missing an alt attribute. Each area element must have a text alternative that describes the function of the image map area.",
                ),
                area,
            ));
        }
    }
}

fn document_language(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    let Some(root) = page.html.select(&selector("html")).next() else {
        return;
    };
    if attr(root, "lang").is_none() && attr(root, "xml:lang").is_none() {
        out.push(
            issue(
                standard,
                "Principle3.Guideline3_1.3_1_1.H57.2",
                IssueType::Error,
                "The html element should have a lang or xml:lang attribute which describes the language of the document.",
            )
            .with_selector("html"),
        );
    }
}

fn document_title(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    match page.html.select(&selector("head title, title")).next() {
        None => out.push(
            issue(
                standard,
                "Principle2.Guideline2_4.2_4_2.H25.1.NoTitleEl",
                IssueType::Error,
                "A title should be provided for the document, using a non-empty title element in the head section.",
            )
            .with_selector("html > head"),
        ),
        Some(title) if text_of(title).is_empty() => out.push(issue_at(
            issue(
                standard,
                "Principle2.Guideline2_4.2_4_2.H25.1.EmptyTitle",
                IssueType::Error,
                "The title element in the head section should be non-empty.",
            ),
            title,
        )),
        Some(_) => {}
    }
}

fn form_labels(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    let label_targets: HashSet<&str> = page
        .html
        .select(&selector("label[for]"))
        .filter_map(|l| attr(l, "for"))
        .collect();

    for control in page.html.select(&selector("input, select, textarea")) {
        let el = control.value();
        if el.name() == "input" {
            let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            if UNLABELLED_INPUT_TYPES.contains(&kind.as_str()) {
                continue;
            }
        }
        if is_hidden(control) || has_aria_name(control) {
            continue;
        }
        if el.id().is_some_and(|id| label_targets.contains(id)) {
            continue;
        }
        let wrapped = control
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "label");
        if wrapped {
            continue;
        }
        out.push(issue_at(
            issue(
                standard,
                "Principle1.Guideline1_3.1_3_1.F68",
                IssueType::Error,
                "This form field should be labelled in some way. Use the label element (either with a \"for\" attribute or wrapped around the form field), or \"title\", \"aria-label\" or \"aria-labelledby\" attributes as appropriate.",
            ),
            control,
        ));
    }
}

fn link_names(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for link in page.html.select(&selector("a[href]")) {
        if is_hidden(link) || has_aria_name(link) || has_content_name(link) {
            continue;
        }
        out.push(issue_at(
            issue(
                standard,
                "Principle4.Guideline4_1.4_1_2.H91.A.NoContent",
                IssueType::Error,
                "Anchor element found with a valid href attribute, but no link content has been supplied.",
            ),
            link,
        ));
    }
}

fn button_names(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for button in page.html.select(&selector("button, input[type=\"button\"]")) {
        if is_hidden(button) || has_aria_name(button) {
            continue;
        }
        let named = if button.value().name() == "input" {
            attr(button, "value").is_some()
        } else {
            has_content_name(button)
        };
        if !named {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle4.Guideline4_1.4_1_2.H91.Button.Name",
                    IssueType::Error,
                    "This button element does not have a name available to an accessibility API. Valid names are: title attribute, element content, aria-label, aria-labelledby.",
                ),
                button,
            ));
        }
    }
}

fn frame_titles(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for frame in page.html.select(&selector("iframe, frame")) {
        if is_hidden(frame) || attr(frame, "title").is_some() || attr(frame, "aria-label").is_some() {
            continue;
        }
        out.push(issue_at(
            issue(
                standard,
                "Principle2.Guideline2_4.2_4_1.H64.1",
                IssueType::Error,
                "Iframe element requires a non-empty title attribute that identifies the frame.",
            ),
            frame,
        ));
    }
}

fn duplicate_ids(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for el in page.html.select(&selector("[id]")) {
        let Some(id) = attr(el, "id") else {
            continue;
        };
        let count = seen.entry(id).or_insert(0);
        *count += 1;
        if *count == 2 {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle4.Guideline4_1.4_1_1.F77",
                    IssueType::Error,
                    &format!("Duplicate id attribute value \"{id}\" found on the web page."),
                ),
                el,
            ));
        }
    }
}

fn heading_order(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    let mut previous: Option<u8> = None;
    for heading in page.html.select(&selector("h1, h2, h3, h4, h5, h6")) {
        let level = heading.value().name().as_bytes()[1] - b'0';
        if let Some(prev) = previous {
            if level > prev + 1 {
                out.push(issue_at(
                    issue(
                        standard,
                        "Principle1.Guideline1_3.1_3_1_A.G141",
                        IssueType::Warning,
                        &format!(
                            "The heading structure is not logically nested. This h{level} element follows an h{prev} element and should be an h{} or higher.",
                            prev + 1
                        ),
                    ),
                    heading,
                ));
            }
        }
        previous = Some(level);
    }
}

fn autoplay_media(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for media in page.html.select(&selector("video[autoplay], audio[autoplay]")) {
        if media.value().attr("muted").is_some() {
            continue;
        }
        out.push(issue_at(
            issue(
                standard,
                "Principle1.Guideline1_4.1_4_2.F23",
                IssueType::Warning,
                "Media starts playing automatically with sound. Audio that plays for more than 3 seconds needs a mechanism to pause it or control its volume.",
            ),
            media,
        ));
    }
}

/// Whether a viewport `content` value blocks pinch zoom.
fn blocks_zoom(content: &str) -> bool {
    content.split([',', ';']).any(|part| {
        let Some((key, value)) = part.split_once('=') else {
            return false;
        };
        let value = value.trim().to_ascii_lowercase();
        match key.trim().to_ascii_lowercase().as_str() {
            "user-scalable" => value == "no" || value == "0",
            "maximum-scale" => value.parse::<f32>().is_ok_and(|v| v < 2.0),
            _ => false,
        }
    })
}

fn viewport_zoom(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for meta in page.html.select(&selector("meta[name=\"viewport\"]")) {
        if attr(meta, "content").is_some_and(blocks_zoom) {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle1.Guideline1_4.1_4_4.MetaViewport",
                    IssueType::Error,
                    "The viewport meta tag prevents zooming. Remove user-scalable=no and keep maximum-scale at 2 or above so text can be resized to 200%.",
                ),
                meta,
            ));
        }
    }
}

fn ambiguous_link_text(page: &PageDocument<'_>, standard: Standard, out: &mut Vec<Issue>) {
    for link in page.html.select(&selector("a[href]")) {
        if attr(link, "aria-label").is_some() || attr(link, "aria-labelledby").is_some() {
            continue;
        }
        let text = text_of(link).to_lowercase();
        let text = text.trim_end_matches(['.', '!', '…']);
        if AMBIGUOUS_LINK_TEXT.contains(&text) {
            out.push(issue_at(
                issue(
                    standard,
                    "Principle2.Guideline2_4.2_4_9.H30",
                    IssueType::Warning,
                    &format!(
                        "Link text \"{text}\" does not describe the link's purpose on its own."
                    ),
                ),
                link,
            ));
        }
    }
}
