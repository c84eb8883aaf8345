// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scan engines.
//!
//! The probe only sees the [`Engine`] trait. [`PageEngine`] is the built-in
//! implementation: it acquires one page (plain HTTP, or a Chromium tab when
//! rendering is asked for), runs the selected [`runners`] over the parsed
//! document and assembles a one-page [`ScanReport`].

pub mod runners;

use crate::acquisition::http_client::{HttpClient, LinkStatus};
use crate::error::{Result, ScanError};
use crate::options::{EngineId, ScanOptions};
use crate::renderer::Renderer;
use crate::report::{BrokenLink, ImageInfo, PageData, PageReport, ScanReport};
use async_trait::async_trait;
use runners::links::resolve_link;
use runners::{runner_for, selector, text_of, PageDocument};
use scraper::Html;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

/// Parallel link checks per page.
const LINK_CHECK_CONCURRENCY: usize = 8;

/// Ceiling for a single link check, independent of the page deadline.
const LINK_CHECK_TIMEOUT_MS: u64 = 10_000;

/// Chromium net error markers that mean the host could not be reached.
const UNREACHABLE_MARKERS: &[&str] = &[
    "ERR_NAME_NOT_RESOLVED",
    "ERR_CONNECTION",
    "ERR_ADDRESS_UNREACHABLE",
    "ERR_INTERNET_DISCONNECTED",
    "ERR_SSL",
    "ERR_CERT",
];

/// An accessibility engine invoked once per probe attempt.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Scan the page at `url`.
    async fn run(&self, url: &Url, options: &ScanOptions) -> Result<ScanReport>;
}

/// Raw page source plus the URL it was finally served from.
struct Acquired {
    final_url: Url,
    html: String,
}

/// Built-in engine: fetch, parse, run rules.
pub struct PageEngine {
    http: HttpClient,
    renderer: Option<Arc<dyn Renderer>>,
}

impl PageEngine {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            http: HttpClient::new(&options.user_agent, options.timeout_ms),
            renderer: None,
        }
    }

    /// Attach a browser used when `ScanOptions::render` is set.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    async fn acquire(&self, url: &Url, options: &ScanOptions) -> Result<Acquired> {
        match (&self.renderer, options.render) {
            (Some(renderer), true) => render(renderer.as_ref(), url, options.timeout_ms).await,
            (None, true) => {
                warn!("rendering requested but no browser is attached, fetching over HTTP");
                self.fetch(url, options).await
            }
            _ => self.fetch(url, options).await,
        }
    }

    async fn fetch(&self, url: &Url, options: &ScanOptions) -> Result<Acquired> {
        let resp = self.http.get(url, options.timeout_ms).await?;
        if !resp.is_success() {
            return Err(ScanError::EngineFailure(format!(
                "target responded with HTTP {} ({})",
                resp.status, resp.final_url
            )));
        }
        if !resp.is_html() {
            return Err(ScanError::EngineFailure(format!(
                "target is not an HTML page (content-type {})",
                resp.content_type.as_deref().unwrap_or("unknown")
            )));
        }
        let final_url = Url::parse(&resp.final_url).unwrap_or_else(|_| url.clone());
        Ok(Acquired {
            final_url,
            html: resp.body,
        })
    }

    async fn broken_links(&self, hrefs: &[String], options: &ScanOptions) -> Vec<BrokenLink> {
        debug!("checking {} links", hrefs.len());
        let timeout_ms = options.timeout_ms.min(LINK_CHECK_TIMEOUT_MS);
        self.http
            .check_links(hrefs, LINK_CHECK_CONCURRENCY, timeout_ms)
            .await
            .into_iter()
            .filter(LinkStatus::is_broken)
            .map(|l| BrokenLink {
                href: l.href,
                status: l.status,
            })
            .collect()
    }
}

#[async_trait]
impl Engine for PageEngine {
    async fn run(&self, url: &Url, options: &ScanOptions) -> Result<ScanReport> {
        let page = self.acquire(url, options).await?;
        let check_links = options.runs(EngineId::Links) && options.max_link_checks > 0;
        let (links_tx, links_rx) = oneshot::channel::<Vec<String>>();
        let (broken_tx, broken_rx) = oneshot::channel::<Vec<BrokenLink>>();
        let abandoned = Abandon::default();

        // Parsing and the runners block; they run off the async workers so the
        // attempt deadline can still fire while they are busy.
        let analysis = {
            let options = options.clone();
            let abandoned = Arc::clone(&abandoned.0);
            tokio::task::spawn_blocking(move || {
                let doc = Html::parse_document(&page.html);
                let broken = if check_links {
                    let hrefs = collect_links(&doc, &page.final_url, options.max_link_checks);
                    links_tx.send(hrefs).ok()?;
                    broken_rx.blocking_recv().ok()?
                } else {
                    drop(links_tx);
                    Vec::new()
                };
                analyze(&doc, &page.final_url, broken, &options, &abandoned)
            })
        };

        if let Ok(hrefs) = links_rx.await {
            let broken = self.broken_links(&hrefs, options).await;
            if broken_tx.send(broken).is_err() {
                debug!("page analysis stopped before link results arrived");
            }
        }

        let report = analysis
            .await
            .map_err(|e| ScanError::EngineFailure(format!("page analysis failed: {e}")))?
            .ok_or_else(|| ScanError::EngineFailure("page analysis stopped early".to_string()))?;
        info!(
            "{}: {} issues ({} images, {} broken links)",
            report.url,
            report.issues.len(),
            report.data.images.len(),
            report.data.broken_links.len()
        );
        Ok(ScanReport::from_pages(
            options.standard,
            options.engines.clone(),
            vec![report],
        ))
    }
}

/// Raised when the attempt future is dropped, telling the blocking analysis
/// to stop at its next checkpoint.
#[derive(Default)]
struct Abandon(Arc<AtomicBool>);

impl Drop for Abandon {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

async fn render(renderer: &dyn Renderer, url: &Url, timeout_ms: u64) -> Result<Acquired> {
    let mut ctx = renderer
        .new_context()
        .await
        .map_err(|e| classify_render_error(&e, timeout_ms))?;

    let loaded = async {
        let nav = ctx.navigate(url.as_str(), timeout_ms).await?;
        let html = ctx.get_html().await?;
        Ok::<_, anyhow::Error>((nav, html))
    }
    .await;

    if let Err(e) = ctx.close().await {
        debug!("failed to close render context: {e}");
    }

    let (nav, html) = loaded.map_err(|e| classify_render_error(&e, timeout_ms))?;
    let final_url = Url::parse(&nav.final_url).unwrap_or_else(|_| url.clone());
    if let Some(status) = nav.status.filter(|s| !(200..300).contains(s)) {
        return Err(ScanError::EngineFailure(format!(
            "target responded with HTTP {status} ({final_url})"
        )));
    }
    debug!("rendered {final_url} in {}ms", nav.load_time_ms);
    Ok(Acquired { final_url, html })
}

/// Map a browser failure onto the scan error taxonomy.
fn classify_render_error(err: &anyhow::Error, timeout_ms: u64) -> ScanError {
    let message = format!("{err:#}");
    if UNREACHABLE_MARKERS.iter().any(|m| message.contains(m)) {
        ScanError::NetworkUnreachable(message)
    } else if message.contains("timed out") {
        ScanError::Timeout { timeout_ms }
    } else {
        ScanError::EngineFailure(message)
    }
}

/// Distinct http(s) link targets, in document order, at most `max`.
fn collect_links(doc: &Html, base: &Url, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.select(&selector("a[href]"))
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .filter(|href| seen.insert(href.clone()))
        .take(max)
        .collect()
}

/// Run every selected runner over the parsed page.
///
/// Returns `None` once `abandoned` is raised; it is checked between runners.
fn analyze(
    doc: &Html,
    base: &Url,
    broken_links: Vec<BrokenLink>,
    options: &ScanOptions,
    abandoned: &AtomicBool,
) -> Option<PageReport> {
    let title = doc
        .select(&selector("title"))
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty());

    let images = doc
        .select(&selector("img"))
        .map(|img| {
            let src = img.value().attr("src").unwrap_or_default().trim();
            ImageInfo {
                src: base
                    .join(src)
                    .map(String::from)
                    .unwrap_or_else(|_| src.to_string()),
                alt: img.value().attr("alt").map(str::to_string),
            }
        })
        .collect();

    let page = PageDocument {
        html: doc,
        base,
        broken_links: &broken_links,
    };
    let mut issues = Vec::new();
    for id in &options.engines {
        if abandoned.load(Ordering::Relaxed) {
            debug!("analysis of {base} abandoned before the {id} runner");
            return None;
        }
        issues.extend(
            runner_for(*id)
                .check(&page, options.standard)
                .into_iter()
                .filter(|issue| options.keeps(issue.kind)),
        );
    }

    Some(PageReport {
        url: base.to_string(),
        title,
        issues,
        data: PageData {
            images,
            broken_links,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Standard;
    use crate::renderer::{NavigationResult, RenderContext};
    use crate::report::IssueType;
    use std::sync::atomic::AtomicUsize;

    const PAGE: &str = r#"<html><head><title> Shop </title></head><body>
        <h1>Shop</h1><h3>Deals</h3>
        <img src="/a.png"><img src="b.png" alt="">
        <a href="/x#top">x</a><a href="/x">x again</a><a href="mailto:a@b.c">mail</a>
        <a href="https://other.example.com/">other</a>
        </body></html>"#;

    fn base() -> Url {
        Url::parse("https://example.com/shop/").unwrap()
    }

    fn analyze_page(broken: Vec<BrokenLink>, options: &ScanOptions) -> PageReport {
        let doc = Html::parse_document(PAGE);
        analyze(&doc, &base(), broken, options, &AtomicBool::new(false)).unwrap()
    }

    #[test]
    fn test_analyze_collects_page_data() {
        let report = analyze_page(Vec::new(), &ScanOptions::default());
        assert_eq!(report.url, "https://example.com/shop/");
        assert_eq!(report.title.as_deref(), Some("Shop"));
        assert_eq!(report.data.images.len(), 2);
        assert_eq!(report.data.images[0].src, "https://example.com/a.png");
        assert_eq!(report.data.images[0].alt, None);
        assert_eq!(report.data.images[1].src, "https://example.com/shop/b.png");
        assert_eq!(report.data.images[1].alt.as_deref(), Some(""));
    }

    #[test]
    fn test_analyze_filters_warnings_unless_included() {
        let defaults = analyze_page(Vec::new(), &ScanOptions::default());
        assert!(defaults.issues.iter().all(|i| i.kind == IssueType::Error));
        assert!(defaults.issues.iter().any(|i| i.code.ends_with("H37")));

        let opts = ScanOptions {
            include_warnings: true,
            ..ScanOptions::default()
        };
        let with_warnings = analyze_page(Vec::new(), &opts);
        assert!(with_warnings
            .issues
            .iter()
            .any(|i| i.kind == IssueType::Warning && i.code.ends_with("G141")));
    }

    #[test]
    fn test_analyze_runs_engines_in_order() {
        let opts = ScanOptions::default()
            .with_standard(Standard::Wcag2AA)
            .with_engines([EngineId::Links, EngineId::Markup]);
        let broken = vec![BrokenLink {
            href: "https://other.example.com/".to_string(),
            status: Some(500),
        }];
        let report = analyze_page(broken, &opts);
        assert_eq!(report.issues[0].runner, EngineId::Links);
        assert!(report.issues[1..].iter().all(|i| i.runner == EngineId::Markup));
        assert_eq!(report.data.broken_links.len(), 1);
    }

    #[test]
    fn test_analyze_stops_when_abandoned() {
        let doc = Html::parse_document(PAGE);
        let abandoned = AtomicBool::new(true);
        assert!(analyze(&doc, &base(), Vec::new(), &ScanOptions::default(), &abandoned).is_none());

        let flag = Abandon::default();
        let shared = Arc::clone(&flag.0);
        drop(flag);
        assert!(shared.load(Ordering::Relaxed));
    }

    #[test]
    fn test_collect_links_dedupes_and_caps() {
        let doc = Html::parse_document(PAGE);
        let links = collect_links(&doc, &base(), 10);
        assert_eq!(
            links,
            vec!["https://example.com/x", "https://other.example.com/"]
        );
        assert_eq!(collect_links(&doc, &base(), 1).len(), 1);
    }

    #[test]
    fn test_classify_render_error() {
        let unreachable = anyhow::anyhow!("navigation failed: net::ERR_NAME_NOT_RESOLVED");
        assert!(matches!(
            classify_render_error(&unreachable, 10),
            ScanError::NetworkUnreachable(_)
        ));
        let slow = anyhow::anyhow!("navigation timed out after 10ms");
        assert!(matches!(
            classify_render_error(&slow, 10),
            ScanError::Timeout { timeout_ms: 10 }
        ));
        let other = anyhow::anyhow!("browser crashed");
        assert!(matches!(
            classify_render_error(&other, 10),
            ScanError::EngineFailure(_)
        ));
    }

    struct StaticRenderer {
        html: &'static str,
        status: Option<u16>,
        closed: Arc<AtomicUsize>,
    }

    struct StaticContext {
        html: &'static str,
        status: Option<u16>,
        url: Option<String>,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for StaticRenderer {
        async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>> {
            Ok(Box::new(StaticContext {
                html: self.html,
                status: self.status,
                url: None,
                closed: Arc::clone(&self.closed),
            }))
        }

        fn active_contexts(&self) -> usize {
            0
        }
    }

    #[async_trait]
    impl RenderContext for StaticContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> anyhow::Result<NavigationResult> {
            self.url = Some(url.to_string());
            Ok(NavigationResult {
                final_url: url.to_string(),
                status: self.status,
                load_time_ms: 1,
            })
        }

        async fn get_html(&self) -> anyhow::Result<String> {
            Ok(self.html.to_string())
        }

        async fn close(self: Box<Self>) -> anyhow::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rendered_scan_uses_browser_dom() {
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(StaticRenderer {
            html: "<html lang='en'><head><title>Rendered</title></head><body><p>hi</p></body></html>",
            status: Some(200),
            closed: Arc::clone(&closed),
        });
        let opts = ScanOptions::default().with_render(true);
        let engine = PageEngine::new(&opts).with_renderer(renderer);

        let report = engine
            .run(&Url::parse("https://example.invalid/").unwrap(), &opts)
            .await
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.document_title.as_deref(), Some("Rendered"));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rendered_error_status_fails_attempt() {
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(StaticRenderer {
            html: "<html><head><title>Not Found</title></head><body></body></html>",
            status: Some(404),
            closed: Arc::clone(&closed),
        });
        let opts = ScanOptions::default().with_render(true);
        let engine = PageEngine::new(&opts).with_renderer(renderer);

        let err = engine
            .run(&Url::parse("https://example.invalid/missing").unwrap(), &opts)
            .await
            .unwrap_err();
        match err {
            ScanError::EngineFailure(msg) => assert!(msg.contains("HTTP 404"), "{msg}"),
            other => panic!("expected engine failure, got {other:?}"),
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rendered_unknown_status_is_scanned() {
        let renderer = Arc::new(StaticRenderer {
            html: "<html lang='en'><head><title>Local</title></head><body></body></html>",
            status: None,
            closed: Arc::new(AtomicUsize::new(0)),
        });
        let opts = ScanOptions::default().with_render(true);
        let engine = PageEngine::new(&opts).with_renderer(renderer);

        let report = engine
            .run(&Url::parse("https://example.invalid/").unwrap(), &opts)
            .await
            .unwrap();
        assert_eq!(report.document_title.as_deref(), Some("Local"));
    }
}
