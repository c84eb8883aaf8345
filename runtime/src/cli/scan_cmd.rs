// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! `adaptivetest-scan <url>` — normalize, probe, report.

use super::Cli;
use crate::engine::PageEngine;
use crate::options::{EngineId, ScanOptions, Standard};
use crate::probe::Probe;
use crate::renderer::chromium::ChromiumRenderer;
use crate::report::ScanReport;
use crate::target::normalize;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build scan options from the command line.
pub fn options_from(cli: &Cli) -> Result<ScanOptions> {
    let standard: Standard = cli.standard.parse()?;
    let mut options = ScanOptions {
        standard,
        timeout_ms: cli.timeout,
        render: cli.render,
        include_warnings: cli.include_warnings,
        include_notices: cli.include_notices,
        max_link_checks: cli.max_link_checks,
        ..ScanOptions::default()
    };
    if !cli.engines.is_empty() {
        let engines = cli
            .engines
            .iter()
            .map(|e| e.parse::<EngineId>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        options = options.with_engines(engines);
    }
    options.validate()?;
    Ok(options)
}

/// Run one scan and return its report.
pub async fn run(cli: &Cli) -> Result<ScanReport> {
    let Some(raw) = cli.url.as_deref() else {
        bail!("missing URL argument. Usage: adaptivetest-scan [OPTIONS] <URL>");
    };
    let target = normalize(raw)?;
    let mut options = options_from(cli)?;

    let mut engine = PageEngine::new(&options);
    if options.render {
        match ChromiumRenderer::new(&options.user_agent).await {
            Ok(renderer) => engine = engine.with_renderer(Arc::new(renderer)),
            Err(e) => {
                warn!("{e:#}; scanning over plain HTTP instead");
                options.render = false;
            }
        }
    }

    info!("scanning {target} ({}, engines: {:?})", options.standard, options.engines);
    let spinner = (!cli.quiet && std::io::stderr().is_terminal()).then(|| spinner(&target.to_string()));

    let probe = Probe::new(engine, options);
    let outcome = probe.scan(&target).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    outcome.with_context(|| format!("could not scan {target}"))
}

fn spinner(url: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(format!("Scanning {url}"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
