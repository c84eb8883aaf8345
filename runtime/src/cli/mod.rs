// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line surface of the `adaptivetest-scan` binary.

pub mod logging;
pub mod scan_cmd;

use crate::options::{DEFAULT_MAX_LINK_CHECKS, DEFAULT_TIMEOUT_MS};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "adaptivetest-scan",
    about = "Scan a web page for WCAG accessibility issues and print a JSON report",
    version,
    after_help = "If the page cannot be scanned over the given scheme, the scan is retried once over the other one (https <-> http)."
)]
pub struct Cli {
    /// Page to scan, with or without scheme (e.g. "example.com")
    pub url: Option<String>,

    /// Conformance profile: WCAG2A, WCAG2AA or WCAG2AAA
    #[arg(long, default_value = "WCAG2AA")]
    pub standard: String,

    /// Rule runner to use (markup, contrast, links). Can be repeated.
    #[arg(long = "engine", value_name = "ENGINE")]
    pub engines: Vec<String>,

    /// Per-attempt deadline in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Load the page in headless Chromium instead of plain HTTP
    #[arg(long)]
    pub render: bool,

    /// Include warnings in the report
    #[arg(long)]
    pub include_warnings: bool,

    /// Include notices in the report
    #[arg(long)]
    pub include_notices: bool,

    /// Maximum number of links checked by the links runner
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_LINK_CHECKS)]
    pub max_link_checks: usize,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Log filter directive (overridden by RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Only log warnings and errors; no progress spinner
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
