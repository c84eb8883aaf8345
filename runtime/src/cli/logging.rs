// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tracing setup. Logs always go to stderr; stdout carries only the report.

use super::{Cli, LogFormat};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "adaptivetest=debug"
    } else if quiet {
        "adaptivetest=warn"
    } else {
        "adaptivetest=info"
    }
}

pub fn init(cli: &Cli) {
    let fallback = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_directive(cli.verbose, cli.quiet).to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match cli.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("  Warning: logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "adaptivetest=info");
        assert_eq!(default_directive(true, false), "adaptivetest=debug");
        assert_eq!(default_directive(true, true), "adaptivetest=debug");
        assert_eq!(default_directive(false, true), "adaptivetest=warn");
    }
}
