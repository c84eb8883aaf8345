// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

use adaptivetest_runtime::cli::{logging, scan_cmd, Cli};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli);

    let printed = match scan_cmd::run(&cli).await {
        Ok(report) => serde_json::to_string_pretty(&report)
            .map(|json| println!("{json}"))
            .map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = printed {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
}
