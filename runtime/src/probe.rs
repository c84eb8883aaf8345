// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Retryable scan probe.
//!
//! Runs the engine against the normalized target and, if that attempt fails
//! for any reason, once more against the same address with the other
//! scheme. At most two engine invocations per scan; the second one starts
//! only after the first has finished or been abandoned at its deadline.

use crate::engine::Engine;
use crate::error::{Attempt, AttemptStage, Result, ScanError};
use crate::options::ScanOptions;
use crate::report::ScanReport;
use crate::target::NormalizedUrl;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Engine invocations per scan: the primary scheme, then the alternate.
pub const MAX_ATTEMPTS: usize = 2;

const STAGES: [AttemptStage; MAX_ATTEMPTS] = [AttemptStage::Primary, AttemptStage::Fallback];

/// Terminal result of a scan.
pub type ScanOutcome = Result<ScanReport>;

/// Scan probe bound to one engine and one set of options.
pub struct Probe<E: Engine> {
    engine: E,
    options: ScanOptions,
}

impl<E: Engine> Probe<E> {
    pub fn new(engine: E, options: ScanOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Scan `target`, falling back to the alternate scheme once.
    ///
    /// A success on either attempt is returned as is. When both attempts
    /// fail the error carries both diagnostics.
    pub async fn scan(&self, target: &NormalizedUrl) -> ScanOutcome {
        self.options.validate()?;

        let candidates = [target.clone(), target.alternate()];
        let mut primary_failure: Option<Attempt> = None;

        for (stage, url) in STAGES.into_iter().zip(candidates) {
            info!("{stage} attempt: scanning {url}");
            let started = Instant::now();

            let error = match self.attempt(&url).await {
                Ok(report) => {
                    info!(
                        "{stage} attempt succeeded for {url} in {}ms ({} issues)",
                        started.elapsed().as_millis(),
                        report.summary.issues
                    );
                    return Ok(report);
                }
                Err(e) => e,
            };

            let failed = Attempt {
                stage,
                scheme: url.scheme(),
                url: url.to_string(),
                error: Box::new(error),
            };

            match primary_failure.take() {
                None => {
                    warn!(
                        "{stage} attempt failed ({}): {failed}; retrying over {}",
                        failed.kind(),
                        url.scheme().alternate()
                    );
                    primary_failure = Some(failed);
                }
                Some(primary) => {
                    let err = ScanError::BothAttemptsFailed {
                        primary,
                        fallback: failed,
                    };
                    error!("{err}");
                    return Err(err);
                }
            }
        }

        Err(primary_failure.map_or_else(
            || ScanError::EngineFailure("no scan attempted".to_string()),
            |a| *a.error,
        ))
    }

    async fn attempt(&self, url: &NormalizedUrl) -> ScanOutcome {
        let timeout_ms = self.options.timeout_ms;
        tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.engine.run(url.url(), &self.options),
        )
        .await
        .unwrap_or(Err(ScanError::Timeout { timeout_ms }))
    }
}
