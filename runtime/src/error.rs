// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for normalization and scanning.
//!
//! A single attempt fails with one of the leaf variants (`InvalidInput`,
//! `Timeout`, `EngineFailure`, `NetworkUnreachable`). The probe aggregates two
//! failed attempts into `BothAttemptsFailed`, which keeps both diagnostics
//! together with the scheme each attempt used.

use crate::target::Scheme;
use serde::Serialize;
use std::fmt;

/// Coarse classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    InvalidInput,
    Timeout,
    EngineFailure,
    NetworkUnreachable,
    BothAttemptsFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidInput => "InvalidInput",
            FailureKind::Timeout => "Timeout",
            FailureKind::EngineFailure => "EngineFailure",
            FailureKind::NetworkUnreachable => "NetworkUnreachable",
            FailureKind::BothAttemptsFailed => "BothAttemptsFailed",
        };
        f.write_str(name)
    }
}

/// Which of the two probe attempts produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStage {
    Primary,
    Fallback,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStage::Primary => f.write_str("primary"),
            AttemptStage::Fallback => f.write_str("fallback"),
        }
    }
}

/// A failed attempt, with its provenance.
#[derive(Debug)]
pub struct Attempt {
    pub stage: AttemptStage,
    pub scheme: Scheme,
    pub url: String,
    pub error: Box<ScanError>,
}

impl Attempt {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.scheme, self.error, self.url)
    }
}

/// Errors surfaced by the normalizer, the engines and the probe.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("engine failure: {0}")]
    EngineFailure(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("scan failed over {} then {}: {primary}; {fallback}", .primary.scheme, .fallback.scheme)]
    BothAttemptsFailed { primary: Attempt, fallback: Attempt },
}

impl ScanError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScanError::InvalidInput(_) => FailureKind::InvalidInput,
            ScanError::Timeout { .. } => FailureKind::Timeout,
            ScanError::EngineFailure(_) => FailureKind::EngineFailure,
            ScanError::NetworkUnreachable(_) => FailureKind::NetworkUnreachable,
            ScanError::BothAttemptsFailed { .. } => FailureKind::BothAttemptsFailed,
        }
    }

    /// Classify a reqwest failure from fetching the target page.
    pub fn from_request(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ScanError::Timeout { timeout_ms }
        } else if err.is_connect() {
            ScanError::NetworkUnreachable(error_chain(err))
        } else {
            ScanError::EngineFailure(error_chain(err))
        }
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(stage: AttemptStage, scheme: Scheme, error: ScanError) -> Attempt {
        Attempt {
            stage,
            scheme,
            url: format!("{scheme}://example.com"),
            error: Box::new(error),
        }
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ScanError::InvalidInput("x".into()).kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            ScanError::Timeout { timeout_ms: 10 }.kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            ScanError::NetworkUnreachable("refused".into()).kind(),
            FailureKind::NetworkUnreachable
        );
    }

    #[test]
    fn test_both_attempts_display_names_both_schemes() {
        let err = ScanError::BothAttemptsFailed {
            primary: attempt(
                AttemptStage::Primary,
                Scheme::Https,
                ScanError::Timeout { timeout_ms: 60000 },
            ),
            fallback: attempt(
                AttemptStage::Fallback,
                Scheme::Http,
                ScanError::Timeout { timeout_ms: 60000 },
            ),
        };
        let text = err.to_string();
        assert!(text.starts_with("scan failed over https then http"));
        assert!(text.contains("[https] timed out after 60000ms (https://example.com)"));
        assert!(text.contains("[http] timed out after 60000ms (http://example.com)"));
        assert_eq!(err.kind(), FailureKind::BothAttemptsFailed);
    }

    #[test]
    fn test_error_chain_dedupes_repeated_text() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(error_chain(&io), "refused");
    }
}
