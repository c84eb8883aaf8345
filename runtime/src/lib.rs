// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! AdaptiveTest runtime — WCAG accessibility scanning with scheme fallback.
//!
//! [`target::normalize`] turns user input into a canonical URL, and
//! [`probe::Probe`] runs an [`engine::Engine`] against it, retrying once over
//! the other scheme before giving up.

pub mod acquisition;
pub mod backend;
pub mod cli;
pub mod engine;
pub mod error;
pub mod options;
pub mod probe;
pub mod renderer;
pub mod report;
pub mod target;

pub use engine::{Engine, PageEngine};
pub use error::{FailureKind, ScanError};
pub use options::{EngineId, ScanOptions, Standard};
pub use probe::{Probe, ScanOutcome, MAX_ATTEMPTS};
pub use report::ScanReport;
pub use target::{normalize, NormalizedUrl, Scheme};
