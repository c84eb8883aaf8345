// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP acquisition of target pages and link checks.
//!
//! Plain requests only; JavaScript rendering lives in [`crate::renderer`].

pub mod http_client;
