// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! System composition from YAML search directories.
//!
//! [`compose`] scans the configured directories, validates every document,
//! resolves port IDs, merges all topologies into one [`SystemModel`] and
//! reports every problem it finds in a single pass. [`render_report`] turns
//! the outcome into a startup-log friendly summary.
//!
//! [`SystemModel`]: crate::model::SystemModel

mod engine;
mod error;
mod report;

pub use engine::{compose, compose_from_env};
pub use error::{ComposeError, ComposeErrorKind, ComposeResult, EnvPathsError};
pub use report::render_report;
