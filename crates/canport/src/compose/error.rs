// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composition error reporting.
//!
//! Composition never aborts on the first problem. Every failure becomes a
//! [`ComposeError`] carrying a stable machine-readable kind, and callers
//! inspect the full list on the returned [`ComposeResult`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::SystemModel;

// ============================================================================
// Error kinds
// ============================================================================

/// Stable classification of composition failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ComposeErrorKind {
    /// A configured search directory does not exist or is not a directory.
    SearchDirNotFound,
    /// A document path vanished between discovery and loading.
    FileNotFound,
    /// A document could not be read from disk.
    FileReadError,
    /// A document is not well-formed YAML.
    DocumentParseError,
    /// A topology document failed shape or semantic validation.
    SystemValidationError,
    /// An interface document failed shape or semantic validation.
    InterfaceValidationError,
    /// Two devices claim the same name across the composed documents.
    DeviceNameConflict,
    /// A device references an interface no search directory provides.
    InterfaceNotFound,
    /// An interface references a wire type with no registered codec.
    CodecNotFound,
}

impl ComposeErrorKind {
    /// Stable identifier, suitable for matching and log filtering.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComposeErrorKind::SearchDirNotFound => "SEARCH_DIR_NOT_FOUND",
            ComposeErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ComposeErrorKind::FileReadError => "FILE_READ_ERROR",
            ComposeErrorKind::DocumentParseError => "DOCUMENT_PARSE_ERROR",
            ComposeErrorKind::SystemValidationError => "SYSTEM_VALIDATION_ERROR",
            ComposeErrorKind::InterfaceValidationError => "INTERFACE_VALIDATION_ERROR",
            ComposeErrorKind::DeviceNameConflict => "DEVICE_NAME_CONFLICT",
            ComposeErrorKind::InterfaceNotFound => "INTERFACE_NOT_FOUND",
            ComposeErrorKind::CodecNotFound => "CODEC_NOT_FOUND",
        }
    }
}

impl fmt::Display for ComposeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// One composition failure with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeError {
    pub kind: ComposeErrorKind,
    pub message: String,
    /// Document the failure was detected in, when one applies.
    pub file_path: Option<PathBuf>,
    /// Extra key/value context, e.g. the conflicting device name.
    pub details: Vec<(String, String)>,
}

impl ComposeError {
    #[must_use]
    pub fn new(kind: ComposeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: None,
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Value of the first detail stored under `key`.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ComposeError {}

// ============================================================================
// Result
// ============================================================================

/// Outcome of one composition run.
///
/// The model is always present; on failure it holds whatever composed
/// cleanly before and around the errors. [`success`](Self::success) is the
/// gate callers check before starting transports.
#[derive(Debug, Clone, Default)]
pub struct ComposeResult {
    pub model: SystemModel,
    pub errors: Vec<ComposeError>,
    /// Union of wire types over every loaded interface.
    pub wire_types: BTreeSet<String>,
}

impl ComposeResult {
    /// True when composition produced no errors.
    #[must_use]
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors of one kind, for targeted assertions and reporting.
    #[must_use]
    pub fn errors_of_kind(&self, kind: ComposeErrorKind) -> Vec<&ComposeError> {
        self.errors.iter().filter(|e| e.kind == kind).collect()
    }
}

// ============================================================================
// Environment lookup
// ============================================================================

/// Failure to derive search paths from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvPathsError {
    /// The variable is not set.
    Missing(&'static str),
    /// The variable is set but yields no usable path.
    Empty(&'static str),
}

impl fmt::Display for EnvPathsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvPathsError::Missing(var) => write!(f, "{var} must be set"),
            EnvPathsError::Empty(var) => write!(f, "{var} contains no usable paths"),
        }
    }
}

impl std::error::Error for EnvPathsError {}
