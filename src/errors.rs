// src/errors.rs

//! Crate-wide error types.
//!
//! Start failures are deliberately *not* propagated as `Result`s out of
//! the control path: they surface as log events on the affected
//! script's stream (see `supervisor::runtime`). The types here exist so
//! those paths have one well-named shape to render from.

use std::path::PathBuf;

pub use anyhow::{Error, Result};

/// Why a `start` request could not produce a running process.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// No descriptor exists for the requested identifier.
    #[error("no configuration found for script '{0}'")]
    ConfigurationMissing(String),

    /// The expected interpreter path is absent from the filesystem.
    #[error("virtual environment not found: {}", .0.display())]
    EnvironmentMissing(PathBuf),

    /// The OS refused to create the process.
    #[error("failed to start process: {0}")]
    SpawnFailure(#[from] std::io::Error),
}

/// Returned by the registry when an insert would violate the
/// at-most-one-process-per-id invariant.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("script '{0}' already has a live process")]
pub struct AlreadyRunning(pub String);
