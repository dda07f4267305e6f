//! Structured error types for symtrace
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while building the static symbol index
///
/// All of these are fatal under the default policy: an image that cannot
/// describe its own layout is misconfigured. A stripped image is not an
/// error, it produces an empty index instead.
#[derive(Error, Debug)]
pub enum SymbolIndexError {
    #[error("Failed to locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("Failed to read image {path}: {source}")]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a recognized object file: {source}")]
    UnrecognizedFormat {
        path: PathBuf,
        #[source]
        source: object::Error,
    },

    #[error("Failed to read the symbol table of {path}: {source}")]
    SymbolTable {
        path: PathBuf,
        #[source]
        source: object::Error,
    },
}

/// Failures of the live symbol service
///
/// Never fatal: the resolver degrades to the static index for the pass.
#[derive(Error, Debug)]
pub enum LiveServiceError {
    #[error("Live symbol service unavailable: {0}")]
    Unavailable(String),
}
