// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store construction.
//!
//! Steady-state store operations never fail loudly: reads degrade to `None`
//! and writes are tolerated, per the storage contract. The only fallible
//! path is constructing a file-backed store, where the cache directory
//! itself cannot be prepared.

use std::io;
use std::path::PathBuf;

/// An error raised while constructing a store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache directory could not be created or enumerated.
    #[error("failed to prepare cache directory {path:?}")]
    CacheDirectory {
        /// The directory that could not be prepared.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// A specialized [`Result`](std::result::Result) type for store construction.
pub type Result<T> = std::result::Result<T, Error>;
