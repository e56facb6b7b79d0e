//! Static snapshot files
//!
//! A snapshot is a saved copy of the sheet endpoint's response. It is read
//! and normalized exactly like a live response, and is used when live data
//! cannot be fetched.

use std::path::Path;

use thiserror::Error;

use crate::data::fetcher::decode_payload;
use crate::data::normalize::normalize_payload;
use crate::data::{Dataset, FetchError};

/// Errors that can occur when loading a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The file could not be read
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not hold a usable payload
    #[error("Invalid snapshot: {0}")]
    Invalid(#[from] FetchError),
}

/// Reads and normalizes a snapshot file
pub async fn load_snapshot(path: &Path) -> Result<Dataset, SnapshotError> {
    let body = tokio::fs::read_to_string(path).await?;
    let payload = decode_payload(&body)?;
    Ok(normalize_payload(&payload))
}
