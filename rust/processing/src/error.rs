// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scan sessions.

use crate::session::ScanState;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scan processing.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a scan session.
#[derive(Debug, Error)]
pub enum Error {
    /// Finalize requested with no captured anchors. The caller must re-scan.
    #[error("No mesh data captured")]
    NoMeshData,

    /// Writing the exported mesh failed. The merged mesh is kept, so the
    /// export can be retried.
    #[error("Export to {path} failed: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The AR capability needed for scanning is missing.
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Operation not allowed in the current session state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ScanState,
    },

    /// Raw platform buffer could not be decoded.
    #[error("Buffer decode error ({what}): {reason}")]
    BufferDecode { what: &'static str, reason: String },

    #[error("Geometry error: {0}")]
    Geometry(#[from] roomscan_geometry::Error),

    /// Background finalize worker panicked or was cancelled.
    #[error("Finalize worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn decode(what: &'static str, reason: impl Into<String>) -> Self {
        Error::BufferDecode {
            what,
            reason: reason.into(),
        }
    }

    /// Only export failures can be retried without scanning again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Export { .. })
    }
}
