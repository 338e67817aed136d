// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use roomscan_core::AnchorId;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty mesh: {0}")]
    EmptyMesh(String),

    #[error("Invalid anchor {id}: {reason}")]
    InvalidAnchor { id: AnchorId, reason: String },

    #[error("Combined mesh exceeds u32 index range ({0} vertices)")]
    IndexOverflow(usize),
}

impl Error {
    pub fn invalid_anchor(id: AnchorId, reason: impl Into<String>) -> Self {
        Error::InvalidAnchor {
            id,
            reason: reason.into(),
        }
    }
}
