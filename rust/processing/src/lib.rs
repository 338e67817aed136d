// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Processing
//!
//! Capture pipeline for LiDAR room scans: anchor ingestion, semantic
//! classification, depth-frame integration, and the session controller that
//! merges, projects and exports the finished scan.
//!
//! ```rust,ignore
//! use roomscan_processing::{DeviceCapabilities, ScanConfig, ScanSession};
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut session = ScanSession::new(ScanConfig::default(), DeviceCapabilities::lidar(), tx);
//! session.start()?;
//! // feed anchors through FrameSink...
//! let result = session.finalize(ExportFormat::Glb).await?;
//! ```

pub mod classification;
pub mod config;
pub mod depth;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod platform;
pub mod session;

pub use classification::{dedup_objects, ClassificationAggregator, ClassificationOutcome};
pub use config::ScanConfig;
pub use depth::{DepthIntegrator, DepthUpdate};
pub use error::{Error, Result};
pub use export::MeshExporter;
pub use ingestion::{FrameIngestion, Ingested};
pub use platform::{AnchorEvent, DeviceCapabilities, FrameSink};
pub use session::{ScanEvent, ScanSession, ScanState};
