// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Core
//!
//! Shared vocabulary for LiDAR / depth room scanning.
//!
//! ## Overview
//!
//! This crate holds the plain data types that travel between the capture
//! pipeline and its callers:
//!
//! - **Identifiers**: [`AnchorId`] for tracked mesh anchors and planes
//! - **Semantics**: [`SemanticLabel`] decoded from per-triangle classification
//!   bytes, grouped into [`ObjectCategory`]
//! - **Detections**: [`RecognizedObject`] with world-space [`BoundingBox3`]
//! - **Results**: [`RoomDimensions`], [`FloorPlanPoint`], [`FloorPlan`],
//!   [`ExportedMesh`] and the terminal [`ScanResult`]
//!
//! Geometry math lives in `roomscan-geometry`; this crate carries no math
//! dependency so results can be handed to any consumer.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for result types

pub mod id;
pub mod label;
pub mod object;
pub mod result;

pub use id::AnchorId;
pub use label::{ObjectCategory, SemanticLabel};
pub use object::{BoundingBox3, RecognizedObject};
pub use result::{
    ExportFormat, ExportedMesh, FloorPlan, FloorPlanPoint, PlanOpening, RoomDimensions,
    ScanResult, WallSegment,
};
