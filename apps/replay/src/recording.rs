// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recorded session format.
//!
//! A recording is JSON lines, one runtime callback per line, tagged by
//! `type`. Transforms are column-major 4x4 arrays as the AR runtimes hand
//! them out. Blank lines and lines starting with `#` are skipped.

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use roomscan_core::{AnchorId, SemanticLabel};
use roomscan_geometry::transform::from_column_major;
use roomscan_geometry::MeshAnchor;
use roomscan_processing::platform::{CameraIntrinsics, DepthFrame, PlaneObservation};
use roomscan_processing::{AnchorEvent, FrameSink};
use serde::Deserialize;

/// Anchor geometry as recorded
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedAnchor {
    pub id: AnchorId,
    pub transform: [f32; 16],
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
    #[serde(default)]
    pub classifications: Option<Vec<u8>>,
}

impl RecordedAnchor {
    pub fn into_anchor(self) -> MeshAnchor {
        let anchor = MeshAnchor::new(
            self.id,
            from_column_major(&self.transform),
            self.vertices
                .into_iter()
                .map(|[x, y, z]| Point3::new(x, y, z))
                .collect(),
            self.normals
                .into_iter()
                .map(|[x, y, z]| Vector3::new(x, y, z))
                .collect(),
            self.faces,
        );
        match self.classifications {
            Some(classes) => anchor.with_classifications(classes),
            None => anchor,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecordedIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// Depth image as recorded
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedDepthFrame {
    pub width: usize,
    pub height: usize,
    pub depth_mm: Vec<u16>,
    #[serde(default)]
    pub confidence: Option<Vec<u8>>,
    pub intrinsics: RecordedIntrinsics,
    pub camera_to_world: [f32; 16],
    #[serde(default)]
    pub timestamp_ns: u64,
}

impl RecordedDepthFrame {
    pub fn into_frame(self) -> DepthFrame {
        DepthFrame {
            width: self.width,
            height: self.height,
            depth_mm: self.depth_mm,
            confidence: self.confidence,
            intrinsics: CameraIntrinsics {
                fx: self.intrinsics.fx,
                fy: self.intrinsics.fy,
                cx: self.intrinsics.cx,
                cy: self.intrinsics.cy,
            },
            camera_to_world: from_column_major(&self.camera_to_world),
            timestamp_ns: self.timestamp_ns,
        }
    }
}

/// Plane as recorded; `label` accepts the runtime's plane names
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedPlane {
    pub id: AnchorId,
    pub label: String,
    pub center_pose: [f32; 16],
    pub polygon: Vec<[f32; 2]>,
}

impl RecordedPlane {
    pub fn into_plane(self) -> PlaneObservation {
        PlaneObservation {
            id: self.id,
            label: SemanticLabel::from_name(&self.label),
            center_pose: from_column_major(&self.center_pose),
            polygon: self.polygon,
        }
    }
}

/// One line of a recording
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedEvent {
    AnchorAdded(RecordedAnchor),
    AnchorUpdated(RecordedAnchor),
    AnchorRemoved { id: AnchorId },
    DepthFrame(RecordedDepthFrame),
    Plane(RecordedPlane),
}

impl RecordedEvent {
    /// Parse one recording line, `None` for blanks and comments
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let event = serde_json::from_str(line)?;
        Ok(Some(event))
    }

    /// Hand the event to a frame sink
    pub fn dispatch<S: FrameSink>(self, sink: &mut S) {
        match self {
            RecordedEvent::AnchorAdded(anchor) => {
                sink.on_anchor_event(AnchorEvent::Added(anchor.into_anchor()))
            }
            RecordedEvent::AnchorUpdated(anchor) => {
                sink.on_anchor_event(AnchorEvent::Updated(anchor.into_anchor()))
            }
            RecordedEvent::AnchorRemoved { id } => sink.on_anchor_event(AnchorEvent::Removed(id)),
            RecordedEvent::DepthFrame(frame) => sink.on_depth_frame(frame.into_frame()),
            RecordedEvent::Plane(plane) => sink.on_plane_event(plane.into_plane()),
        }
    }
}
