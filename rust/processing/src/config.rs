// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan pipeline configuration.

use roomscan_core::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tuning knobs for a scan session.
///
/// Deserializes from partial documents; missing fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Same-label detections closer than this are duplicates (metres).
    pub proximity_threshold: f32,
    /// Class groups need more than this many triangles to count.
    pub min_group_triangles: usize,
    /// Anchor count at which mesh progress reaches 1.0.
    pub progress_anchor_target: usize,
    /// Detections below this confidence are dropped.
    pub min_confidence: f32,
    /// Distinct floor samples needed before the outline uses a convex hull.
    pub min_outline_points: usize,
    /// Directory for exported mesh files.
    pub export_dir: PathBuf,
    /// Format used when the caller does not pick one.
    pub default_format: ExportFormat,
    /// Sample every n-th depth pixel in both directions.
    pub depth_sample_stride: usize,
    /// Depth samples closer than this are dropped (metres).
    pub depth_min_m: f32,
    /// Depth samples farther than this are dropped (metres).
    pub depth_max_m: f32,
    /// Max depth jump inside one grid cell before it is left open (metres).
    pub depth_discontinuity_m: f32,
    /// Every n-th depth frame becomes a mesh anchor.
    pub depth_keyframe_interval: u64,
    /// Keyframe anchors kept at once; newer keyframes replace the oldest.
    pub depth_max_keyframes: usize,
    /// Voxel edge used for depth coverage (metres).
    pub depth_voxel_size_m: f32,
    /// Voxels that count as full coverage.
    pub depth_target_voxels: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 0.5,
            min_group_triangles: 10,
            progress_anchor_target: 50,
            min_confidence: 0.0,
            min_outline_points: 8,
            export_dir: std::env::temp_dir().join("roomscan"),
            default_format: ExportFormat::Glb,
            depth_sample_stride: 8,
            depth_min_m: 0.2,
            depth_max_m: 5.0,
            depth_discontinuity_m: 0.1,
            depth_keyframe_interval: 10,
            depth_max_keyframes: 32,
            depth_voxel_size_m: 0.1,
            depth_target_voxels: 4000,
        }
    }
}

impl ScanConfig {
    /// Override the export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}
