// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-image capture path
//!
//! Devices without scene reconstruction still deliver depth images. Every
//! frame is sampled on a sparse pixel grid and its world-space samples mark
//! voxels for the coverage estimate. Keyframes are additionally
//! grid-triangulated into a mesh anchor in camera space, with the camera pose
//! as the anchor transform, so they merge exactly like runtime anchors.
//!
//! Keyframe anchors cycle through a fixed set of ids, so once the ring is
//! full each new keyframe replaces the oldest one in the working set.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::platform::DepthFrame;
use nalgebra::{Point3, Vector3};
use roomscan_core::AnchorId;
use roomscan_geometry::transform::transform_point;
use roomscan_geometry::MeshAnchor;
use rustc_hash::FxHashSet;

/// Result of integrating one depth frame
#[derive(Debug)]
pub struct DepthUpdate {
    /// Scan coverage after this frame (0.0 - 1.0)
    pub coverage: f32,
    /// Usable samples in this frame
    pub samples: usize,
    /// Triangulated anchor when the frame was a keyframe
    pub keyframe: Option<MeshAnchor>,
}

/// One grid sample: camera-space point and its depth
#[derive(Clone, Copy)]
struct Sample {
    point: Point3<f32>,
    depth: f32,
}

#[derive(Debug)]
pub struct DepthIntegrator {
    stride: usize,
    min_depth: f32,
    max_depth: f32,
    discontinuity: f32,
    keyframe_interval: u64,
    voxel_size: f32,
    target_voxels: usize,
    voxels: FxHashSet<[i32; 3]>,
    frames_seen: u64,
    max_keyframes: usize,
    keyframe_ids: Vec<AnchorId>,
    keyframes_emitted: u64,
}

impl DepthIntegrator {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            stride: config.depth_sample_stride.max(1),
            min_depth: config.depth_min_m,
            max_depth: config.depth_max_m,
            discontinuity: config.depth_discontinuity_m,
            keyframe_interval: config.depth_keyframe_interval.max(1),
            voxel_size: if config.depth_voxel_size_m > 0.0 {
                config.depth_voxel_size_m
            } else {
                0.1
            },
            target_voxels: config.depth_target_voxels.max(1),
            voxels: FxHashSet::default(),
            frames_seen: 0,
            max_keyframes: config.depth_max_keyframes.max(1),
            keyframe_ids: Vec::new(),
            keyframes_emitted: 0,
        }
    }

    /// Fraction of the target voxel count seen so far
    pub fn coverage(&self) -> f32 {
        (self.voxels.len() as f32 / self.target_voxels as f32).min(1.0)
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Distinct keyframe anchor ids handed out, at most `depth_max_keyframes`
    pub fn keyframe_anchors(&self) -> usize {
        self.keyframe_ids.len()
    }

    pub fn clear(&mut self) {
        self.voxels.clear();
        self.frames_seen = 0;
        self.keyframe_ids.clear();
        self.keyframes_emitted = 0;
    }

    fn next_keyframe_id(&mut self) -> AnchorId {
        let slot = (self.keyframes_emitted % self.max_keyframes as u64) as usize;
        self.keyframes_emitted += 1;
        if slot == self.keyframe_ids.len() {
            self.keyframe_ids.push(AnchorId::new_v4());
        }
        self.keyframe_ids[slot]
    }

    /// Integrate one frame. The first frame and every
    /// `depth_keyframe_interval`-th after it are triangulated.
    pub fn integrate(&mut self, frame: &DepthFrame) -> Result<DepthUpdate> {
        frame.validate()?;

        let is_keyframe = self.frames_seen % self.keyframe_interval == 0;
        self.frames_seen += 1;

        let cols = frame.width.div_ceil(self.stride);
        let rows = frame.height.div_ceil(self.stride);
        let mut grid: Vec<Option<Sample>> = Vec::with_capacity(cols * rows);

        for row in 0..rows {
            for col in 0..cols {
                let (u, v) = (col * self.stride, row * self.stride);
                let sample = frame
                    .depth_m(u, v)
                    .filter(|d| *d >= self.min_depth && *d <= self.max_depth)
                    .map(|depth| Sample {
                        point: frame.unproject(u, v, depth),
                        depth,
                    });
                if let Some(s) = &sample {
                    let world = transform_point(&frame.camera_to_world, &s.point);
                    self.voxels.insert(self.voxel_key(&world));
                }
                grid.push(sample);
            }
        }

        let samples = grid.iter().filter(|s| s.is_some()).count();
        let mut keyframe = if is_keyframe {
            self.triangulate(frame, &grid, cols, rows)
        } else {
            None
        };
        if let Some(anchor) = keyframe.as_mut() {
            anchor.id = self.next_keyframe_id();
        }

        tracing::trace!(
            timestamp_ns = frame.timestamp_ns,
            samples,
            keyframe = keyframe.is_some(),
            "Integrated depth frame"
        );

        Ok(DepthUpdate {
            coverage: self.coverage(),
            samples,
            keyframe,
        })
    }

    #[inline]
    fn voxel_key(&self, p: &Point3<f32>) -> [i32; 3] {
        [
            (p.x / self.voxel_size).floor() as i32,
            (p.y / self.voxel_size).floor() as i32,
            (p.z / self.voxel_size).floor() as i32,
        ]
    }

    /// Two triangles per grid cell whose four corners are valid, skipping
    /// triangles that span a depth discontinuity.
    fn triangulate(
        &self,
        frame: &DepthFrame,
        grid: &[Option<Sample>],
        cols: usize,
        rows: usize,
    ) -> Option<MeshAnchor> {
        let mut cell_faces: Vec<[usize; 3]> = Vec::new();
        for row in 0..rows.saturating_sub(1) {
            for col in 0..cols.saturating_sub(1) {
                let a = row * cols + col;
                let b = a + 1;
                let c = a + cols;
                let d = c + 1;
                for tri in [[a, c, b], [b, c, d]] {
                    let depths: Option<Vec<f32>> =
                        tri.iter().map(|&i| grid[i].map(|s| s.depth)).collect();
                    let Some(depths) = depths else { continue };
                    let near = depths.iter().copied().fold(f32::INFINITY, f32::min);
                    let far = depths.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    if far - near <= self.discontinuity {
                        cell_faces.push(tri);
                    }
                }
            }
        }

        if cell_faces.is_empty() {
            return None;
        }

        // Keep only samples used by a triangle
        let mut remap: Vec<Option<u32>> = vec![None; grid.len()];
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut faces = Vec::with_capacity(cell_faces.len());
        for tri in &cell_faces {
            let mut face = [0u32; 3];
            for (slot, &cell) in face.iter_mut().zip(tri) {
                let index = match remap[cell] {
                    Some(index) => index,
                    None => {
                        let point = grid[cell]?.point;
                        let index = vertices.len() as u32;
                        vertices.push(point);
                        // Facing the camera at the origin
                        normals.push(
                            (-point.coords)
                                .try_normalize(f32::EPSILON)
                                .unwrap_or_else(Vector3::zeros),
                        );
                        remap[cell] = Some(index);
                        index
                    }
                };
                *slot = index;
            }
            faces.push(face);
        }

        Some(MeshAnchor::new(
            AnchorId::new_v4(),
            frame.camera_to_world,
            vertices,
            normals,
            faces,
        ))
    }
}
