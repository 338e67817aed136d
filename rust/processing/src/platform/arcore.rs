// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ARCore frame types: depth images and detected planes.

use crate::error::{Error, Result};
use nalgebra::{Matrix4, Point3};
use roomscan_core::{AnchorId, SemanticLabel};
use roomscan_geometry::transform::transform_point;

/// Pinhole intrinsics of the depth image, in depth-image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// One depth image (`DEPTH16`-style millimetres, 0 = no data)
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: usize,
    pub height: usize,
    /// Row-major depth in millimetres
    pub depth_mm: Vec<u16>,
    /// Optional per-pixel confidence, 0 = unusable
    pub confidence: Option<Vec<u8>>,
    pub intrinsics: CameraIntrinsics,
    /// Camera pose: camera space to world space
    pub camera_to_world: Matrix4<f32>,
    pub timestamp_ns: u64,
}

impl DepthFrame {
    pub fn validate(&self) -> Result<()> {
        const WHAT: &str = "depth frame";

        let pixels = self
            .width
            .checked_mul(self.height)
            .ok_or_else(|| Error::decode(WHAT, "image size overflows"))?;
        if pixels == 0 {
            return Err(Error::decode(WHAT, "empty image"));
        }
        if self.depth_mm.len() != pixels {
            return Err(Error::decode(
                WHAT,
                format!("{} depth samples for {}x{}", self.depth_mm.len(), self.width, self.height),
            ));
        }
        if let Some(conf) = &self.confidence {
            if conf.len() != pixels {
                return Err(Error::decode(
                    WHAT,
                    format!("{} confidence samples for {} pixels", conf.len(), pixels),
                ));
            }
        }
        let k = &self.intrinsics;
        if !(k.fx.is_finite() && k.fy.is_finite() && k.fx != 0.0 && k.fy != 0.0) {
            return Err(Error::decode(WHAT, "focal length must be finite and non-zero"));
        }
        if !roomscan_geometry::transform::is_finite(&self.camera_to_world) {
            return Err(Error::decode(WHAT, "camera pose has non-finite entries"));
        }
        Ok(())
    }

    /// Depth in metres at pixel `(u, v)`, `None` when missing or marked
    /// unusable by the confidence image
    #[inline]
    pub fn depth_m(&self, u: usize, v: usize) -> Option<f32> {
        if u >= self.width || v >= self.height {
            return None;
        }
        let i = v * self.width + u;
        if let Some(conf) = &self.confidence {
            if conf.get(i).copied().unwrap_or(0) == 0 {
                return None;
            }
        }
        match self.depth_mm.get(i).copied() {
            Some(0) | None => None,
            Some(mm) => Some(mm as f32 / 1000.0),
        }
    }

    /// Back-project pixel `(u, v)` at `depth` metres into camera space.
    ///
    /// Camera space follows the AR convention: +X right, +Y up, looking
    /// down -Z. Image rows grow downwards.
    #[inline]
    pub fn unproject(&self, u: usize, v: usize, depth: f32) -> Point3<f32> {
        let k = &self.intrinsics;
        Point3::new(
            (u as f32 - k.cx) * depth / k.fx,
            -(v as f32 - k.cy) * depth / k.fy,
            -depth,
        )
    }
}

/// A detected plane (floor, wall, table top...)
#[derive(Debug, Clone)]
pub struct PlaneObservation {
    pub id: AnchorId,
    pub label: SemanticLabel,
    /// Plane-local to world; the plane lies in local XZ
    pub center_pose: Matrix4<f32>,
    /// Boundary polygon as local `(x, z)` pairs
    pub polygon: Vec<[f32; 2]>,
}

impl PlaneObservation {
    /// Boundary polygon in world space, non-finite vertices dropped
    pub fn world_polygon(&self) -> Vec<Point3<f32>> {
        self.polygon
            .iter()
            .map(|&[x, z]| transform_point(&self.center_pose, &Point3::new(x, 0.0, z)))
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
            .collect()
    }
}
