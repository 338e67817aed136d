// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared transform utilities for anchor geometry
//!
//! AR runtimes hand out local-to-world transforms as column-major 4x4 float
//! matrices. Positions go through the full homogeneous multiply; normals only
//! through the upper-left 3x3 so translation never leaks into them.

use nalgebra::{Matrix4, Point3, Vector3};

/// Build a transform from 16 column-major floats (simd_float4x4 layout)
#[inline]
pub fn from_column_major(values: &[f32; 16]) -> Matrix4<f32> {
    Matrix4::from_column_slice(values)
}

/// Flatten a transform into 16 column-major floats
#[inline]
pub fn to_column_major(transform: &Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    out.copy_from_slice(transform.as_slice());
    out
}

/// Pure translation
#[inline]
pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// True when every matrix entry is finite
#[inline]
pub fn is_finite(transform: &Matrix4<f32>) -> bool {
    transform.iter().all(|v| v.is_finite())
}

/// Transform a local position into world space.
///
/// Homogeneous multiply, keeping x/y/z. No perspective divide: anchor
/// transforms are affine.
#[inline]
pub fn transform_point(transform: &Matrix4<f32>, point: &Point3<f32>) -> Point3<f32> {
    let h = transform * point.to_homogeneous();
    Point3::new(h.x, h.y, h.z)
}

/// Transform a local normal into world space.
///
/// Uses the rotation part only, then re-normalizes. Degenerate normals stay
/// zero instead of turning into NaN.
#[inline]
pub fn transform_normal(transform: &Matrix4<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    let rotation = transform.fixed_view::<3, 3>(0, 0);
    let t = rotation * normal;
    t.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Translation column of a transform
#[inline]
pub fn translation_of(transform: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)])
}
