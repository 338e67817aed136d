// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounds of world-space geometry

use nalgebra::{Point3, Vector3};
use roomscan_core::{BoundingBox3, RoomDimensions};

/// Axis-aligned bounding box in f32 world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Create bounds initialized to an inverted (invalid) state
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Bounds of a point set, invalid when the iterator is empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, p: &Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand bounds to include another box
    #[inline]
    pub fn union(&mut self, other: &Aabb) {
        if other.is_valid() {
            self.expand(&other.min);
            self.expand(&other.max);
        }
    }

    /// True when `other` lies entirely inside these bounds
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    /// Center of the box (origin when invalid)
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        if !self.is_valid() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent per axis (zero when invalid)
    #[inline]
    pub fn extent(&self) -> Vector3<f32> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    pub fn dimensions(&self) -> RoomDimensions {
        let e = self.extent();
        RoomDimensions {
            width: e.x,
            height: e.y,
            length: e.z,
        }
    }

    pub fn to_bounding_box(&self) -> BoundingBox3 {
        if !self.is_valid() {
            return BoundingBox3::new([0.0; 3], [0.0; 3]);
        }
        BoundingBox3::new(
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.max.y, self.max.z],
        )
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
