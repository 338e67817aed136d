// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recognized objects

use crate::id::AnchorId;
use crate::label::{ObjectCategory, SemanticLabel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox3 {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox3 {
    #[inline]
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Center of the box
    #[inline]
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Extent per axis (max - min)
    #[inline]
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// One semantically meaningful item detected during the scan
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecognizedObject {
    pub label: SemanticLabel,
    pub category: ObjectCategory,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// World-space centroid
    pub centroid: [f32; 3],
    /// World-space bounds of the supporting geometry
    pub bounds: BoundingBox3,
    /// Raw classification byte the object was derived from
    pub classification: u8,
    /// Number of triangles supporting the detection
    pub support: usize,
    /// Anchor (or plane) the detection came from
    pub source: AnchorId,
}

impl RecognizedObject {
    /// Euclidean distance between centroids
    #[inline]
    pub fn centroid_distance(&self, other: &RecognizedObject) -> f32 {
        let dx = self.centroid[0] - other.centroid[0];
        let dy = self.centroid[1] - other.centroid[1];
        let dz = self.centroid[2] - other.centroid[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Same label and centroids closer than `threshold`
    #[inline]
    pub fn is_duplicate_of(&self, other: &RecognizedObject, threshold: f32) -> bool {
        self.label == other.label && self.centroid_distance(other) < threshold
    }

    /// True when this detection should replace `other` in a dedup pass:
    /// larger support wins, confidence breaks support ties.
    #[inline]
    pub fn outranks(&self, other: &RecognizedObject) -> bool {
        self.support > other.support
            || (self.support == other.support && self.confidence > other.confidence)
    }
}
