// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh anchors as delivered by the AR runtime

use crate::error::{Error, Result};
use crate::transform;
use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_core::AnchorId;

/// One spatial region's reconstructed geometry.
///
/// Vertices, normals and faces are in the anchor's local frame; `transform`
/// maps them to world space. Face indices address this anchor's own vertex
/// list. `classifications` holds one raw semantic byte per face when the
/// runtime's scene understanding is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAnchor {
    pub id: AnchorId,
    /// Local-to-world transform
    pub transform: Matrix4<f32>,
    pub vertices: Vec<Point3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<[u32; 3]>,
    pub classifications: Option<Vec<u8>>,
}

impl MeshAnchor {
    /// Create an unclassified anchor
    pub fn new(
        id: AnchorId,
        transform: Matrix4<f32>,
        vertices: Vec<Point3<f32>>,
        normals: Vec<Vector3<f32>>,
        faces: Vec<[u32; 3]>,
    ) -> Self {
        Self {
            id,
            transform,
            vertices,
            normals,
            faces,
            classifications: None,
        }
    }

    /// Attach per-face classification bytes
    pub fn with_classifications(mut self, classifications: Vec<u8>) -> Self {
        self.classifications = Some(classifications);
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Check the geometry invariants the merge relies on.
    ///
    /// Classification data is not checked here; see
    /// [`classification_data`](Self::classification_data).
    pub fn validate(&self) -> Result<()> {
        if !transform::is_finite(&self.transform) {
            return Err(Error::invalid_anchor(self.id, "transform has non-finite entries"));
        }
        if self.normals.len() != self.vertices.len() {
            return Err(Error::invalid_anchor(
                self.id,
                format!(
                    "{} normals for {} vertices",
                    self.normals.len(),
                    self.vertices.len()
                ),
            ));
        }
        if let Some(i) = self
            .vertices
            .iter()
            .position(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
        {
            return Err(Error::invalid_anchor(self.id, format!("vertex {} is not finite", i)));
        }
        let count = self.vertices.len();
        if let Some(face) = self
            .faces
            .iter()
            .position(|f| f.iter().any(|&i| i as usize >= count))
        {
            return Err(Error::invalid_anchor(
                self.id,
                format!("face {} references a vertex outside 0..{}", face, count),
            ));
        }
        Ok(())
    }

    /// Per-face classification bytes, `None` when absent or when the buffer
    /// does not line up with the face list.
    pub fn classification_data(&self) -> Option<&[u8]> {
        match &self.classifications {
            Some(classes) if classes.len() == self.faces.len() && !classes.is_empty() => {
                Some(classes.as_slice())
            }
            _ => None,
        }
    }

    /// World-space position of vertex `index`
    #[inline]
    pub fn world_vertex(&self, index: usize) -> Option<Point3<f32>> {
        self.vertices
            .get(index)
            .map(|p| transform::transform_point(&self.transform, p))
    }
}

impl AsRef<MeshAnchor> for MeshAnchor {
    fn as_ref(&self) -> &MeshAnchor {
        self
    }
}
