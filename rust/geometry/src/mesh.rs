// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::bounds::Aabb;
use nalgebra::{Point3, Vector3};
use roomscan_core::RoomDimensions;

/// Merged world-space triangle mesh of a whole scan.
///
/// Buffers are flat (x, y, z) triplets so exporters can hand them to binary
/// formats without repacking. The mesh is built once by
/// [`merge_anchors`](crate::merge::merge_anchors) and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct CombinedMesh {
    /// Vertex positions (x, y, z)
    positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    indices: Vec<u32>,
    bounds: Aabb,
}

impl CombinedMesh {
    /// Create a mesh with capacity
    pub(crate) fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
            bounds: Aabb::empty(),
        }
    }

    /// Append an already transformed vertex block and its rebased indices
    #[inline]
    pub(crate) fn append(
        &mut self,
        positions: &[f32],
        normals: &[f32],
        faces: &[[u32; 3]],
        vertex_offset: u32,
        bounds: &Aabb,
    ) {
        self.positions.extend_from_slice(positions);
        self.normals.extend_from_slice(normals);
        self.indices.extend(
            faces
                .iter()
                .flat_map(|face| face.iter().map(move |&i| i + vertex_offset)),
        );
        self.bounds.union(bounds);
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// World-space bounds of all vertices
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Room width/length/height from the bounding box
    #[inline]
    pub fn dimensions(&self) -> RoomDimensions {
        self.bounds.dimensions()
    }

    /// Position of vertex `index`
    #[inline]
    pub fn vertex(&self, index: usize) -> Option<Point3<f32>> {
        let chunk = self.positions.get(index * 3..index * 3 + 3)?;
        Some(Point3::new(chunk[0], chunk[1], chunk[2]))
    }

    /// Normal of vertex `index`
    #[inline]
    pub fn normal(&self, index: usize) -> Option<Vector3<f32>> {
        let chunk = self.normals.get(index * 3..index * 3 + 3)?;
        Some(Vector3::new(chunk[0], chunk[1], chunk[2]))
    }

    /// Iterate triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
    }

    /// True when every index addresses an existing vertex
    pub fn indices_in_range(&self) -> bool {
        let count = self.vertex_count();
        self.indices.iter().all(|&i| (i as usize) < count)
    }
}
