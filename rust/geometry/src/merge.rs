// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh merge engine
//!
//! Combines every anchor of a scan into one world-space mesh. Transforming
//! vertices is independent per anchor and runs on the rayon pool; the
//! concatenation that rebases indices stays sequential so output order always
//! matches anchor order.

use crate::anchor::MeshAnchor;
use crate::bounds::Aabb;
use crate::error::{Error, Result};
use crate::mesh::CombinedMesh;
use crate::transform::{transform_normal, transform_point};
use rayon::prelude::*;

/// One anchor's vertices after the world transform
struct TransformedBlock<'a> {
    positions: Vec<f32>,
    normals: Vec<f32>,
    faces: &'a [[u32; 3]],
    bounds: Aabb,
}

fn transform_block(anchor: &MeshAnchor) -> TransformedBlock<'_> {
    let mut positions = Vec::with_capacity(anchor.vertices.len() * 3);
    let mut normals = Vec::with_capacity(anchor.normals.len() * 3);
    let mut bounds = Aabb::empty();

    for vertex in &anchor.vertices {
        let p = transform_point(&anchor.transform, vertex);
        bounds.expand(&p);
        positions.extend_from_slice(&[p.x, p.y, p.z]);
    }

    // Transform normals (without translation)
    for normal in &anchor.normals {
        let n = transform_normal(&anchor.transform, normal);
        normals.extend_from_slice(&[n.x, n.y, n.z]);
    }

    TransformedBlock {
        positions,
        normals,
        faces: &anchor.faces,
        bounds,
    }
}

/// Merge anchors into one mesh, in the given order.
///
/// Each anchor's indices are shifted by the number of vertices of all
/// anchors before it. Fails with [`Error::EmptyMesh`] when there is nothing
/// to merge and [`Error::IndexOverflow`] when the result would not fit u32
/// indices.
pub fn merge_anchors<A>(anchors: &[A]) -> Result<CombinedMesh>
where
    A: AsRef<MeshAnchor> + Sync,
{
    if anchors.is_empty() {
        return Err(Error::EmptyMesh("no anchors captured".to_string()));
    }

    let total_vertices: usize = anchors.iter().map(|a| a.as_ref().vertex_count()).sum();
    let total_indices: usize = anchors.iter().map(|a| a.as_ref().triangle_count() * 3).sum();

    if total_vertices == 0 {
        return Err(Error::EmptyMesh(format!(
            "{} anchors without vertices",
            anchors.len()
        )));
    }
    if total_vertices > u32::MAX as usize {
        return Err(Error::IndexOverflow(total_vertices));
    }

    // par_iter + collect keeps the input order
    let blocks: Vec<TransformedBlock<'_>> = anchors
        .par_iter()
        .map(|a| transform_block(a.as_ref()))
        .collect();

    let mut mesh = CombinedMesh::with_capacity(total_vertices, total_indices);
    let mut vertex_offset: u32 = 0;
    for block in &blocks {
        mesh.append(
            &block.positions,
            &block.normals,
            block.faces,
            vertex_offset,
            &block.bounds,
        );
        vertex_offset += (block.positions.len() / 3) as u32;
    }

    Ok(mesh)
}
