// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary glTF 2.0 (GLB) encoder
//!
//! Layout: 12-byte header, JSON chunk padded with spaces, BIN chunk padded
//! with zeros. The BIN chunk holds positions, then normals, then u32
//! indices, each block already 4-byte aligned.

use roomscan_geometry::CombinedMesh;
use serde_json::{json, Value};
use std::io::{self, Write};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_POINTS: u32 = 0;
const MODE_TRIANGLES: u32 = 4;

#[inline]
fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn document(mesh: &CombinedMesh, bin_len: usize) -> Value {
    let vertex_count = mesh.vertex_count();
    let vec3_bytes = vertex_count * 12;
    let index_bytes = mesh.indices().len() * 4;

    let bounds = mesh.bounds();
    let (min, max) = if bounds.is_valid() {
        (
            [bounds.min.x, bounds.min.y, bounds.min.z],
            [bounds.max.x, bounds.max.y, bounds.max.z],
        )
    } else {
        ([0.0; 3], [0.0; 3])
    };

    let mut buffer_views = vec![
        json!({
            "buffer": 0,
            "byteOffset": 0,
            "byteLength": vec3_bytes,
            "target": TARGET_ARRAY_BUFFER,
        }),
        json!({
            "buffer": 0,
            "byteOffset": vec3_bytes,
            "byteLength": vec3_bytes,
            "target": TARGET_ARRAY_BUFFER,
        }),
    ];
    let mut accessors = vec![
        json!({
            "bufferView": 0,
            "componentType": COMPONENT_FLOAT,
            "count": vertex_count,
            "type": "VEC3",
            "min": min,
            "max": max,
        }),
        json!({
            "bufferView": 1,
            "componentType": COMPONENT_FLOAT,
            "count": vertex_count,
            "type": "VEC3",
        }),
    ];

    let mut primitive = json!({
        "attributes": { "POSITION": 0, "NORMAL": 1 },
        "mode": MODE_POINTS,
    });

    if index_bytes > 0 {
        buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": vec3_bytes * 2,
            "byteLength": index_bytes,
            "target": TARGET_ELEMENT_ARRAY_BUFFER,
        }));
        accessors.push(json!({
            "bufferView": 2,
            "componentType": COMPONENT_UNSIGNED_INT,
            "count": mesh.indices().len(),
            "type": "SCALAR",
        }));
        primitive["indices"] = json!(2);
        primitive["mode"] = json!(MODE_TRIANGLES);
    }

    json!({
        "asset": { "version": "2.0", "generator": concat!("roomscan ", env!("CARGO_PKG_VERSION")) },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "RoomScan" }],
        "meshes": [{ "name": "ScanMesh", "primitives": [primitive] }],
        "buffers": [{ "byteLength": bin_len }],
        "bufferViews": buffer_views,
        "accessors": accessors,
    })
}

/// Write `mesh` as a GLB container
pub fn write<W: Write>(mesh: &CombinedMesh, out: &mut W) -> io::Result<()> {
    let bin_len = (mesh.positions().len() + mesh.normals().len() + mesh.indices().len()) * 4;

    let json = serde_json::to_vec(&document(mesh, bin_len))?;
    let json_len = padded(json.len());
    let total = 12 + 8 + json_len + 8 + bin_len;
    let total = u32::try_from(total)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "mesh too large for GLB"))?;

    out.write_all(&GLB_MAGIC.to_le_bytes())?;
    out.write_all(&GLB_VERSION.to_le_bytes())?;
    out.write_all(&total.to_le_bytes())?;

    out.write_all(&(json_len as u32).to_le_bytes())?;
    out.write_all(&CHUNK_JSON.to_le_bytes())?;
    out.write_all(&json)?;
    out.write_all(&b"   "[..json_len - json.len()])?;

    out.write_all(&(bin_len as u32).to_le_bytes())?;
    out.write_all(&CHUNK_BIN.to_le_bytes())?;
    for value in mesh.positions().iter().chain(mesh.normals()) {
        out.write_all(&value.to_le_bytes())?;
    }
    for index in mesh.indices() {
        out.write_all(&index.to_le_bytes())?;
    }
    Ok(())
}
