// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ encoder (positions, normals, faces; no materials)

use roomscan_geometry::CombinedMesh;
use std::io::{self, Write};

pub fn write<W: Write>(mesh: &CombinedMesh, out: &mut W) -> io::Result<()> {
    writeln!(out, "# RoomScan mesh")?;
    writeln!(
        out,
        "# {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;
    writeln!(out, "o ScanMesh")?;

    for v in mesh.positions().chunks_exact(3) {
        writeln!(out, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for n in mesh.normals().chunks_exact(3) {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    // OBJ indices are 1-based; normals share the vertex index
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a as u64 + 1, b as u64 + 1, c as u64 + 1);
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::two_anchor_mesh;

    #[test]
    fn test_obj_listing() {
        let mut bytes = Vec::new();
        write(&two_anchor_mesh(), &mut bytes).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 7);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 7);
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 3);
        assert_eq!(faces[0], "f 1//1 2//2 3//3");
        assert_eq!(faces[2], "f 5//5 6//6 7//7");
        assert!(text.contains("v 11 0 0"));
    }
}
