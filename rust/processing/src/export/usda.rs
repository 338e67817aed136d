// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! USD ASCII (`.usda`) encoder
//!
//! One `Xform` root holding a single `Mesh` prim. The stage is Y-up with
//! metres as the unit, which matches AR world space.

use roomscan_geometry::CombinedMesh;
use std::io::{self, Write};

/// Write `items` as a USD array literal, `per_line` items per line
fn write_array<W, T, F>(out: &mut W, items: &[T], per_line: usize, fmt: F) -> io::Result<()>
where
    W: Write,
    F: Fn(&T) -> String,
{
    write!(out, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
            if i % per_line == 0 {
                write!(out, "\n            ")?;
            }
        }
        write!(out, "{}", fmt(item))?;
    }
    write!(out, "]")
}

fn vec3(v: &[f32; 3]) -> String {
    format!("({}, {}, {})", v[0], v[1], v[2])
}

fn triplets(flat: &[f32]) -> Vec<[f32; 3]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

pub fn write<W: Write>(mesh: &CombinedMesh, out: &mut W) -> io::Result<()> {
    let points = triplets(mesh.positions());
    let normals = triplets(mesh.normals());
    let bounds = mesh.bounds();
    let extent = if bounds.is_valid() {
        [
            [bounds.min.x, bounds.min.y, bounds.min.z],
            [bounds.max.x, bounds.max.y, bounds.max.z],
        ]
    } else {
        [[0.0; 3]; 2]
    };

    writeln!(out, "#usda 1.0")?;
    writeln!(out, "(")?;
    writeln!(out, "    defaultPrim = \"RoomScan\"")?;
    writeln!(out, "    metersPerUnit = 1")?;
    writeln!(out, "    upAxis = \"Y\"")?;
    writeln!(out, ")")?;
    writeln!(out)?;
    writeln!(out, "def Xform \"RoomScan\"")?;
    writeln!(out, "{{")?;
    writeln!(out, "    def Mesh \"ScanMesh\"")?;
    writeln!(out, "    {{")?;

    write!(out, "        float3[] extent = ")?;
    write_array(out, &extent, 2, vec3)?;
    writeln!(out)?;

    let counts = vec![3u32; mesh.triangle_count()];
    write!(out, "        int[] faceVertexCounts = ")?;
    write_array(out, &counts, 32, |c| c.to_string())?;
    writeln!(out)?;

    write!(out, "        int[] faceVertexIndices = ")?;
    write_array(out, mesh.indices(), 24, |i| i.to_string())?;
    writeln!(out)?;

    write!(out, "        normal3f[] normals = ")?;
    write_array(out, &normals, 8, vec3)?;
    writeln!(out, " (")?;
    writeln!(out, "            interpolation = \"vertex\"")?;
    writeln!(out, "        )")?;

    write!(out, "        point3f[] points = ")?;
    write_array(out, &points, 8, vec3)?;
    writeln!(out)?;

    writeln!(out, "        uniform token subdivisionScheme = \"none\"")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(())
}
