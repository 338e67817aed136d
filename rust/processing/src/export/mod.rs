// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh export
//!
//! Encoders stream a [`CombinedMesh`] into any `io::Write`. [`MeshExporter`]
//! places the result in its export directory under a unique file name.

pub mod glb;
pub mod obj;
pub mod usda;

use crate::error::{Error, Result};
use roomscan_core::{ExportFormat, ExportedMesh};
use roomscan_geometry::CombinedMesh;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Encode `mesh` in `format` into `out`
pub fn write_mesh<W: Write>(
    mesh: &CombinedMesh,
    format: ExportFormat,
    out: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Glb => glb::write(mesh, out),
        ExportFormat::Usda => usda::write(mesh, out),
        ExportFormat::Obj => obj::write(mesh, out),
    }
}

/// Encode `mesh` in memory
pub fn encode(mesh: &CombinedMesh, format: ExportFormat) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_mesh(mesh, format, &mut bytes)?;
    Ok(bytes)
}

/// Milliseconds since the Unix epoch (0 if the clock is before it)
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `room-scan-<unix-ms>-<uuid>.<ext>`
pub fn unique_file_name(format: ExportFormat) -> String {
    format!(
        "room-scan-{}-{}.{}",
        unix_millis(),
        Uuid::new_v4(),
        format.extension()
    )
}

/// Writes meshes into one directory
#[derive(Debug, Clone)]
pub struct MeshExporter {
    dir: PathBuf,
}

impl MeshExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `mesh` to a new file. The directory is created when missing.
    pub fn export(&self, mesh: &CombinedMesh, format: ExportFormat) -> Result<ExportedMesh> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::Export {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(unique_file_name(format));
        let byte_len = write_file(&path, mesh, format).map_err(|source| Error::Export {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            %format,
            byte_len,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Exported mesh"
        );

        Ok(ExportedMesh {
            path,
            format,
            byte_len,
        })
    }
}

fn write_file(path: &Path, mesh: &CombinedMesh, format: ExportFormat) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    write_mesh(mesh, format, &mut out)?;
    let file = out.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use roomscan_core::AnchorId;
    use roomscan_geometry::transform::translation;
    use roomscan_geometry::{merge_anchors, Matrix4, MeshAnchor, Point3, Vector3};

    /// Quad at the origin plus a triangle shifted 10 along x
    pub(crate) fn two_anchor_mesh() -> CombinedMesh {
        let quad = MeshAnchor::new(
            AnchorId::from_u128(1),
            Matrix4::identity(),
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![Vector3::z(); 4],
            vec![[0, 1, 2], [1, 2, 3]],
        );
        let triangle = MeshAnchor::new(
            AnchorId::from_u128(2),
            translation(10.0, 0.0, 0.0),
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Vector3::z(); 3],
            vec![[0, 1, 2]],
        );
        merge_anchors(&[quad, triangle]).unwrap()
    }

    #[test]
    fn test_unique_file_names() {
        let a = unique_file_name(ExportFormat::Glb);
        let b = unique_file_name(ExportFormat::Glb);
        assert_ne!(a, b);
        assert!(a.starts_with("room-scan-"));
        assert!(a.ends_with(".glb"));
        assert!(unique_file_name(ExportFormat::Obj).ends_with(".obj"));
    }

    #[test]
    fn test_export_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = MeshExporter::new(tmp.path().join("nested").join("scans"));
        let mesh = two_anchor_mesh();

        for format in [ExportFormat::Glb, ExportFormat::Usda, ExportFormat::Obj] {
            let exported = exporter.export(&mesh, format).unwrap();
            assert!(exported.path.starts_with(exporter.dir()));
            assert_eq!(exported.format, format);
            let on_disk = std::fs::read(&exported.path).unwrap();
            assert_eq!(on_disk.len() as u64, exported.byte_len);
            assert_eq!(on_disk, encode(&mesh, format).unwrap());
        }
    }

    #[test]
    fn test_export_failure_is_retryable() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the directory should be
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();

        let exporter = MeshExporter::new(&blocker);
        let err = exporter.export(&two_anchor_mesh(), ExportFormat::Obj).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
        assert!(err.is_retryable());
    }
}
