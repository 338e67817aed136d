// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ARKit mesh anchor decoding
//!
//! Scene reconstruction hands out geometry as raw Metal buffers described by
//! `(count, stride, offset, components)`. Everything here reads those buffers
//! with explicit bounds checks; a short buffer is a decode error, never a
//! panic. Values are little-endian.

use crate::error::{Error, Result};
use roomscan_core::AnchorId;
use roomscan_geometry::{Matrix4, MeshAnchor, Point3, Vector3};
use uuid::Uuid;

/// Strided per-element buffer (vertices, normals, classification)
#[derive(Debug, Clone, Copy)]
pub struct GeometrySource<'a> {
    pub buffer: &'a [u8],
    /// Number of elements
    pub count: usize,
    /// Byte offset of the first element
    pub offset: usize,
    /// Bytes between consecutive elements
    pub stride: usize,
    /// Scalars per element
    pub components: usize,
}

impl<'a> GeometrySource<'a> {
    /// Bytes of element `index`, `width` bytes long
    fn element(&self, index: usize, width: usize, what: &'static str) -> Result<&'a [u8]> {
        let start = index
            .checked_mul(self.stride)
            .and_then(|s| s.checked_add(self.offset))
            .ok_or_else(|| Error::decode(what, "element offset overflows"))?;
        let end = start
            .checked_add(width)
            .ok_or_else(|| Error::decode(what, "element offset overflows"))?;
        self.buffer.get(start..end).ok_or_else(|| {
            Error::decode(
                what,
                format!(
                    "element {} needs bytes {}..{}, buffer has {}",
                    index,
                    start,
                    end,
                    self.buffer.len()
                ),
            )
        })
    }

    /// Read `count` float3 elements
    pub fn read_float3(&self, what: &'static str) -> Result<Vec<[f32; 3]>> {
        if self.components != 3 {
            return Err(Error::decode(
                what,
                format!("expected 3 components, got {}", self.components),
            ));
        }
        if self.stride < 12 {
            return Err(Error::decode(what, format!("stride {} is below 12", self.stride)));
        }
        (0..self.count)
            .map(|i| {
                let bytes = self.element(i, 12, what)?;
                Ok([
                    read_f32(&bytes[0..4]),
                    read_f32(&bytes[4..8]),
                    read_f32(&bytes[8..12]),
                ])
            })
            .collect()
    }

    /// Read `count` single-byte elements
    pub fn read_u8(&self, what: &'static str) -> Result<Vec<u8>> {
        if self.components != 1 {
            return Err(Error::decode(
                what,
                format!("expected 1 component, got {}", self.components),
            ));
        }
        (0..self.count)
            .map(|i| self.element(i, 1, what).map(|bytes| bytes[0]))
            .collect()
    }
}

#[inline]
fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Packed primitive index buffer
#[derive(Debug, Clone, Copy)]
pub struct GeometryElement<'a> {
    pub buffer: &'a [u8],
    /// Number of primitives
    pub count: usize,
    /// 2 (u16) or 4 (u32)
    pub bytes_per_index: usize,
    pub indices_per_primitive: usize,
}

impl GeometryElement<'_> {
    pub fn read_triangles(&self) -> Result<Vec<[u32; 3]>> {
        const WHAT: &str = "faces";

        if self.indices_per_primitive != 3 {
            return Err(Error::decode(
                WHAT,
                format!("{} indices per primitive", self.indices_per_primitive),
            ));
        }
        let width = self.bytes_per_index;
        if width != 2 && width != 4 {
            return Err(Error::decode(WHAT, format!("{}-byte indices", width)));
        }
        let needed = self
            .count
            .checked_mul(3 * width)
            .ok_or_else(|| Error::decode(WHAT, "face buffer size overflows"))?;
        let data = self.buffer.get(..needed).ok_or_else(|| {
            Error::decode(
                WHAT,
                format!(
                    "{} faces need {} bytes, buffer has {}",
                    self.count,
                    needed,
                    self.buffer.len()
                ),
            )
        })?;

        let index = |bytes: &[u8]| -> u32 {
            if width == 2 {
                u16::from_le_bytes([bytes[0], bytes[1]]) as u32
            } else {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
        };

        Ok(data
            .chunks_exact(3 * width)
            .map(|face| {
                [
                    index(&face[..width]),
                    index(&face[width..2 * width]),
                    index(&face[2 * width..]),
                ]
            })
            .collect())
    }
}

/// One `ARMeshAnchor` as it arrives from the runtime
#[derive(Debug, Clone)]
pub struct RawMeshAnchor<'a> {
    pub identifier: Uuid,
    /// Column-major local-to-world transform
    pub transform: [f32; 16],
    pub vertices: GeometrySource<'a>,
    pub normals: GeometrySource<'a>,
    pub faces: GeometryElement<'a>,
    /// Per-face classification, present when scene understanding is on
    pub classification: Option<GeometrySource<'a>>,
}

impl RawMeshAnchor<'_> {
    /// Decode into an owned [`MeshAnchor`].
    ///
    /// Vertex, normal and face buffers must decode. A broken classification
    /// buffer only drops classification for this anchor.
    pub fn decode(&self) -> Result<MeshAnchor> {
        let id = AnchorId::from_uuid(self.identifier);

        let vertices = self
            .vertices
            .read_float3("vertices")?
            .into_iter()
            .map(|[x, y, z]| Point3::new(x, y, z))
            .collect();
        let normals = self
            .normals
            .read_float3("normals")?
            .into_iter()
            .map(|[x, y, z]| Vector3::new(x, y, z))
            .collect();
        let faces = self.faces.read_triangles()?;

        let anchor = MeshAnchor::new(
            id,
            roomscan_geometry::transform::from_column_major(&self.transform),
            vertices,
            normals,
            faces,
        );

        match self.classification.as_ref().map(|c| c.read_u8("classification")) {
            Some(Ok(classes)) => Ok(anchor.with_classifications(classes)),
            Some(Err(err)) => {
                tracing::debug!(anchor = %id, error = %err, "Dropping unreadable classification");
                Ok(anchor)
            }
            None => Ok(anchor),
        }
    }
}

/// Identity transform in the column-major layout ARKit uses
pub const IDENTITY_TRANSFORM: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Convenience for adapters holding an nalgebra matrix already
pub fn transform_to_raw(matrix: &Matrix4<f32>) -> [f32; 16] {
    roomscan_geometry::transform::to_column_major(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_read_strided_float3() {
        // 16-byte stride with 4 bytes of padding per vertex, 8-byte header
        let mut buffer = vec![0xAA; 8];
        for v in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]] {
            buffer.extend(floats(&v));
            buffer.extend([0u8; 4]);
        }
        let source = GeometrySource {
            buffer: &buffer,
            count: 2,
            offset: 8,
            stride: 16,
            components: 3,
        };
        assert_eq!(
            source.read_float3("vertices").unwrap(),
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn test_short_buffer_is_error() {
        let buffer = floats(&[1.0, 2.0, 3.0, 4.0]);
        let source = GeometrySource {
            buffer: &buffer,
            count: 2,
            offset: 0,
            stride: 12,
            components: 3,
        };
        assert!(matches!(
            source.read_float3("vertices"),
            Err(Error::BufferDecode { what: "vertices", .. })
        ));
    }

    #[test]
    fn test_read_u16_and_u32_faces() {
        let short: Vec<u8> = [0u16, 1, 2, 2, 1, 3].iter().flat_map(|i| i.to_le_bytes()).collect();
        let element = GeometryElement {
            buffer: &short,
            count: 2,
            bytes_per_index: 2,
            indices_per_primitive: 3,
        };
        assert_eq!(element.read_triangles().unwrap(), vec![[0, 1, 2], [2, 1, 3]]);

        let wide: Vec<u8> = [7u32, 70_000, 9].iter().flat_map(|i| i.to_le_bytes()).collect();
        let element = GeometryElement {
            buffer: &wide,
            count: 1,
            bytes_per_index: 4,
            indices_per_primitive: 3,
        };
        assert_eq!(element.read_triangles().unwrap(), vec![[7, 70_000, 9]]);
    }

    #[test]
    fn test_unsupported_face_layout() {
        let element = GeometryElement {
            buffer: &[0u8; 12],
            count: 1,
            bytes_per_index: 1,
            indices_per_primitive: 3,
        };
        assert!(element.read_triangles().is_err());
    }

    #[test]
    fn test_decode_anchor() {
        let vertices = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let normals = floats(&[0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        let faces: Vec<u8> = [0u32, 1, 2].iter().flat_map(|i| i.to_le_bytes()).collect();
        let classes = [2u8];

        let mut transform = IDENTITY_TRANSFORM;
        transform[13] = 1.5; // translate y

        let raw = RawMeshAnchor {
            identifier: Uuid::from_u128(42),
            transform,
            vertices: GeometrySource {
                buffer: &vertices,
                count: 3,
                offset: 0,
                stride: 12,
                components: 3,
            },
            normals: GeometrySource {
                buffer: &normals,
                count: 3,
                offset: 0,
                stride: 12,
                components: 3,
            },
            faces: GeometryElement {
                buffer: &faces,
                count: 1,
                bytes_per_index: 4,
                indices_per_primitive: 3,
            },
            classification: Some(GeometrySource {
                buffer: &classes,
                count: 1,
                offset: 0,
                stride: 1,
                components: 1,
            }),
        };

        let anchor = raw.decode().unwrap();
        assert_eq!(anchor.id, AnchorId::from_u128(42));
        assert_eq!(anchor.vertex_count(), 3);
        assert_eq!(anchor.faces, vec![[0, 1, 2]]);
        assert_eq!(anchor.classification_data(), Some(&[2u8][..]));
        assert_eq!(anchor.world_vertex(1), Some(Point3::new(1.0, 1.5, 0.0)));
        assert!(anchor.validate().is_ok());
    }

    #[test]
    fn test_broken_classification_is_dropped() {
        let vertices = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let faces: Vec<u8> = [0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()).collect();
        let source = GeometrySource {
            buffer: &vertices,
            count: 3,
            offset: 0,
            stride: 12,
            components: 3,
        };
        let raw = RawMeshAnchor {
            identifier: Uuid::from_u128(1),
            transform: IDENTITY_TRANSFORM,
            vertices: source,
            normals: source,
            faces: GeometryElement {
                buffer: &faces,
                count: 1,
                bytes_per_index: 2,
                indices_per_primitive: 3,
            },
            classification: Some(GeometrySource {
                buffer: &[],
                count: 1,
                offset: 0,
                stride: 1,
                components: 1,
            }),
        };
        let anchor = raw.decode().unwrap();
        assert!(anchor.classifications.is_none());
    }

    #[test]
    fn test_transform_round_trip_layout() {
        let matrix = roomscan_geometry::transform::translation(1.0, 2.0, 3.0);
        let raw = transform_to_raw(&matrix);
        assert_eq!(&raw[12..15], &[1.0, 2.0, 3.0]);
    }
}
