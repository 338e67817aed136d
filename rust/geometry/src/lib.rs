// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan Geometry
//!
//! World-space reconstruction of scanned rooms: per-anchor transforms with
//! nalgebra, order-preserving parallel merging with rayon, bounding boxes and
//! floor-plan projection.

pub mod anchor;
pub mod bounds;
pub mod error;
pub mod floor_plan;
pub mod merge;
pub mod mesh;
pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};

pub use anchor::MeshAnchor;
pub use bounds::Aabb;
pub use error::{Error, Result};
pub use floor_plan::{bounding_quad, build_floor_plan, convex_hull, outline, project_to_plan};
pub use merge::merge_anchors;
pub use mesh::CombinedMesh;
