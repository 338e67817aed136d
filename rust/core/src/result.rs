// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan result types

use crate::label::SemanticLabel;
use crate::object::RecognizedObject;
use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Room extents derived from the merged mesh bounds (Y-up world space)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoomDimensions {
    /// X extent
    pub width: f32,
    /// Z extent
    pub length: f32,
    /// Y extent
    pub height: f32,
}

impl RoomDimensions {
    /// Build from bounding box corners (max - min per axis)
    pub fn from_extent(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            width: max[0] - min[0],
            height: max[1] - min[1],
            length: max[2] - min[2],
        }
    }

    /// Footprint area in square units
    #[inline]
    pub fn floor_area(&self) -> f32 {
        self.width * self.length
    }
}

/// Point on the floor plan. `y` carries the world `z` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloorPlanPoint {
    pub x: f32,
    pub y: f32,
}

impl FloorPlanPoint {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &FloorPlanPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Straight wall segment on the floor plan
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallSegment {
    pub start: FloorPlanPoint,
    pub end: FloorPlanPoint,
}

impl WallSegment {
    pub fn length(&self) -> f32 {
        self.start.distance_to(&self.end)
    }
}

/// Door or window placed on the floor plan
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanOpening {
    pub label: SemanticLabel,
    pub position: FloorPlanPoint,
    /// Larger horizontal extent of the detection
    pub width: f32,
}

/// Simplified room footprint
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloorPlan {
    /// Closed outline, counter-clockwise
    pub outline: Vec<FloorPlanPoint>,
    pub walls: Vec<WallSegment>,
    pub openings: Vec<PlanOpening>,
    /// X extent of the outline
    pub width: f32,
    /// Plan-Y (world Z) extent of the outline
    pub length: f32,
}

impl FloorPlan {
    /// Outline area using the shoelace formula
    pub fn area(&self) -> f32 {
        let n = self.outline.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area = 0.0f32;
        for i in 0..n {
            let a = self.outline[i];
            let b = self.outline[(i + 1) % n];
            twice_area += a.x * b.y - b.x * a.y;
        }
        (twice_area * 0.5).abs()
    }
}

/// Interchange format for exported meshes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum ExportFormat {
    /// Binary glTF scene
    #[default]
    Glb,
    /// ASCII USD scene
    Usda,
    /// Wavefront OBJ vertex/face listing
    Obj,
}

impl ExportFormat {
    /// Parse a format name, `None` when unrecognized
    pub fn try_from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "glb" | "gltf" | "binary-scene" => Some(ExportFormat::Glb),
            "usd" | "usda" | "usdz" | "usd-scene" => Some(ExportFormat::Usda),
            "obj" | "txt" | "text-scene" => Some(ExportFormat::Obj),
            _ => None,
        }
    }

    /// Parse a format name, falling back to [`ExportFormat::Glb`]
    pub fn from_name(name: &str) -> Self {
        match Self::try_from_name(name) {
            Some(format) => format,
            None => ExportFormat::default(),
        }
    }

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Glb => "glb",
            ExportFormat::Usda => "usda",
            ExportFormat::Obj => "obj",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Glb => "model/gltf-binary",
            ExportFormat::Usda => "model/vnd.usda",
            ExportFormat::Obj => "model/obj",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Handle to an exported mesh file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportedMesh {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub byte_len: u64,
}

/// Terminal artifact of a completed scan
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanResult {
    pub mesh: ExportedMesh,
    pub dimensions: RoomDimensions,
    pub objects: Vec<RecognizedObject>,
    pub floor_plan_points: Vec<FloorPlanPoint>,
    pub floor_plan: FloorPlan,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Capture time, Unix epoch milliseconds
    pub captured_at_ms: u64,
}
