// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic classification vocabulary
//!
//! Scene-understanding runtimes tag every mesh triangle with a small integer
//! class. The values follow ARKit's `ARMeshClassification`:
//!
//! | raw | label   |
//! |-----|---------|
//! | 0   | none    |
//! | 1   | wall    |
//! | 2   | floor   |
//! | 3   | ceiling |
//! | 4   | table   |
//! | 5   | seat    |
//! | 6   | window  |
//! | 7   | door    |
//!
//! Anything outside that range decodes to [`SemanticLabel::Unknown`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic label of a classified geometry group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum SemanticLabel {
    Unknown,
    Wall,
    Floor,
    Ceiling,
    Table,
    Seat,
    Window,
    Door,
}

impl SemanticLabel {
    /// Every label, in raw classification order
    pub const ALL: [SemanticLabel; 8] = [
        SemanticLabel::Unknown,
        SemanticLabel::Wall,
        SemanticLabel::Floor,
        SemanticLabel::Ceiling,
        SemanticLabel::Table,
        SemanticLabel::Seat,
        SemanticLabel::Window,
        SemanticLabel::Door,
    ];

    /// Decode a raw per-triangle classification byte
    #[inline]
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => SemanticLabel::Wall,
            2 => SemanticLabel::Floor,
            3 => SemanticLabel::Ceiling,
            4 => SemanticLabel::Table,
            5 => SemanticLabel::Seat,
            6 => SemanticLabel::Window,
            7 => SemanticLabel::Door,
            _ => SemanticLabel::Unknown,
        }
    }

    /// Raw classification byte for this label
    #[inline]
    pub fn raw(self) -> u8 {
        match self {
            SemanticLabel::Unknown => 0,
            SemanticLabel::Wall => 1,
            SemanticLabel::Floor => 2,
            SemanticLabel::Ceiling => 3,
            SemanticLabel::Table => 4,
            SemanticLabel::Seat => 5,
            SemanticLabel::Window => 6,
            SemanticLabel::Door => 7,
        }
    }

    /// Parse a label name (case-insensitive). Unrecognized names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "wall" => SemanticLabel::Wall,
            "floor" => SemanticLabel::Floor,
            "ceiling" => SemanticLabel::Ceiling,
            "table" => SemanticLabel::Table,
            "seat" | "chair" | "sofa" => SemanticLabel::Seat,
            "window" => SemanticLabel::Window,
            "door" => SemanticLabel::Door,
            _ => SemanticLabel::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticLabel::Unknown => "unknown",
            SemanticLabel::Wall => "wall",
            SemanticLabel::Floor => "floor",
            SemanticLabel::Ceiling => "ceiling",
            SemanticLabel::Table => "table",
            SemanticLabel::Seat => "seat",
            SemanticLabel::Window => "window",
            SemanticLabel::Door => "door",
        }
    }

    /// Broad category used by downstream design tooling
    pub fn category(self) -> ObjectCategory {
        match self {
            SemanticLabel::Wall | SemanticLabel::Floor | SemanticLabel::Ceiling => {
                ObjectCategory::Architectural
            }
            SemanticLabel::Table | SemanticLabel::Seat => ObjectCategory::Furniture,
            SemanticLabel::Window | SemanticLabel::Door => ObjectCategory::Fixture,
            SemanticLabel::Unknown => ObjectCategory::Other,
        }
    }

    /// Doors and windows are cut into walls on the floor plan
    #[inline]
    pub fn is_opening(self) -> bool {
        matches!(self, SemanticLabel::Door | SemanticLabel::Window)
    }
}

impl fmt::Display for SemanticLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum ObjectCategory {
    /// Walls, floors, ceilings
    Architectural,
    /// Tables, seats
    Furniture,
    /// Windows, doors
    Fixture,
    Other,
}

impl ObjectCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Architectural => "architectural",
            ObjectCategory::Furniture => "furniture",
            ObjectCategory::Fixture => "fixture",
            ObjectCategory::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_match_arkit() {
        for label in SemanticLabel::ALL {
            assert_eq!(SemanticLabel::from_raw(label.raw()), label);
        }
        assert_eq!(SemanticLabel::from_raw(2), SemanticLabel::Floor);
        assert_eq!(SemanticLabel::from_raw(0), SemanticLabel::Unknown);
        assert_eq!(SemanticLabel::from_raw(42), SemanticLabel::Unknown);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SemanticLabel::from_name("Floor"), SemanticLabel::Floor);
        assert_eq!(SemanticLabel::from_name(" door "), SemanticLabel::Door);
        assert_eq!(SemanticLabel::from_name("lamp"), SemanticLabel::Unknown);
    }

    #[test]
    fn test_categories() {
        assert_eq!(SemanticLabel::Wall.category(), ObjectCategory::Architectural);
        assert_eq!(SemanticLabel::Seat.category(), ObjectCategory::Furniture);
        assert_eq!(SemanticLabel::Window.category(), ObjectCategory::Fixture);
        assert_eq!(SemanticLabel::Unknown.category(), ObjectCategory::Other);
        assert!(SemanticLabel::Door.is_opening());
        assert!(!SemanticLabel::Table.is_opening());
    }
}
