// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform adapters
//!
//! The AR runtimes deliver frames in their own shapes. Adapters turn them into
//! [`MeshAnchor`]s, depth frames and plane observations, and a [`FrameSink`]
//! (normally the scan session) consumes them.

pub mod arcore;
pub mod arkit;

use roomscan_core::AnchorId;
use roomscan_geometry::MeshAnchor;

pub use arcore::{CameraIntrinsics, DepthFrame, PlaneObservation};
pub use arkit::{GeometryElement, GeometrySource, RawMeshAnchor};

/// Anchor lifecycle notification from the runtime
#[derive(Debug, Clone)]
pub enum AnchorEvent {
    Added(MeshAnchor),
    Updated(MeshAnchor),
    Removed(AnchorId),
}

impl AnchorEvent {
    pub fn id(&self) -> AnchorId {
        match self {
            AnchorEvent::Added(anchor) | AnchorEvent::Updated(anchor) => anchor.id,
            AnchorEvent::Removed(id) => *id,
        }
    }
}

/// Consumer of runtime frame callbacks
pub trait FrameSink {
    fn on_anchor_event(&mut self, event: AnchorEvent);

    fn on_depth_frame(&mut self, frame: DepthFrame);

    fn on_plane_event(&mut self, plane: PlaneObservation);
}

/// What the device's AR runtime can provide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Mesh anchors from scene reconstruction (LiDAR)
    pub scene_reconstruction: bool,
    /// Per-frame depth images
    pub depth: bool,
}

impl DeviceCapabilities {
    pub const fn lidar() -> Self {
        Self {
            scene_reconstruction: true,
            depth: true,
        }
    }

    pub const fn depth_only() -> Self {
        Self {
            scene_reconstruction: false,
            depth: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            scene_reconstruction: false,
            depth: false,
        }
    }

    /// Either capture path is available
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.scene_reconstruction || self.depth
    }
}
