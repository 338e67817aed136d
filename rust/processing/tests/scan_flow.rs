// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scans through the public session API

use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_core::{AnchorId, ExportFormat, FloorPlanPoint, SemanticLabel};
use roomscan_geometry::transform::translation;
use roomscan_geometry::MeshAnchor;
use roomscan_processing::platform::{
    CameraIntrinsics, DepthFrame, GeometryElement, GeometrySource, PlaneObservation,
    RawMeshAnchor,
};
use roomscan_processing::{
    AnchorEvent, DeviceCapabilities, FrameSink, ScanConfig, ScanEvent, ScanSession, ScanState,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

const FLOOR: u8 = 2;

fn new_session(
    dir: &std::path::Path,
    capabilities: DeviceCapabilities,
) -> (ScanSession, UnboundedReceiver<ScanEvent>) {
    let (tx, rx) = unbounded_channel();
    let session = ScanSession::new(ScanConfig::default().with_export_dir(dir), capabilities, tx);
    (session, rx)
}

/// Flat patch of `n` floor triangles centred at the local origin
fn floor_patch(id: u128, n: usize, transform: Matrix4<f32>) -> MeshAnchor {
    let mut vertices = Vec::new();
    for i in 0..=n {
        let x = i as f32 / n as f32 - 0.5;
        vertices.push(Point3::new(x, 0.0, -0.25));
        vertices.push(Point3::new(x, 0.0, 0.25));
    }
    let faces: Vec<[u32; 3]> = (0..n as u32).map(|i| [2 * i, 2 * i + 1, 2 * i + 2]).collect();
    let normals = vec![Vector3::y(); vertices.len()];
    MeshAnchor::new(AnchorId::from_u128(id), transform, vertices, normals, faces)
        .with_classifications(vec![FLOOR; n])
}

#[tokio::test]
async fn two_anchor_scan_merges_with_rebased_indices() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut session, _rx) = new_session(tmp.path(), DeviceCapabilities::lidar());
    session.start().unwrap();

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
    session.on_anchor_event(AnchorEvent::Added(quad));
    session.on_anchor_event(AnchorEvent::Added(triangle));

    let result = session.finalize(ExportFormat::Obj).await.unwrap();
    assert_eq!(result.vertex_count, 7);
    assert_eq!(result.triangle_count, 3);
    assert_eq!(result.dimensions.width, 11.0);
    assert_eq!(result.dimensions.height, 1.0);

    let text = std::fs::read_to_string(&result.mesh.path).unwrap();
    assert!(text.lines().any(|l| l == "f 5//5 6//6 7//7"));

    // No floor samples: the outline falls back to the mesh footprint
    assert_eq!(result.floor_plan.outline.len(), 4);
    assert_eq!(result.floor_plan.width, 11.0);
}

#[tokio::test]
async fn nearby_floor_detections_collapse_to_one_object() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut session, mut rx) = new_session(tmp.path(), DeviceCapabilities::lidar());
    session.start().unwrap();

    session.on_anchor_event(AnchorEvent::Added(floor_patch(1, 20, Matrix4::identity())));
    session.on_anchor_event(AnchorEvent::Added(floor_patch(2, 20, translation(0.2, 0.0, 0.0))));
    // Identical update: idempotent
    session.on_anchor_event(AnchorEvent::Updated(floor_patch(2, 20, translation(0.2, 0.0, 0.0))));

    let result = session.finalize(ExportFormat::Glb).await.unwrap();
    let floors: Vec<_> = result
        .objects
        .iter()
        .filter(|o| o.label == SemanticLabel::Floor)
        .collect();
    assert_eq!(floors.len(), 1);

    let mut recognized = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ScanEvent::ObjectRecognized(_)) {
            recognized += 1;
        }
    }
    assert_eq!(recognized, 1);
}

#[tokio::test]
async fn floor_centroids_project_onto_plan() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut session, _rx) = new_session(tmp.path(), DeviceCapabilities::lidar());
    session.start().unwrap();

    for (id, (x, z)) in [(1.0, 2.0), (3.0, 2.0), (3.0, 5.0)].into_iter().enumerate() {
        session.add_anchor(floor_patch(id as u128 + 1, 12, translation(x, 0.0, z)));
    }

    let result = session.finalize(ExportFormat::Usda).await.unwrap();
    assert_eq!(
        result.floor_plan_points,
        vec![
            FloorPlanPoint::new(1.0, 2.0),
            FloorPlanPoint::new(3.0, 2.0),
            FloorPlanPoint::new(3.0, 5.0),
        ]
    );
    // Too sparse for a hull: bounding quad
    assert_eq!(
        result.floor_plan.outline,
        vec![
            FloorPlanPoint::new(1.0, 2.0),
            FloorPlanPoint::new(3.0, 2.0),
            FloorPlanPoint::new(3.0, 5.0),
            FloorPlanPoint::new(1.0, 5.0),
        ]
    );
    assert_eq!(result.objects.len(), 3);
}

#[tokio::test]
async fn removed_anchor_is_not_merged() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut session, _rx) = new_session(tmp.path(), DeviceCapabilities::lidar());
    session.start().unwrap();
    session.add_anchor(floor_patch(1, 12, Matrix4::identity()));
    session.add_anchor(floor_patch(2, 12, translation(4.0, 0.0, 0.0)));
    session.on_anchor_event(AnchorEvent::Removed(AnchorId::from_u128(2)));

    let result = session.finalize(ExportFormat::Glb).await.unwrap();
    assert_eq!(result.vertex_count, 26);
}

#[tokio::test]
async fn arkit_buffers_feed_the_session() {
    let vertices: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let normals: Vec<u8> = [0.0f32, 1.0, 0.0]
        .repeat(3)
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let faces: Vec<u8> = [0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()).collect();

    let raw = RawMeshAnchor {
        identifier: uuid::Uuid::from_u128(5),
        transform: roomscan_processing::platform::arkit::IDENTITY_TRANSFORM,
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
            bytes_per_index: 2,
            indices_per_primitive: 3,
        },
        classification: None,
    };

    let tmp = tempfile::tempdir().unwrap();
    let (mut session, _rx) = new_session(tmp.path(), DeviceCapabilities::lidar());
    session.start().unwrap();
    session.on_anchor_event(AnchorEvent::Added(raw.decode().unwrap()));
    assert_eq!(session.anchor_count(), 1);

    let result = session.finalize(ExportFormat::Glb).await.unwrap();
    assert_eq!(result.triangle_count, 1);
    assert!(result.objects.is_empty());
}

#[tokio::test]
async fn depth_only_device_scans_from_frames_and_planes() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut session, mut rx) = new_session(tmp.path(), DeviceCapabilities::depth_only());
    session.start().unwrap();

    let frame = DepthFrame {
        width: 64,
        height: 48,
        depth_mm: vec![2500; 64 * 48],
        confidence: None,
        intrinsics: CameraIntrinsics {
            fx: 60.0,
            fy: 60.0,
            cx: 32.0,
            cy: 24.0,
        },
        camera_to_world: translation(0.0, 1.4, 0.0),
        timestamp_ns: 1,
    };
    for _ in 0..3 {
        session.on_depth_frame(frame.clone());
    }
    // Only the first frame is a keyframe
    assert_eq!(session.anchor_count(), 1);
    assert!(session.progress() > 0.0);

    session.on_plane_event(PlaneObservation {
        id: AnchorId::from_u128(77),
        label: SemanticLabel::Floor,
        center_pose: Matrix4::identity(),
        polygon: vec![[-2.0, -2.0], [2.0, -2.0], [2.0, 2.0], [-2.0, 2.0]],
    });

    let result = session.finalize(ExportFormat::Glb).await.unwrap();
    assert_eq!(session.state(), ScanState::Completed);
    assert!(result.triangle_count > 0);
    assert_eq!(result.objects.len(), 1);
    assert_eq!(result.objects[0].confidence, 1.0);
    assert_eq!(result.floor_plan_points.len(), 4);
    assert_eq!(result.floor_plan.width, 4.0);

    let progress_events = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|e| matches!(e, ScanEvent::Progress(_)))
        .count();
    assert_eq!(progress_events, 4);
}
