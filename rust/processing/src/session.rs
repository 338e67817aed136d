// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan session controller
//!
//! Drives one capture from start to exported result:
//!
//! ```text
//! Idle -> Scanning -> Finalizing -> Completed | Failed
//! ```
//!
//! Frame callbacks are synchronous and cheap. `finalize` freezes a snapshot
//! of the working sets and runs merge, floor plan and export on tokio's
//! blocking pool. Terminal states stay put until [`ScanSession::reset`].

use crate::classification::{dedup_objects, ClassificationAggregator, ClassificationOutcome};
use crate::config::ScanConfig;
use crate::depth::DepthIntegrator;
use crate::error::{Error, Result};
use crate::export::{unix_millis, MeshExporter};
use crate::ingestion::FrameIngestion;
use crate::platform::{AnchorEvent, DepthFrame, DeviceCapabilities, FrameSink, PlaneObservation};
use roomscan_core::{AnchorId, ExportFormat, ExportedMesh, RecognizedObject, ScanResult};
use roomscan_geometry::{
    build_floor_plan, merge_anchors, project_to_plan, CombinedMesh, MeshAnchor, Point3,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Scanning,
    Finalizing,
    Completed,
    Failed,
}

impl ScanState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Failed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "idle",
            ScanState::Scanning => "scanning",
            ScanState::Finalizing => "finalizing",
            ScanState::Completed => "completed",
            ScanState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Notifications streamed to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Capture progress (0.0 - 1.0)
    Progress(f32),
    ObjectRecognized(RecognizedObject),
    /// A stronger detection replaced an earlier one at the same spot
    ObjectRefined(RecognizedObject),
    Completed(ScanResult),
    Failed(String),
}

/// Everything the finalize worker needs, detached from the live session
struct FinalizeJob {
    anchors: Vec<Arc<MeshAnchor>>,
    objects: Vec<RecognizedObject>,
    floor_points: Vec<Point3<f32>>,
    format: ExportFormat,
    exporter: MeshExporter,
    proximity_threshold: f32,
    min_outline_points: usize,
}

struct FinalizeOutcome {
    /// Present whenever the merge succeeded, even if export failed
    mesh: Option<Arc<CombinedMesh>>,
    result: Result<ScanResult>,
}

impl FinalizeOutcome {
    fn failed(err: Error) -> Self {
        Self {
            mesh: None,
            result: Err(err),
        }
    }
}

impl FinalizeJob {
    fn run(self) -> FinalizeOutcome {
        let start = std::time::Instant::now();

        let mesh = match merge_anchors(&self.anchors) {
            Ok(mesh) => Arc::new(mesh),
            Err(roomscan_geometry::Error::EmptyMesh(reason)) => {
                tracing::debug!(%reason, "Nothing to merge");
                return FinalizeOutcome::failed(Error::NoMeshData);
            }
            Err(err) => return FinalizeOutcome::failed(err.into()),
        };
        tracing::debug!(
            anchors = self.anchors.len(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            merge_ms = start.elapsed().as_millis() as u64,
            "Merged anchors"
        );

        let objects = dedup_objects(self.objects, self.proximity_threshold);
        let floor_plan_points = project_to_plan(&self.floor_points);
        let floor_plan = build_floor_plan(
            &floor_plan_points,
            &objects,
            Some(mesh.bounds()),
            self.min_outline_points,
        );

        let result = self
            .exporter
            .export(&mesh, self.format)
            .map(|exported| ScanResult {
                mesh: exported,
                dimensions: mesh.dimensions(),
                objects,
                floor_plan_points,
                floor_plan,
                vertex_count: mesh.vertex_count(),
                triangle_count: mesh.triangle_count(),
                captured_at_ms: unix_millis(),
            });

        FinalizeOutcome {
            mesh: Some(mesh),
            result,
        }
    }
}

/// One room capture
pub struct ScanSession {
    config: ScanConfig,
    capabilities: DeviceCapabilities,
    events: UnboundedSender<ScanEvent>,
    state: ScanState,
    frames: FrameIngestion,
    classifier: ClassificationAggregator,
    depth: DepthIntegrator,
    exporter: MeshExporter,
    /// Merged mesh of the last finalize, kept for export retries
    mesh: Option<Arc<CombinedMesh>>,
    progress: f32,
}

impl ScanSession {
    pub fn new(
        config: ScanConfig,
        capabilities: DeviceCapabilities,
        events: UnboundedSender<ScanEvent>,
    ) -> Self {
        let classifier = ClassificationAggregator::new(
            config.proximity_threshold,
            config.min_group_triangles,
            config.min_confidence,
        );
        let depth = DepthIntegrator::new(&config);
        let exporter = MeshExporter::new(config.export_dir.clone());
        Self {
            config,
            capabilities,
            events,
            state: ScanState::Idle,
            frames: FrameIngestion::new(),
            classifier,
            depth,
            exporter,
            mesh: None,
            progress: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn anchor_count(&self) -> usize {
        self.frames.len()
    }

    /// Objects recognized so far in the running scan
    pub fn objects(&self) -> &[RecognizedObject] {
        self.classifier.objects()
    }

    /// Begin capturing. Only valid from `Idle`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ScanState::Idle {
            return Err(Error::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        if !self.capabilities.is_supported() {
            return Err(Error::UnsupportedDevice(
                "neither scene reconstruction nor depth is available".to_string(),
            ));
        }

        self.discard_working_sets();
        self.mesh = None;
        self.progress = 0.0;
        self.state = ScanState::Scanning;
        tracing::info!(
            scene_reconstruction = self.capabilities.scene_reconstruction,
            depth = self.capabilities.depth,
            "Scan started"
        );
        Ok(())
    }

    /// Leave a terminal state so a new scan can start.
    ///
    /// Also recovers a session left in `Finalizing` by a dropped
    /// [`finalize`](Self::finalize) future.
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            ScanState::Idle => Ok(()),
            ScanState::Completed | ScanState::Failed | ScanState::Finalizing => {
                if self.state == ScanState::Finalizing {
                    // finalize holds &mut self while running, so it was abandoned
                    tracing::warn!("Resetting after an abandoned finalize");
                }
                self.discard_working_sets();
                self.mesh = None;
                self.progress = 0.0;
                self.state = ScanState::Idle;
                tracing::info!("Scan session reset");
                Ok(())
            }
            state => Err(Error::InvalidState {
                operation: "reset",
                state,
            }),
        }
    }

    fn accepting(&self, operation: &'static str) -> bool {
        if self.state == ScanState::Scanning {
            return true;
        }
        tracing::debug!(operation, state = %self.state, "Ignoring frame event outside scanning");
        false
    }

    pub fn add_anchor(&mut self, anchor: MeshAnchor) {
        if self.accepting("add anchor") {
            let id = anchor.id;
            if self.frames.on_added(anchor).accepted() {
                self.classify(&id);
                self.report_progress();
            }
        }
    }

    pub fn update_anchor(&mut self, anchor: MeshAnchor) {
        if self.accepting("update anchor") {
            let id = anchor.id;
            if self.frames.on_updated(anchor).accepted() {
                self.classify(&id);
                self.report_progress();
            }
        }
    }

    pub fn remove_anchor(&mut self, id: &AnchorId) {
        if self.accepting("remove anchor") && self.frames.on_removed(id) {
            self.report_progress();
        }
    }

    /// Integrate a depth frame; keyframes join the working set as anchors
    pub fn ingest_depth_frame(&mut self, frame: &DepthFrame) {
        if !self.accepting("ingest depth frame") {
            return;
        }
        match self.depth.integrate(frame) {
            Ok(update) => {
                if let Some(anchor) = update.keyframe {
                    tracing::debug!(
                        anchor = %anchor.id,
                        triangles = anchor.triangle_count(),
                        "Depth keyframe triangulated"
                    );
                    self.frames.on_added(anchor);
                }
                self.report_progress();
            }
            Err(err) => {
                tracing::warn!(
                    timestamp_ns = frame.timestamp_ns,
                    error = %err,
                    "Skipping depth frame"
                );
            }
        }
    }

    pub fn observe_plane(&mut self, plane: &PlaneObservation) {
        if self.accepting("observe plane") {
            let outcome = self.classifier.observe_plane(plane);
            self.publish(outcome);
            self.report_progress();
        }
    }

    fn classify(&mut self, id: &AnchorId) {
        if let Some(anchor) = self.frames.get(id).cloned() {
            let outcome = self.classifier.classify(&anchor);
            self.publish(outcome);
        }
    }

    fn publish(&self, outcome: ClassificationOutcome) {
        for object in outcome.added {
            self.emit(ScanEvent::ObjectRecognized(object));
        }
        for object in outcome.refined {
            self.emit(ScanEvent::ObjectRefined(object));
        }
    }

    fn report_progress(&mut self) {
        let target = self.config.progress_anchor_target.max(1);
        // Depth keyframes count through coverage, not as anchors
        let mesh_anchors = self.frames.len().saturating_sub(self.depth.keyframe_anchors());
        let mesh_progress = (mesh_anchors as f32 / target as f32).min(1.0);
        self.progress = mesh_progress.max(self.depth.coverage());
        self.emit(ScanEvent::Progress(self.progress));
    }

    fn emit(&self, event: ScanEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.events.send(event);
    }

    fn discard_working_sets(&mut self) {
        self.frames.clear();
        self.classifier.clear();
        self.depth.clear();
    }

    fn fail(&mut self, err: &Error) {
        self.state = ScanState::Failed;
        tracing::warn!(error = %err, retryable = err.is_retryable(), "Scan failed");
        self.emit(ScanEvent::Failed(err.to_string()));
    }

    /// Stop capturing and build the result.
    ///
    /// Only valid while scanning. The working sets are discarded whatever
    /// the outcome; the merged mesh is retained for [`export_mesh`](Self::export_mesh).
    /// Dropping the future before it resolves leaves the session in
    /// `Finalizing` until [`reset`](Self::reset).
    pub async fn finalize(&mut self, format: ExportFormat) -> Result<ScanResult> {
        if self.state != ScanState::Scanning {
            return Err(Error::InvalidState {
                operation: "finalize",
                state: self.state,
            });
        }

        if self.frames.is_empty() {
            self.discard_working_sets();
            self.fail(&Error::NoMeshData);
            return Err(Error::NoMeshData);
        }

        self.state = ScanState::Finalizing;
        let job = FinalizeJob {
            anchors: self.frames.snapshot(),
            objects: self.classifier.objects().to_vec(),
            floor_points: self.classifier.floor_points(),
            format,
            exporter: self.exporter.clone(),
            proximity_threshold: self.config.proximity_threshold,
            min_outline_points: self.config.min_outline_points,
        };
        self.discard_working_sets();
        tracing::info!(
            anchors = job.anchors.len(),
            objects = job.objects.len(),
            %format,
            "Finalizing scan"
        );

        let outcome = match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(outcome) => outcome,
            Err(join) => FinalizeOutcome::failed(Error::Worker(join)),
        };
        self.mesh = outcome.mesh;

        match outcome.result {
            Ok(result) => {
                self.state = ScanState::Completed;
                self.progress = 1.0;
                tracing::info!(
                    path = %result.mesh.path.display(),
                    vertices = result.vertex_count,
                    objects = result.objects.len(),
                    "Scan completed"
                );
                self.emit(ScanEvent::Completed(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Export the retained mesh of the last finalize again, possibly in
    /// another format. Valid from `Completed`, or from `Failed` when the
    /// merge had succeeded.
    pub async fn export_mesh(&self, format: ExportFormat) -> Result<ExportedMesh> {
        if !self.state.is_terminal() {
            return Err(Error::InvalidState {
                operation: "export mesh",
                state: self.state,
            });
        }
        let Some(mesh) = self.mesh.clone() else {
            return Err(Error::NoMeshData);
        };
        let exporter = self.exporter.clone();
        tokio::task::spawn_blocking(move || exporter.export(&mesh, format)).await?
    }
}

impl FrameSink for ScanSession {
    fn on_anchor_event(&mut self, event: AnchorEvent) {
        match event {
            AnchorEvent::Added(anchor) => self.add_anchor(anchor),
            AnchorEvent::Updated(anchor) => self.update_anchor(anchor),
            AnchorEvent::Removed(id) => self.remove_anchor(&id),
        }
    }

    fn on_depth_frame(&mut self, frame: DepthFrame) {
        self.ingest_depth_frame(&frame);
    }

    fn on_plane_event(&mut self, plane: PlaneObservation) {
        self.observe_plane(&plane);
    }
}
