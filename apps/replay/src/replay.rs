// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drives a scan session from a recording file.

use crate::config::Config;
use crate::recording::RecordedEvent;
use anyhow::{Context, Result};
use roomscan_core::{ExportFormat, ScanResult};
use roomscan_processing::{ScanEvent, ScanSession};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Log (or print) session events until the session is dropped
async fn forward_events(mut rx: UnboundedReceiver<ScanEvent>, as_json: bool) -> usize {
    let mut count = 0;
    while let Some(event) = rx.recv().await {
        count += 1;
        if as_json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(err) => tracing::warn!(error = %err, "Cannot serialize event"),
            }
            continue;
        }
        match &event {
            ScanEvent::Progress(p) => tracing::debug!(progress = *p, "Progress"),
            ScanEvent::ObjectRecognized(object) => tracing::info!(
                label = %object.label,
                confidence = object.confidence,
                centroid = ?object.centroid,
                "Object recognized"
            ),
            ScanEvent::ObjectRefined(object) => tracing::info!(
                label = %object.label,
                support = object.support,
                "Object refined"
            ),
            ScanEvent::Completed(result) => tracing::info!(
                path = %result.mesh.path.display(),
                vertices = result.vertex_count,
                triangles = result.triangle_count,
                "Scan completed"
            ),
            ScanEvent::Failed(reason) => tracing::warn!(%reason, "Scan failed"),
        }
    }
    count
}

/// Replay `path` through a fresh session and finalize it in `format`
pub async fn run(path: &Path, config: &Config, format: ExportFormat) -> Result<ScanResult> {
    let (tx, rx) = unbounded_channel();
    let forwarder = tokio::spawn(forward_events(rx, config.events_json));

    let mut session = ScanSession::new(config.scan.clone(), config.capabilities, tx);
    session.start()?;

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Cannot open recording {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut dispatched = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let event = RecordedEvent::parse_line(&line)
            .with_context(|| format!("{}:{}", path.display(), line_no))?;
        if let Some(event) = event {
            event.dispatch(&mut session);
            dispatched += 1;
        }
    }
    tracing::info!(
        events = dispatched,
        anchors = session.anchor_count(),
        "Recording replayed"
    );

    let result = session.finalize(format).await;

    // Closing the channel lets the forwarder finish
    drop(session);
    let forwarded = forwarder.await?;
    tracing::debug!(events = forwarded, "Event stream closed");

    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomscan_processing::{DeviceCapabilities, ScanConfig};

    fn config(dir: &Path) -> Config {
        Config {
            scan: ScanConfig::default().with_export_dir(dir),
            capabilities: DeviceCapabilities::lidar(),
            events_json: false,
        }
    }

    fn anchor_line(id: u32, x: f32) -> String {
        // 12 floor triangles in a strip along +x
        let mut vertices = Vec::new();
        for i in 0..=12 {
            vertices.push(format!("[{},0,0]", i as f32 * 0.1));
            vertices.push(format!("[{},0,0.5]", i as f32 * 0.1));
        }
        let faces: Vec<String> = (0..12)
            .map(|i| format!("[{},{},{}]", 2 * i, 2 * i + 1, 2 * i + 2))
            .collect();
        format!(
            r#"{{"type":"anchor_added","id":"00000000-0000-0000-0000-{:012}","transform":[1,0,0,0,0,1,0,0,0,0,1,0,{},0,0,1],"vertices":[{}],"normals":[{}],"faces":[{}],"classifications":[{}]}}"#,
            id,
            x,
            vertices.join(","),
            vec!["[0,1,0]"; 26].join(","),
            faces.join(","),
            vec!["2"; 12].join(",")
        )
    }

    #[tokio::test]
    async fn test_replay_recording() {
        let tmp = tempfile::tempdir().unwrap();
        let recording = tmp.path().join("session.jsonl");
        let text = [anchor_line(1, 0.0), anchor_line(2, 5.0)].join("\n");
        std::fs::write(&recording, text).unwrap();

        let config = config(&tmp.path().join("out"));
        let result = run(&recording, &config, ExportFormat::Obj).await.unwrap();

        assert_eq!(result.vertex_count, 52);
        assert_eq!(result.objects.len(), 2);
        assert!(result.mesh.path.starts_with(tmp.path().join("out")));
        assert_eq!(result.mesh.format, ExportFormat::Obj);
    }

    #[tokio::test]
    async fn test_empty_recording_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let recording = tmp.path().join("empty.jsonl");
        std::fs::write(&recording, "# nothing captured\n").unwrap();

        let err = run(&recording, &config(tmp.path()), ExportFormat::Glb)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<roomscan_processing::Error>(),
            Some(roomscan_processing::Error::NoMeshData)
        ));
    }
}
