// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Replay configuration loaded from environment variables.

use roomscan_core::ExportFormat;
use roomscan_processing::{DeviceCapabilities, ScanConfig};

/// Replay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pipeline settings handed to the scan session.
    pub scan: ScanConfig,
    /// Capabilities the replayed device claims.
    pub capabilities: DeviceCapabilities,
    /// Print every scan event as a JSON line on stdout.
    pub events_json: bool,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

pub fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `ROOMSCAN_CONFIG` may point at a JSON `ScanConfig`; individual
    /// variables override it.
    pub fn from_env() -> Self {
        let mut scan = std::env::var("ROOMSCAN_CONFIG")
            .ok()
            .and_then(|path| match std::fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str::<ScanConfig>(&text) {
                    Ok(scan) => Some(scan),
                    Err(err) => {
                        tracing::warn!(path = %path, error = %err, "Ignoring invalid scan config");
                        None
                    }
                },
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "Cannot read scan config");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(dir) = std::env::var("ROOMSCAN_EXPORT_DIR") {
            scan.export_dir = dir.into();
        }
        if let Ok(format) = std::env::var("ROOMSCAN_FORMAT") {
            scan.default_format = ExportFormat::from_name(&format);
        }
        scan.proximity_threshold = env_parse("ROOMSCAN_PROXIMITY", scan.proximity_threshold);
        scan.min_confidence = env_parse("ROOMSCAN_MIN_CONFIDENCE", scan.min_confidence);
        scan.progress_anchor_target =
            env_parse("ROOMSCAN_PROGRESS_TARGET", scan.progress_anchor_target);
        scan.depth_keyframe_interval =
            env_parse("ROOMSCAN_KEYFRAME_INTERVAL", scan.depth_keyframe_interval);
        scan.depth_max_keyframes = env_parse("ROOMSCAN_MAX_KEYFRAMES", scan.depth_max_keyframes);

        let capabilities = match std::env::var("ROOMSCAN_DEVICE")
            .unwrap_or_else(|_| "lidar".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "depth" => DeviceCapabilities::depth_only(),
            "none" => DeviceCapabilities::none(),
            _ => DeviceCapabilities::lidar(),
        };

        Self {
            scan,
            capabilities,
            events_json: env_flag("ROOMSCAN_EVENTS_JSON"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
