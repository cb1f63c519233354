// SPDX-License-Identifier: MPL-2.0

//! Camera discovery through the GStreamer device monitor

use super::types::{BackendResult, CameraDevice};
use crate::constants::pipeline;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// List the video sources currently attached.
///
/// GStreamer must already be initialized.
pub fn enumerate_cameras() -> BackendResult<Vec<CameraDevice>> {
    let monitor = gstreamer::DeviceMonitor::new();
    let caps = gstreamer::Caps::new_empty_simple("video/x-raw");
    monitor.add_filter(Some(pipeline::DEVICE_CLASS), Some(&caps));
    monitor.start()?;

    let cameras: Vec<CameraDevice> = monitor
        .devices()
        .into_iter()
        .map(|device| {
            let name = device.display_name().to_string();
            let caps = device
                .caps()
                .and_then(|caps| caps.structure(0).map(|s| s.to_string()));
            debug!(name = %name, caps = ?caps, "Found camera");
            CameraDevice {
                name,
                caps,
                device,
            }
        })
        .collect();

    monitor.stop();

    info!(count = cameras.len(), "Enumerated cameras");
    Ok(cameras)
}
