// SPDX-License-Identifier: MPL-2.0

//! GStreamer capture pipeline for one camera

use super::types::*;
use crate::constants::pipeline;
use crate::errors::CameraError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::{VideoFormat, VideoFrameRef, VideoInfo};
use std::sync::Arc;
use tracing::{debug, info};

/// Capture pipeline: `<device source> [! videoconvert] ! capsfilter ! appsink`
///
/// Frames are pulled from the appsink without blocking. Dropping the
/// pipeline stops it and releases the device.
pub struct CameraPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    name: String,
}

impl CameraPipeline {
    /// Build and start a pipeline for `camera`.
    ///
    /// With `convert_to_nv12` a `videoconvert` element forces the shader's
    /// layout. Otherwise NV12 is only preferred.
    pub fn open(camera: &CameraDevice, convert_to_nv12: bool) -> BackendResult<Self> {
        let open_failed = |reason: String| CameraError::OpenFailed {
            name: camera.name.clone(),
            reason,
        };

        info!(camera = %camera.name, convert_to_nv12, "Opening camera");

        let pipeline = gstreamer::Pipeline::with_name("friedcamera-capture");
        let source = camera
            .device
            .create_element(Some("source"))
            .map_err(|e| open_failed(e.to_string()))?;

        let caps_string = if convert_to_nv12 {
            pipeline::NV12_CAPS
        } else {
            pipeline::SINK_CAPS
        };
        let caps = caps_string
            .parse::<gstreamer::Caps>()
            .map_err(|e| open_failed(e.to_string()))?;
        let capsfilter = gstreamer::ElementFactory::make("capsfilter")
            .name("caps")
            .property("caps", &caps)
            .build()
            .map_err(|e| open_failed(e.to_string()))?;

        let appsink = AppSink::builder().name("sink").build();
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let mut elements = vec![source];
        if convert_to_nv12 {
            let convert = gstreamer::ElementFactory::make("videoconvert")
                .build()
                .map_err(|e| open_failed(e.to_string()))?;
            elements.push(convert);
        }
        elements.push(capsfilter);
        elements.push(appsink.clone().upcast());

        pipeline
            .add_many(&elements)
            .map_err(|e| open_failed(e.to_string()))?;
        gstreamer::Element::link_many(&elements).map_err(|e| open_failed(e.to_string()))?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(open_failed(e.to_string()));
        }

        Ok(Self {
            pipeline,
            appsink,
            name: camera.name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn negotiated_caps(&self) -> Option<gstreamer::Caps> {
        self.appsink
            .static_pad("sink")
            .and_then(|pad| pad.current_caps())
    }

    /// Pull the next frame if one is queued. Never blocks.
    pub fn try_acquire_frame(&self) -> BackendResult<Option<CameraFrame>> {
        let Some(sample) = self.appsink.try_pull_sample(gstreamer::ClockTime::ZERO) else {
            return Ok(None);
        };

        let buffer = sample
            .buffer()
            .ok_or_else(|| CameraError::BackendError("Sample without buffer".to_string()))?;
        let caps = sample
            .caps()
            .ok_or_else(|| CameraError::BackendError("Sample without caps".to_string()))?;
        let info = VideoInfo::from_caps(caps)
            .map_err(|e| CameraError::BackendError(format!("Invalid caps: {}", e)))?;

        let data: Arc<[u8]> = if info.format() == VideoFormat::Nv12 {
            let frame = VideoFrameRef::from_buffer_ref_readable(buffer, &info)
                .map_err(|e| CameraError::BackendError(format!("Failed to map frame: {}", e)))?;
            let strides = frame.plane_stride();
            let luma = frame.plane_data(0)?;
            let chroma = frame.plane_data(1)?;
            pack_nv12(
                luma,
                strides[0] as usize,
                chroma,
                strides[1] as usize,
                info.width() as usize,
                info.height() as usize,
            )
            .into()
        } else {
            let map = buffer
                .map_readable()
                .map_err(|e| CameraError::BackendError(format!("Failed to map buffer: {}", e)))?;
            Arc::from(map.as_slice())
        };

        Ok(Some(CameraFrame {
            width: info.width(),
            height: info.height(),
            data,
        }))
    }
}

impl FormatSource for CameraPipeline {
    /// Read the format negotiated on the appsink pad.
    fn format(&self) -> BackendResult<CameraSpec> {
        let caps = self.negotiated_caps().ok_or_else(|| {
            CameraError::FormatUnavailable(format!("{}: caps not negotiated", self.name))
        })?;
        let info =
            VideoInfo::from_caps(&caps).map_err(|e| CameraError::FormatUnavailable(e.to_string()))?;

        let format_name = info.format().to_str().to_string();
        let fps = info.fps();
        Ok(CameraSpec {
            pixel_format: PixelFormat::from_gst_format(&format_name),
            format_name,
            colorimetry: info.colorimetry().to_string(),
            width: info.width(),
            height: info.height(),
            framerate: Framerate::new(fps.numer().max(0) as u32, fps.denom().max(0) as u32),
        })
    }
}

impl PermissionSource for CameraPipeline {
    /// Access counts as granted once caps are negotiated, since data is
    /// flowing at that point. An authorization error on the bus is a denial.
    fn permission(&self) -> BackendResult<Permission> {
        if let Some(bus) = self.pipeline.bus() {
            while let Some(msg) = bus.pop_filtered(&[gstreamer::MessageType::Error]) {
                if let gstreamer::MessageView::Error(err) = msg.view() {
                    let error = err.error();
                    if error.matches(gstreamer::ResourceError::NotAuthorized) {
                        return Ok(Permission::Denied);
                    }
                    return Err(CameraError::BackendError(format!(
                        "{}: {}",
                        self.name, error
                    )));
                }
            }
        }

        if self.negotiated_caps().is_some() {
            Ok(Permission::Granted)
        } else {
            Ok(Permission::Undetermined)
        }
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        debug!(camera = %self.name, "Stopping camera pipeline");
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Copy NV12 planes with padded rows into one tightly packed buffer.
///
/// The result has `height` luma rows and `height / 2` chroma rows, each
/// `width` bytes long. Rows missing from a short plane are left out.
pub fn pack_nv12(
    luma: &[u8],
    luma_stride: usize,
    chroma: &[u8],
    chroma_stride: usize,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut packed = Vec::with_capacity(width * height * 3 / 2);
    for row in luma.chunks(luma_stride.max(1)).take(height) {
        packed.extend_from_slice(&row[..width.min(row.len())]);
    }
    for row in chroma.chunks(chroma_stride.max(1)).take(height / 2) {
        packed.extend_from_slice(&row[..width.min(row.len())]);
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_nv12_strips_row_padding() {
        // 4x2 frame with 2 bytes of padding per row
        let luma = [1, 2, 3, 4, 0, 0, 5, 6, 7, 8, 0, 0];
        let chroma = [9, 10, 11, 12, 0, 0];
        let packed = pack_nv12(&luma, 6, &chroma, 6, 4, 2);
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_pack_nv12_tight_input_unchanged() {
        let luma: Vec<u8> = (0..16).collect();
        let chroma: Vec<u8> = (16..24).collect();
        let packed = pack_nv12(&luma, 4, &chroma, 4, 4, 4);
        assert_eq!(packed, (0..24).collect::<Vec<u8>>());
    }

    #[test]
    fn test_pack_nv12_last_row_without_padding() {
        // Final row is shorter than the stride
        let luma = [1, 2, 0, 3, 4];
        let chroma = [5, 6];
        let packed = pack_nv12(&luma, 3, &chroma, 3, 2, 2);
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6]);
    }
}
