// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::app::crunch_primitive::{CrunchPrimitive, SnapshotReply};
use crate::backends::camera::{CameraDevice, CameraSpec, CaptureEvent, CaptureRequest};
use crate::config::Config;
use crate::errors::CameraError;
use crate::shaders::CrunchSettings;
use crate::storage::SnapshotNamer;

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Cameras found at startup
    pub available_cameras: Vec<CameraDevice>,
    /// Display names for the camera dropdown
    pub camera_dropdown_options: Vec<String>,
    /// Index of the camera currently streaming
    pub current_camera_index: Option<usize>,
    /// Cameras the capture subscription should try
    pub capture_request: Option<CaptureRequest>,
    /// Bumped whenever the capture subscription must restart
    pub capture_generation: u64,
    /// Negotiated format of the open camera
    pub camera_spec: Option<CameraSpec>,
    /// Slider-driven crunch factors
    pub settings: CrunchSettings,
    /// File names for saved results
    pub snapshots: SnapshotNamer,
    /// Render primitive shared with the preview widget
    pub preview: CrunchPrimitive,
}

impl AppModel {
    /// Whether the open camera delivers NV12. `true` until a format is known.
    pub fn camera_is_nv12(&self) -> bool {
        self.camera_spec.as_ref().is_none_or(CameraSpec::is_nv12)
    }
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    /// Camera enumeration finished
    CamerasEnumerated(Result<Vec<CameraDevice>, CameraError>),
    /// A camera was picked in the dropdown
    SelectCamera(usize),
    /// Event from the capture subscription
    Capture(CaptureEvent),
    /// Slider values, in natural-log space
    SetCrunchBase(f32),
    SetCrunchHorizontal(f32),
    SetCrunchVertical(f32),
    /// Save the next crunched frame
    SaveSnapshot,
    /// The renderer finished (or abandoned) the requested snapshot
    SnapshotSaved(SnapshotReply),
    /// Configuration changed on disk
    UpdateConfig(Config),
}

impl From<CaptureEvent> for Message {
    fn from(event: CaptureEvent) -> Self {
        Message::Capture(event)
    }
}
