// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling

use crate::app::crunch_primitive::SnapshotReply;
use crate::app::log_slider;
use crate::app::state::{AppModel, Message};
use crate::backends::camera::{CameraDevice, CaptureEvent, CaptureRequest};
use crate::config::Config;
use crate::errors::{self, CameraError, SnapshotError};
use cosmic::Task;
use tracing::{debug, info, warn};

impl AppModel {
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            Message::CamerasEnumerated(result) => self.handle_cameras_enumerated(result),
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::Capture(event) => self.handle_capture_event(event),

            Message::SetCrunchBase(position) => {
                self.settings.set_base(log_slider::BASE.value(position));
                Task::none()
            }
            Message::SetCrunchHorizontal(position) => {
                self.settings
                    .set_horizontal(log_slider::HORIZONTAL.value(position));
                Task::none()
            }
            Message::SetCrunchVertical(position) => {
                self.settings.set_vertical(log_slider::VERTICAL.value(position));
                Task::none()
            }

            Message::SaveSnapshot => self.handle_save_snapshot(),
            Message::SnapshotSaved(result) => self.handle_snapshot_saved(result),
            Message::UpdateConfig(config) => self.handle_update_config(config),
        }
    }

    fn handle_save_snapshot(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(path) = self.snapshots.reserve() else {
            debug!("Previous snapshot still being written");
            return Task::none();
        };
        info!(path = %path.display(), "Snapshot requested");
        let receiver = self.preview.request_snapshot(path);
        Task::perform(
            async move { receiver.await.unwrap_or(Err(SnapshotError::Cancelled)) },
            |result| cosmic::Action::App(Message::SnapshotSaved(result)),
        )
    }

    fn handle_snapshot_saved(&mut self, result: SnapshotReply) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Snapshot written");
                self.snapshots.finish(true);
            }
            Err(err) => {
                warn!(error = %err, "Snapshot not written");
                self.snapshots.finish(false);
            }
        }
        Task::none()
    }

    fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        info!(?config, "Configuration updated");
        if config.snapshot_directory != self.config.snapshot_directory {
            let directory = config.resolve_snapshot_directory();
            info!(directory = %directory.display(), "Snapshot directory changed");
            self.snapshots.set_directory(directory);
        }
        if config.shader_directory != self.config.shader_directory {
            warn!("Shader directory changes take effect after a restart");
        }
        self.config = config;
        Task::none()
    }

    fn handle_cameras_enumerated(
        &mut self,
        result: Result<Vec<CameraDevice>, CameraError>,
    ) -> Task<cosmic::Action<Message>> {
        let cameras = match result {
            Ok(cameras) if cameras.is_empty() => errors::fatal(&CameraError::NoCameraFound),
            Ok(cameras) => cameras,
            Err(err) => errors::fatal(&err),
        };

        info!(count = cameras.len(), "Found camera(s)");
        self.camera_dropdown_options = cameras.iter().map(|c| c.name.clone()).collect();

        // Startup opens the first camera that works
        self.start_capture(cameras.iter().cloned().enumerate().collect());
        self.available_cameras = cameras;
        Task::none()
    }

    fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(candidates) =
            switch_candidates(self.current_camera_index, &self.available_cameras, index)
        else {
            debug!(index, "Camera already active or unknown");
            return Task::none();
        };

        info!(index, "Switching camera");
        self.start_capture(candidates);
        Task::none()
    }

    /// Restart the capture subscription with new candidates.
    ///
    /// Dropping the old subscription closes its camera before the new one opens.
    fn start_capture(&mut self, candidates: Vec<(usize, CameraDevice)>) {
        self.capture_request = Some(CaptureRequest {
            candidates,
            convert_to_nv12: self.config.convert_to_nv12,
        });
        self.capture_generation += 1;
    }

    fn handle_capture_event(&mut self, event: CaptureEvent) -> Task<cosmic::Action<Message>> {
        match event {
            CaptureEvent::Opened { index, spec } => {
                info!(index, spec = %spec, "Camera opened");
                self.current_camera_index = Some(index);
                self.preview.set_camera_spec(spec.clone());
                self.camera_spec = Some(spec);
            }
            CaptureEvent::Frame(frame) => self.preview.push_frame(frame),
            CaptureEvent::Failed(err) => errors::fatal(&err),
        }
        Task::none()
    }
}

/// Candidates for switching to `cameras[index]`.
///
/// `None` when that camera is already active or the index is unknown.
fn switch_candidates<C: Clone>(
    current: Option<usize>,
    cameras: &[C],
    index: usize,
) -> Option<Vec<(usize, C)>> {
    if current == Some(index) {
        return None;
    }
    cameras.get(index).map(|camera| vec![(index, camera.clone())])
}
