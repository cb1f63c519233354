// SPDX-License-Identifier: MPL-2.0

//! Main application module for FriedCamera
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message)
//! - `update`: Message handling
//! - `view`: Main view rendering
//! - `crunch_primitive`: GPU primitive running the crunch compute pass
//! - `crunch_widget`: Preview widget drawing the primitive
//! - `log_slider`: Log-scale mapping for the crunch sliders

mod crunch_primitive;
mod crunch_widget;
pub mod log_slider;
mod state;
mod update;
mod view;

use crate::backends::camera::{self, run_capture};
use crate::config::Config;
use crate::constants::pipeline;
use crate::errors::{self, AppError, CameraError};
use crate::fl;
use crate::shaders::{CrunchSettings, ShaderSources};
use crate::storage::SnapshotNamer;
use cosmic::iced::Subscription;
use cosmic::{ApplicationExt, Element, Task};
pub use crunch_primitive::CrunchPrimitive;
pub use state::{AppModel, Message};
use tracing::info;

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.friedcamera.FriedCamera";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        if let Err(err) = gstreamer::init() {
            errors::fatal(&err);
        }

        let config = Config::load(Self::APP_ID);
        let shaders = match ShaderSources::load(&config.resolve_shader_directory()) {
            Ok(shaders) => shaders,
            Err(err) => errors::fatal(&AppError::from(err)),
        };
        let snapshots = SnapshotNamer::new(config.resolve_snapshot_directory());

        let mut app = AppModel {
            core,
            config,
            available_cameras: Vec::new(),
            camera_dropdown_options: Vec::new(),
            current_camera_index: None,
            capture_request: None,
            capture_generation: 0,
            camera_spec: None,
            settings: CrunchSettings::default(),
            snapshots,
            preview: CrunchPrimitive::new(shaders),
        };

        let title_task = match app.core.main_window_id() {
            Some(id) => app.set_window_title(fl!("app-title"), id),
            None => Task::none(),
        };

        // Enumeration can be slow, keep it off the UI thread
        let enumerate_task = Task::perform(
            async {
                tokio::task::spawn_blocking(camera::enumerate_cameras)
                    .await
                    .map_err(|e| CameraError::InitializationFailed(e.to_string()))
                    .and_then(|result| result)
            },
            |result| cosmic::Action::App(Message::CamerasEnumerated(result)),
        );

        (app, Task::batch([title_task, enumerate_task]))
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        // A new generation drops the running session, closing its camera
        let capture_sub = match self.capture_request.clone() {
            Some(request) => Subscription::run_with_id(
                ("camera-session", self.capture_generation),
                cosmic::iced::stream::channel(
                    pipeline::FRAME_CHANNEL_CAPACITY,
                    move |output| async move {
                        info!(candidates = request.candidates.len(), "Capture session started");
                        run_capture(request, output).await;
                    },
                ),
            ),
            None => Subscription::none(),
        };

        Subscription::batch([config_sub, capture_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}
