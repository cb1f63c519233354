// SPDX-License-Identifier: MPL-2.0

//! FriedCamera - live JPEG-style "crunch" of a webcam feed
//!
//! Camera frames are uploaded to the GPU as NV12, run through a compute
//! shader that quantizes 8x8 DCT blocks with slider-controlled tables, and
//! presented in a COSMIC window. The crunched frame can be saved as PNG.
//!
//! # Architecture
//!
//! - [`app`]: Application state, UI and the render primitive
//! - [`backends`]: Camera discovery and capture over GStreamer
//! - [`gpu`]: Resource provisioning and frame pacing
//! - [`shaders`]: Shader loading and uniform parameters
//! - [`config`]: User configuration handling
//! - [`storage`]: Snapshot naming and PNG export
//!
//! # Example
//!
//! ```ignore
//! // This is a GUI application, typically run via:
//! // friedcamera
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod i18n;
pub mod shaders;
pub mod storage;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use shaders::{CrunchSettings, FrameParams};
