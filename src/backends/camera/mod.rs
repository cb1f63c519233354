// SPDX-License-Identifier: MPL-2.0

//! Camera capture over GStreamer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  App subscription   │
//! └──────────┬──────────┘
//!            │ run_capture()
//!            ▼
//! ┌─────────────────────┐
//! │   Capture session   │  ← open first camera, wait for permission,
//! └──────────┬──────────┘    report spec, poll frames
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CameraPipeline    │  ← device source ! capsfilter ! appsink
//! └─────────────────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod session;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use pipeline::{CameraPipeline, pack_nv12};
pub use session::{
    CaptureEvent, CaptureRequest, open_first, open_first_with, run_capture, wait_for_permission,
};
pub use types::*;
