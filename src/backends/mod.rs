// SPDX-License-Identifier: MPL-2.0

//! Capture backends
//!
//! Only camera capture exists. It runs on GStreamer: cameras are discovered
//! through a device monitor and read from an appsink without blocking.

pub mod camera;
