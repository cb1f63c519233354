// SPDX-License-Identifier: MPL-2.0

//! Shared types for camera capture

use crate::errors::CameraError;
use std::fmt;
use std::sync::Arc;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// A camera found by the device monitor
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Human readable name
    pub name: String,
    /// Caps the device advertises, rendered as a string
    pub caps: Option<String>,
    /// GStreamer device used to build the source element
    pub device: gstreamer::Device,
}

impl fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Framerate as a fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate, treating a zero denominator as 1
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{:.2}", self.as_f64())
        }
    }
}

/// Pixel layouts a camera may negotiate
///
/// Only [`PixelFormat::NV12`] matches what the crunch shader reads. The rest
/// are recognised so the mismatch can be reported by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    NV12,
    /// NV12 with V and U swapped
    NV21,
    /// Planar 4:2:0
    I420,
    /// Packed 4:2:2 (Y0 U Y1 V)
    YUYV,
    /// Packed 4:2:2 (U Y0 V Y1)
    UYVY,
    /// 8-bit greyscale
    Gray8,
    /// 32-bit RGBA
    RGBA,
}

impl PixelFormat {
    /// Map a GStreamer format name to a pixel format
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "NV12" => Some(Self::NV12),
            "NV21" => Some(Self::NV21),
            "I420" | "YV12" => Some(Self::I420),
            "YUYV" | "YUY2" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            "GRAY8" | "GREY" | "Y8" => Some(Self::Gray8),
            "RGBA" | "RGBx" | "BGRA" | "BGRx" => Some(Self::RGBA),
            _ => None,
        }
    }
}

/// Negotiated capture format of an open camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    /// Format name as reported by GStreamer (e.g. "NV12", "YUY2")
    pub format_name: String,
    /// Recognised pixel format, if any
    pub pixel_format: Option<PixelFormat>,
    /// Colorimetry string (e.g. "bt601")
    pub colorimetry: String,
    pub width: u32,
    pub height: u32,
    pub framerate: Framerate,
}

impl CameraSpec {
    /// Whether frames arrive in the layout the shader assumes
    pub fn is_nv12(&self) -> bool {
        self.pixel_format == Some(PixelFormat::NV12)
    }
}

impl fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {} @ {} fps",
            self.width, self.height, self.format_name, self.framerate
        )
    }
}

/// One captured frame
///
/// NV12 frames are tightly packed: luma rows of `width` bytes followed by
/// `height / 2` interleaved chroma rows of `width` bytes.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

/// Camera access permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// No decision yet, poll again
    Undetermined,
    Granted,
    Denied,
}

/// Anything that can report the active capture format
pub trait FormatSource {
    fn format(&self) -> BackendResult<CameraSpec>;
}

/// An already negotiated spec reports itself
impl FormatSource for CameraSpec {
    fn format(&self) -> BackendResult<CameraSpec> {
        Ok(self.clone())
    }
}

/// Anything that can answer the tri-state permission query
pub trait PermissionSource {
    fn permission(&self) -> BackendResult<Permission>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framerate_display() {
        assert_eq!(Framerate::new(30, 1).to_string(), "30");
        assert_eq!(Framerate::new(30000, 1001).to_string(), "29.97");
        assert_eq!(Framerate::new(15, 0).denom, 1);
    }

    #[test]
    fn test_from_gst_format() {
        assert_eq!(PixelFormat::from_gst_format("NV12"), Some(PixelFormat::NV12));
        assert_eq!(PixelFormat::from_gst_format("YUY2"), Some(PixelFormat::YUYV));
        assert_eq!(PixelFormat::from_gst_format("MJPG"), None);
    }

    #[test]
    fn test_spec_is_nv12() {
        let mut spec = CameraSpec {
            format_name: "NV12".into(),
            pixel_format: Some(PixelFormat::NV12),
            colorimetry: "bt601".into(),
            width: 640,
            height: 480,
            framerate: Framerate::new(30, 1),
        };
        assert!(spec.is_nv12());
        assert_eq!(spec.format().map(|s| s.width).ok(), Some(640));

        spec.pixel_format = PixelFormat::from_gst_format("YUY2");
        assert!(!spec.is_nv12());
    }
}
