// SPDX-License-Identifier: MPL-2.0

//! Error types for FriedCamera
//!
//! Setup failures are carried as typed errors up to the point where the
//! application decides to give up, which is [`fatal`].

use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// GPU device and resource errors
    Gpu(GpuError),
    /// Shader loading errors
    Shader(ShaderError),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// GStreamer could not be initialized
    InitializationFailed(String),
    /// A single camera refused to open
    OpenFailed { name: String, reason: String },
    /// None of the attached cameras could be opened
    NoneOpened(usize),
    /// The user or the platform denied camera access
    PermissionDenied,
    /// The negotiated capture format could not be read
    FormatUnavailable(String),
    /// Backend error reported on the pipeline bus
    BackendError(String),
}

/// GPU errors
#[derive(Debug, Clone)]
pub enum GpuError {
    /// A buffer or texture could not be created
    AllocationFailed {
        resource: &'static str,
        reason: String,
    },
    /// A shader module or pipeline failed validation
    PipelineCreation(String),
    /// Mapping a transfer buffer failed
    MappingFailed(String),
}

/// Shader source errors
#[derive(Debug, Clone)]
pub enum ShaderError {
    /// A shader file is missing or unreadable
    NotFound { path: PathBuf, reason: String },
}

/// Snapshot errors
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// Downloaded data does not cover the frame
    ShortRead { expected: usize, actual: usize },
    /// The crunched frame could not be read back from the GPU
    ReadbackFailed(String),
    /// The renderer dropped the request before saving
    Cancelled,
    /// PNG encoding or writing failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Gpu(e) => write!(f, "GPU error: {}", e),
            AppError::Shader(e) => write!(f, "Shader error: {}", e),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No cameras attached"),
            CameraError::InitializationFailed(msg) => {
                write!(f, "Camera initialization failed: {}", msg)
            }
            CameraError::OpenFailed { name, reason } => {
                write!(f, "Could not open camera '{}': {}", name, reason)
            }
            CameraError::NoneOpened(count) => {
                write!(f, "Could not open any cameras out of {} options", count)
            }
            CameraError::PermissionDenied => write!(f, "Camera permission denied"),
            CameraError::FormatUnavailable(msg) => {
                write!(f, "Could not query camera format: {}", msg)
            }
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::AllocationFailed { resource, reason } => {
                write!(f, "Could not create {}: {}", resource, reason)
            }
            GpuError::PipelineCreation(msg) => write!(f, "Pipeline creation failed: {}", msg),
            GpuError::MappingFailed(msg) => write!(f, "Buffer mapping failed: {}", msg),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::NotFound { path, reason } => {
                write!(f, "Could not load shader '{}': {}", path.display(), reason)
            }
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::ShortRead { expected, actual } => write!(
                f,
                "Downloaded {} bytes but the frame needs {}",
                actual, expected
            ),
            SnapshotError::ReadbackFailed(msg) => write!(f, "Snapshot readback failed: {}", msg),
            SnapshotError::Cancelled => write!(f, "Snapshot request was dropped"),
            SnapshotError::SaveFailed(msg) => write!(f, "Could not save snapshot: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for GpuError {}
impl std::error::Error for ShaderError {}
impl std::error::Error for SnapshotError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<GpuError> for AppError {
    fn from(err: GpuError) -> Self {
        AppError::Gpu(err)
    }
}

impl From<ShaderError> for AppError {
    fn from(err: ShaderError) -> Self {
        AppError::Shader(err)
    }
}

impl From<gstreamer::glib::Error> for CameraError {
    fn from(err: gstreamer::glib::Error) -> Self {
        CameraError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for CameraError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        CameraError::BackendError(err.to_string())
    }
}

/// Log an unrecoverable setup failure and terminate the process.
pub fn fatal(err: &impl fmt::Display) -> ! {
    tracing::error!(error = %err, "Fatal error, exiting");
    std::process::exit(1)
}
