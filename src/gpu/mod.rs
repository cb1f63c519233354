// SPDX-License-Identifier: GPL-3.0-only

//! GPU resource management for the crunch pipeline.
//!
//! Rendering uses the device libcosmic already created for the UI. The traits
//! below are the seam between resource bookkeeping and wgpu:
//!
//! ```text
//! ┌──────────────┐ provision() ┌──────────────┐
//! │ FormatSource │────────────>│ ResourceSet  │ upload / download /
//! └──────────────┘             └──────┬───────┘ storage / texture
//!                                     │ GpuDevice
//!                              ┌──────┴───────┐
//!                              │  WgpuDevice  │ SubmitQueue
//!                              └──────┬───────┘
//!                                     │ fences
//!                              ┌──────┴───────┐
//!                              │  FramePacer  │ at most one frame in flight
//!                              └──────────────┘
//! ```

pub mod device;
pub mod pacing;
pub mod resources;

use crate::errors::GpuError;

/// Re-export wgpu types from cosmic
pub use cosmic::iced_wgpu::wgpu;

pub use device::WgpuDevice;
pub use pacing::FramePacer;
pub use resources::{ProvisionOutcome, ResourceSet, ResourceSizes, provision};

/// A GPU object that can be released explicitly.
pub trait GpuResource {
    /// Free the underlying memory. The handle must not be used afterwards.
    fn release(&self);
}

/// Allocator for the four resources of a [`ResourceSet`].
pub trait GpuDevice {
    type Buffer: GpuResource;
    type Texture: GpuResource;

    /// Host-writable buffer used to stage camera frames
    fn create_upload_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<Self::Buffer, GpuError>;

    /// Host-readable buffer used to fetch the crunched frame
    fn create_download_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<Self::Buffer, GpuError>;

    /// Device-local buffer read by the compute pass
    fn create_storage_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<Self::Buffer, GpuError>;

    /// RGBA texture written by compute and sampled by the display pass
    fn create_output_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, GpuError>;
}

/// Queue that hands back a fence per submission.
pub trait SubmitQueue {
    type Commands;
    type Fence;

    fn submit(&self, commands: Self::Commands) -> Self::Fence;

    /// Block until the work behind `fence` has finished. No timeout.
    fn wait(&self, fence: Self::Fence);
}
