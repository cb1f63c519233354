// SPDX-License-Identifier: GPL-3.0-only

//! Camera-format driven resource provisioning

use super::{GpuDevice, GpuResource};
use crate::backends::camera::{CameraSpec, FormatSource};
use crate::errors::AppResult;
use crate::shaders::FrameParams;
use tracing::{info, warn};

/// Wgpu requires buffer-to-texture row pitches to be a multiple of this.
pub const ROW_PITCH_ALIGNMENT: u32 = 256;

pub const UPLOAD_LABEL: &str = "Camera Frame Upload";
pub const DOWNLOAD_LABEL: &str = "Output RGB Download";
pub const STORAGE_LABEL: &str = "GPU Camera Frame";
pub const TEXTURE_LABEL: &str = "Output RGB (fried) Texture";

/// Byte sizes derived from a frame size, assuming NV12 (4:2:0) input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSizes {
    pub width: u32,
    pub height: u32,
    /// Full-resolution luma plus half-resolution interleaved chroma
    pub yuv_bytes: u64,
    /// Tightly packed RGBA frame
    pub rgba_bytes: u64,
    /// Offset of the chroma plane
    pub uv_offset: u64,
    /// Row pitch of the download buffer
    pub download_row_pitch: u32,
    /// Size of the download buffer, `download_row_pitch * height`
    pub download_bytes: u64,
}

impl ResourceSizes {
    pub fn for_frame(width: u32, height: u32) -> Self {
        let pixels = width as u64 * height as u64;
        let download_row_pitch = (width * 4).next_multiple_of(ROW_PITCH_ALIGNMENT);
        Self {
            width,
            height,
            yuv_bytes: 3 * pixels / 2,
            rgba_bytes: pixels * 4,
            uv_offset: pixels,
            download_row_pitch,
            download_bytes: download_row_pitch as u64 * height as u64,
        }
    }
}

/// The four GPU resources tied to one camera format.
///
/// Dropping the set releases every member.
pub struct ResourceSet<D: GpuDevice> {
    upload: D::Buffer,
    download: D::Buffer,
    storage: D::Buffer,
    texture: D::Texture,
    sizes: ResourceSizes,
}

impl<D: GpuDevice> ResourceSet<D> {
    /// Allocate upload, download, storage and texture, in that order.
    ///
    /// On failure the members allocated so far are released again.
    pub fn allocate(device: &D, sizes: ResourceSizes) -> AppResult<Self> {
        let upload = device.create_upload_buffer(UPLOAD_LABEL, sizes.yuv_bytes)?;
        let download = device
            .create_download_buffer(DOWNLOAD_LABEL, sizes.download_bytes)
            .inspect_err(|_| upload.release())?;
        let storage = device
            .create_storage_buffer(STORAGE_LABEL, sizes.yuv_bytes)
            .inspect_err(|_| {
                upload.release();
                download.release();
            })?;
        let texture = device
            .create_output_texture(TEXTURE_LABEL, sizes.width, sizes.height)
            .inspect_err(|_| {
                upload.release();
                download.release();
                storage.release();
            })?;
        Ok(Self {
            upload,
            download,
            storage,
            texture,
            sizes,
        })
    }

    pub fn upload(&self) -> &D::Buffer {
        &self.upload
    }

    pub fn download(&self) -> &D::Buffer {
        &self.download
    }

    pub fn storage(&self) -> &D::Buffer {
        &self.storage
    }

    pub fn texture(&self) -> &D::Texture {
        &self.texture
    }

    pub fn sizes(&self) -> ResourceSizes {
        self.sizes
    }
}

impl<D: GpuDevice> Drop for ResourceSet<D> {
    fn drop(&mut self) {
        self.upload.release();
        self.download.release();
        self.storage.release();
        self.texture.release();
    }
}

/// Result of a successful [`provision`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionOutcome {
    pub spec: CameraSpec,
    pub sizes: ResourceSizes,
}

/// (Re)create the resource set for the camera's current format.
///
/// Any set already in `slot` is released before the new one is allocated.
/// `params` receives the new frame geometry. Errors are meant to be fatal.
pub fn provision<D, S>(
    camera: &S,
    device: &D,
    slot: &mut Option<ResourceSet<D>>,
    params: &mut FrameParams,
) -> AppResult<ProvisionOutcome>
where
    D: GpuDevice,
    S: FormatSource + ?Sized,
{
    let spec = camera.format()?;
    info!(
        format = %spec.format_name,
        colorimetry = %spec.colorimetry,
        width = spec.width,
        height = spec.height,
        framerate = %spec.framerate,
        "Camera spec"
    );

    let sizes = ResourceSizes::for_frame(spec.width, spec.height);
    params.set_frame_geometry(spec.width, spec.height);

    drop(slot.take());
    *slot = Some(ResourceSet::allocate(device, sizes)?);

    if !spec.is_nv12() {
        warn!(
            format = %spec.format_name,
            "Camera data is not NV12, the shader may read or output garbage"
        );
    }

    Ok(ProvisionOutcome { spec, sizes })
}
