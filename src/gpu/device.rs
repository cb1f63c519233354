// SPDX-License-Identifier: GPL-3.0-only

//! wgpu implementation of the resource and submission traits

use super::{GpuDevice, GpuResource, SubmitQueue, wgpu};
use crate::errors::GpuError;

impl GpuResource for wgpu::Buffer {
    fn release(&self) {
        self.destroy();
    }
}

impl GpuResource for wgpu::Texture {
    fn release(&self) {
        self.destroy();
    }
}

/// Device and queue handed to the render primitive by the UI renderer
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl WgpuDevice {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    /// Run `create` inside validation and out-of-memory error scopes.
    pub fn checked<T>(
        &self,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    fn allocate_buffer(
        &self,
        label: &'static str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, GpuError> {
        // Copies and storage bindings operate on whole words.
        let size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        self.checked(|device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        })
        .map_err(|err| GpuError::AllocationFailed {
            resource: label,
            reason: err.to_string(),
        })
    }

    /// Map `buffer` for writing and copy `bytes` into its start.
    ///
    /// Copies at most the buffer length. The buffer must not be in use by the GPU.
    pub fn write_mapped(&self, buffer: &wgpu::Buffer, bytes: &[u8]) -> Result<(), GpuError> {
        let slice = buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();

        slice.map_async(wgpu::MapMode::Write, move |result| {
            let _ = sender.send(result);
        });

        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        pollster::block_on(receiver)
            .map_err(|_| GpuError::MappingFailed("mapping callback dropped".to_string()))?
            .map_err(|e| GpuError::MappingFailed(format!("{:?}", e)))?;

        {
            let mut view = slice.get_mapped_range_mut();
            let len = bytes.len().min(view.len());
            view[..len].copy_from_slice(&bytes[..len]);
        }
        buffer.unmap();

        Ok(())
    }

    /// Map `buffer` for reading and copy its contents out.
    pub fn read_mapped(&self, buffer: &wgpu::Buffer) -> Result<Vec<u8>, GpuError> {
        let slice = buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();

        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        pollster::block_on(receiver)
            .map_err(|_| GpuError::MappingFailed("mapping callback dropped".to_string()))?
            .map_err(|e| GpuError::MappingFailed(format!("{:?}", e)))?;

        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();

        Ok(data)
    }
}

impl GpuDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type Texture = wgpu::Texture;

    fn create_upload_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<wgpu::Buffer, GpuError> {
        self.allocate_buffer(
            label,
            size,
            wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
        )
    }

    fn create_download_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<wgpu::Buffer, GpuError> {
        self.allocate_buffer(
            label,
            size,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        )
    }

    fn create_storage_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<wgpu::Buffer, GpuError> {
        self.allocate_buffer(
            label,
            size,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        )
    }

    fn create_output_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
    ) -> Result<wgpu::Texture, GpuError> {
        self.checked(|device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        })
        .map_err(|err| GpuError::AllocationFailed {
            resource: label,
            reason: err.to_string(),
        })
    }
}

impl SubmitQueue for WgpuDevice {
    type Commands = wgpu::CommandBuffer;
    type Fence = wgpu::SubmissionIndex;

    fn submit(&self, commands: wgpu::CommandBuffer) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(commands))
    }

    fn wait(&self, fence: wgpu::SubmissionIndex) {
        let _ = self.device.poll(wgpu::PollType::Wait {
            submission_index: Some(fence),
            timeout: None,
        });
    }
}
