// SPDX-License-Identifier: MPL-2.0

//! Custom render primitive running the crunch compute pass
//!
//! Every prepare waits for the previous frame's fence, then uploads the
//! newest camera frame, recomputes the quantization tables and dispatches the
//! compute shader into the output texture. Render draws that texture.

use crate::backends::camera::{CameraFrame, CameraSpec};
use crate::constants::shaders as names;
use crate::errors::{self, GpuError, SnapshotError};
use crate::gpu::{FramePacer, GpuResource, ResourceSet, WgpuDevice, provision, wgpu};
use crate::shaders::{CrunchSettings, FrameParams, ShaderSources, compute_dispatch_size};
use crate::storage;
use cosmic::iced::Rectangle;
use cosmic::iced_wgpu::graphics::Viewport;
use cosmic::iced_wgpu::primitive::{self, Primitive as PrimitiveTrait};
use futures::channel::oneshot;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// State handed from the UI thread to the renderer
#[derive(Debug, Default)]
pub struct PendingWork {
    /// Format of the open camera. Resources follow this.
    pub spec: Option<CameraSpec>,
    /// Newest frame not yet uploaded
    pub frame: Option<Arc<CameraFrame>>,
    /// Where to save the next crunched frame
    pub snapshot: Option<SnapshotRequest>,
}

/// Outcome of a snapshot, reported once the PNG is written or abandoned
pub type SnapshotReply = Result<PathBuf, SnapshotError>;

/// A snapshot waiting for the renderer
#[derive(Debug)]
pub struct SnapshotRequest {
    pub path: PathBuf,
    reply: oneshot::Sender<SnapshotReply>,
}

impl SnapshotRequest {
    fn new(path: PathBuf) -> (Self, oneshot::Receiver<SnapshotReply>) {
        let (reply, receiver) = oneshot::channel();
        (Self { path, reply }, receiver)
    }

    fn respond(self, result: Result<(), SnapshotError>) {
        // The app may have gone away, nothing to report to then
        let _ = self.reply.send(result.map(|()| self.path));
    }
}

/// Primitive drawn by [`CrunchWidget`](super::crunch_widget::CrunchWidget)
#[derive(Debug, Clone)]
pub struct CrunchPrimitive {
    shared: Arc<Mutex<PendingWork>>,
    shaders: Arc<ShaderSources>,
    settings: CrunchSettings,
}

impl CrunchPrimitive {
    pub fn new(shaders: ShaderSources) -> Self {
        Self {
            shared: Arc::new(Mutex::new(PendingWork::default())),
            shaders: Arc::new(shaders),
            settings: CrunchSettings::default(),
        }
    }

    /// Copy of this primitive carrying `settings` for the next prepare
    pub fn with_settings(&self, settings: CrunchSettings) -> Self {
        Self {
            settings,
            ..self.clone()
        }
    }

    pub fn set_camera_spec(&self, spec: CameraSpec) {
        if let Ok(mut pending) = self.shared.lock() {
            pending.spec = Some(spec);
            pending.frame = None;
        }
    }

    /// Replace any frame still waiting for upload.
    pub fn push_frame(&self, frame: Arc<CameraFrame>) {
        if let Ok(mut pending) = self.shared.lock() {
            pending.frame = Some(frame);
        }
    }

    /// Save the next crunched frame to `path`.
    ///
    /// The receiver yields once the file is written. It is cancelled if the
    /// request is dropped first, e.g. by a camera switch.
    pub fn request_snapshot(&self, path: PathBuf) -> oneshot::Receiver<SnapshotReply> {
        let (request, receiver) = SnapshotRequest::new(path);
        if let Ok(mut pending) = self.shared.lock() {
            pending.snapshot = Some(request);
        }
        receiver
    }
}

impl PrimitiveTrait for CrunchPrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut primitive::Storage,
        _bounds: &Rectangle,
        _viewport: &Viewport,
    ) {
        if !storage.has::<CrunchPipeline>() {
            let gpu = WgpuDevice::new(device, queue);
            match CrunchPipeline::new(gpu, format, &self.shaders) {
                Ok(pipeline) => storage.store(pipeline),
                Err(err) => errors::fatal(&err),
            }
        }

        // Brief lock, GPU work happens after release
        let (spec, frame, snapshot) = match self.shared.lock() {
            Ok(mut pending) => (
                pending.spec.clone(),
                pending.frame.take(),
                pending.snapshot.take(),
            ),
            Err(_) => return,
        };

        if let Some(pipeline) = storage.get_mut::<CrunchPipeline>() {
            pipeline.prepare_frame(spec, frame, snapshot, &self.settings);
        }
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &primitive::Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        if let Some(pipeline) = storage.get::<CrunchPipeline>() {
            pipeline.render(encoder, target, clip_bounds);
        }
    }
}

/// Bind groups tied to one resource set
struct FrameBindings {
    compute: wgpu::BindGroup,
    render: wgpu::BindGroup,
}

/// GPU state living in the renderer's primitive storage
pub struct CrunchPipeline {
    gpu: WgpuDevice,
    compute_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::RenderPipeline,
    compute_layout: wgpu::BindGroupLayout,
    render_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    params: FrameParams,
    active_spec: Option<CameraSpec>,
    resources: Option<ResourceSet<WgpuDevice>>,
    bindings: Option<FrameBindings>,
    pacer: FramePacer<wgpu::SubmissionIndex>,
    /// Snapshot whose texture copy is in the last submission
    readback: Option<SnapshotRequest>,
}

impl CrunchPipeline {
    pub fn new(
        gpu: WgpuDevice,
        format: wgpu::TextureFormat,
        shaders: &ShaderSources,
    ) -> Result<Self, GpuError> {
        let pipeline_error = |stage: &str, err: wgpu::Error| {
            GpuError::PipelineCreation(format!(
                "{} ({}): {}",
                stage,
                shaders.directory.display(),
                err
            ))
        };

        let compute_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("friedcamera compute bind group layout"),
            entries: &[
                // Frame parameters
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(FrameParams::SIZE),
                    },
                    count: None,
                },
                // Camera frame bytes
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Output texture
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let render_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("friedcamera render bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let compute_pipeline = gpu
            .checked(|device| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("friedcamera compute shader"),
                    source: wgpu::ShaderSource::Wgsl(shaders.compute.as_str().into()),
                });
                let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("friedcamera compute pipeline layout"),
                    bind_group_layouts: &[&compute_layout],
                    push_constant_ranges: &[],
                });
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("friedcamera compute pipeline"),
                    layout: Some(&layout),
                    module: &module,
                    entry_point: Some(names::COMPUTE_ENTRY),
                    compilation_options: Default::default(),
                    cache: None,
                })
            })
            .map_err(|err| pipeline_error(names::COMPUTE_FILE, err))?;

        let render_pipeline = gpu
            .checked(|device| {
                let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("friedcamera vertex shader"),
                    source: wgpu::ShaderSource::Wgsl(shaders.vertex.as_str().into()),
                });
                let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("friedcamera fragment shader"),
                    source: wgpu::ShaderSource::Wgsl(shaders.fragment.as_str().into()),
                });
                let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("friedcamera render pipeline layout"),
                    bind_group_layouts: &[&render_layout],
                    push_constant_ranges: &[],
                });
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("friedcamera render pipeline"),
                    layout: Some(&layout),
                    vertex: wgpu::VertexState {
                        module: &vertex,
                        entry_point: Some(names::VERTEX_ENTRY),
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    fragment: Some(wgpu::FragmentState {
                        module: &fragment,
                        entry_point: Some(names::FRAGMENT_ENTRY),
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|err| {
                pipeline_error(
                    &format!("{} + {}", names::VERTEX_FILE, names::FRAGMENT_FILE),
                    err,
                )
            })?;

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("friedcamera output sampler"),
            address_mode_u: wgpu::AddressMode::MirrorRepeat,
            address_mode_v: wgpu::AddressMode::MirrorRepeat,
            address_mode_w: wgpu::AddressMode::MirrorRepeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = gpu
            .checked(|device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Frame Params"),
                    size: FrameParams::SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .map_err(|err| GpuError::AllocationFailed {
                resource: "Frame Params",
                reason: err.to_string(),
            })?;

        Ok(Self {
            gpu,
            compute_pipeline,
            render_pipeline,
            compute_layout,
            render_layout,
            sampler,
            uniform_buffer,
            params: FrameParams::default(),
            active_spec: None,
            resources: None,
            bindings: None,
            pacer: FramePacer::new(),
            readback: None,
        })
    }

    fn prepare_frame(
        &mut self,
        spec: Option<CameraSpec>,
        frame: Option<Arc<CameraFrame>>,
        snapshot: Option<SnapshotRequest>,
        settings: &CrunchSettings,
    ) {
        // The previous submission owns the transfer buffers until it retires.
        self.pacer.begin_frame(&self.gpu);
        self.finish_readback();

        if let Some(spec) = spec
            && self.active_spec.as_ref() != Some(&spec)
        {
            self.reprovision(spec);
        }

        let Some(resources) = self.resources.as_ref() else {
            return;
        };
        let Some(bindings) = self.bindings.as_ref() else {
            return;
        };
        let sizes = resources.sizes();

        self.params.update_quantization(settings);
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.params));

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("friedcamera frame encoder"),
            });

        if let Some(frame) = frame {
            if frame.width != sizes.width || frame.height != sizes.height {
                debug!(
                    frame_width = frame.width,
                    frame_height = frame.height,
                    "Frame does not match provisioned size, skipping upload"
                );
            } else {
                match self.gpu.write_mapped(resources.upload(), &frame.data) {
                    Ok(()) => encoder.copy_buffer_to_buffer(
                        resources.upload(),
                        0,
                        resources.storage(),
                        0,
                        resources.upload().size(),
                    ),
                    Err(err) => warn!(error = %err, "Frame upload failed"),
                }
            }
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("friedcamera crunch pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.compute_pipeline);
            pass.set_bind_group(0, &bindings.compute, &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(sizes.width, names::TILE_SIZE),
                compute_dispatch_size(sizes.height, names::TILE_SIZE),
                1,
            );
        }

        if let Some(request) = snapshot {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture: resources.texture(),
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: resources.download(),
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(sizes.download_row_pitch),
                        rows_per_image: Some(sizes.height),
                    },
                },
                wgpu::Extent3d {
                    width: sizes.width,
                    height: sizes.height,
                    depth_or_array_layers: 1,
                },
            );
            self.readback = Some(request);
        }

        self.pacer.submit(&self.gpu, encoder.finish());
    }

    /// Replace the resource set and bind groups for a new camera format.
    fn reprovision(&mut self, spec: CameraSpec) {
        self.bindings = None;
        if let Some(request) = self.readback.take() {
            request.respond(Err(SnapshotError::Cancelled));
        }
        let outcome = match provision(&spec, &self.gpu, &mut self.resources, &mut self.params) {
            Ok(outcome) => outcome,
            Err(err) => errors::fatal(&err),
        };
        info!(
            width = outcome.sizes.width,
            height = outcome.sizes.height,
            upload_bytes = outcome.sizes.yuv_bytes,
            download_bytes = outcome.sizes.download_bytes,
            "GPU resources provisioned"
        );
        let Some(resources) = self.resources.as_ref() else {
            return;
        };

        let output_view = resources
            .texture()
            .create_view(&wgpu::TextureViewDescriptor::default());

        let compute = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("friedcamera compute bind group"),
            layout: &self.compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: resources.storage().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
            ],
        });

        let render = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("friedcamera render bind group"),
            layout: &self.render_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.bindings = Some(FrameBindings { compute, render });
        self.active_spec = Some(outcome.spec);
    }

    /// Save the frame copied by the last submission, which has retired.
    fn finish_readback(&mut self) {
        let Some(request) = self.readback.take() else {
            return;
        };
        let Some(resources) = self.resources.as_ref() else {
            request.respond(Err(SnapshotError::Cancelled));
            return;
        };
        let sizes = resources.sizes();

        let rgba = match self
            .gpu
            .read_mapped(resources.download())
            .map_err(|e| SnapshotError::ReadbackFailed(e.to_string()))
            .and_then(|data| {
                storage::unpad_rows(&data, sizes.width, sizes.height, sizes.download_row_pitch)
            }) {
            Ok(rgba) => rgba,
            Err(err) => {
                warn!(path = %request.path.display(), error = %err, "Snapshot readback failed");
                request.respond(Err(err));
                return;
            }
        };

        std::thread::spawn(move || {
            let result = storage::save_png(&request.path, &rgba, sizes.width, sizes.height);
            if let Err(err) = &result {
                warn!(error = %err, "Failed to save snapshot");
            }
            request.respond(result);
        });
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        let Some(bindings) = self.bindings.as_ref() else {
            return;
        };
        if clip_bounds.width == 0 || clip_bounds.height == 0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("friedcamera present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_viewport(
            clip_bounds.x as f32,
            clip_bounds.y as f32,
            clip_bounds.width as f32,
            clip_bounds.height as f32,
            0.0,
            1.0,
        );
        render_pass.set_scissor_rect(
            clip_bounds.x,
            clip_bounds.y,
            clip_bounds.width,
            clip_bounds.height,
        );
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &bindings.render, &[]);
        render_pass.draw(0..6, 0..1);
    }
}

impl Drop for CrunchPipeline {
    fn drop(&mut self) {
        self.pacer.drain(&self.gpu);
        self.uniform_buffer.release();
    }
}
