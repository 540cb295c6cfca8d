use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::backend::{FrameUniforms, RippleBackend, QUAD_COMPONENTS};
use crate::compile::compile_stage;
use crate::error::{DrawError, RippleError, ShaderStageKind};
use crate::types::SurfaceSize;

use super::context::{GpuContext, GpuOptions};
use super::pipeline;
use super::uniforms::{RippleUniforms, UNIFORM_SIZE};

pub(crate) struct GpuStage {
    stage: ShaderStageKind,
    module: wgpu::ShaderModule,
}

/// Linked pipeline plus the buffers bound to it during initialisation.
pub(crate) struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    geometry: Option<(wgpu::Buffer, u32)>,
    uniforms: Option<(wgpu::Buffer, wgpu::BindGroup)>,
}

/// [`RippleBackend`] drawing into a window surface through wgpu.
pub(crate) struct GpuBackend {
    context: GpuContext,
    uniforms: RippleUniforms,
}

impl GpuBackend {
    /// Acquires a device and surface for `target`.
    pub(crate) fn acquire<T>(target: &T, options: GpuOptions, opacity: f32) -> Result<Self, RippleError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, options)
            .map_err(|err| RippleError::context_unavailable(format!("{err:#}")))?;
        debug!(
            format = ?context.surface_format,
            color_space = ?context.color_space,
            width = context.size.width,
            height = context.size.height,
            "GPU context ready"
        );
        let uniforms = RippleUniforms::new(context.size, opacity);
        Ok(Self { context, uniforms })
    }

    fn write_uniforms(&self, program: &GpuProgram) {
        if let Some((buffer, _)) = program.uniforms.as_ref() {
            self.context
                .queue
                .write_buffer(buffer, 0, self.uniforms.as_bytes());
        }
    }
}

impl RippleBackend for GpuBackend {
    type Stage = GpuStage;
    type Program = GpuProgram;

    fn surface_size(&self) -> SurfaceSize {
        self.context.size
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStageKind,
        source: &str,
    ) -> Result<Self::Stage, String> {
        let module = compile_stage(&self.context.device, stage, source)?;
        Ok(GpuStage { stage, module })
    }

    fn link_program(
        &mut self,
        vertex: Self::Stage,
        fragment: Self::Stage,
    ) -> Result<Self::Program, String> {
        if vertex.stage != ShaderStageKind::Vertex || fragment.stage != ShaderStageKind::Fragment {
            return Err(format!(
                "expected vertex and fragment stages, got {} and {}",
                vertex.stage, fragment.stage
            ));
        }
        let device = &self.context.device;
        let uniform_layout = pipeline::uniform_layout(device);
        let render_pipeline = pipeline::link(
            device,
            &vertex.module,
            &fragment.module,
            &uniform_layout,
            self.context.surface_format,
        )?;
        Ok(GpuProgram {
            pipeline: render_pipeline,
            uniform_layout,
            geometry: None,
            uniforms: None,
        })
    }

    fn upload_geometry(&mut self, program: &mut Self::Program, vertices: &[f32]) {
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ripple quad"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let vertex_count = (vertices.len() / QUAD_COMPONENTS) as u32;
        program.geometry = Some((buffer, vertex_count));
    }

    fn bind_uniforms(&mut self, program: &mut Self::Program) {
        let device = &self.context.device;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ripple uniforms"),
            size: UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ripple uniform bind group"),
            layout: &program.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        program.uniforms = Some((buffer, bind_group));
        self.write_uniforms(program);
    }

    fn resize(&mut self, program: &mut Self::Program, size: SurfaceSize) {
        if size == self.context.size {
            self.context.reconfigure();
        } else {
            self.context.resize(size);
        }
        self.uniforms.set_resolution(self.context.size);
        self.write_uniforms(program);
    }

    fn set_uniforms(&mut self, program: &mut Self::Program, uniforms: &FrameUniforms) {
        self.uniforms.apply(uniforms);
        self.write_uniforms(program);
    }

    fn draw(&mut self, program: &mut Self::Program, vertex_count: u32) -> Result<(), DrawError> {
        let (Some((vertex_buffer, uploaded)), Some((_, bind_group))) =
            (program.geometry.as_ref(), program.uniforms.as_ref())
        else {
            return Err(DrawError::Fatal(
                "draw issued before geometry and uniforms were bound".to_string(),
            ));
        };
        let vertex_count = vertex_count.min(*uploaded);

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(DrawError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(DrawError::Fatal("surface out of memory".to_string()))
            }
            Err(err) => return Err(DrawError::Transient(err.to_string())),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("ripple encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ripple pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let size = self.context.size;
            render_pass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..vertex_count, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
