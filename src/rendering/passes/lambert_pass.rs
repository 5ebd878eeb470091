use std::{path::Path, sync::Arc};

use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPass,
    RenderPassDescriptor, ShaderSource, StencilState,
};

use crate::rendering::{
    instance::Instance,
    render_common::RenderCommon,
    render_model::RENDER_MODEL_VBL,
    shader_loader::{PipelineFactory, ShaderDefinition, ShaderLoader, LAMBERT_SHADER},
    texture::DepthTexture,
};

/// Clears the output and draws lit, vertex-coloured geometry.
pub struct LambertPass {
    shader_loader: ShaderLoader,
    common: Arc<RenderCommon>,
}

pub struct LambertTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
    pub clear_color: wgpu::Color,
}

impl LambertPass {
    pub fn create(
        device: &wgpu::Device,
        common: Arc<RenderCommon>,
        shader_folder: &Path,
    ) -> anyhow::Result<Self> {
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Lambert pipeline layout"),
                bind_group_layouts: &[&common.frame_uniform.bind_group_layout],
                push_constant_ranges: &[],
            });

        let surface_format = common.surface_format();

        let factory: PipelineFactory = Arc::new(
            move |device: &Device,
                  shader_def: &ShaderDefinition,
                  source: &str|
                  -> anyhow::Result<wgpu::RenderPipeline> {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader_def.name),
                    source: ShaderSource::Wgsl(source.into()),
                });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Lambert render pipeline"),
                    layout: Some(&render_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[RENDER_MODEL_VBL, Instance::descriptor()],
                        compilation_options: PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: Some(wgpu::Face::Back),
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DepthTexture::DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: StencilState::default(),
                        bias: DepthBiasState::default(),
                    }),
                    multisample: MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });

                Ok(pipeline)
            },
        );

        let shader_loader =
            ShaderLoader::new(device.clone(), shader_folder, LAMBERT_SHADER, factory)?;

        Ok(LambertPass {
            shader_loader,
            common,
        })
    }

    pub fn load_pending_shaders(&mut self) {
        self.shader_loader.load_pending_shaders();
    }

    pub fn render<F>(&self, target: &LambertTarget, encoder: &mut wgpu::CommandEncoder, draw: F)
    where
        F: FnOnce(&mut RenderPass),
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Lambert pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(target.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(self.shader_loader.pipeline());
        render_pass.set_bind_group(0, &self.common.frame_uniform.bind_group, &[]);

        draw(&mut render_pass);
    }
}
