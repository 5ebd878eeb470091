use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;
use glam::Vec4;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    model::{Model, ModelKey},
    rendering::{
        frame_uniform::FrameUniformState,
        imgui_renderer::ImguiRendererState,
        instance::Instance,
        passes::lambert_pass::{LambertPass, LambertTarget},
        render_common::RenderCommon,
        render_model::RenderModel,
        texture::DepthTexture,
    },
    scene_host::{DrawItem, FrameSnapshot},
};

/// Cleared to when no view is producing frames.
const IDLE_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

/// Draw items of one model, in first-seen order.
pub struct DrawBatch {
    pub model: Arc<Model>,
    pub instances: Vec<Instance>,
}

pub fn batch_draw_items(items: &[DrawItem]) -> Vec<DrawBatch> {
    let mut batches: Vec<DrawBatch> = Vec::new();
    let mut batch_by_key: HashMap<ModelKey, usize> = HashMap::new();

    for item in items {
        let index = *batch_by_key.entry(item.model.key).or_insert_with(|| {
            batches.push(DrawBatch {
                model: item.model.clone(),
                instances: Vec::new(),
            });
            batches.len() - 1
        });
        batches[index].instances.push(Instance::from_draw_item(item));
    }

    batches
}

fn to_wgpu_color(color: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: color.x as f64,
        g: color.y as f64,
        b: color.z as f64,
        a: color.w as f64,
    }
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: HashMap<ModelKey, RenderModel>,

    lambert_pass: LambertPass,
    imgui_renderer: ImguiRendererState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        imgui_context: &mut imgui::Context,
        shader_folder: &Path,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let common = Arc::new(RenderCommon::new(&device, &adapter, &surface, size));

        let depth_texture = DepthTexture::new(&device, size.width, size.height, "Depth Texture");

        let lambert_pass = LambertPass::create(&device, common.clone(), shader_folder)?;

        let imgui_renderer =
            ImguiRendererState::new(&device, &queue, common.surface_format(), imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: HashMap::new(),
            lambert_pass,
            imgui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Ok(mut config) = self.common.output_surface_config.write() else {
            log::error!("Surface configuration lock poisoned");
            return;
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
        self.depth_texture
            .resize(&self.device, new_size.width, new_size.height);
    }

    /// Uploads what the snapshot draws. Models the snapshot doesn't use are
    /// released.
    fn sync_models(&mut self, snapshot: &FrameSnapshot) {
        for render_model in self.render_models.values_mut() {
            render_model.instances.clear();
        }

        for batch in batch_draw_items(&snapshot.items) {
            let render_model = self
                .render_models
                .entry(batch.model.key)
                .or_insert_with(|| {
                    log::debug!(
                        "Uploading model {} ({} triangles)",
                        batch.model.name,
                        batch.model.triangle_count()
                    );
                    RenderModel::from_model(&self.device, &batch.model)
                });
            render_model.instances = batch.instances;
        }

        self.render_models
            .retain(|_, render_model| !render_model.instances.is_empty());

        for render_model in self.render_models.values_mut() {
            render_model.upload_instances(&self.device, &self.queue);
        }
    }

    /// Draws `snapshot` (or just clears if there is none) with the UI on top.
    pub fn render(
        &mut self,
        snapshot: Option<&FrameSnapshot>,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.lambert_pass.load_pending_shaders();

        let clear_color = match snapshot {
            Some(snapshot) => {
                self.common
                    .frame_uniform
                    .update(&self.queue, &FrameUniformState::from_snapshot(snapshot));
                self.sync_models(snapshot);
                to_wgpu_color(snapshot.clear_color)
            }
            None => {
                self.render_models.clear();
                IDLE_CLEAR_COLOR
            }
        };

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.lambert_pass.render(
            &LambertTarget {
                color: &view,
                depth: self.depth_texture.view(),
                clear_color,
            },
            &mut encoder,
            |render_pass| {
                for render_model in self.render_models.values() {
                    render_model.draw(render_pass);
                }
            },
        );

        if let Err(e) = self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        ) {
            log::error!("Rendering Imgui failed: {:?}", e);
        }

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::geometry::box_model;

    fn item(model: &Arc<Model>, x: f32) -> DrawItem {
        let world = Mat4::from_translation(Vec3::X * x);
        DrawItem {
            model: model.clone(),
            world,
            normal: world.inverse().transpose(),
        }
    }

    #[test]
    fn items_sharing_a_model_become_one_batch() {
        let a = Arc::new(box_model("a", Vec3::ONE, Vec4::ONE));
        let b = Arc::new(box_model("b", Vec3::ONE, Vec4::ONE));

        let batches = batch_draw_items(&[item(&a, 0.0), item(&b, 1.0), item(&a, 2.0)]);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].model.key, a.key);
        assert_eq!(batches[0].instances.len(), 2);
        assert_eq!(batches[0].instances[1].model[3][0], 2.0);
        assert_eq!(batches[1].instances.len(), 1);
    }

    #[test]
    fn clear_color_converts_channels() {
        let color = to_wgpu_color(Vec4::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!((color.r, color.g, color.b, color.a), (1.0, 0.5, 0.0, 1.0));
    }
}
