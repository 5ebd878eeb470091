use winit::event::{DeviceEvent, KeyEvent};

use crate::{config::AppConfig, scene_host::FrameSnapshot, stage::Stage};

mod animated_box;
mod model_viewer;
mod static_box;

pub use animated_box::AnimatedBoxView;
pub use model_viewer::ModelView;
pub use static_box::StaticBoxView;

/// A sample that can be mounted into a [`Stage`].
///
/// A view owns its scene host. `mount` and `unmount` must leave the stage
/// with the same listeners and outputs it had before.
pub trait View {
    fn title(&self) -> &'static str;

    fn mount(&mut self, stage: &mut Stage) -> anyhow::Result<()>;

    fn unmount(&mut self, stage: &mut Stage) -> anyhow::Result<()>;

    /// Advances animations by `dt` seconds.
    fn update(&mut self, dt: f32);

    fn draw_ui(&mut self, ui: &imgui::Ui);

    fn handle_device_event(&mut self, _event: &DeviceEvent) {}

    fn handle_key(&mut self, _event: &KeyEvent) {}

    fn render_frame(&mut self) -> Option<FrameSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Static,
    Animated,
    Model,
}

impl Sample {
    pub const ALL: [Sample; 3] = [Sample::Static, Sample::Animated, Sample::Model];

    pub fn label(self) -> &'static str {
        match self {
            Sample::Static => "Sample 1",
            Sample::Animated => "Animation",
            Sample::Model => "3D model",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "static" => Some(Sample::Static),
            "animated" => Some(Sample::Animated),
            "model" => Some(Sample::Model),
            _ => None,
        }
    }

    pub fn create_view(self, config: &AppConfig) -> Box<dyn View> {
        match self {
            Sample::Static => Box::new(StaticBoxView::new()),
            Sample::Animated => Box::new(AnimatedBoxView::new()),
            Sample::Model => Box::new(ModelView::new(
                &config.asset_root,
                &config.model_path,
                config.model_format,
            )),
        }
    }
}
