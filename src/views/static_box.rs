use std::sync::Arc;

use anyhow::Context;
use glam::Vec3;

use super::View;
use crate::{
    geometry::{box_model, rgb},
    scene_graph::{Object3D, ObjectId},
    scene_host::{FrameSnapshot, SceneHost, SceneSetup},
    stage::Stage,
};

/// Labels of the six numeric inputs, positions first.
pub const INPUT_LABELS: [&str; 6] = [
    "positionX",
    "positionY",
    "positionZ",
    "rotationX",
    "rotationY",
    "rotationZ",
];

/// Inputs are divided by this before they reach the box.
const INPUT_DIVISOR: f32 = 10.0;

/// Empty text reads as zero; anything else that isn't a number is NaN.
pub fn parse_input(text: &str) -> f32 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.parse().unwrap_or(f32::NAN)
}

/// Replaces the components of `current` that are not NaN in `next`.
fn merge_finite(current: Vec3, next: Vec3) -> Vec3 {
    Vec3::select(next.is_nan_mask(), current, next)
}

/// A yellow box positioned directly from text inputs.
pub struct StaticBoxView {
    host: SceneHost,
    box_id: Option<ObjectId>,
    inputs: [String; 6],
}

impl StaticBoxView {
    pub fn new() -> Self {
        Self {
            host: SceneHost::new(),
            box_id: None,
            inputs: std::array::from_fn(|_| "0".to_string()),
        }
    }

    /// Sets the text of the input called `label` and applies all inputs.
    /// Returns false for an unknown label.
    pub fn set_input(&mut self, label: &str, text: &str) -> bool {
        let Some(index) = INPUT_LABELS.iter().position(|l| *l == label) else {
            return false;
        };
        self.inputs[index] = text.to_string();
        self.apply_inputs();
        true
    }

    fn apply_inputs(&mut self) {
        let Some(box_id) = self.box_id else {
            return;
        };
        let [px, py, pz, rx, ry, rz] = std::array::from_fn(|i| parse_input(&self.inputs[i]));
        let position = Vec3::new(px, py, pz) / INPUT_DIVISOR;
        let rotation = Vec3::new(rx, ry, rz) / INPUT_DIVISOR;

        let scene = self.host.scene_mut();
        let Some(transform) = scene.get_object_transform(box_id) else {
            return;
        };
        let position = merge_finite(transform.translation(), position);
        let rotation = merge_finite(transform.rotation(), rotation);

        scene.set_object_translation(box_id, position);
        scene.set_object_rotation(box_id, rotation);
    }
}

impl Default for StaticBoxView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for StaticBoxView {
    fn title(&self) -> &'static str {
        "Sample 1"
    }

    fn mount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.host = SceneHost::new();
        self.host
            .init(stage, SceneSetup::static_box())
            .context("Failed to initialize static box scene")?;

        let model = Arc::new(box_model("box", Vec3::ONE, rgb(0xffcc00)));
        self.box_id = Some(
            self.host
                .scene_mut()
                .add_object(Object3D::with_model("box", model)),
        );
        self.apply_inputs();

        self.host.start()?;
        log::info!("Mounted {}", self.title());
        Ok(())
    }

    fn unmount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.host.dispose(stage)?;
        self.box_id = None;
        log::info!("Unmounted {}", self.title());
        Ok(())
    }

    fn update(&mut self, _dt: f32) {}

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let mut changed = false;
        for (label, text) in INPUT_LABELS.iter().zip(self.inputs.iter_mut()) {
            changed |= ui.input_text(label, text).build();
        }
        if changed {
            self.apply_inputs();
        }
    }

    fn render_frame(&mut self) -> Option<FrameSnapshot> {
        self.host.render_frame()
    }
}
