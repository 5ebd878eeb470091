use std::sync::Arc;

use anyhow::Context;
use glam::Vec3;

use super::View;
use crate::{
    controls::{apply_control, Control},
    geometry::{box_model, rgb},
    scene_graph::{Object3D, ObjectId},
    scene_host::{FrameSnapshot, SceneHost, SceneSetup},
    stage::Stage,
    transform_state::{rotation_units_to_radians, TransformStore},
    tween::Timeline,
};

/// A red box moved by buttons, animated towards the stored transform.
pub struct AnimatedBoxView {
    host: SceneHost,
    store: TransformStore,
    timeline: Timeline,
    box_id: Option<ObjectId>,
}

impl AnimatedBoxView {
    pub fn new() -> Self {
        Self {
            host: SceneHost::new(),
            store: TransformStore::default(),
            timeline: Timeline::new(),
            box_id: None,
        }
    }

    pub fn store(&self) -> &TransformStore {
        &self.store
    }

    /// Does what clicking the button for `control` does. Ignored while the
    /// view is not mounted.
    pub fn press(&mut self, control: Control) {
        let Some(box_id) = self.box_id else {
            return;
        };
        apply_control(control, &mut self.store, &mut self.timeline, box_id);
    }
}

impl Default for AnimatedBoxView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for AnimatedBoxView {
    fn title(&self) -> &'static str {
        "Animation"
    }

    fn mount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.host = SceneHost::new();
        self.host
            .init(stage, SceneSetup::animated_box())
            .context("Failed to initialize animated box scene")?;

        let state = *self.store.state();
        let mut object = Object3D::with_model(
            "box",
            Arc::new(box_model("box", Vec3::ONE, rgb(0xef5555))),
        );
        object.transform.set_transform(
            state.position,
            state.rotation.map(rotation_units_to_radians),
            state.scale,
        );
        self.box_id = Some(self.host.scene_mut().add_object(object));

        self.host.start()?;
        log::info!("Mounted {}", self.title());
        Ok(())
    }

    fn unmount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.timeline.clear();
        self.host.dispose(stage)?;
        self.box_id = None;
        log::info!("Unmounted {}", self.title());
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.timeline.advance(dt, self.host.scene_mut());
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let mut pressed = None;
        for (index, control) in Control::ALL.into_iter().enumerate() {
            // Scale, rotate, move and move back each get a row.
            if !matches!(index, 0 | 2 | 5 | 8) {
                ui.same_line();
            }
            if ui.button(control.label()) {
                pressed = Some(control);
            }
        }
        if let Some(control) = pressed {
            self.press(control);
        }

        let state = self.store.state();
        ui.separator();
        ui.text(format!("scale: {}", state.scale));
        ui.text(format!("rotation: {}", state.rotation));
        ui.text(format!("position: {}", state.position));
        if !self.timeline.is_empty() {
            ui.text_disabled(format!("{} tweens running", self.timeline.len()));
        }
    }

    fn render_frame(&mut self) -> Option<FrameSnapshot> {
        self.host.render_frame()
    }
}
