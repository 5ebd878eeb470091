use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use winit::event::{DeviceEvent, KeyEvent};

use super::View;
use crate::{
    model_loader::{AssetFormat, LoadEvent, ModelLoader},
    scene_graph::ObjectId,
    scene_host::{FrameSnapshot, SceneHost, SceneSetup},
    stage::Stage,
};

/// Radians added to the model's Z rotation every update.
const SPIN_PER_FRAME: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading(f32),
    Loaded { nodes: usize },
    Failed(String),
}

/// Shows an external model with orbit controls.
pub struct ModelView {
    host: SceneHost,
    loader: ModelLoader,
    model_path: PathBuf,
    format: AssetFormat,
    status: LoadStatus,
    model_root: Option<ObjectId>,
}

impl ModelView {
    pub fn new(asset_root: &Path, model_path: &Path, format: AssetFormat) -> Self {
        Self {
            host: SceneHost::new(),
            loader: ModelLoader::new(asset_root),
            model_path: model_path.to_path_buf(),
            format,
            status: LoadStatus::Idle,
            model_root: None,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    fn poll_loader(&mut self) {
        for event in self.loader.poll() {
            match event {
                LoadEvent::Progress(fraction) => self.status = LoadStatus::Loading(fraction),
                LoadEvent::Loaded(imported) => {
                    let nodes = imported.node_count();
                    let roots = self.host.scene_mut().spawn_imported(&imported);
                    self.model_root = roots.first().copied();
                    log::info!(
                        "Loaded {} ({} nodes)",
                        self.model_path.display(),
                        nodes
                    );
                    self.status = LoadStatus::Loaded { nodes };
                }
                LoadEvent::Failed(error) => {
                    log::error!("Failed to load {}: {}", self.model_path.display(), error);
                    self.status = LoadStatus::Failed(error.to_string());
                }
            }
        }
    }

    fn spin_model(&mut self) {
        let Some(root) = self.model_root else {
            return;
        };
        let scene = self.host.scene_mut();
        if let Some(rotation) = scene.get_object_transform(root).map(|t| t.rotation()) {
            scene.set_object_rotation(root, rotation + Vec3::Z * SPIN_PER_FRAME);
        }
    }
}

impl View for ModelView {
    fn title(&self) -> &'static str {
        "3D model"
    }

    fn mount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.host = SceneHost::new();
        self.host
            .init(stage, SceneSetup::model_viewer())
            .context("Failed to initialize model viewer scene")?;
        self.host.start()?;

        self.model_root = None;
        self.status = match self.loader.load(&self.model_path, self.format) {
            Ok(()) => LoadStatus::Loading(0.0),
            Err(error) => {
                log::error!("Failed to start loading {}: {}", self.model_path.display(), error);
                LoadStatus::Failed(error.to_string())
            }
        };

        log::info!("Mounted {}", self.title());
        Ok(())
    }

    fn unmount(&mut self, stage: &mut Stage) -> anyhow::Result<()> {
        self.loader.cancel();
        self.host.dispose(stage)?;
        self.model_root = None;
        log::info!("Unmounted {}", self.title());
        Ok(())
    }

    fn update(&mut self, _dt: f32) {
        self.poll_loader();
        self.spin_model();
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        ui.text(format!("model: {}", self.model_path.display()));
        match &self.status {
            LoadStatus::Idle => ui.text("idle"),
            LoadStatus::Loading(fraction) => ui.text(format!("{:.0}% loaded", fraction * 100.0)),
            LoadStatus::Loaded { nodes } => ui.text(format!("loaded, {} nodes", nodes)),
            LoadStatus::Failed(message) => ui.text_colored([0.8, 0.1, 0.1, 1.0], message),
        }
        ui.text_disabled("drag: orbit, shift+drag: pan, wheel: zoom");
    }

    fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let Some(controls) = self.host.orbit_controls_mut() {
            controls.process_device_event(event);
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if let Some(controls) = self.host.orbit_controls_mut() {
            controls.process_key(event);
        }
    }

    fn render_frame(&mut self) -> Option<FrameSnapshot> {
        self.host.render_frame()
    }
}
