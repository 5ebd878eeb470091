use std::{cell::RefCell, rc::Rc, sync::Arc};

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

use crate::{
    camera::PerspectiveCamera,
    geometry::rgb,
    model::Model,
    orbit_controls::OrbitControls,
    scene_graph::{PointLight, Scene},
    stage::{ListenerId, OutputId, Stage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Initialized,
    Rendering,
    Disposed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("cannot {operation} a scene host that is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: HostState,
    },
}

/// What a host is initialised with.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub name: &'static str,
    pub clear_color: Vec4,
    pub lights: Vec<PointLight>,
    pub orbit_controls: bool,
}

impl SceneSetup {
    pub fn static_box() -> Self {
        Self {
            name: "static box",
            clear_color: rgb(0xe5e5e5),
            lights: vec![PointLight::sample_light()],
            orbit_controls: false,
        }
    }

    pub fn animated_box() -> Self {
        Self {
            name: "animated box",
            clear_color: rgb(0xeeeeee),
            lights: vec![PointLight::sample_light()],
            orbit_controls: false,
        }
    }

    pub fn model_viewer() -> Self {
        Self {
            name: "model viewer",
            clear_color: rgb(0xeeeeee),
            lights: vec![PointLight::sample_light()],
            orbit_controls: true,
        }
    }
}

/// Cancellable per-host frame callback.
#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Counts a frame if the loop is running.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.frames += 1;
        }
        self.running
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[derive(Debug, Clone)]
struct Viewport {
    width: u32,
    height: u32,
    camera: PerspectiveCamera,
}

impl Viewport {
    fn resize(&mut self, width: u32, height: u32) {
        if self.camera.set_aspect(width, height) {
            self.width = width;
            self.height = height;
        }
    }
}

#[derive(Clone)]
pub struct DrawItem {
    pub model: Arc<Model>,
    pub world: Mat4,
    pub normal: Mat4,
}

impl PartialEq for DrawItem {
    fn eq(&self, other: &Self) -> bool {
        self.model.key == other.model.key && self.world == other.world && self.normal == other.normal
    }
}

impl std::fmt::Debug for DrawItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawItem")
            .field("model", &self.model.name)
            .field("world", &self.world)
            .finish()
    }
}

/// Everything one frame draws.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub clear_color: Vec4,
    pub view_proj: Mat4,
    pub eye: Vec3,
    pub size: (u32, u32),
    pub lights: Vec<PointLight>,
    pub items: Vec<DrawItem>,
}

/// Owns one scene together with its camera, output and frame loop.
pub struct SceneHost {
    state: HostState,
    scene: Scene,
    viewport: Rc<RefCell<Viewport>>,
    clear_color: Vec4,
    orbit_controls: Option<OrbitControls>,
    frame_loop: FrameLoop,
    resize_listener: Option<ListenerId>,
    output: Option<OutputId>,
}

impl Default for SceneHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost {
    pub fn new() -> Self {
        Self {
            state: HostState::Uninitialized,
            scene: Scene::new(),
            viewport: Rc::new(RefCell::new(Viewport {
                width: 1,
                height: 1,
                camera: PerspectiveCamera::new(1.0),
            })),
            clear_color: Vec4::ONE,
            orbit_controls: None,
            frame_loop: FrameLoop::default(),
            resize_listener: None,
            output: None,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    fn expect_state(&self, operation: &'static str, allowed: &[HostState]) -> Result<(), HostError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(HostError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Sets up the scene, attaches an output to `stage` and starts listening
    /// for its resizes.
    pub fn init(&mut self, stage: &mut Stage, setup: SceneSetup) -> Result<(), HostError> {
        self.expect_state("initialize", &[HostState::Uninitialized])?;

        let (width, height) = stage.size();
        {
            let mut viewport = self.viewport.borrow_mut();
            viewport.camera = PerspectiveCamera::new(1.0);
            viewport.resize(width, height);
        }

        self.scene = Scene::new();
        for light in setup.lights {
            self.scene.add_light(light);
        }
        self.clear_color = setup.clear_color;
        self.orbit_controls = setup.orbit_controls.then(OrbitControls::default);

        let viewport = self.viewport.clone();
        self.resize_listener = Some(stage.add_resize_listener(Box::new(move |width, height| {
            viewport.borrow_mut().resize(width, height)
        })));
        self.output = Some(stage.attach_output(setup.name));

        log::info!("Initialized scene host for {}", setup.name);
        self.state = HostState::Initialized;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), HostError> {
        self.expect_state("start", &[HostState::Initialized])?;
        self.frame_loop.start();
        self.state = HostState::Rendering;
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> PerspectiveCamera {
        self.viewport.borrow().camera
    }

    pub fn output_size(&self) -> (u32, u32) {
        let viewport = self.viewport.borrow();
        (viewport.width, viewport.height)
    }

    pub fn orbit_controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.orbit_controls.as_mut()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_loop.frame_count()
    }

    /// Same as a resize notification from the stage. Zero-sized outputs are
    /// ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.borrow_mut().resize(width, height);
    }

    /// Produces the next frame, or nothing if the frame loop is not running.
    /// Frames are produced whether or not anything changed.
    pub fn render_frame(&mut self) -> Option<FrameSnapshot> {
        if !self.frame_loop.tick() {
            return None;
        }

        let (camera, size) = {
            let mut viewport = self.viewport.borrow_mut();
            if let Some(controls) = &self.orbit_controls {
                controls.apply_to(&mut viewport.camera);
            }
            (viewport.camera, (viewport.width, viewport.height))
        };

        self.scene.update_world_transforms();

        let items = self
            .scene
            .objects
            .iter()
            .filter(|(_, object)| object.visible)
            .filter_map(|(_, object)| {
                let model = object.model.clone()?;
                Some(DrawItem {
                    model,
                    world: *object.transform.get_world_matrix(),
                    normal: *object.transform.get_normal_matrix(),
                })
            })
            .collect();

        let snapshot = FrameSnapshot {
            clear_color: self.clear_color,
            view_proj: camera.get_vp_matrix(),
            eye: camera.eye,
            size,
            lights: self.scene.lights.clone(),
            items,
        };

        Some(snapshot)
    }

    /// Stops the frame loop and releases everything registered on `stage`.
    pub fn dispose(&mut self, stage: &mut Stage) -> Result<(), HostError> {
        self.expect_state("dispose", &[HostState::Initialized, HostState::Rendering])?;

        self.frame_loop.cancel();
        if let Some(listener) = self.resize_listener.take() {
            stage.remove_resize_listener(listener);
        }
        if let Some(output) = self.output.take() {
            stage.detach_output(output);
        }
        self.scene = Scene::new();
        self.orbit_controls = None;

        log::info!("Disposed scene host after {} frames", self.frame_count());
        self.state = HostState::Disposed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::box_model;
    use crate::scene_graph::Object3D;

    fn started_host(stage: &mut Stage) -> SceneHost {
        let mut host = SceneHost::new();
        host.init(stage, SceneSetup::static_box()).unwrap();
        host.start().unwrap();
        host
    }

    #[test]
    fn init_registers_one_listener_and_one_output() {
        let mut stage = Stage::new(800, 600);
        let mut host = started_host(&mut stage);
        assert_eq!(stage.resize_listener_count(), 1);
        assert_eq!(stage.output_count(), 1);
        assert_eq!(host.scene().lights.len(), 1);
        assert!((host.camera().aspect - 800.0 / 600.0).abs() < 1e-6);

        host.dispose(&mut stage).unwrap();
        assert_eq!(stage.resize_listener_count(), 0);
        assert_eq!(stage.output_count(), 0);
    }

    #[test]
    fn stage_resize_reaches_camera() {
        let mut stage = Stage::new(800, 600);
        let host = started_host(&mut stage);

        stage.resize(1000, 500);
        assert_eq!(host.output_size(), (1000, 500));
        assert_eq!(host.camera().aspect, 2.0);

        let before = host.camera();
        stage.resize(1000, 500);
        assert_eq!(host.camera(), before);

        stage.resize(0, 500);
        assert_eq!(host.output_size(), (1000, 500));
        assert_eq!(host.camera().aspect, 2.0);
    }

    #[test]
    fn operations_in_wrong_state_are_rejected() {
        let mut stage = Stage::new(100, 100);
        let mut host = SceneHost::new();

        assert_eq!(
            host.start(),
            Err(HostError::InvalidState {
                operation: "start",
                state: HostState::Uninitialized
            })
        );
        assert!(host.dispose(&mut stage).is_err());

        host.init(&mut stage, SceneSetup::static_box()).unwrap();
        assert!(host.init(&mut stage, SceneSetup::static_box()).is_err());
        assert_eq!(stage.resize_listener_count(), 1);

        host.start().unwrap();
        assert!(host.start().is_err());

        host.dispose(&mut stage).unwrap();
        assert_eq!(host.state(), HostState::Disposed);
        assert!(host.dispose(&mut stage).is_err());
        assert!(host.start().is_err());
    }

    #[test]
    fn no_frames_before_start_or_after_dispose() {
        let mut stage = Stage::new(100, 100);
        let mut host = SceneHost::new();
        host.init(&mut stage, SceneSetup::static_box()).unwrap();
        assert!(host.render_frame().is_none());

        host.start().unwrap();
        assert!(host.render_frame().is_some());

        host.dispose(&mut stage).unwrap();
        assert!(host.render_frame().is_none());
        assert_eq!(host.frame_count(), 1);
    }

    #[test]
    fn unchanged_scene_renders_identical_frames() {
        let mut stage = Stage::new(640, 480);
        let mut host = started_host(&mut stage);
        let model = Arc::new(box_model("box", Vec3::ONE, Vec4::ONE));
        host.scene_mut()
            .add_object(Object3D::with_model("box", model));

        let first = host.render_frame().unwrap();
        let second = host.render_frame().unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first.clear_color, rgb(0xe5e5e5));
        assert_eq!(first.eye, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn moved_object_changes_frame() {
        let mut stage = Stage::new(640, 480);
        let mut host = started_host(&mut stage);
        let model = Arc::new(box_model("box", Vec3::ONE, Vec4::ONE));
        let id = host
            .scene_mut()
            .add_object(Object3D::with_model("box", model));

        let first = host.render_frame().unwrap();
        host.scene_mut().set_object_translation(id, Vec3::X);
        let second = host.render_frame().unwrap();
        assert_ne!(first, second);
        assert_eq!(second.items[0].world.w_axis.x, 1.0);
    }

    #[test]
    fn hidden_and_empty_objects_are_not_drawn() {
        let mut stage = Stage::new(640, 480);
        let mut host = started_host(&mut stage);
        let model = Arc::new(box_model("box", Vec3::ONE, Vec4::ONE));
        let id = host
            .scene_mut()
            .add_object(Object3D::with_model("box", model));
        host.scene_mut().add_object(Object3D::new("group"));

        host.scene_mut().get_object_mut(id).unwrap().visible = false;
        assert!(host.render_frame().unwrap().items.is_empty());
    }
}
