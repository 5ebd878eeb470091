use std::{
    collections::HashMap,
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, channel, TryRecvError},
        Arc,
    },
    thread,
};

use glam::{EulerRot, Quat, Vec3, Vec4};
use thiserror::Error;

use crate::model::Model;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Uniform scale applied to the first root of every imported scene.
pub const IMPORT_SCALE: f32 = 0.1;
/// Rotation about the first root's local Z axis after import, in radians.
pub const IMPORT_ROTATION_Z: f32 = 90.0;

const OBJ_FALLBACK_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("unsupported primitive mode {0}")]
    UnsupportedPrimitive(String),
    #[error("missing {0} attribute in mesh {1}")]
    MissingAttribute(&'static str, String),
    #[error("{attribute} has {found} entries but mesh {mesh} has {expected} positions")]
    AttributeCountMismatch {
        attribute: &'static str,
        mesh: String,
        expected: usize,
        found: usize,
    },
    #[error("mesh {0} has no primitives")]
    EmptyMesh(String),
    #[error("asset contains no scene")]
    NoScene,
    #[error("{0:?} assets are not supported")]
    UnsupportedFormat(AssetFormat),
    #[error("a load is already in progress")]
    Busy,
    #[error("loader worker stopped without a result")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Gltf,
    Obj,
    Fbx,
}

impl AssetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(AssetFormat::Gltf),
            "obj" => Some(AssetFormat::Obj),
            "fbx" => Some(AssetFormat::Fbx),
            _ => None,
        }
    }
}

/// Node of an imported asset, detached from any scene.
#[derive(Clone)]
pub struct ImportedNode {
    pub name: String,
    pub translation: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub model: Option<Arc<Model>>,
    pub children: Vec<ImportedNode>,
}

impl ImportedNode {
    fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            model: None,
            children: Vec::new(),
        }
    }

    fn rotate_local_z(&mut self, angle: f32) {
        let current = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        let (x, y, z) = (current * Quat::from_rotation_z(angle)).to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(ImportedNode::count).sum::<usize>()
    }
}

#[derive(Clone)]
pub struct ImportedScene {
    pub roots: Vec<ImportedNode>,
}

impl ImportedScene {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ImportedNode::count).sum()
    }

    /// Shrinks the first root and turns it about its local Z axis.
    pub fn apply_import_adjustment(&mut self) {
        if let Some(root) = self.roots.first_mut() {
            root.scale *= IMPORT_SCALE;
            root.rotate_local_z(IMPORT_ROTATION_Z);
        }
    }
}

pub enum LoadEvent {
    /// Fraction of the file read so far, 0..=1.
    Progress(f32),
    Loaded(ImportedScene),
    Failed(LoadError),
}

/// Loads one asset at a time on a worker thread.
pub struct ModelLoader {
    asset_root: PathBuf,
    receiver: Option<mpsc::Receiver<LoadEvent>>,
}

impl ModelLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            receiver: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.is_some()
    }

    /// Starts loading `path` (relative to the asset root) and returns
    /// immediately. Results arrive through [`ModelLoader::poll`].
    pub fn load(&mut self, path: impl AsRef<Path>, format: AssetFormat) -> Result<(), LoadError> {
        if self.is_loading() {
            return Err(LoadError::Busy);
        }

        let full_path = self.asset_root.join(path.as_ref());
        log::info!("Loading {:?} asset {}", format, full_path.display());

        let (sender, receiver) = channel();
        thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let event = match load_scene(&full_path, format, &sender) {
                    Ok(mut scene) => {
                        scene.apply_import_adjustment();
                        LoadEvent::Loaded(scene)
                    }
                    Err(error) => LoadEvent::Failed(error),
                };
                // The receiver is gone if the view was unmounted mid-load.
                let _ = sender.send(event);
            })?;

        self.receiver = Some(receiver);
        Ok(())
    }

    /// Forgets the load in flight. The worker finishes on its own and its
    /// result is discarded.
    pub fn cancel(&mut self) {
        if self.receiver.take().is_some() {
            log::debug!("Abandoned model load in flight");
        }
    }

    /// Drains everything the worker has reported since the last call.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        let Some(receiver) = &self.receiver else {
            return events;
        };

        let mut finished = false;
        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    finished = matches!(event, LoadEvent::Loaded(_) | LoadEvent::Failed(_));
                    events.push(event);
                    if finished {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    events.push(LoadEvent::Failed(LoadError::Disconnected));
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            self.receiver = None;
        }
        events
    }
}

fn load_scene(
    path: &Path,
    format: AssetFormat,
    progress: &mpsc::Sender<LoadEvent>,
) -> Result<ImportedScene, LoadError> {
    if format == AssetFormat::Fbx {
        return Err(LoadError::UnsupportedFormat(format));
    }

    let bytes = read_with_progress(path, progress)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    match format {
        AssetFormat::Gltf => import_gltf(&bytes, base),
        AssetFormat::Obj => import_obj(&bytes, base, path),
        AssetFormat::Fbx => Err(LoadError::UnsupportedFormat(format)),
    }
}

fn read_with_progress(
    path: &Path,
    progress: &mpsc::Sender<LoadEvent>,
) -> Result<Vec<u8>, LoadError> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len() as usize;
    let mut bytes = Vec::with_capacity(total);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);

        let fraction = if total == 0 {
            1.0
        } else {
            (bytes.len() as f32 / total as f32).min(1.0)
        };
        log::debug!("{:.0}% loaded", fraction * 100.0);
        let _ = progress.send(LoadEvent::Progress(fraction));
    }

    Ok(bytes)
}

fn import_gltf(bytes: &[u8], base: &Path) -> Result<ImportedScene, LoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, Some(base), blob)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut models = HashMap::new();
    let roots = scene
        .nodes()
        .map(|node| import_gltf_node(&node, &buffers, &mut models))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportedScene { roots })
}

fn import_gltf_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    models: &mut HashMap<usize, Arc<Model>>,
) -> Result<ImportedNode, LoadError> {
    let name = node.name().unwrap_or("Unnamed").to_string();
    let (translation, rotation, scale) = node.transform().decomposed();
    let (rx, ry, rz) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);

    // Meshes shared between nodes become one model.
    let model = match node.mesh() {
        Some(mesh) => match models.get(&mesh.index()) {
            Some(model) => Some(model.clone()),
            None => {
                let mesh_index = mesh.index();
                let mesh_name = mesh
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{} (Mesh)", name));
                let model = Arc::new(Model::from_gltf(mesh_name, mesh, buffers)?);
                models.insert(mesh_index, model.clone());
                Some(model)
            }
        },
        None => None,
    };

    let children = node
        .children()
        .map(|child| import_gltf_node(&child, buffers, models))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportedNode {
        name,
        translation: Vec3::from(translation),
        rotation: Vec3::new(rx, ry, rz),
        scale: Vec3::from(scale),
        model,
        children,
    })
}

fn import_obj(bytes: &[u8], base: &Path, path: &Path) -> Result<ImportedScene, LoadError> {
    let (obj_models, materials) = tobj::load_obj_buf(
        &mut Cursor::new(bytes),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |material_path| tobj::load_mtl(base.join(material_path)),
    )?;

    let materials = materials.unwrap_or_else(|error| {
        log::warn!("Ignoring OBJ materials: {}", error);
        Vec::new()
    });

    let children = obj_models
        .iter()
        .map(|obj| {
            let color = obj
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse)
                .map(|[r, g, b]| Vec4::new(r, g, b, 1.0))
                .unwrap_or(OBJ_FALLBACK_COLOR);

            ImportedNode {
                model: Some(Arc::new(Model::from_obj(obj, color))),
                ..ImportedNode::group(obj.name.clone())
            }
        })
        .collect();

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "obj".to_string());

    Ok(ImportedScene {
        roots: vec![ImportedNode {
            children,
            ..ImportedNode::group(name)
        }],
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// One named node holding a single-triangle mesh, buffer inlined.
    pub const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Tri", "mesh": 0, "translation": [0.0, 2.0, 0.0] }],
        "meshes": [{ "name": "TriMesh", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    }"#;
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        time::{Duration, Instant},
    };

    use super::fixtures::TRIANGLE_GLTF;
    use super::*;

    const TRIANGLE_OBJ: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn write_asset(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn wait_for_result(loader: &mut ModelLoader) -> (Vec<f32>, LoadEvent) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut progress = Vec::new();

        while Instant::now() < deadline {
            for event in loader.poll() {
                match event {
                    LoadEvent::Progress(fraction) => progress.push(fraction),
                    other => return (progress, other),
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("loader did not finish");
    }

    #[test]
    fn loads_gltf_and_adjusts_first_root() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), "tri.gltf", TRIANGLE_GLTF);

        let mut loader = ModelLoader::new(dir.path());
        loader.load("tri.gltf", AssetFormat::Gltf).unwrap();
        let (progress, result) = wait_for_result(&mut loader);

        assert_eq!(progress.last().copied(), Some(1.0));
        assert!(!loader.is_loading());

        let LoadEvent::Loaded(scene) = result else {
            panic!("expected a loaded scene");
        };
        assert_eq!(scene.roots.len(), 1);
        let root = &scene.roots[0];
        assert_eq!(root.name, "Tri");
        assert_eq!(root.translation, Vec3::new(0.0, 2.0, 0.0));
        assert!((root.scale - Vec3::splat(IMPORT_SCALE)).length() < 1e-6);

        let expected = Quat::from_rotation_z(IMPORT_ROTATION_Z);
        let actual = Quat::from_euler(EulerRot::XYZ, root.rotation.x, root.rotation.y, root.rotation.z);
        assert!(actual.dot(expected).abs() > 1.0 - 1e-5);

        let model = root.model.as_ref().unwrap();
        assert_eq!(model.name, "TriMesh");
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.primitives[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn obj_models_are_grouped_under_one_root() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), "tri.obj", TRIANGLE_OBJ);

        let mut loader = ModelLoader::new(dir.path());
        loader.load("tri.obj", AssetFormat::Obj).unwrap();

        let LoadEvent::Loaded(scene) = wait_for_result(&mut loader).1 else {
            panic!("expected a loaded scene");
        };
        assert_eq!(scene.roots.len(), 1);
        assert_eq!(scene.roots[0].name, "tri");
        assert_eq!(scene.node_count(), 2);
        assert!((scene.roots[0].scale - Vec3::splat(IMPORT_SCALE)).length() < 1e-6);
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ModelLoader::new(dir.path());
        loader.load("nope.gltf", AssetFormat::Gltf).unwrap();

        let (_, result) = wait_for_result(&mut loader);
        assert!(matches!(result, LoadEvent::Failed(LoadError::Io(_))));
        assert!(!loader.is_loading());
    }

    #[test]
    fn second_load_while_busy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), "tri.gltf", TRIANGLE_GLTF);

        let mut loader = ModelLoader::new(dir.path());
        loader.load("tri.gltf", AssetFormat::Gltf).unwrap();
        assert!(matches!(
            loader.load("tri.gltf", AssetFormat::Gltf),
            Err(LoadError::Busy)
        ));

        wait_for_result(&mut loader);
        assert!(loader.load("tri.gltf", AssetFormat::Gltf).is_ok());

        loader.cancel();
        assert!(!loader.is_loading());
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn fbx_is_reported_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        write_asset(dir.path(), "model.fbx", "not really fbx");

        let mut loader = ModelLoader::new(dir.path());
        loader.load("model.fbx", AssetFormat::Fbx).unwrap();

        let (progress, result) = wait_for_result(&mut loader);
        assert!(progress.is_empty());
        assert!(matches!(
            result,
            LoadEvent::Failed(LoadError::UnsupportedFormat(AssetFormat::Fbx))
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            AssetFormat::from_path(Path::new("a/b/Scene.GLB")),
            Some(AssetFormat::Gltf)
        );
        assert_eq!(
            AssetFormat::from_path(Path::new("x.fbx")),
            Some(AssetFormat::Fbx)
        );
        assert_eq!(AssetFormat::from_path(Path::new("x.png")), None);
        assert_eq!(AssetFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn adjustment_only_touches_first_root() {
        let mut scene = ImportedScene {
            roots: vec![ImportedNode::group("a"), ImportedNode::group("b")],
        };
        scene.apply_import_adjustment();
        assert_eq!(scene.roots[0].scale, Vec3::splat(IMPORT_SCALE));
        assert_eq!(scene.roots[1].scale, Vec3::ONE);
        assert_eq!(scene.roots[1].rotation, Vec3::ZERO);
    }

    #[test]
    fn local_z_turn_composes_with_existing_rotation() {
        let mut node = ImportedNode::group("root");
        node.rotation = Vec3::new(0.0, 0.0, 0.25);
        node.rotate_local_z(0.5);

        let actual = Quat::from_euler(EulerRot::XYZ, node.rotation.x, node.rotation.y, node.rotation.z);
        assert!(actual.dot(Quat::from_rotation_z(0.75)).abs() > 1.0 - 1e-5);

        let mut tilted = ImportedNode::group("tilted");
        tilted.rotation = Vec3::new(0.3, 0.0, 0.0);
        tilted.rotate_local_z(0.5);

        let expected = Quat::from_rotation_x(0.3) * Quat::from_rotation_z(0.5);
        let actual = Quat::from_euler(EulerRot::XYZ, tilted.rotation.x, tilted.rotation.y, tilted.rotation.z);
        assert!(actual.dot(expected).abs() > 1.0 - 1e-5);
    }
}
