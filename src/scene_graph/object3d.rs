use std::sync::Arc;

use id_arena::Id;

use crate::model::Model;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model: Option<Arc<Model>>,
    pub visible: bool,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_model(name: impl Into<String>, model: Arc<Model>) -> Self {
        Self {
            model: Some(model),
            ..Self::new(name)
        }
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            model: None,
            visible: true,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
