use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::model_loader::{ImportedNode, ImportedScene};
use crate::scene_graph::light::PointLight;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::transform::Transform;
use crate::tween::{Animatable, Channel, TweenTarget};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub lights: Vec<PointLight>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            lights: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        log::trace!("Adding object {:?}", object.name);
        self.objects.alloc(object)
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    /// Inserts an imported node tree. Returns the ids of the root objects in
    /// import order.
    pub fn spawn_imported(&mut self, imported: &ImportedScene) -> Vec<ObjectId> {
        imported
            .roots
            .iter()
            .map(|node| self.spawn_imported_node(node, None))
            .collect()
    }

    fn spawn_imported_node(&mut self, node: &ImportedNode, parent: Option<ObjectId>) -> ObjectId {
        let mut object = Object3D::new(node.name.clone());
        object
            .transform
            .set_transform(node.translation, node.rotation, node.scale);
        object.model = node.model.clone();

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in &node.children {
            self.spawn_imported_node(child, Some(object_id));
        }

        object_id
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_object_transform_recursive(
        &self,
        object_id: ObjectId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        if let Some(object) = self.objects.get(object_id) {
            // Computing the local matrix may mark the world matrix dirty.
            let local_matrix = *object.transform.get_local_matrix();
            let changed = parent_changed || object.transform.is_world_dirty();

            if changed {
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix, changed);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|c| c.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_rotation(rotation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    /// Recomputes world matrices of edited objects and their descendants.
    pub fn update_world_transforms(&mut self) {
        self.update_transforms();
    }
}

impl Animatable for Scene {
    fn component(&self, target: TweenTarget) -> Option<f32> {
        let transform = self.get_object_transform(target.object)?;
        let value = match target.channel {
            Channel::Scale => transform.scale(),
            Channel::Rotation => transform.rotation(),
            Channel::Position => transform.translation(),
        };
        Some(target.axis.get(value))
    }

    fn set_component(&mut self, target: TweenTarget, value: f32) -> bool {
        let Some(transform) = self.get_object_transform(target.object) else {
            return false;
        };

        let mut vector = match target.channel {
            Channel::Scale => transform.scale(),
            Channel::Rotation => transform.rotation(),
            Channel::Position => transform.translation(),
        };
        target.axis.set(&mut vector, value);

        match target.channel {
            Channel::Scale => self.set_object_scale(target.object, vector),
            Channel::Rotation => self.set_object_rotation(target.object, vector),
            Channel::Position => self.set_object_translation(target.object, vector),
        }
        true
    }
}
