//! Timed interpolation of scene object transform components.
//!
//! A [`Timeline`] owns pending and running tweens and is advanced once per
//! frame against anything implementing [`Animatable`] (the scene graph).

mod ease;
mod timeline;

use glam::Vec3;

use crate::scene_graph::ObjectId;

pub use ease::Ease;
pub use timeline::{Placement, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Scale,
    Rotation,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn get(self, vector: Vec3) -> f32 {
        match self {
            Axis::X => vector.x,
            Axis::Y => vector.y,
            Axis::Z => vector.z,
        }
    }

    pub fn set(self, vector: &mut Vec3, value: f32) {
        match self {
            Axis::X => vector.x = value,
            Axis::Y => vector.y = value,
            Axis::Z => vector.z = value,
        }
    }

    /// Returns `vector` with this axis replaced by `value`.
    pub fn with(self, mut vector: Vec3, value: f32) -> Vec3 {
        self.set(&mut vector, value);
        vector
    }
}

/// One scalar component of an object's live transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenTarget {
    pub object: ObjectId,
    pub channel: Channel,
    pub axis: Axis,
}

impl TweenTarget {
    pub fn new(object: ObjectId, channel: Channel, axis: Axis) -> Self {
        Self {
            object,
            channel,
            axis,
        }
    }
}

/// Read/write access to tweenable components.
pub trait Animatable {
    /// Current value, or `None` if the target no longer exists.
    fn component(&self, target: TweenTarget) -> Option<f32>;

    /// Writes a value. Returns `false` if the target no longer exists.
    fn set_component(&mut self, target: TweenTarget, value: f32) -> bool;
}
