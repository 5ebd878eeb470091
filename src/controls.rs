//! Buttons of the animated sample and what they do to the box.
//!
//! Every control updates the authoritative [`TransformState`] immediately and
//! issues the matching tween in the same call; the live object catches up over
//! the tween's duration.

use glam::Vec3;

use crate::scene_graph::ObjectId;
use crate::transform_state::{rotation_units_to_radians, TransformAction, TransformStore};
use crate::tween::{Axis, Channel, Ease, Placement, Timeline, TweenTarget};

pub const SCALE_STEP: f32 = 1.0;
pub const ROTATION_STEP: f32 = 10.0;
pub const POSITION_STEP: f32 = 1.0;

pub const SCALE_TWEEN_SECONDS: f32 = 0.3;
pub const MOVE_TWEEN_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ScaleUp,
    ScaleDown,
    Rotate(Axis),
    Position(Axis),
    PositionNegative(Axis),
}

impl Control {
    /// In the order the buttons are laid out.
    pub const ALL: [Control; 11] = [
        Control::ScaleUp,
        Control::ScaleDown,
        Control::Rotate(Axis::X),
        Control::Rotate(Axis::Y),
        Control::Rotate(Axis::Z),
        Control::Position(Axis::X),
        Control::Position(Axis::Y),
        Control::Position(Axis::Z),
        Control::PositionNegative(Axis::X),
        Control::PositionNegative(Axis::Y),
        Control::PositionNegative(Axis::Z),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::ScaleUp => "scaleUp",
            Control::ScaleDown => "scaleDown",
            Control::Rotate(Axis::X) => "rotateX",
            Control::Rotate(Axis::Y) => "rotateY",
            Control::Rotate(Axis::Z) => "rotateZ",
            Control::Position(Axis::X) => "positionX",
            Control::Position(Axis::Y) => "positionY",
            Control::Position(Axis::Z) => "positionZ",
            Control::PositionNegative(Axis::X) => "positionX Negative",
            Control::PositionNegative(Axis::Y) => "positionY Negative",
            Control::PositionNegative(Axis::Z) => "positionZ Negative",
        }
    }
}

/// Applies `control` to the stored state and queues the tween that carries
/// `object` to the new value.
pub fn apply_control(
    control: Control,
    store: &mut TransformStore,
    timeline: &mut Timeline,
    object: ObjectId,
) {
    let state = *store.state();

    match control {
        Control::ScaleUp | Control::ScaleDown => {
            let delta = if control == Control::ScaleUp {
                SCALE_STEP
            } else {
                -SCALE_STEP
            };
            let scale = state.scale + Vec3::splat(delta);
            store.dispatch(TransformAction::Scale(scale));

            // One axis after another rather than all three at once.
            for (index, axis) in Axis::ALL.into_iter().enumerate() {
                let placement = if index == 0 {
                    Placement::Now
                } else {
                    Placement::AfterPrevious
                };
                timeline.to(
                    TweenTarget::new(object, Channel::Scale, axis),
                    axis.get(scale),
                    SCALE_TWEEN_SECONDS,
                    Ease::ExpoOut,
                    placement,
                );
            }
        }
        Control::Rotate(axis) => {
            let units = axis.get(state.rotation) + ROTATION_STEP;
            store.dispatch(TransformAction::Rotate(axis.with(state.rotation, units)));
            timeline.to(
                TweenTarget::new(object, Channel::Rotation, axis),
                rotation_units_to_radians(units),
                MOVE_TWEEN_SECONDS,
                Ease::QuadInOut,
                Placement::Now,
            );
        }
        Control::Position(axis) | Control::PositionNegative(axis) => {
            let delta = if matches!(control, Control::Position(_)) {
                POSITION_STEP
            } else {
                -POSITION_STEP
            };
            let value = axis.get(state.position) + delta;
            store.dispatch(TransformAction::Position(axis.with(state.position, value)));
            timeline.to(
                TweenTarget::new(object, Channel::Position, axis),
                value,
                MOVE_TWEEN_SECONDS,
                Ease::QuadInOut,
                Placement::Now,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::{Object3D, Scene};
    use crate::tween::Animatable;

    fn setup() -> (TransformStore, Timeline, Scene, ObjectId) {
        let mut scene = Scene::new();
        let id = scene.add_object(Object3D::new("box"));
        (TransformStore::default(), Timeline::new(), scene, id)
    }

    #[test]
    fn seven_up_three_down_scales_to_five() {
        let (mut store, mut timeline, _scene, id) = setup();
        for _ in 0..7 {
            apply_control(Control::ScaleUp, &mut store, &mut timeline, id);
        }
        for _ in 0..3 {
            apply_control(Control::ScaleDown, &mut store, &mut timeline, id);
        }
        assert_eq!(store.state().scale, Vec3::splat(5.0));
    }

    #[test]
    fn three_rotations_accumulate_units_and_radians() {
        let (mut store, mut timeline, mut scene, id) = setup();
        for _ in 0..3 {
            apply_control(Control::Rotate(Axis::X), &mut store, &mut timeline, id);
        }
        assert_eq!(store.state().rotation, Vec3::new(30.0, 0.0, 0.0));

        timeline.advance(MOVE_TWEEN_SECONDS + 0.01, &mut scene);
        let radians = scene
            .component(TweenTarget::new(id, Channel::Rotation, Axis::X))
            .unwrap();
        assert!((radians - 30.0 * std::f32::consts::PI / 100.0).abs() < 1e-5);
        assert!((radians - 0.9425).abs() < 1e-4);
    }

    #[test]
    fn state_updates_before_object_catches_up() {
        let (mut store, mut timeline, mut scene, id) = setup();
        apply_control(Control::Position(Axis::Y), &mut store, &mut timeline, id);

        assert_eq!(store.state().position, Vec3::Y);
        timeline.advance(MOVE_TWEEN_SECONDS / 2.0, &mut scene);
        let live = scene.get_object_transform(id).unwrap().translation();
        assert!(live.y > 0.0 && live.y < 1.0);

        timeline.advance(MOVE_TWEEN_SECONDS, &mut scene);
        let live = scene.get_object_transform(id).unwrap().translation();
        assert_eq!(live, Vec3::Y);
    }

    #[test]
    fn negative_position_moves_single_axis() {
        let (mut store, mut timeline, _scene, id) = setup();
        apply_control(
            Control::PositionNegative(Axis::Z),
            &mut store,
            &mut timeline,
            id,
        );
        apply_control(Control::Position(Axis::X), &mut store, &mut timeline, id);
        assert_eq!(store.state().position, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(store.state().scale, Vec3::ONE);
    }

    #[test]
    fn scale_issues_three_tweens_and_others_one() {
        let (mut store, mut timeline, _scene, id) = setup();
        apply_control(Control::ScaleUp, &mut store, &mut timeline, id);
        assert_eq!(timeline.len(), 3);
        apply_control(Control::Rotate(Axis::Z), &mut store, &mut timeline, id);
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn scale_axes_arrive_in_order() {
        let (mut store, mut timeline, mut scene, id) = setup();
        apply_control(Control::ScaleUp, &mut store, &mut timeline, id);

        timeline.advance(SCALE_TWEEN_SECONDS + 0.01, &mut scene);
        let scale = scene.get_object_transform(id).unwrap().scale();
        assert_eq!(scale.x, 2.0);
        assert!(scale.y < 2.0);
        assert_eq!(scale.z, 1.0);

        timeline.advance(2.0 * SCALE_TWEEN_SECONDS, &mut scene);
        let scale = scene.get_object_transform(id).unwrap().scale();
        assert_eq!(scale, Vec3::splat(2.0));
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<_> = Control::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Control::ALL.len());
    }
}
