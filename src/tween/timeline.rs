use super::{Animatable, Ease, TweenTarget};

/// Where a new tween starts on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// At the current clock.
    Now,
    /// When the most recently added tween ends, or now if that is past.
    AfterPrevious,
}

#[derive(Debug, Clone)]
struct Tween {
    target: TweenTarget,
    to: f32,
    start_time: f64,
    duration: f64,
    ease: Ease,
    /// Captured from the target when the tween activates.
    from: Option<f32>,
    finished: bool,
}

impl Tween {
    fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// A shared animation clock with tweens scheduled on it.
///
/// Tweens read their start value lazily when they activate, so a tween queued
/// behind another one starts from wherever the first one left the value.
/// When a tween activates, other running tweens on the same target are
/// dropped and the newest one wins.
#[derive(Debug, Default)]
pub struct Timeline {
    /// Seconds. Kept in f64 so that frame-sized steps still register after
    /// the view has been mounted for days.
    clock: f64,
    tweens: Vec<Tween>,
    last_end: f64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending and running tweens.
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Schedules a tween of `target` towards `to` over `duration` seconds.
    pub fn to(
        &mut self,
        target: TweenTarget,
        to: f32,
        duration: f32,
        ease: Ease,
        placement: Placement,
    ) {
        let start_time = match placement {
            Placement::Now => self.clock,
            Placement::AfterPrevious => self.last_end.max(self.clock),
        };
        let duration = duration.max(0.0) as f64;

        log::debug!(
            "tween {:?}.{:?} -> {} over {}s at t={:.3}",
            target.channel,
            target.axis,
            to,
            duration,
            start_time
        );

        let tween = Tween {
            target,
            to,
            start_time,
            duration,
            ease,
            from: None,
            finished: false,
        };
        self.last_end = tween.end_time();
        self.tweens.push(tween);
    }

    /// Moves the clock forward by `dt` seconds and writes the interpolated
    /// values of every running tween.
    pub fn advance(&mut self, dt: f32, subject: &mut impl Animatable) {
        self.clock += dt.max(0.0) as f64;

        for index in 0..self.tweens.len() {
            if self.tweens[index].finished || self.clock < self.tweens[index].start_time {
                continue;
            }

            if self.tweens[index].from.is_none() {
                let target = self.tweens[index].target;
                let Some(from) = subject.component(target) else {
                    self.tweens[index].finished = true;
                    continue;
                };
                self.tweens[index].from = Some(from);

                for (other_index, other) in self.tweens.iter_mut().enumerate() {
                    if other_index != index && other.target == target && other.from.is_some() {
                        other.finished = true;
                    }
                }
            }

            let tween = &mut self.tweens[index];
            let from = tween.from.unwrap_or(tween.to);
            let progress = if tween.duration <= 0.0 {
                1.0
            } else {
                ((self.clock - tween.start_time) / tween.duration) as f32
            };

            let value = if progress >= 1.0 {
                tween.finished = true;
                tween.to
            } else {
                from + (tween.to - from) * tween.ease.apply(progress)
            };

            if !subject.set_component(tween.target, value) {
                tween.finished = true;
            }
        }

        self.tweens.retain(|tween| !tween.finished);
    }

    /// Drops every tween, running or pending, without touching the targets.
    pub fn clear(&mut self) {
        self.tweens.clear();
        self.last_end = self.clock;
    }

    #[cfg(test)]
    fn end_of(&self, target: TweenTarget) -> Option<f64> {
        self.tweens
            .iter()
            .filter(|tween| tween.target == target)
            .map(Tween::end_time)
            .reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene_graph::{Object3D, ObjectId, Scene};
    use crate::tween::{Axis, Channel};

    fn scene_with_box() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let id = scene.add_object(Object3D::new("box"));
        (scene, id)
    }

    fn value(scene: &Scene, target: TweenTarget) -> f32 {
        scene.component(target).unwrap()
    }

    #[test]
    fn linear_tween_interpolates_and_lands_exactly() {
        let (mut scene, id) = scene_with_box();
        let target = TweenTarget::new(id, Channel::Position, Axis::X);
        let mut timeline = Timeline::new();

        timeline.to(target, 10.0, 1.0, Ease::Linear, Placement::Now);
        timeline.advance(0.0, &mut scene);
        assert!(value(&scene, target).abs() < 1e-6);

        timeline.advance(0.5, &mut scene);
        assert!((value(&scene, target) - 5.0).abs() < 1e-4);

        timeline.advance(0.7, &mut scene);
        assert_eq!(value(&scene, target), 10.0);
        assert!(timeline.is_empty());
    }

    #[test]
    fn after_previous_runs_sequentially() {
        let (mut scene, id) = scene_with_box();
        let x = TweenTarget::new(id, Channel::Scale, Axis::X);
        let y = TweenTarget::new(id, Channel::Scale, Axis::Y);
        let z = TweenTarget::new(id, Channel::Scale, Axis::Z);
        let mut timeline = Timeline::new();

        timeline.to(x, 2.0, 0.3, Ease::ExpoOut, Placement::Now);
        timeline.to(y, 2.0, 0.3, Ease::ExpoOut, Placement::AfterPrevious);
        timeline.to(z, 2.0, 0.3, Ease::ExpoOut, Placement::AfterPrevious);
        assert!((timeline.end_of(z).unwrap() - 0.9).abs() < 1e-6);

        timeline.advance(0.15, &mut scene);
        assert!(value(&scene, x) > 1.0);
        assert_eq!(value(&scene, y), 1.0);
        assert_eq!(value(&scene, z), 1.0);

        timeline.advance(0.3, &mut scene);
        assert_eq!(value(&scene, x), 2.0);
        assert!(value(&scene, y) > 1.0 && value(&scene, y) < 2.0);
        assert_eq!(value(&scene, z), 1.0);

        timeline.advance(0.5, &mut scene);
        let scale = scene.get_object_transform(id).unwrap().scale();
        assert_eq!(scale, Vec3::splat(2.0));
    }

    #[test]
    fn now_placement_runs_concurrently() {
        let (mut scene, id) = scene_with_box();
        let x = TweenTarget::new(id, Channel::Rotation, Axis::X);
        let y = TweenTarget::new(id, Channel::Rotation, Axis::Y);
        let mut timeline = Timeline::new();

        timeline.to(x, 1.0, 0.5, Ease::QuadInOut, Placement::Now);
        timeline.to(y, 1.0, 0.5, Ease::QuadInOut, Placement::Now);

        timeline.advance(0.25, &mut scene);
        assert!((value(&scene, x) - 0.5).abs() < 1e-4);
        assert!((value(&scene, y) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn newer_tween_overrides_running_one() {
        let (mut scene, id) = scene_with_box();
        let target = TweenTarget::new(id, Channel::Position, Axis::Y);
        let mut timeline = Timeline::new();

        timeline.to(target, 1.0, 0.5, Ease::QuadInOut, Placement::Now);
        timeline.advance(0.25, &mut scene);
        timeline.to(target, 2.0, 0.5, Ease::QuadInOut, Placement::Now);
        timeline.advance(0.0, &mut scene);
        assert_eq!(timeline.len(), 1);

        timeline.advance(1.0, &mut scene);
        assert_eq!(value(&scene, target), 2.0);
        assert!(timeline.is_empty());
    }

    #[test]
    fn queued_tween_starts_from_value_left_behind() {
        let (mut scene, id) = scene_with_box();
        let target = TweenTarget::new(id, Channel::Position, Axis::Z);
        let mut timeline = Timeline::new();

        timeline.to(target, 4.0, 0.5, Ease::Linear, Placement::Now);
        timeline.to(target, 0.0, 1.0, Ease::Linear, Placement::AfterPrevious);

        timeline.advance(0.5, &mut scene);
        assert_eq!(value(&scene, target), 4.0);

        timeline.advance(0.5, &mut scene);
        assert!((value(&scene, target) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn tweens_on_missing_objects_are_dropped() {
        let (mut scene, id) = scene_with_box();
        let mut other_scene = Scene::new();
        let target = TweenTarget::new(id, Channel::Scale, Axis::X);
        let mut timeline = Timeline::new();

        timeline.to(target, 3.0, 0.5, Ease::Linear, Placement::Now);
        timeline.advance(0.1, &mut other_scene);
        assert!(timeline.is_empty());
        assert_eq!(value(&scene, target), 1.0);

        timeline.to(target, 3.0, 0.5, Ease::Linear, Placement::Now);
        timeline.advance(1.0, &mut scene);
        assert_eq!(value(&scene, target), 3.0);
    }

    #[test]
    fn clear_drops_pending_work() {
        let (mut scene, id) = scene_with_box();
        let target = TweenTarget::new(id, Channel::Scale, Axis::X);
        let mut timeline = Timeline::new();

        timeline.to(target, 3.0, 0.5, Ease::Linear, Placement::Now);
        timeline.clear();
        timeline.advance(1.0, &mut scene);
        assert_eq!(value(&scene, target), 1.0);
    }

    #[test]
    fn frame_steps_still_count_after_a_week_of_uptime() {
        let (mut scene, id) = scene_with_box();
        let target = TweenTarget::new(id, Channel::Position, Axis::X);
        let mut timeline = Timeline::new();

        timeline.advance(600_000.0, &mut scene);
        timeline.to(target, 1.0, 0.5, Ease::QuadInOut, Placement::Now);
        for _ in 0..120 {
            timeline.advance(1.0 / 60.0, &mut scene);
        }

        assert_eq!(value(&scene, target), 1.0);
        assert!(timeline.is_empty());
    }
}
