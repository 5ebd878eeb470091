use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::PerspectiveCamera;

#[derive(Debug, Clone, Copy)]
pub struct OrbitBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitBounds {
    fn default() -> Self {
        Self {
            min_distance: 0.5,
            max_distance: 500.0,
            min_pitch: -FRAC_PI_2 + 0.01,
            max_pitch: FRAC_PI_2 - 0.01,
        }
    }
}

/// Mouse-driven orbit around a target point.
///
/// Yaw and pitch are measured from the +Z axis, so the defaults put the eye
/// at `(0, 0, distance)`.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub target: Vec3,
    pub bounds: OrbitBounds,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    is_mouse_pressed: bool,
    is_shift_held: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            distance: 5.0,
            pitch: 0.0,
            yaw: 0.0,
            target: Vec3::ZERO,
            bounds: OrbitBounds::default(),
            rotate_speed: 0.005,
            zoom_speed: 1.0,
            pan_speed: 0.01,
            is_mouse_pressed: false,
            is_shift_held: false,
        }
    }
}

impl OrbitControls {
    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn apply_to(&self, camera: &mut PerspectiveCamera) {
        camera.eye = self.eye();
        camera.target = self.target;
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(self.bounds.min_distance, self.bounds.max_distance);
    }

    /// Zooms proportionally to how far away the camera already is.
    pub fn add_distance(&mut self, delta: f32) {
        let corrected = self.distance.max(1.0).log10().max(0.1) * delta;
        self.set_distance(self.distance + corrected);
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.pitch = (self.pitch + delta).clamp(self.bounds.min_pitch, self.bounds.max_pitch);
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.yaw += delta;
    }

    /// Moves the target in the view plane.
    pub fn pan(&mut self, horizontal: f32, vertical: f32) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();

        let scale = self.distance * 0.1;
        self.target += (right * horizontal + up * vertical) * scale;
    }

    pub fn set_mouse_pressed(&mut self, pressed: bool) {
        self.is_mouse_pressed = pressed;
    }

    pub fn set_shift_held(&mut self, held: bool) {
        self.is_shift_held = held;
    }

    pub fn mouse_moved(&mut self, dx: f32, dy: f32) {
        if !self.is_mouse_pressed {
            return;
        }

        if self.is_shift_held {
            self.pan(-dx * self.pan_speed, dy * self.pan_speed);
        } else {
            self.add_yaw(-dx * self.rotate_speed);
            self.add_pitch(dy * self.rotate_speed);
        }
    }

    pub fn scrolled(&mut self, amount: f32) {
        self.add_distance(-amount * self.zoom_speed);
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left mouse button
                state,
            } => self.set_mouse_pressed(*state == ElementState::Pressed),
            DeviceEvent::MouseWheel { delta } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 20.0,
                };
                self.scrolled(amount);
            }
            DeviceEvent::MouseMotion { delta } => self.mouse_moved(delta.0 as f32, delta.1 as f32),
            _ => (),
        }
    }

    pub fn process_key(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight) = event.physical_key {
            self.set_shift_held(event.state == ElementState::Pressed);
        }
    }
}
