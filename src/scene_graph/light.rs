use glam::Vec3;

/// Omnidirectional light with linear-to-zero falloff at `distance`.
///
/// `distance == 0` means no cut-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
}

impl PointLight {
    pub fn new(color: Vec3, intensity: f32, distance: f32) -> Self {
        Self {
            color,
            intensity,
            distance,
            decay: 1.0,
            position: Vec3::ZERO,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// The light every sample scene uses: white, full intensity, reach 500.
    pub fn sample_light() -> Self {
        Self::new(Vec3::ONE, 1.0, 500.0).at(Vec3::new(10.0, 0.0, 25.0))
    }
}
