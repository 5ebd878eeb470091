use keyframe::{functions, EasingFunction};

/// Exponential ease-out, `1 - 2^(-10t)`.
#[derive(Debug, Clone, Copy)]
struct EaseOutExpo;

impl EasingFunction for EaseOutExpo {
    fn y(&self, x: f64) -> f64 {
        if x >= 1.0 {
            1.0
        } else {
            1.0 - 2f64.powf(-10.0 * x)
        }
    }
}

/// Easing curve applied to a tween's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Fast start, long soft landing. Used by scale tweens.
    ExpoOut,
    /// Quadratic in-out. Used by rotation and translation tweens.
    QuadInOut,
}

impl Ease {
    /// Maps elapsed fraction (clamped to 0..=1) to progress fraction.
    pub fn apply(self, t: f32) -> f32 {
        let t = (t as f64).clamp(0.0, 1.0);
        let result = match self {
            Ease::Linear => functions::Linear.y(t),
            Ease::ExpoOut => EaseOutExpo.y(t),
            Ease::QuadInOut => functions::EaseInOutQuad.y(t),
        };
        result as f32
    }
}
