use glam::Vec3;

/// Authoritative transform of the controlled object.
///
/// Rotation is kept in control units (10 per click); the live object is
/// rotated by `units * PI / 100` radians, see [`rotation_units_to_radians`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: Vec3,
    pub rotation: Vec3,
    pub position: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            position: Vec3::ZERO,
        }
    }
}

/// A state change. Each variant carries the full replacement triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformAction {
    Scale(Vec3),
    Rotate(Vec3),
    Position(Vec3),
}

impl TransformAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformAction::Scale(_) => "scale",
            TransformAction::Rotate(_) => "rotate",
            TransformAction::Position(_) => "position",
        }
    }
}

/// Returns `state` with exactly the triple named by `action` replaced.
pub fn reduce(state: &TransformState, action: TransformAction) -> TransformState {
    match action {
        TransformAction::Scale(scale) => TransformState { scale, ..*state },
        TransformAction::Rotate(rotation) => TransformState { rotation, ..*state },
        TransformAction::Position(position) => TransformState { position, ..*state },
    }
}

pub fn rotation_units_to_radians(units: f32) -> f32 {
    std::f32::consts::PI * units / 100.0
}

#[derive(Debug, Default)]
pub struct TransformStore {
    state: TransformState,
}

impl TransformStore {
    pub fn new(state: TransformState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TransformState {
        &self.state
    }

    pub fn dispatch(&mut self, action: TransformAction) {
        log::debug!("dispatch {} {:?}", action.kind(), action);
        self.state = reduce(&self.state, action);
    }
}
