use std::time::Duration;

use crate::views::View;

/// Longest step fed to animations. Stalls (window drags, breakpoints) would
/// otherwise finish every running tween in one frame.
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);

pub fn update(view: &mut dyn View, delta_time: Duration) -> anyhow::Result<()> {
    view.update(delta_time.min(MAX_FRAME_STEP).as_secs_f32());

    Ok(())
}
