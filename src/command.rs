use crate::calibration::{MAX_CURVATURE, MAX_SPEED_M_S};

/// What the planner wants for the coming tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveCommand {
    /// m/s, positive forwards.
    pub target_speed: f32,
    /// 1/m, positive turns left.
    pub target_curvature: f32,
}

impl DriveCommand {
    pub const STOP: Self = Self {
        target_speed: 0.0,
        target_curvature: 0.0,
    };

    /// Builds a command clamped to the default speed and curvature limits.
    /// NaN becomes 0.
    pub fn new(target_speed: f32, target_curvature: f32) -> Self {
        Self {
            target_speed,
            target_curvature,
        }
        .clamp_to(MAX_SPEED_M_S, MAX_CURVATURE)
    }

    /// Same command limited to `+-max_speed` and `+-max_curvature`.
    pub fn clamp_to(&self, max_speed: f32, max_curvature: f32) -> Self {
        Self {
            target_speed: clamp_or_zero(self.target_speed, max_speed),
            target_curvature: clamp_or_zero(self.target_curvature, max_curvature),
        }
    }

    /// Angular rate the kinematic model expects from this command.
    pub fn yaw_rate(&self) -> f32 {
        self.target_speed * self.target_curvature
    }
}

fn clamp_or_zero(value: f32, limit: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        num_traits::clamp(value, -limit, limit)
    }
}
