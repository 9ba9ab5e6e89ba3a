#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MotorEffort {
    Forward(f32), // Measured as 0..=1 in terms of effort
    Backward(f32),
    Brake,
    #[default]
    Release,
}

impl MotorEffort {
    /// Saturates a signed effort to -1..=1 and splits it into a direction.
    pub fn from_signed(effort: f32) -> Self {
        let effort = num_traits::clamp(effort, -1.0, 1.0);
        if effort > 0.0 {
            MotorEffort::Forward(effort)
        } else if effort < 0.0 {
            MotorEffort::Backward(-effort)
        } else {
            MotorEffort::Release
        }
    }

    /// Signed effort in -1..=1. Braking has no direction and reads as 0.
    pub fn signed(&self) -> f32 {
        match *self {
            MotorEffort::Forward(e) => num_traits::clamp(e, 0.0, 1.0),
            MotorEffort::Backward(e) => -num_traits::clamp(e, 0.0, 1.0),
            MotorEffort::Brake | MotorEffort::Release => 0.0,
        }
    }
}

/// Actuator sink. Implementations may saturate again at the peripheral, but
/// callers always hand over an effort that is already within range.
pub trait OpenLoopDrive {
    fn drive(&mut self, effort: MotorEffort);
    fn current_effort(&self) -> MotorEffort;
}
