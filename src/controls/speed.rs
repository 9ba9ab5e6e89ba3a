use crate::calibration::DriveCalibration;
use crate::motors::MotorEffort;

/// Drive motor command from a target speed.
///
/// The baseline is pure feedforward (`kff * target`). `kp` adds a proportional
/// correction on the measured speed; it defaults to 0. Either way the result
/// saturates at full effort instead of wrapping.
#[derive(Debug, Clone, Copy)]
pub struct SpeedController {
    calibration: DriveCalibration,
}

impl SpeedController {
    pub fn new(calibration: DriveCalibration) -> Self {
        Self { calibration }
    }

    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if speed.is_nan() {
            return 0.0;
        }
        let max = self.calibration.max_speed;
        num_traits::clamp(speed, -max, max)
    }

    /// Signed effort in -1..=1.
    pub fn effort(&self, target_speed: f32, current_speed: f32) -> f32 {
        let target = self.clamp_speed(target_speed);
        let feedforward = self.calibration.kff * target;
        let feedback = if current_speed.is_nan() {
            0.0
        } else {
            self.calibration.kp * (target - current_speed)
        };
        num_traits::clamp(feedforward + feedback, -1.0, 1.0)
    }

    pub fn command(&self, target_speed: f32, current_speed: f32) -> MotorEffort {
        MotorEffort::from_signed(self.effort(target_speed, current_speed))
    }
}

impl Default for SpeedController {
    fn default() -> Self {
        Self::new(DriveCalibration::DEFAULT)
    }
}
