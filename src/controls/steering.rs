//! Steering: curvature in, potentiometer position and H-bridge effort out.

use num_traits::Float;

use super::pid::{PidController, PidCreator};
use crate::calibration::SteeringCalibration;
use crate::hal::AnalogFeedback;
use crate::motors::MotorEffort;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub target: u16,
    pub current: u16,
    /// `target - current`, in raw counts.
    pub error: i32,
    pub effort: MotorEffort,
}

pub struct SteeringController {
    calibration: SteeringCalibration,
    pid: PidController<f32>,
}

impl SteeringController {
    pub fn new(calibration: SteeringCalibration) -> Self {
        let pid = PidCreator::new()
            .set_p(calibration.kp)
            .set_i(calibration.ki)
            .set_d(calibration.kd)
            .set_limit(1.0_f32)
            .create_controller();
        Self { calibration, pid }
    }

    pub fn clamp_curvature(&self, curvature: f32) -> f32 {
        if curvature.is_nan() {
            return 0.0;
        }
        let max = self.calibration.max_curvature;
        num_traits::clamp(curvature, -max, max)
    }

    /// Potentiometer reading that corresponds to `curvature`.
    pub fn target_position(&self, curvature: f32) -> u16 {
        let curvature = self.clamp_curvature(curvature);
        let raw = self.calibration.turn_mid()
            + (curvature / self.calibration.max_curvature) * self.calibration.turn_half_range();
        self.clamp_reading(Float::round(raw) as u16)
    }

    /// One read of the feedback pot, clamped to the mechanical range.
    pub fn current_position<F: AnalogFeedback>(&self, feedback: &mut F) -> u16 {
        let raw = feedback.read_raw();
        let clamped = self.clamp_reading(raw);
        if clamped != raw {
            log::debug!("steering feedback {} outside turn range, using {}", raw, clamped);
        }
        clamped
    }

    /// Steps the position loop once and returns what it decided.
    pub fn update<F: AnalogFeedback>(&mut self, curvature: f32, feedback: &mut F) -> SteeringOutput {
        let target = self.target_position(curvature);
        let current = self.current_position(feedback);

        self.pid.set_setpoint(target as f32);
        let effort = MotorEffort::from_signed(self.pid.update(current as f32));

        SteeringOutput {
            target,
            current,
            error: target as i32 - current as i32,
            effort,
        }
    }

    fn clamp_reading(&self, raw: u16) -> u16 {
        raw.clamp(
            self.calibration.min_turn_reading,
            self.calibration.max_turn_reading,
        )
    }
}

impl Default for SteeringController {
    fn default() -> Self {
        Self::new(SteeringCalibration::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pot(u16);

    impl AnalogFeedback for Pot {
        fn read_raw(&mut self) -> u16 {
            self.0
        }
    }

    #[test]
    fn curvature_maps_onto_turn_range() {
        let steer = SteeringController::default();
        assert_eq!(steer.target_position(0.0), 3000);
        assert_eq!(steer.target_position(0.8), 4000);
        assert_eq!(steer.target_position(-0.8), 2000);
        assert_eq!(steer.target_position(0.4), 3500);
    }

    #[test]
    fn curvature_beyond_limit_clamps() {
        let steer = SteeringController::default();
        assert_eq!(steer.target_position(2.5), 4000);
        assert_eq!(steer.target_position(-100.0), 2000);
        assert_eq!(steer.target_position(f32::INFINITY), 4000);
        assert_eq!(steer.target_position(f32::NAN), 3000);
    }

    #[test]
    fn mapping_is_monotonic() {
        let steer = SteeringController::default();
        let mut last = 0;
        let mut c = -1.0;
        while c <= 1.0 {
            let pos = steer.target_position(c);
            assert!(pos >= last);
            last = pos;
            c += 0.01;
        }
    }

    #[test]
    fn feedback_is_clamped() {
        let steer = SteeringController::default();
        assert_eq!(steer.current_position(&mut Pot(4095)), 4000);
        assert_eq!(steer.current_position(&mut Pot(12)), 2000);
        assert_eq!(steer.current_position(&mut Pot(2500)), 2500);
    }

    #[test]
    fn update_reports_error_and_bounded_effort() {
        let mut steer = SteeringController::default();

        let out = steer.update(0.8, &mut Pot(3500));
        assert_eq!(out.target, 4000);
        assert_eq!(out.current, 3500);
        assert_eq!(out.error, 500);
        assert_eq!(out.effort, MotorEffort::Forward(1.0));

        let out = steer.update(0.0, &mut Pot(3250));
        assert_eq!(out.error, -250);
        assert_eq!(out.effort, MotorEffort::Backward(0.5));

        let out = steer.update(0.0, &mut Pot(3000));
        assert_eq!(out.error, 0);
        assert_eq!(out.effort, MotorEffort::Release);
    }
}
