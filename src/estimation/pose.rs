//! Pose estimation from the drive command, the wheel encoder and the gyro.
//!
//! The filter tracks two velocities, forward speed and yaw rate, each with its
//! own variance. Position and heading are integrated from those velocities
//! along a circular arc; they carry no covariance of their own.
//!
//! * predict: the velocities relax toward what the command asks for with the
//!   drive's time constant, and their variances grow with process noise.
//! * correct: a scalar Kalman update of each velocity against its sensor.

use core::f32::consts::{PI, TAU};

use num_traits::Float;

use crate::calibration::EstimatorCalibration;
use crate::command::DriveCommand;
use crate::time::{self, Duration};

/// Below this yaw rate (rad/s) the arc is integrated as a straight line.
const STRAIGHT_YAW_RATE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Heading in (-pi, pi], 0 along +x, counter-clockwise positive.
    pub theta: f32,
    pub linear_velocity: f32,
    pub angular_velocity: f32,
}

pub struct PoseEstimator {
    calibration: EstimatorCalibration,
    pose: Pose,
    speed_variance: f32,
    yaw_rate_variance: f32,
}

impl PoseEstimator {
    pub fn new(calibration: EstimatorCalibration) -> Self {
        Self::with_pose(calibration, Pose::default())
    }

    pub fn with_pose(calibration: EstimatorCalibration, pose: Pose) -> Self {
        Self {
            calibration,
            pose: Pose {
                theta: wrap_angle(pose.theta),
                ..pose
            },
            speed_variance: calibration.initial_variance,
            yaw_rate_variance: calibration.initial_variance,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// `(speed, yaw rate)` variances.
    pub fn variances(&self) -> (f32, f32) {
        (self.speed_variance, self.yaw_rate_variance)
    }

    pub fn predict(&mut self, command: &DriveCommand, elapsed: Duration) {
        let dt = time::dur_to_secs(elapsed);
        if dt <= 0.0 {
            return;
        }

        let command =
            command.clamp_to(self.calibration.max_speed, self.calibration.max_curvature);
        let v_cmd = command.target_speed;
        let w_cmd = command.yaw_rate();

        let beta = (dt / self.calibration.time_constant_s).min(1.0);
        let keep = 1.0 - beta;

        self.pose.linear_velocity += beta * (v_cmd - self.pose.linear_velocity);
        self.pose.angular_velocity += beta * (w_cmd - self.pose.angular_velocity);

        self.speed_variance =
            keep * keep * self.speed_variance + self.calibration.speed_process_noise * dt;
        self.yaw_rate_variance =
            keep * keep * self.yaw_rate_variance + self.calibration.yaw_rate_process_noise * dt;

        self.integrate(dt);
    }

    /// Pulls the velocity estimates toward the measurements. A non-finite
    /// measurement leaves its channel untouched.
    pub fn correct(&mut self, measured_speed: f32, measured_heading_rate: f32) {
        if measured_speed.is_finite() {
            let (v, p) = kalman_update(
                self.pose.linear_velocity,
                self.speed_variance,
                measured_speed,
                self.calibration.speed_measurement_noise,
            );
            self.pose.linear_velocity = v;
            self.speed_variance = p;
        }

        if measured_heading_rate.is_finite() {
            let (w, p) = kalman_update(
                self.pose.angular_velocity,
                self.yaw_rate_variance,
                measured_heading_rate,
                self.calibration.yaw_rate_measurement_noise,
            );
            self.pose.angular_velocity = w;
            self.yaw_rate_variance = p;
        }
    }

    fn integrate(&mut self, dt: f32) {
        let v = self.pose.linear_velocity;
        let w = self.pose.angular_velocity;
        let theta = self.pose.theta;

        if w.abs() < STRAIGHT_YAW_RATE {
            let dist = v * dt;
            self.pose.x += dist * Float::cos(theta);
            self.pose.y += dist * Float::sin(theta);
            self.pose.theta = wrap_angle(theta + w * dt);
        } else {
            let r = v / w;
            let next = theta + w * dt;
            self.pose.x += r * (Float::sin(next) - Float::sin(theta));
            self.pose.y += r * (Float::cos(theta) - Float::cos(next));
            self.pose.theta = wrap_angle(next);
        }
    }
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new(EstimatorCalibration::DEFAULT)
    }
}

/// Returns the updated `(estimate, variance)`.
fn kalman_update(estimate: f32, variance: f32, measurement: f32, noise: f32) -> (f32, f32) {
    let gain = variance / (variance + noise);
    (
        estimate + gain * (measurement - estimate),
        (1.0 - gain) * variance,
    )
}

/// Wraps to (-pi, pi].
pub fn wrap_angle(theta: f32) -> f32 {
    let wrapped = theta - TAU * Float::floor((theta + PI) / TAU);
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
