//! Calibration constants and the structs that carry them into each component.
//!
//! The constants are the values measured on the car. Components never read them
//! directly; they take one of the calibration structs below so a second vehicle
//! (or a test) can be built with different numbers.

use core::f32::consts::PI;

use crate::error::CalibrationError;
use crate::time::Duration;

pub const WHEEL_DIAMETER_M: f32 = 0.04;
pub const WHEEL_CIRCUMFERENCE_M: f32 = WHEEL_DIAMETER_M * PI;
pub const COUNTS_PER_REVOLUTION: u32 = 4; // quadrature cycles through 4 states per revolution
pub const METERS_PER_STEP: f32 = WHEEL_CIRCUMFERENCE_M / COUNTS_PER_REVOLUTION as f32;
pub const STEP_PERIOD_ALPHA: f32 = 0.4;
pub const DEBOUNCE_US: u32 = 5000;

pub const MAX_CURVATURE: f32 = 0.8;
pub const MIN_TURN_READING: u16 = 2000;
pub const MAX_TURN_READING: u16 = 4000;
pub const ADC_MAX_READING: u16 = 4095; // 12 bit
pub const STEER_KP: f32 = 0.002; // full effort at half the turn range

pub const MAX_SPEED_M_S: f32 = 2.0;
pub const DRIVE_KFF: f32 = 1.0;
pub const DRIVE_KP: f32 = 0.0;

pub const DRIVE_TIME_CONSTANT_S: f32 = 0.2;
pub const SPEED_PROCESS_NOISE: f32 = 0.5; // (m/s)^2 per second
pub const YAW_RATE_PROCESS_NOISE: f32 = 0.5; // (rad/s)^2 per second
pub const SPEED_MEASUREMENT_NOISE: f32 = 0.05;
pub const YAW_RATE_MEASUREMENT_NOISE: f32 = 0.01;
pub const INITIAL_VARIANCE: f32 = 1.0;

pub const GYRO_CALIB_SAMPLES: u16 = 100;
pub const CONTROL_PERIOD_MS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderCalibration {
    pub wheel_diameter_m: f32,
    pub counts_per_revolution: u32,
    pub alpha: f32,
    pub debounce: Duration,
}

impl EncoderCalibration {
    pub const DEFAULT: Self = Self {
        wheel_diameter_m: WHEEL_DIAMETER_M,
        counts_per_revolution: COUNTS_PER_REVOLUTION,
        alpha: STEP_PERIOD_ALPHA,
        debounce: Duration::micros(DEBOUNCE_US),
    };

    pub fn meters_per_step(&self) -> f32 {
        self.wheel_diameter_m * PI / self.counts_per_revolution as f32
    }

    pub fn validate(self) -> Result<Self, CalibrationError> {
        if !(self.wheel_diameter_m > 0.0) {
            return Err(CalibrationError::WheelDiameter(self.wheel_diameter_m));
        }
        if self.counts_per_revolution == 0 {
            return Err(CalibrationError::CountsPerRevolution(
                self.counts_per_revolution,
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(CalibrationError::SmoothingFactor(self.alpha));
        }
        Ok(self)
    }
}

impl Default for EncoderCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringCalibration {
    pub max_curvature: f32,
    pub min_turn_reading: u16,
    pub max_turn_reading: u16,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl SteeringCalibration {
    pub const DEFAULT: Self = Self {
        max_curvature: MAX_CURVATURE,
        min_turn_reading: MIN_TURN_READING,
        max_turn_reading: MAX_TURN_READING,
        kp: STEER_KP,
        ki: 0.0,
        kd: 0.0,
    };

    pub fn turn_mid(&self) -> f32 {
        (self.max_turn_reading as f32 + self.min_turn_reading as f32) / 2.0
    }

    pub fn turn_half_range(&self) -> f32 {
        (self.max_turn_reading as f32 - self.min_turn_reading as f32) / 2.0
    }

    pub fn validate(self) -> Result<Self, CalibrationError> {
        if !(self.max_curvature > 0.0) {
            return Err(CalibrationError::MaxCurvature(self.max_curvature));
        }
        if self.min_turn_reading >= self.max_turn_reading
            || self.max_turn_reading > ADC_MAX_READING
        {
            return Err(CalibrationError::TurnReadingBounds {
                min: self.min_turn_reading,
                max: self.max_turn_reading,
            });
        }
        Ok(self)
    }
}

impl Default for SteeringCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCalibration {
    pub kff: f32,
    pub kp: f32,
    pub max_speed: f32,
}

impl DriveCalibration {
    pub const DEFAULT: Self = Self {
        kff: DRIVE_KFF,
        kp: DRIVE_KP,
        max_speed: MAX_SPEED_M_S,
    };

    pub fn validate(self) -> Result<Self, CalibrationError> {
        if !(self.max_speed > 0.0) {
            return Err(CalibrationError::MaxSpeed(self.max_speed));
        }
        Ok(self)
    }
}

impl Default for DriveCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Tuning for the pose estimator's velocity filter.
///
/// Process noise is the variance added per second of prediction, measurement
/// noise is the variance of a single encoder/gyro reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorCalibration {
    /// Commands are clamped to these before they drive the model.
    pub max_speed: f32,
    pub max_curvature: f32,
    pub time_constant_s: f32,
    pub speed_process_noise: f32,
    pub yaw_rate_process_noise: f32,
    pub speed_measurement_noise: f32,
    pub yaw_rate_measurement_noise: f32,
    pub initial_variance: f32,
}

impl EstimatorCalibration {
    pub const DEFAULT: Self = Self {
        max_speed: MAX_SPEED_M_S,
        max_curvature: MAX_CURVATURE,
        time_constant_s: DRIVE_TIME_CONSTANT_S,
        speed_process_noise: SPEED_PROCESS_NOISE,
        yaw_rate_process_noise: YAW_RATE_PROCESS_NOISE,
        speed_measurement_noise: SPEED_MEASUREMENT_NOISE,
        yaw_rate_measurement_noise: YAW_RATE_MEASUREMENT_NOISE,
        initial_variance: INITIAL_VARIANCE,
    };

    pub fn validate(self) -> Result<Self, CalibrationError> {
        if !(self.max_speed > 0.0) {
            return Err(CalibrationError::MaxSpeed(self.max_speed));
        }
        if !(self.max_curvature > 0.0) {
            return Err(CalibrationError::MaxCurvature(self.max_curvature));
        }
        if !(self.time_constant_s > 0.0) {
            return Err(CalibrationError::TimeConstant(self.time_constant_s));
        }
        for v in [
            self.speed_process_noise,
            self.yaw_rate_process_noise,
            self.speed_measurement_noise,
            self.yaw_rate_measurement_noise,
            self.initial_variance,
        ] {
            if !(v > 0.0) {
                return Err(CalibrationError::NoiseVariance(v));
            }
        }
        Ok(self)
    }
}

impl Default for EstimatorCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub encoder: EncoderCalibration,
    pub steering: SteeringCalibration,
    pub drive: DriveCalibration,
    pub estimator: EstimatorCalibration,
}

impl Calibration {
    pub const DEFAULT: Self = Self {
        encoder: EncoderCalibration::DEFAULT,
        steering: SteeringCalibration::DEFAULT,
        drive: DriveCalibration::DEFAULT,
        estimator: EstimatorCalibration::DEFAULT,
    };

    pub fn new() -> Self {
        Self::DEFAULT
    }

    pub fn set_encoder(self, encoder: EncoderCalibration) -> Self {
        let mut s = self;
        s.encoder = encoder;
        s
    }

    pub fn set_steering(self, steering: SteeringCalibration) -> Self {
        let mut s = self;
        s.steering = steering;
        s
    }

    pub fn set_drive(self, drive: DriveCalibration) -> Self {
        let mut s = self;
        s.drive = drive;
        s
    }

    pub fn set_estimator(self, estimator: EstimatorCalibration) -> Self {
        let mut s = self;
        s.estimator = estimator;
        s
    }

    pub fn validate(self) -> Result<Self, CalibrationError> {
        Ok(Self {
            encoder: self.encoder.validate()?,
            steering: self.steering.validate()?,
            drive: self.drive.validate()?,
            estimator: self.estimator.validate()?,
        })
    }
}
