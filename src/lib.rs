//! Estimation and actuation core for a small car-like robot.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`sensors`] | Quadrature decoding (interrupt side) and the IMU bias driver |
//! | [`controls`] | Speed feedforward, steering position loop, PID, ESC pulse math |
//! | [`estimation`] | Predict/correct pose estimator |
//! | [`control_loop`] | One fixed-rate tick tying the above together |
//! | [`hal`] | Traits the board code implements |
//!
//! Nothing here allocates. State shared with interrupts sits behind
//! `critical_section`, so the board crate has to provide an implementation
//! (cortex-m's `critical-section-single-core` on the car).

#![cfg_attr(not(test), no_std)]

pub mod calibration;
pub mod command;
pub mod control_loop;
pub mod controls;
pub mod error;
pub mod estimation;
pub mod hal;
pub mod motors;
pub mod sensors;
pub mod sync;
pub mod time;

pub use calibration::Calibration;
pub use command::DriveCommand;
pub use control_loop::{ControlLoop, TickOutput};
pub use error::CalibrationError;
pub use estimation::pose::{Pose, PoseEstimator};
pub use sensors::encoder::{EncoderDecoder, QuadratureSample};
pub use sensors::imu::InertialSample;
