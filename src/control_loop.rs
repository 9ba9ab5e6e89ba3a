//! The fixed-rate foreground tick.
//!
//! Each call to [`ControlLoop::tick`] takes the newest command and inertial
//! sample from their mailboxes (whatever is there, however old), runs exactly
//! one predict and one correct on the estimator, then writes both actuators.

use crate::calibration::{Calibration, CONTROL_PERIOD_MS};
use crate::command::DriveCommand;
use crate::controls::speed::SpeedController;
use crate::controls::steering::{SteeringController, SteeringOutput};
use crate::estimation::pose::{Pose, PoseEstimator};
use crate::hal::AnalogFeedback;
use crate::motors::{MotorEffort, OpenLoopDrive};
use crate::sensors::encoder::EncoderDecoder;
use crate::sensors::imu::InertialSample;
use crate::sync::Latest;
use crate::time::{self, dur_from_millis, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// The command as actually applied, after clamping.
    pub command: DriveCommand,
    pub pose: Pose,
    pub measured_speed: f32,
    pub distance: f32,
    pub drive: MotorEffort,
    pub steering: SteeringOutput,
}

pub struct ControlLoop<'a, F: AnalogFeedback, D: OpenLoopDrive, S: OpenLoopDrive> {
    encoder: &'a EncoderDecoder,
    commands: &'a Latest<DriveCommand>,
    inertial: &'a Latest<InertialSample>,
    estimator: PoseEstimator,
    speed: SpeedController,
    steering: SteeringController,
    feedback: F,
    drive: D,
    steer: S,
    period: Duration,
    last_tick: Option<Instant>,
}

impl<'a, F: AnalogFeedback, D: OpenLoopDrive, S: OpenLoopDrive> ControlLoop<'a, F, D, S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calibration: Calibration,
        encoder: &'a EncoderDecoder,
        commands: &'a Latest<DriveCommand>,
        inertial: &'a Latest<InertialSample>,
        feedback: F,
        drive: D,
        steer: S,
    ) -> Self {
        Self {
            encoder,
            commands,
            inertial,
            estimator: PoseEstimator::new(calibration.estimator),
            speed: SpeedController::new(calibration.drive),
            steering: SteeringController::new(calibration.steering),
            feedback,
            drive,
            steer,
            period: dur_from_millis(CONTROL_PERIOD_MS),
            last_tick: None,
        }
    }

    /// Nominal tick period, used as the elapsed time of the very first tick.
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn tick(&mut self, now: Instant) -> TickOutput {
        let elapsed = match self.last_tick {
            Some(last) => time::elapsed(last, now).unwrap_or(Duration::micros(0)),
            None => self.period,
        };
        self.last_tick = Some(now);

        let requested = self.commands.latest().unwrap_or(DriveCommand::STOP);
        let command = DriveCommand {
            target_speed: self.speed.clamp_speed(requested.target_speed),
            target_curvature: self.steering.clamp_curvature(requested.target_curvature),
        };
        if command != requested {
            log::debug!(
                "clamped command ({}, {}) to ({}, {})",
                requested.target_speed,
                requested.target_curvature,
                command.target_speed,
                command.target_curvature
            );
        }

        let imu = self
            .inertial
            .latest()
            .unwrap_or(InertialSample::stationary(now));

        let encoder = self.encoder.snapshot();
        let meters_per_step = self.encoder.calibration().meters_per_step();
        let measured_speed = encoder.velocity(meters_per_step);
        let distance = encoder.distance(meters_per_step);

        self.estimator.predict(&command, elapsed);
        self.estimator.correct(measured_speed, imu.heading_rate());
        let pose = self.estimator.pose();

        let drive = self.speed.command(command.target_speed, pose.linear_velocity);
        let steering = self.steering.update(command.target_curvature, &mut self.feedback);

        self.drive.drive(drive);
        self.steer.drive(steering.effort);

        log::trace!(
            "pose ({}, {}, {}) v {} drive {:?} steer {}/{}",
            pose.x,
            pose.y,
            pose.theta,
            pose.linear_velocity,
            drive,
            steering.current,
            steering.target
        );

        TickOutput {
            command,
            pose,
            measured_speed,
            distance,
            drive,
            steering,
        }
    }

    pub fn pose(&self) -> Pose {
        self.estimator.pose()
    }

    pub fn drive_sink(&self) -> &D {
        &self.drive
    }

    pub fn steering_sink(&self) -> &S {
        &self.steer
    }
}
