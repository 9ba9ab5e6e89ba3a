use crate::calibration::GYRO_CALIB_SAMPLES;
use crate::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scale(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl core::ops::Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl core::ops::Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// One 6-axis reading: acceleration in m/s^2, angular rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialSample {
    pub accel: Vector3,
    pub gyro: Vector3,
    pub timestamp: Instant,
}

impl InertialSample {
    /// A car standing still at boot: no rotation, no acceleration reading.
    pub const fn stationary(timestamp: Instant) -> Self {
        Self {
            accel: Vector3::new(0.0, 0.0, 0.0),
            gyro: Vector3::new(0.0, 0.0, 0.0),
            timestamp,
        }
    }

    /// Yaw rate, counter-clockwise positive.
    pub fn heading_rate(&self) -> f32 {
        self.gyro.z
    }
}

/// Register-level IMU driver, owned by the board code.
pub trait InertialSensor {
    type Error;

    /// Returns `(gyro, accel)`.
    fn read(&mut self) -> Result<(Vector3, Vector3), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImuCalibrationState {
    Calibrating,
    Operational,
    Error,
}

/// Removes the gyro bias measured while the car sits still after power-up.
pub struct ImuDriver<I: InertialSensor> {
    imu: I,
    calib_target: u16,
    calib_count: u16,
    state: ImuCalibrationState,
    gyro_sum: Vector3,
    gyro_offset: Vector3,
}

impl<I: InertialSensor> ImuDriver<I> {
    pub fn new(imu: I) -> Self {
        Self::with_calibration_samples(imu, GYRO_CALIB_SAMPLES)
    }

    pub fn with_calibration_samples(imu: I, samples: u16) -> Self {
        Self {
            imu,
            calib_target: samples.max(1),
            calib_count: 0,
            state: ImuCalibrationState::Calibrating,
            gyro_sum: Vector3::default(),
            gyro_offset: Vector3::default(),
        }
    }

    pub fn get_state(&self) -> ImuCalibrationState {
        self.state
    }

    pub fn gyro_offset(&self) -> Vector3 {
        self.gyro_offset
    }

    /// Reads the sensor once. Returns a bias-corrected sample once calibration
    /// has finished, `None` while it is still collecting.
    ///
    /// A read error after calibration moves the driver to `Error`; the next
    /// successful read puts it back in service with the offsets it already has.
    pub fn update(&mut self, now: Instant) -> Result<Option<InertialSample>, I::Error> {
        let (gyro, accel) = match self.imu.read() {
            Ok(data) => data,
            Err(e) => {
                if self.state == ImuCalibrationState::Operational {
                    log::warn!("IMU read failed, holding last sample");
                    self.state = ImuCalibrationState::Error;
                }
                return Err(e);
            }
        };

        match self.state {
            ImuCalibrationState::Calibrating => {
                self.gyro_sum = self.gyro_sum + gyro;
                self.calib_count += 1;
                if self.calib_count >= self.calib_target {
                    let mut offset = self.gyro_sum;
                    offset.scale(1.0 / self.calib_count as f32);
                    self.gyro_offset = offset;
                    log::info!("Gyro calib done: {:?}", self.gyro_offset);
                    self.state = ImuCalibrationState::Operational;
                }
                Ok(None)
            }
            ImuCalibrationState::Operational | ImuCalibrationState::Error => {
                if self.state == ImuCalibrationState::Error {
                    log::info!("IMU recovered");
                    self.state = ImuCalibrationState::Operational;
                }
                Ok(Some(InertialSample {
                    accel,
                    gyro: gyro - self.gyro_offset,
                    timestamp: now,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeImu {
        gyro: Vector3,
        fail: bool,
    }

    impl InertialSensor for FakeImu {
        type Error = ();

        fn read(&mut self) -> Result<(Vector3, Vector3), ()> {
            if self.fail {
                Err(())
            } else {
                Ok((self.gyro, Vector3::new(0.0, 0.0, 9.81)))
            }
        }
    }

    fn close(a: Vector3, b: Vector3) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6 && (a.z - b.z).abs() < 1e-6
    }

    #[test]
    fn bias_is_averaged_then_removed() {
        let bias = Vector3::new(0.01, -0.02, 0.03);
        let mut driver = ImuDriver::with_calibration_samples(
            FakeImu {
                gyro: bias,
                fail: false,
            },
            10,
        );

        for i in 0..10 {
            assert_eq!(driver.update(Instant::from_ticks(i)), Ok(None));
        }
        assert_eq!(driver.get_state(), ImuCalibrationState::Operational);
        assert!(close(driver.gyro_offset(), bias));

        driver.imu.gyro = Vector3::new(0.01, -0.02, 0.53);
        let sample = driver.update(Instant::from_ticks(50)).unwrap().unwrap();
        assert!((sample.heading_rate() - 0.5).abs() < 1e-6);
        assert_eq!(sample.timestamp, Instant::from_ticks(50));
        assert_eq!(sample.accel.z, 9.81);
    }

    #[test]
    fn read_errors_are_reported_and_recovered() {
        let mut driver = ImuDriver::with_calibration_samples(
            FakeImu {
                gyro: Vector3::default(),
                fail: false,
            },
            1,
        );
        assert_eq!(driver.update(Instant::from_ticks(0)), Ok(None));

        driver.imu.fail = true;
        assert_eq!(driver.update(Instant::from_ticks(1)), Err(()));
        assert_eq!(driver.get_state(), ImuCalibrationState::Error);

        driver.imu.fail = false;
        assert!(driver.update(Instant::from_ticks(2)).unwrap().is_some());
        assert_eq!(driver.get_state(), ImuCalibrationState::Operational);
    }
}
