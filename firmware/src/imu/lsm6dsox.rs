use super::lsm_regs::{Register, CTRL3_BDU_IF_INC, WHO_AM_I_VALUE};

use core::f32::consts::PI;

use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use microcar::sensors::imu::{InertialSensor, Vector3};

const DEFAULT_ADDR: u8 = 0x6A;

// Datasheet table 2 sensitivities for the ranges set in `setup`.
// 1000 dps full scale: 35 mdps/LSB
const GYRO_CONVERT: f32 = 0.035 * PI / 180.0;
// +-8 g full scale: 0.244 mg/LSB
const ACCEL_CONVERT: f32 = 0.000_244 * 9.806_65;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum VectorType {
    Gyro,
    Accel,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error<E> {
    Timeout,
    SetupInvalidRead((u8, u8)),
    InvalidAddress(u8),
    Inner(E),
}

pub struct Lsm6dsox<T> {
    i2c: T,
}

impl<T, E> Lsm6dsox<T>
where
    T: I2c<SevenBitAddress, Error = E>,
{
    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    pub fn setup<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        let mut timeout_ms: i32 = 35 * 4; // Datasheet table 3, T_on is 35ms

        loop {
            if timeout_ms <= 0 {
                return Err(Error::Timeout);
            }

            match self.read_u8(Register::WhoAmI) {
                Ok(WHO_AM_I_VALUE) => break,
                Ok(b) => return Err(Error::InvalidAddress(b)),
                Err(_) => {
                    delay.delay_ms(5);
                    timeout_ms -= 5;
                }
            }
        }

        let init_values = [
            (Register::Ctrl3C, CTRL3_BDU_IF_INC),
            (Register::Ctrl1Accel, 0b0110_1100), // 416Hz ODR, +- 8g range, single-stage LPF
            (Register::Ctrl8Accel, 0b0000_0000), // No HPF, Disable LPF2 stuff
            (Register::Ctrl9Accel, 0b1110_0010), // Default settings but disable I3C
            (Register::Ctrl2Gyro, 0b0110_1000),  // 416Hz ODR, 1000dps
            (Register::Ctrl4C, 0b0000_0000),     // Gyro LPF1 off
            (Register::Ctrl6C, 0b0000_0000),
            (Register::Ctrl7Gyro, 0b0000_0000), // No HPF, no OIS
        ];

        for (register, write_val) in init_values {
            self.write_u8(register, write_val).map_err(Error::Inner)?;
            let read_back = self.read_u8(register).map_err(Error::Inner)?;

            if write_val != read_back {
                return Err(Error::SetupInvalidRead((write_val, read_back)));
            }
        }

        Ok(())
    }

    fn read_u8(&mut self, reg: Register) -> Result<u8, E> {
        let mut buf = [0_u8; 1];
        self.i2c.write_read(DEFAULT_ADDR, &[reg.into()], &mut buf)?;
        Ok(buf[0])
    }

    fn write_u8(&mut self, reg: Register, val: u8) -> Result<(), E> {
        self.i2c.write(DEFAULT_ADDR, &[reg.into(), val])
    }

    fn read_vec(&mut self, vec_type: VectorType) -> Result<Vector3, Error<E>> {
        let mut buf = [0_u8; 6];
        let (start, conv_factor) = match vec_type {
            VectorType::Accel => (Register::AccelXLo, ACCEL_CONVERT),
            VectorType::Gyro => (Register::GyroXLo, GYRO_CONVERT),
        };

        self.i2c
            .write_read(DEFAULT_ADDR, &[start.into()], &mut buf)
            .map_err(Error::Inner)?;

        let xi = i16::from_le_bytes([buf[0], buf[1]]);
        let yi = i16::from_le_bytes([buf[2], buf[3]]);
        let zi = i16::from_le_bytes([buf[4], buf[5]]);

        Ok(Vector3::new(
            xi as f32 * conv_factor,
            yi as f32 * conv_factor,
            zi as f32 * conv_factor,
        ))
    }

    /// Angular rate in rad/s
    pub fn get_gyro(&mut self) -> Result<Vector3, Error<E>> {
        self.read_vec(VectorType::Gyro)
    }

    /// Acceleration in m/s^2
    pub fn get_accel(&mut self) -> Result<Vector3, Error<E>> {
        self.read_vec(VectorType::Accel)
    }
}

impl<T, E> InertialSensor for Lsm6dsox<T>
where
    T: I2c<SevenBitAddress, Error = E>,
{
    type Error = Error<E>;

    fn read(&mut self) -> Result<(Vector3, Vector3), Self::Error> {
        Ok((self.get_gyro()?, self.get_accel()?))
    }
}
