#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Register {
    WhoAmI = 0x0F,
    Ctrl1Accel = 0x10,
    Ctrl2Gyro = 0x11,
    Ctrl3C = 0x12,
    Ctrl4C = 0x13,
    Ctrl6C = 0x15,
    Ctrl7Gyro = 0x16,
    Ctrl8Accel = 0x17,
    Ctrl9Accel = 0x18,

    /// First of six little-endian gyro bytes (X, Y, Z)
    GyroXLo = 0x22,
    /// First of six little-endian accel bytes (X, Y, Z)
    AccelXLo = 0x28,
}

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

pub(crate) const WHO_AM_I_VALUE: u8 = 0x6C;

/// BDU: output registers aren't updated until both bytes are read.
/// IF_INC: auto-increment the address on multi-byte reads.
pub(crate) const CTRL3_BDU_IF_INC: u8 = 0b0100_0100;
