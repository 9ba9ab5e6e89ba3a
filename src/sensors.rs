pub mod encoder;
pub mod imu;
