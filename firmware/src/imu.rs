//! Inertial sensors on the car's I2C bus.

pub mod lsm6dsox;
mod lsm_regs;

pub use lsm6dsox::Lsm6dsox;
