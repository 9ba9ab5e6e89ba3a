pub mod motor_math;
pub mod pid;
pub mod speed;
pub mod steering;
