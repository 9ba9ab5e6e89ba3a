use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    WheelDiameter(f32),
    CountsPerRevolution(u32),
    SmoothingFactor(f32),
    MaxCurvature(f32),
    TurnReadingBounds { min: u16, max: u16 },
    MaxSpeed(f32),
    TimeConstant(f32),
    NoiseVariance(f32),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WheelDiameter(d) => write!(f, "wheel diameter must be positive, got {} m", d),
            Self::CountsPerRevolution(c) => {
                write!(f, "encoder needs at least one count per revolution, got {}", c)
            }
            Self::SmoothingFactor(a) => write!(f, "step period alpha must be in (0, 1], got {}", a),
            Self::MaxCurvature(c) => write!(f, "max curvature must be positive, got {} 1/m", c),
            Self::TurnReadingBounds { min, max } => write!(
                f,
                "turn reading bounds must satisfy min < max <= 4095, got [{}, {}]",
                min, max
            ),
            Self::MaxSpeed(s) => write!(f, "max speed must be positive, got {} m/s", s),
            Self::TimeConstant(t) => write!(f, "drive time constant must be positive, got {} s", t),
            Self::NoiseVariance(v) => write!(f, "noise variances must be positive, got {}", v),
        }
    }
}
