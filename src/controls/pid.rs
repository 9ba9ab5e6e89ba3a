use num_traits::Signed;

pub trait Number: PartialOrd + Signed + Copy + Default {}

impl<T: PartialOrd + Signed + Copy + Default> Number for T {}

#[derive(Default)]
pub struct PidCreator<T: Number> {
    kp: T,
    ki: T,
    kd: T,
    limit: Option<T>,
}

impl<T: Number> PidCreator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_p(self, p: impl Into<T>) -> Self {
        let mut s = self;
        s.kp = p.into();
        s
    }

    pub fn set_i(self, i: impl Into<T>) -> Self {
        let mut s = self;
        s.ki = i.into();
        s
    }

    pub fn set_d(self, d: impl Into<T>) -> Self {
        let mut s = self;
        s.kd = d.into();
        s
    }

    /// Symmetric bound applied to both the integral term and the output.
    pub fn set_limit(self, limit: impl Into<T>) -> Self {
        let mut s = self;
        s.limit = Some(limit.into().abs());
        s
    }

    pub fn create_controller(self) -> PidController<T> {
        PidController {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            setpoint: T::zero(),
            limit: self.limit,
            prev_measurement: None,
            prev_integral: T::zero(),
        }
    }
}

/// Discrete PID, stepped once per control tick. Gains are per tick, the
/// derivative acts on the measurement so setpoint jumps don't kick the output.
#[derive(Debug, Clone, Copy)]
pub struct PidController<T: Number> {
    kp: T,
    ki: T,
    kd: T,
    setpoint: T,
    limit: Option<T>,
    prev_measurement: Option<T>,
    prev_integral: T,
}

impl<T: Number> PidController<T> {
    pub fn set_setpoint(&mut self, new_setpoint: impl Into<T>) {
        self.setpoint = new_setpoint.into();
    }

    pub fn update(&mut self, measurement: T) -> T {
        let error = self.setpoint - measurement;
        let p_term = error * self.kp;

        let integral_unbound = self.prev_integral + error * self.ki;
        self.prev_integral = self.bound(integral_unbound);

        let prev = self.prev_measurement.replace(measurement);
        let d_term = match prev {
            Some(p) => -((measurement - p) * self.kd),
            None => T::zero(),
        };

        self.bound(p_term + self.prev_integral + d_term)
    }

    fn bound(&self, value: T) -> T {
        match self.limit {
            Some(limit) => num_traits::clamp(value, -limit, limit),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = PidCreator::<f32>::new().set_p(0.5_f32).create_controller();
        pid.set_setpoint(10.0_f32);
        assert_eq!(pid.update(6.0), 2.0);
        assert_eq!(pid.update(12.0), -1.0);
    }

    #[test]
    fn output_and_integral_saturate() {
        let mut pid = PidCreator::<f32>::new()
            .set_p(1.0_f32)
            .set_i(1.0_f32)
            .set_limit(-1.0_f32)
            .create_controller();
        pid.set_setpoint(100.0_f32);
        for _ in 0..10 {
            assert_eq!(pid.update(0.0), 1.0);
        }
        // Integral is bounded too, so one reversed error flips the sign.
        assert_eq!(pid.update(200.0), -1.0);
    }

    #[test]
    fn derivative_acts_on_measurement() {
        let mut pid = PidCreator::<f32>::new().set_d(2.0_f32).create_controller();
        pid.set_setpoint(5.0_f32);
        assert_eq!(pid.update(0.0), 0.0);
        assert_eq!(pid.update(1.0), -2.0);
        pid.set_setpoint(50.0_f32);
        assert_eq!(pid.update(1.0), 0.0);
    }
}
