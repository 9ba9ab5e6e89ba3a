use microcar::controls::motor_math::{effort_to_pulse, pulse_to_duty};
use microcar::motors::{MotorEffort, OpenLoopDrive};

use stm32f4xx_hal::timer::{pwm::PwmExt, PwmChannel};

/// RC-style ESC on one channel of a timer running at the 50 Hz servo frame.
pub struct Esc<P: PwmExt, const C: u8> {
    signal: PwmChannel<P, C>,
    effort: MotorEffort,
}

impl<P: PwmExt, const C: u8> Esc<P, C> {
    pub fn new(signal: PwmChannel<P, C>) -> Self {
        let mut esc = Self {
            signal,
            effort: MotorEffort::Release,
        };

        // ESCs only arm after seeing the neutral pulse
        esc.drive(MotorEffort::Release);
        esc.signal.enable();

        esc
    }
}

impl<P: PwmExt, const C: u8> OpenLoopDrive for Esc<P, C> {
    fn drive(&mut self, effort: MotorEffort) {
        let pulse = effort_to_pulse(effort);
        let duty = pulse_to_duty(pulse, self.signal.get_max_duty());
        self.signal.set_duty(duty);
        self.effort = effort;
    }

    fn current_effort(&self) -> MotorEffort {
        self.effort
    }
}
