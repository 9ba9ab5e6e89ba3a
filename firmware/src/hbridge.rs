use microcar::motors::{MotorEffort, OpenLoopDrive};

use stm32f4xx_hal::timer::{pwm::PwmExt, PwmChannel};

/// Two-input H-bridge (one PWM per half) driving the steering motor.
pub struct HBridge<P1: PwmExt, P2: PwmExt, const C: u8, const D: u8> {
    input_1: PwmChannel<P1, C>,
    input_2: PwmChannel<P2, D>,
    effort: MotorEffort,
}

impl<P1: PwmExt, P2: PwmExt, const C: u8, const D: u8> HBridge<P1, P2, C, D> {
    pub fn new(input_1: PwmChannel<P1, C>, input_2: PwmChannel<P2, D>) -> Self {
        let mut bridge = Self {
            input_1,
            input_2,
            effort: MotorEffort::Release,
        };

        // set an initial state
        bridge.input_1.enable();
        bridge.input_2.enable();
        bridge.drive(MotorEffort::Release);

        bridge
    }
}

impl<P1: PwmExt, P2: PwmExt, const C: u8, const D: u8> OpenLoopDrive for HBridge<P1, P2, C, D> {
    fn drive(&mut self, effort: MotorEffort) {
        let max_1 = self.input_1.get_max_duty();
        let max_2 = self.input_2.get_max_duty();
        let (a_duty, b_duty) = match effort {
            MotorEffort::Forward(d) => {
                let duty_ratio = d.clamp(0.0, 1.0);
                ((max_1 as f32 * duty_ratio) as u16, 0)
            }
            MotorEffort::Backward(d) => {
                let duty_ratio = d.clamp(0.0, 1.0);
                (0, (max_2 as f32 * duty_ratio) as u16)
            }
            MotorEffort::Brake => (max_1, max_2),
            MotorEffort::Release => (0, 0),
        };

        self.input_1.set_duty(a_duty);
        self.input_2.set_duty(b_duty);
        self.effort = effort;
    }

    fn current_effort(&self) -> MotorEffort {
        self.effort
    }
}
