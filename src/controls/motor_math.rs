use crate::motors::MotorEffort;
use crate::time::Duration;

// RC-style ESC: 1.5 ms is stopped, 1.0 ms full reverse, 2.0 ms full forward.
pub const ESC_STOP_PULSE_US: u32 = 1500;
pub const ESC_FULL_PULSE_US: u32 = 2000;
const ESC_RANGE_US: f32 = (ESC_FULL_PULSE_US - ESC_STOP_PULSE_US) as f32;

pub const ESC_FRAME_HZ: u32 = 50;
pub const ESC_FRAME_US: u32 = 1_000_000 / ESC_FRAME_HZ;

/// Pulse width that asks the ESC for `effort`.
pub fn effort_to_pulse(effort: MotorEffort) -> Duration {
    let offset = effort.signed() * ESC_RANGE_US;
    let pulse = ESC_STOP_PULSE_US as f32 + offset;
    Duration::micros(pulse as u32)
}

/// Compare value for a PWM channel running at the ESC frame rate.
pub fn pulse_to_duty(pulse: Duration, max_duty: u16) -> u16 {
    let pulse_us = pulse.ticks().min(ESC_FRAME_US);
    ((pulse_us as u64 * max_duty as u64) / ESC_FRAME_US as u64) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulses_span_esc_range() {
        assert_eq!(effort_to_pulse(MotorEffort::Release).ticks(), 1500);
        assert_eq!(effort_to_pulse(MotorEffort::Brake).ticks(), 1500);
        assert_eq!(effort_to_pulse(MotorEffort::Forward(1.0)).ticks(), 2000);
        assert_eq!(effort_to_pulse(MotorEffort::Backward(1.0)).ticks(), 1000);
        assert_eq!(effort_to_pulse(MotorEffort::Forward(0.5)).ticks(), 1750);
    }

    #[test]
    fn out_of_range_effort_is_saturated() {
        assert_eq!(effort_to_pulse(MotorEffort::Forward(7.0)).ticks(), 2000);
        assert_eq!(effort_to_pulse(MotorEffort::Backward(7.0)).ticks(), 1000);
    }

    #[test]
    fn duty_is_fraction_of_frame() {
        assert_eq!(pulse_to_duty(Duration::micros(1500), 20_000), 1500);
        assert_eq!(pulse_to_duty(Duration::micros(2000), 40_000), 4000);
        assert_eq!(pulse_to_duty(Duration::micros(30_000), 1000), 1000);
    }
}
