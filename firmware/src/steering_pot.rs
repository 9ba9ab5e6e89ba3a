use microcar::hal::AnalogFeedback;

use stm32f4xx_hal::{
    adc::{config::SampleTime, Adc},
    gpio::{Analog, PC1},
    pac::ADC1,
};

/// Potentiometer on the steering rack, 12-bit single conversion.
pub struct SteeringPot {
    adc: Adc<ADC1>,
    pin: PC1<Analog>,
}

impl SteeringPot {
    pub fn new(adc: Adc<ADC1>, pin: PC1<Analog>) -> Self {
        Self { adc, pin }
    }
}

impl AnalogFeedback for SteeringPot {
    fn read_raw(&mut self) -> u16 {
        self.adc.convert(&self.pin, SampleTime::Cycles_144)
    }
}
