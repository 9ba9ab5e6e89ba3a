use microcar::hal::EdgeEventSource;
use microcar::QuadratureSample;

use stm32f4xx_hal::{
    gpio::{ExtiPin, Input, PB12, PB13},
    pac::GPIOB,
};

const CHANNEL_A_BIT: u32 = 12;

/// Wheel encoder channels on PB12 (A) and PB13 (B), both on EXTI15_10.
pub struct EncoderPins {
    a: PB12<Input>,
    b: PB13<Input>,
}

impl EncoderPins {
    pub fn new(a: PB12<Input>, b: PB13<Input>) -> Self {
        Self { a, b }
    }

    pub fn read(&self) -> QuadratureSample {
        // Both channels come from one IDR read so they can't tear.
        // SAFETY: read-only access to the input data register.
        let idr = unsafe { (*GPIOB::ptr()).idr.read().bits() };
        QuadratureSample::new((idr >> CHANNEL_A_BIT) as u8)
    }
}

impl EdgeEventSource for EncoderPins {
    fn sample(&mut self) -> QuadratureSample {
        self.read()
    }

    fn clear_pending(&mut self) {
        self.a.clear_interrupt_pending_bit();
        self.b.clear_interrupt_pending_bit();
    }
}
