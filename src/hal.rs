//! Capabilities the core needs from the surrounding board support code.

use crate::sensors::encoder::QuadratureSample;
use crate::time::Instant;

/// Source of quadrature edge events.
///
/// The board routes both encoder channels to edge interrupts; the handler then
/// hands the source to [`EncoderDecoder::service`](crate::sensors::encoder::EncoderDecoder::service).
pub trait EdgeEventSource {
    /// Combined A/B channel state, read in one port access.
    fn sample(&mut self) -> QuadratureSample;

    /// Acknowledge the pending edge so the interrupt doesn't refire.
    fn clear_pending(&mut self) {}
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Raw 12-bit analog reading (0..=4095), read synchronously.
pub trait AnalogFeedback {
    fn read_raw(&mut self) -> u16;
}
