//! Interrupt-driven quadrature decoding.
//!
//! Every edge on either channel lands in [`EncoderDecoder::on_edge`]. The step
//! count follows every edge, while the step period only takes samples that are
//! at least the debounce time apart. At the rates this car sees (well under 40
//! steps a second) that keeps contact bounce out of the speed estimate without
//! losing steps, since bounces cancel out in the count anyway.

use core::cell::Cell;

use critical_section::Mutex;

use crate::calibration::EncoderCalibration;
use crate::hal::{Clock, EdgeEventSource};
use crate::time::{self, Instant, SECONDS_PER_MICRO};

/// Raw two-bit port state. Bit 0 is channel A, bit 1 is channel B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadratureSample(u8);

impl QuadratureSample {
    pub const fn new(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    pub const fn from_channels(a: bool, b: bool) -> Self {
        Self((a as u8) | ((b as u8) << 1))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    // 00 01 11 10
    const fn gray_index(self) -> i8 {
        const ORDER: [i8; 4] = [0, 1, 3, 2];
        ORDER[(self.0 & 0b11) as usize]
    }
}

/// Signed step delta between two port states.
///
/// Adjacent states give +-1. A jump across two states (a bounce that skipped
/// the middle state) comes back as 2; it is counted rather than rejected.
pub fn step_diff(old: QuadratureSample, new: QuadratureSample) -> i8 {
    let mut diff = new.gray_index() - old.gray_index();
    // wrapping backwards
    if diff > 2 {
        diff -= 4;
    }
    // wrapping forwards
    if diff <= -2 {
        diff += 4;
    }
    diff
}

/// Consistent copy of the decoder state, taken in a single critical section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncoderSnapshot {
    pub steps: i32,
    pub step_period_us: Option<f32>,
    /// Sign of the last single-step transition, 0 before the first one.
    pub direction: i8,
}

#[derive(Debug, Clone, Copy, Default)]
struct DecoderState {
    steps: i32,
    last_sample: QuadratureSample,
    last_time: Option<Instant>,
    step_period_us: Option<f32>,
    direction: i8,
}

impl DecoderState {
    fn apply(&mut self, sample: QuadratureSample, now: Instant, calib: &EncoderCalibration) {
        let diff = step_diff(self.last_sample, sample);
        self.last_sample = sample;
        self.steps = self.steps.wrapping_add(diff as i32);
        if diff == 1 || diff == -1 {
            self.direction = diff;
        }

        let Some(last_time) = self.last_time else {
            self.last_time = Some(now);
            return;
        };

        match time::elapsed(last_time, now) {
            Some(dt) if dt >= calib.debounce => {
                let dt_us = dt.ticks() as f32;
                self.step_period_us = Some(match self.step_period_us {
                    Some(period) => period * (1.0 - calib.alpha) + dt_us * calib.alpha,
                    None => dt_us,
                });
                self.last_time = Some(now);
            }
            // bounce
            Some(_) => {}
            // The clock stepped backwards, or the wheel sat still for more than
            // half the 32-bit timer range. Either way the gap can't be measured,
            // so this edge becomes the new reference.
            None => self.last_time = Some(now),
        }
    }

    fn snapshot(&self) -> EncoderSnapshot {
        EncoderSnapshot {
            steps: self.steps,
            step_period_us: self.step_period_us,
            direction: self.direction,
        }
    }
}

/// Wheel encoder decoder shared between the edge interrupt and the control loop.
///
/// `new` is `const` so the board code can keep the decoder in a `static` and
/// reach it from the interrupt handler.
pub struct EncoderDecoder {
    calibration: EncoderCalibration,
    state: Mutex<Cell<DecoderState>>,
}

impl EncoderDecoder {
    pub const fn new(calibration: EncoderCalibration) -> Self {
        Self {
            calibration,
            state: Mutex::new(Cell::new(DecoderState {
                steps: 0,
                last_sample: QuadratureSample::new(0),
                last_time: None,
                step_period_us: None,
                direction: 0,
            })),
        }
    }

    pub fn calibration(&self) -> &EncoderCalibration {
        &self.calibration
    }

    /// Seed the previous port state, so the first edge after start-up is
    /// decoded against where the wheel actually rests.
    pub fn prime(&self, sample: QuadratureSample) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            state.last_sample = sample;
            cell.set(state);
        });
    }

    pub fn on_edge(&self, sample: QuadratureSample, now: Instant) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            state.apply(sample, now, &self.calibration);
            cell.set(state);
        });
    }

    /// Interrupt entry point: read the port, timestamp it and decode.
    pub fn service<S: EdgeEventSource, C: Clock>(&self, source: &mut S, clock: &C) {
        let sample = source.sample();
        let now = clock.now();
        source.clear_pending();
        self.on_edge(sample, now);
    }

    pub fn snapshot(&self) -> EncoderSnapshot {
        critical_section::with(|cs| self.state.borrow(cs).get().snapshot())
    }

    pub fn step_count(&self) -> i32 {
        self.snapshot().steps
    }

    pub fn step_period_us(&self) -> Option<f32> {
        self.snapshot().step_period_us
    }

    /// Meters travelled, signed by direction.
    pub fn distance(&self) -> f32 {
        self.snapshot().distance(self.calibration.meters_per_step())
    }

    /// Meters per second, unsigned. 0 until a step period has been measured.
    pub fn speed(&self) -> f32 {
        self.snapshot().speed(self.calibration.meters_per_step())
    }

    /// `speed()` signed by the direction of the last single step.
    pub fn velocity(&self) -> f32 {
        self.snapshot().velocity(self.calibration.meters_per_step())
    }
}

impl EncoderSnapshot {
    pub fn distance(&self, meters_per_step: f32) -> f32 {
        self.steps as f32 * meters_per_step
    }

    pub fn speed(&self, meters_per_step: f32) -> f32 {
        match self.step_period_us {
            Some(period) if period > 0.0 => meters_per_step / (period * SECONDS_PER_MICRO),
            _ => 0.0,
        }
    }

    pub fn velocity(&self, meters_per_step: f32) -> f32 {
        self.speed(meters_per_step) * self.direction as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::METERS_PER_STEP;

    const S00: QuadratureSample = QuadratureSample::new(0b00);
    const S01: QuadratureSample = QuadratureSample::new(0b01);
    const S11: QuadratureSample = QuadratureSample::new(0b11);
    const S10: QuadratureSample = QuadratureSample::new(0b10);

    fn at(us: u32) -> Instant {
        Instant::from_ticks(us)
    }

    fn decoder() -> EncoderDecoder {
        EncoderDecoder::new(EncoderCalibration::DEFAULT)
    }

    #[test]
    fn single_bit_transitions_step_by_one() {
        let forward = [(S00, S01), (S01, S11), (S11, S10), (S10, S00)];
        for (old, new) in forward {
            assert_eq!(step_diff(old, new), 1, "{:?} -> {:?}", old, new);
            assert_eq!(step_diff(new, old), -1, "{:?} -> {:?}", new, old);
        }
    }

    #[test]
    fn unchanged_state_is_zero() {
        for s in [S00, S01, S11, S10] {
            assert_eq!(step_diff(s, s), 0);
        }
    }

    #[test]
    fn two_bit_jumps_are_counted_as_two() {
        assert_eq!(step_diff(S00, S11).abs(), 2);
        assert_eq!(step_diff(S01, S10).abs(), 2);
        assert_eq!(step_diff(S11, S00).abs(), 2);
        assert_eq!(step_diff(S10, S01).abs(), 2);
    }

    #[test]
    fn channels_pack_into_bits() {
        assert_eq!(QuadratureSample::from_channels(true, false), S01);
        assert_eq!(QuadratureSample::from_channels(false, true), S10);
        assert_eq!(QuadratureSample::new(0b111).bits(), 0b11);
    }

    #[test]
    fn full_cycles_count_four() {
        let enc = decoder();
        let mut t = 0;
        for s in [S01, S11, S10, S00] {
            t += 10_000;
            enc.on_edge(s, at(t));
        }
        assert_eq!(enc.step_count(), 4);

        for s in [S10, S11, S01, S00] {
            t += 10_000;
            enc.on_edge(s, at(t));
        }
        assert_eq!(enc.step_count(), 0);
        assert_eq!(enc.snapshot().direction, -1);
    }

    #[test]
    fn jump_does_not_corrupt_following_steps() {
        let enc = decoder();
        enc.on_edge(S11, at(0));
        assert_eq!(enc.step_count(), 2);
        enc.on_edge(S10, at(10_000));
        enc.on_edge(S00, at(20_000));
        assert_eq!(enc.step_count(), 4);
        assert_eq!(enc.snapshot().direction, 1);
    }

    #[test]
    fn distance_tracks_step_count() {
        let enc = decoder();
        let mut t = 0;
        for s in [S01, S11, S10, S00, S01, S11, S01] {
            t += 1000;
            enc.on_edge(s, at(t));
            let expected = enc.step_count() as f32 * METERS_PER_STEP;
            assert!((enc.distance() - expected).abs() < 1e-6);
        }
        assert_eq!(enc.step_count(), 5);
        let expected = 5.0 * core::f32::consts::PI * 0.04 / 4.0;
        assert!((enc.distance() - expected).abs() < 1e-6);
    }

    #[test]
    fn step_period_initializes_then_smooths() {
        let enc = decoder();
        enc.on_edge(S01, at(0));
        assert_eq!(enc.step_period_us(), None);

        enc.on_edge(S11, at(6000));
        assert_eq!(enc.step_period_us(), Some(6000.0));

        enc.on_edge(S10, at(12_000));
        let period = enc.step_period_us().unwrap();
        assert!((period - 6000.0).abs() < 1e-2);

        enc.on_edge(S00, at(22_000));
        let expected = 6000.0 * 0.6 + 10_000.0 * 0.4;
        assert!((enc.step_period_us().unwrap() - expected).abs() < 1e-3);
    }

    #[test]
    fn debounced_edge_counts_but_keeps_period() {
        let enc = decoder();
        enc.on_edge(S01, at(0));
        enc.on_edge(S11, at(6000));
        enc.on_edge(S10, at(8000));

        assert_eq!(enc.step_count(), 3);
        assert_eq!(enc.step_period_us(), Some(6000.0));

        // The debounced edge didn't advance the reference time.
        enc.on_edge(S00, at(12_000));
        let period = enc.step_period_us().unwrap();
        assert!((period - 6000.0).abs() < 1e-2);
    }

    #[test]
    fn backwards_clock_is_treated_as_bounce() {
        let enc = decoder();
        enc.on_edge(S01, at(10_000));
        enc.on_edge(S11, at(4000));
        assert_eq!(enc.step_count(), 2);
        assert_eq!(enc.step_period_us(), None);
    }

    #[test]
    fn period_recovers_after_idling_past_half_the_timer_range() {
        let enc = decoder();
        let cycle = [S01, S11, S10, S00];
        enc.on_edge(cycle[0], at(0));
        enc.on_edge(cycle[1], at(6000));
        assert_eq!(enc.step_period_us(), Some(6000.0));

        // ~36.7 min parked, longer than 2^31 us
        let restart: u32 = 6000 + 2_200_000_000;
        for i in 0..200u32 {
            enc.on_edge(cycle[(2 + i as usize) % 4], at(restart + i * 20_000));
        }

        assert_eq!(enc.step_count(), 202);
        let period = enc.step_period_us().unwrap();
        assert!((period - 20_000.0).abs() < 1.0, "period {}", period);
    }

    #[test]
    fn backwards_clock_reanchors_reference_time() {
        let enc = decoder();
        enc.on_edge(S01, at(10_000));
        enc.on_edge(S11, at(4000));
        enc.on_edge(S10, at(10_000));
        assert_eq!(enc.step_period_us(), Some(6000.0));
    }

    #[test]
    fn speed_is_zero_without_signal() {
        let enc = decoder();
        assert_eq!(enc.speed(), 0.0);
        enc.on_edge(S01, at(0));
        assert_eq!(enc.speed(), 0.0);
        assert_eq!(enc.velocity(), 0.0);
    }

    #[test]
    fn speed_follows_step_period() {
        let enc = decoder();
        enc.on_edge(S01, at(0));
        enc.on_edge(S11, at(6000));
        let expected = METERS_PER_STEP / (6000.0 * 1e-6);
        assert!((enc.speed() - expected).abs() < 1e-4);
        assert!((enc.velocity() - expected).abs() < 1e-4);

        enc.on_edge(S01, at(12_000));
        assert!((enc.velocity() + expected).abs() < 1e-4);
    }

    #[test]
    fn step_count_wraps() {
        let enc = decoder();
        critical_section::with(|cs| {
            let cell = enc.state.borrow(cs);
            let mut state = cell.get();
            state.steps = i32::MAX;
            cell.set(state);
        });
        enc.on_edge(S01, at(0));
        assert_eq!(enc.step_count(), i32::MIN);
    }

    #[test]
    fn priming_sets_reference_state() {
        let enc = decoder();
        enc.prime(S11);
        enc.on_edge(S10, at(0));
        assert_eq!(enc.step_count(), 1);
    }

    struct Port {
        samples: [QuadratureSample; 4],
        next: usize,
        cleared: usize,
    }

    impl EdgeEventSource for Port {
        fn sample(&mut self) -> QuadratureSample {
            let s = self.samples[self.next % self.samples.len()];
            self.next += 1;
            s
        }

        fn clear_pending(&mut self) {
            self.cleared += 1;
        }
    }

    struct FixedClock(Cell<u32>);

    impl Clock for FixedClock {
        fn now(&self) -> Instant {
            let t = self.0.get();
            self.0.set(t + 7000);
            Instant::from_ticks(t)
        }
    }

    #[test]
    fn service_reads_source_and_clock() {
        let enc = decoder();
        let mut port = Port {
            samples: [S01, S11, S10, S00],
            next: 0,
            cleared: 0,
        };
        let clock = FixedClock(Cell::new(0));
        for _ in 0..8 {
            enc.service(&mut port, &clock);
        }
        assert_eq!(enc.step_count(), 8);
        assert_eq!(port.cleared, 8);
        let period = enc.step_period_us().unwrap();
        assert!((period - 7000.0).abs() < 1e-2);
    }

    static SHARED: EncoderDecoder = EncoderDecoder::new(EncoderCalibration::DEFAULT);

    #[test]
    fn concurrent_reads_never_see_partial_updates() {
        const CYCLES: i32 = 2000;
        let writer = std::thread::spawn(|| {
            let mut t = 0;
            for _ in 0..CYCLES {
                for s in [S01, S11, S10, S00] {
                    t += 6000;
                    SHARED.on_edge(s, at(t));
                }
            }
        });

        let mut last = 0;
        while !writer.is_finished() {
            let snap = SHARED.snapshot();
            assert!(snap.steps >= last && snap.steps <= CYCLES * 4);
            if snap.steps > 1 {
                let period = snap.step_period_us.unwrap();
                assert!((period - 6000.0).abs() < 1e-2);
            }
            last = snap.steps;
        }
        writer.join().unwrap();
        assert_eq!(SHARED.step_count(), CYCLES * 4);
    }
}
