use fugit::{TimerDurationU32, TimerInstantU32};

/// Timer frequency every timestamp in the crate is expressed in.
pub const TICK_HZ: u32 = 1_000_000;

pub type Instant = TimerInstantU32<TICK_HZ>;
pub type Duration = TimerDurationU32<TICK_HZ>;

pub const SECONDS_PER_MICRO: f32 = 0.001 * 0.001;

pub fn dur_from_millis(millis: u32) -> Duration {
    Duration::millis(millis)
}

pub fn dur_to_secs(dur: Duration) -> f32 {
    dur.ticks() as f32 * SECONDS_PER_MICRO
}

/// Time elapsed from `earlier` to `later`, or `None` if `later` reads before `earlier`.
pub fn elapsed(earlier: Instant, later: Instant) -> Option<Duration> {
    later.checked_duration_since(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_handles_timer_wrap() {
        let earlier = Instant::from_ticks(u32::MAX - 999);
        let later = Instant::from_ticks(1000);
        assert_eq!(elapsed(earlier, later).map(|d| d.ticks()), Some(2000));
    }

    #[test]
    fn elapsed_rejects_backwards_clock() {
        let earlier = Instant::from_ticks(5000);
        let later = Instant::from_ticks(4000);
        assert_eq!(elapsed(earlier, later), None);
    }

    #[test]
    fn millis_convert_to_seconds() {
        assert!((dur_to_secs(dur_from_millis(20)) - 0.02).abs() < 1e-6);
    }
}
