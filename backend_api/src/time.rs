//! Tick conversion.

/// Converts a millisecond interval to backend clock ticks, rounding up.
///
/// Ceiling division guarantees that a non-zero delay never becomes zero
/// ticks: a caller asking for any wait at all gets at least one tick.
///
/// `tick_micros` is the backend's fixed tick duration as reported by
/// [`KernelBackend::tick_micros`](crate::KernelBackend::tick_micros) and
/// must be non-zero.
pub fn millis_to_ticks(millis: u32, tick_micros: u32) -> u32 {
    let micros = u64::from(millis) * 1_000;
    let tick = u64::from(tick_micros);
    ((micros + tick - 1) / tick) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        // 1 ms at a 1000 us tick is exactly one tick.
        assert_eq!(millis_to_ticks(1, 1_000), 1);
        assert_eq!(millis_to_ticks(100, 1_000), 100);
    }

    #[test]
    fn test_rounds_up_not_down() {
        // 1 ms at a 10 ms tick must still wait a full tick.
        assert_eq!(millis_to_ticks(1, 10_000), 1);
        // 11 ms at a 10 ms tick needs two ticks.
        assert_eq!(millis_to_ticks(11, 10_000), 2);
    }

    #[test]
    fn test_zero_millis_is_zero_ticks() {
        assert_eq!(millis_to_ticks(0, 1_000), 0);
    }

    #[test]
    fn test_large_interval_does_not_overflow() {
        assert_eq!(millis_to_ticks(u32::MAX, 1_000), u32::MAX);
    }
}
