use chrono::Duration;

const BASE_MS: i64 = 1_000;
const FLOOR_MS: i64 = 5_000;
const CEILING_MS: i64 = 60_000;

/// Delay before a failed job becomes claimable again: `2^attempts` seconds,
/// clamped to `[5s, 60s]`.
pub fn backoff(attempt_count: i32) -> Duration {
    // 2^17s already exceeds the ceiling; capping the exponent keeps the
    // shift from overflowing for absurd attempt counts.
    let exponent = attempt_count.clamp(0, 17) as u32;
    let raw_ms = BASE_MS.saturating_mul(1_i64 << exponent);
    Duration::milliseconds(raw_ms.clamp(FLOOR_MS, CEILING_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_attempt_counts_hit_the_floor() {
        assert_eq!(backoff(0).num_milliseconds(), 5_000);
        assert_eq!(backoff(1).num_milliseconds(), 5_000);
        assert_eq!(backoff(2).num_milliseconds(), 5_000);
    }

    #[test]
    fn exponential_region() {
        assert_eq!(backoff(3).num_milliseconds(), 8_000);
        assert_eq!(backoff(4).num_milliseconds(), 16_000);
        assert_eq!(backoff(5).num_milliseconds(), 32_000);
    }

    #[test]
    fn large_attempt_counts_hit_the_ceiling() {
        assert_eq!(backoff(6).num_milliseconds(), 60_000);
        assert_eq!(backoff(10).num_milliseconds(), 60_000);
        assert_eq!(backoff(i32::MAX).num_milliseconds(), 60_000);
    }

    #[test]
    fn negative_attempt_counts_are_treated_as_zero() {
        assert_eq!(backoff(-1).num_milliseconds(), 5_000);
    }
}
