//! Capped exponential backoff for `abort_timeout`/`provider_5xx` (spec.md §4.1).

use rand::Rng;
use std::time::Duration;

pub const MAX_EXTRA_ATTEMPTS: u32 = 2;
const BASE_MIN_MS: u64 = 50;
const BASE_MAX_MS: u64 = 150;

/// `attempt` is 1-indexed (first retry = 1, second = 2). Doubles the base
/// jittered delay per attempt, capped by `MAX_EXTRA_ATTEMPTS` at the call site.
pub fn backoff_delay(attempt: u32) -> Duration {
    let mut rng = rand::thread_rng();
    let base_ms = rng.gen_range(BASE_MIN_MS..=BASE_MAX_MS);
    let factor = 1u64 << (attempt.saturating_sub(1)).min(4);
    Duration::from_millis(base_ms * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_grows_with_attempt() {
        let d1 = backoff_delay(1);
        let d2 = backoff_delay(2);
        assert!(d1.as_millis() >= 50 && d1.as_millis() <= 150);
        assert!(d2.as_millis() >= 100 && d2.as_millis() <= 300);
    }
}
