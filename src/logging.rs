//! Structured logging + debug-event sampling.
//!
//! Grounded on the teacher's `tracing_subscriber::fmt()...json().init()`
//! call in `main()`, generalized to also support a pretty formatter for
//! local development (selected by [`crate::config::LogFormat`]).

use crate::config::LogFormat;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub fn init(format: LogFormat) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "place_search_core=info,tower_http=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Downsamples a named high-volume debug event class: every Nth call
/// returns `true` ("emit this one"). Used for purposes like `llm_start`
/// where per-stage volume would otherwise flood debug logs (spec.md §4.1
/// talks about elevating *slow* calls to info; the sampler is the
/// complementary knob for routine ones).
#[derive(Clone)]
pub struct Sampler {
    every_n: u64,
    counter: Arc<AtomicU64>,
}

impl Sampler {
    pub fn new(every_n: u64) -> Self {
        Self { every_n: every_n.max(1), counter: Arc::new(AtomicU64::new(0)) }
    }

    pub fn should_emit(&self) -> bool {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        n % self.every_n == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_emits_first_and_every_nth() {
        let s = Sampler::new(3);
        let emitted: Vec<bool> = (0..6).map(|_| s.should_emit()).collect();
        assert_eq!(emitted, vec![true, false, false, true, false, false]);
    }
}
