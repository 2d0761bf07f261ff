//! Property-based tests for the back-off policies and the fail detector
//!
//! These tests use proptest to generate random configurations and verify the
//! invariants every caller relies on.

#[cfg(test)]
mod tests {
    use crate::backoff::{BackOff, ExponentialBackOff, ExponentialConfig, RandomBackOff, Seed};
    use crate::fail_detector::FailDetector;
    use crate::timespan::Timespan;
    use proptest::prelude::*;
    use std::time::Duration;

    // ===== Strategy Generators =====

    fn arb_exponential_config() -> impl Strategy<Value = ExponentialConfig> {
        (1u64..10_000, 0.0f64..=1.0, 0.0f64..4.0).prop_map(|(initial_ms, factor, multiplier)| {
            ExponentialConfig::builder()
                .initial_interval(Duration::from_millis(initial_ms))
                .max_interval(Duration::ZERO)
                .max_elapsed_time(Duration::from_secs(3600))
                .randomization_factor(factor)
                .multiplier(multiplier)
                .build()
                .expect("generated config must be valid")
        })
    }

    fn arb_bounds() -> impl Strategy<Value = (Duration, Duration)> {
        (0u64..1_000_000, 1u64..10_000_000).prop_map(|(min, span)| {
            (
                Duration::from_micros(min),
                Duration::from_micros(min + span),
            )
        })
    }

    // ===== ExponentialBackOff Properties =====

    proptest! {
        /// Property: every delay lies within the jitter window of the center in
        /// effect before the call, and the center then grows by the multiplier
        #[test]
        fn prop_exponential_delay_within_window(config in arb_exponential_config(), steps in 1usize..12) {
            let mut backoff = ExponentialBackOff::new(config);
            let factor = config.randomization_factor();

            for _ in 0..steps {
                let center = backoff.next_interval();
                let delay = backoff.next_delay().expect("budget not exhausted");

                let center_us = center.as_micros() as f64;
                let low = (center_us * (1.0 - factor)).floor() - 1.0;
                let high = (center_us * (1.0 + factor)).ceil() + 1.0;
                let delay_us = delay.as_micros() as f64;
                prop_assert!(delay_us >= low && delay_us <= high,
                    "delay {}us outside [{}, {}]", delay_us, low, high);

                let expected_ms = center.as_millis() as f64 * config.multiplier();
                let actual_ms = backoff.next_interval().as_secs_f64() * 1000.0;
                prop_assert!((actual_ms - expected_ms).abs() <= 1.0,
                    "center {}ms, expected {}ms", actual_ms, expected_ms);
            }
        }

        /// Property: the center never exceeds a configured max interval
        #[test]
        fn prop_exponential_center_capped(
            initial_ms in 1u64..1_000,
            extra_ms in 0u64..20_000,
            multiplier in 1.0f64..10.0,
        ) {
            let max_ms = initial_ms + extra_ms;
            let config = ExponentialConfig::builder()
                .initial_interval(Duration::from_millis(initial_ms))
                .max_interval(Duration::from_millis(max_ms))
                .multiplier(multiplier)
                .build()
                .expect("valid config");
            let mut backoff = ExponentialBackOff::new(config);

            for _ in 0..30 {
                backoff.next_delay();
                prop_assert!(backoff.next_interval() <= Duration::from_millis(max_ms));
            }
        }

        /// Property: initial intervals below one millisecond are rejected
        #[test]
        fn prop_sub_millisecond_initial_rejected(micros in 1u64..1_000) {
            let result = ExponentialConfig::builder()
                .initial_interval(Duration::from_micros(micros))
                .build();
            let is_sub_millisecond = matches!(result, Err(crate::ConfigError::SubMillisecond { .. }));
            prop_assert!(is_sub_millisecond);
        }

        /// Property: invalid factors are always rejected
        #[test]
        fn prop_factor_outside_unit_interval_rejected(factor in prop_oneof![-100.0f64..-0.0001, 1.0001f64..100.0]) {
            prop_assert!(ExponentialConfig::builder().randomization_factor(factor).build().is_err());
        }
    }

    // ===== RandomBackOff Properties =====

    proptest! {
        /// Property: delays stay within bounds and exactly `count` are produced
        #[test]
        fn prop_random_respects_bounds_and_count(
            (min, max) in arb_bounds(),
            count in 1usize..500,
            seed in 0u32..u32::MAX,
        ) {
            let mut backoff = RandomBackOff::new(min, max, count, Seed::Fixed(seed)).expect("valid bounds");
            let mut produced = 0;

            while let Some(delay) = backoff.next_delay() {
                prop_assert!(delay >= min && delay < max);
                produced += 1;
            }

            prop_assert_eq!(produced, count);
        }

        /// Property: reset with a fixed seed replays the same sequence
        #[test]
        fn prop_random_reset_replays((min, max) in arb_bounds(), seed in 0u32..u32::MAX) {
            let mut backoff = RandomBackOff::new(min, max, 0, Seed::Fixed(seed)).expect("valid bounds");
            let first: Vec<_> = (0..32).map(|_| backoff.next_delay()).collect();

            backoff.reset();
            let second: Vec<_> = (0..32).map(|_| backoff.next_delay()).collect();

            prop_assert_eq!(first, second);
        }
    }

    // ===== FailDetector Properties =====

    proptest! {
        /// Property: the detector is failed exactly when the threshold is
        /// positive and reached
        #[test]
        fn prop_fail_detector_threshold(threshold in 0u32..50, fails in 0u32..100) {
            let mut detector = FailDetector::new(threshold);
            for _ in 0..fails {
                detector.fail();
            }

            prop_assert_eq!(detector.is_going_to_fail(), fails > 0);
            prop_assert_eq!(detector.is_failed(), threshold > 0 && fails >= threshold);

            detector.success();
            prop_assert!(!detector.is_failed());
            prop_assert!(!detector.is_going_to_fail());
        }
    }

    // ===== Timespan Properties =====

    proptest! {
        /// Property: the displayed form parses back to the same span
        #[test]
        fn prop_timespan_display_parses(micros in -1_000_000_000_000i64..1_000_000_000_000) {
            let span = Timespan::from_micros(micros);
            prop_assert_eq!(span.to_string().parse::<Timespan>().ok(), Some(span));
        }
    }
}
