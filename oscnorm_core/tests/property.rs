use oscnorm_core::{ChannelConfig, ChannelRegistry, SampleWindow, map_range_clamped};
use proptest::prelude::*;

proptest! {
    #[test]
    fn window_keeps_last_capacity_values(
        cap in 1usize..32,
        values in prop::collection::vec(any::<i32>(), 0..128),
    ) {
        let mut w = SampleWindow::new(cap);
        for &v in &values {
            w.push(v);
        }
        let expected: Vec<i32> = values.iter().rev().take(cap).rev().copied().collect();
        prop_assert_eq!(w.len(), values.len().min(cap));
        prop_assert_eq!(w.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn mean_is_arithmetic_mean(values in prop::collection::vec(-100_000i32..100_000, 1..=10)) {
        let mut w = SampleWindow::new(10);
        for &v in &values {
            w.push(v);
        }
        let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();
        let expected = sum as f64 / values.len() as f64;
        let got = f64::from(w.mean().unwrap());
        prop_assert!((got - expected).abs() <= expected.abs() * 1e-6 + 1e-3);
    }

    #[test]
    fn normalize_is_monotonic_and_bounded(
        in_min in -10_000.0f32..10_000.0,
        width in 1.0f32..10_000.0,
        out_min in -100.0f32..100.0,
        out_width in 0.0f32..1_000.0,
        a in -50_000.0f32..50_000.0,
        b in -50_000.0f32..50_000.0,
    ) {
        let in_max = in_min + width;
        let out_max = out_min + out_width;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let y_lo = map_range_clamped(lo, in_min, in_max, out_min, out_max);
        let y_hi = map_range_clamped(hi, in_min, in_max, out_min, out_max);
        prop_assert!(y_lo <= y_hi);
        let eps = 1e-3;
        for y in [y_lo, y_hi] {
            prop_assert!(y >= out_min - eps && y <= out_max + eps);
        }
        if hi < in_min {
            prop_assert_eq!(y_hi, out_min);
        }
        if lo > in_max {
            prop_assert!((y_lo - out_max).abs() <= eps);
        }
    }

    #[test]
    fn unknown_channels_never_panic(cmd in "[A-Za-z]{1,12}", v in any::<i32>()) {
        let mut reg = ChannelRegistry::new(4);
        reg.insert(ChannelConfig::new("Known", "/k", "/k/min", "/k/max", 0.0, 1.0));
        prop_assume!(cmd != "Known");
        prop_assert!(!reg.push_sample(&cmd, v));
        prop_assert_eq!(reg.computed_data(&cmd), 0.0);
        prop_assert_eq!(reg.min_value(&cmd), -1.0);
        prop_assert_eq!(reg.set_min(&cmd), None);
    }
}
