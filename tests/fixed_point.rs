use proptest::prelude::*;
use qstft::fixed::{rescale, saturating_add, saturating_add_wide, shift_right};
use qstft::{Rounding, Q};

proptest! {
    /// Narrowing then widening recovers the value within one unit of the
    /// coarser scale, for values away from saturation.
    #[test]
    fn prop_rescale_roundtrip(x in -(1i64 << 28)..(1i64 << 28), from in 16u32..31, drop in 1u32..16) {
        let from_q = Q::new(from).unwrap();
        let to_q = Q::new(from - drop).unwrap();
        let y = rescale(x, from_q, to_q, Rounding::Nearest);
        let back = rescale(y as i64, to_q, from_q, Rounding::Nearest) as i64;
        prop_assert!((back - x).abs() <= 1i64 << (drop - 1), "{} -> {} -> {}", x, y, back);
    }

    /// Widening then narrowing is exact.
    #[test]
    fn prop_widen_then_narrow_is_exact(x in -(1i64 << 20)..(1i64 << 20), rounding in prop_oneof![Just(Rounding::Nearest), Just(Rounding::Truncate)]) {
        let y = rescale(x, Q::Q15, Q::Q21, rounding);
        prop_assert_eq!(rescale(y as i64, Q::Q21, Q::Q15, rounding) as i64, x);
    }

    /// Saturating adds never wrap.
    #[test]
    fn prop_saturating_add_matches_wide_clamp(a in any::<i32>(), b in any::<i32>(), t in any::<i64>()) {
        let wide = (a as i64 + b as i64).clamp(i32::MIN as i64, i32::MAX as i64);
        prop_assert_eq!(saturating_add(a, b) as i64, wide);
        let wide = (a as i128 + t as i128).clamp(i32::MIN as i128, i32::MAX as i128);
        prop_assert_eq!(saturating_add_wide(a, t) as i128, wide);
    }

    /// Rounding to nearest is within half a unit of the exact quotient, and
    /// truncation never rounds up.
    #[test]
    fn prop_shift_right_bounds(v in any::<i64>(), s in 1u32..40) {
        let exact = v as f64 / (1u64 << s) as f64;
        let nearest = shift_right(v, s, Rounding::Nearest) as f64;
        let truncated = shift_right(v, s, Rounding::Truncate) as f64;
        prop_assert!((nearest - exact).abs() <= 0.5 + exact.abs() * 1e-12);
        prop_assert!(truncated <= exact + exact.abs() * 1e-12);
    }
}

#[test]
fn rescale_saturates_at_extremes() {
    assert_eq!(rescale(i64::MIN, Q::Q30, Q::Q20, Rounding::Nearest), i32::MIN);
    assert_eq!(rescale(1 << 40, Q::Q20, Q::Q21, Rounding::Truncate), i32::MAX);
    assert_eq!(rescale(-5, Q::Q20, Q::Q20, Rounding::Nearest), -5);
}
