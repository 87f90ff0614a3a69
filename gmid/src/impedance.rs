//! Resistance algebra for composing stage output resistances.

/// Parallel combination of `resistances`.
///
/// A zero resistance shorts the whole combination, so any zero element
/// (including an unresolved device) yields zero. An empty list also yields zero.
pub fn parallel(resistances: &[f64]) -> f64 {
    if resistances.is_empty() || resistances.iter().any(|&r| r == 0.0) {
        return 0.0;
    }
    1.0 / resistances.iter().map(|r| 1.0 / r).sum::<f64>()
}

/// Output resistance of a device with output resistance `r_bottom`
/// cascoded by a device with output resistance `r_top` and transconductance `gm_top`.
#[inline]
pub fn cascode(r_bottom: f64, r_top: f64, gm_top: f64) -> f64 {
    (1.0 + gm_top * r_top) * r_bottom + r_top
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_parallel_equal_resistors() {
        assert_float_eq!(parallel(&[10e3, 10e3]), 5e3, r2nd <= 1e-12);
        assert_float_eq!(parallel(&[3e3, 3e3, 3e3]), 1e3, r2nd <= 1e-12);
    }

    #[test]
    fn test_parallel_is_order_independent() {
        let a = parallel(&[1e3, 4.7e3, 22e3]);
        let b = parallel(&[22e3, 1e3, 4.7e3]);
        assert_float_eq!(a, b, r2nd <= 1e-12);
        assert!(a < 1e3);
    }

    #[test]
    fn test_parallel_zero_shorts() {
        assert_eq!(parallel(&[1e6, 0.0, 2e6]), 0.0);
        assert_eq!(parallel(&[]), 0.0);
    }

    #[test]
    fn test_cascode() {
        assert_float_eq!(cascode(1e6, 1e6, 0.0), 2e6, r2nd <= 1e-12);
        // gm*ro = 50 boosts the bottom device by roughly 51x
        assert_float_eq!(cascode(1e6, 2e6, 25e-6), 53e6, r2nd <= 1e-12);
    }
}
