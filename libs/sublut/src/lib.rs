//! Lookup tables over ordered key axes.
//!
//! Lookups never interpolate: [`Lut1`] selects whole table entries by a
//! stair-step rule and [`Lut2`] only returns entries stored at grid points.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Relative tolerance used when matching floating point grid keys.
pub const KEY_RTOL: f64 = 1e-9;

/// A one dimensional table: an ordered key axis with one value per key.
#[derive(Debug, Default, Clone, Eq, PartialEq, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct Lut1<K, V> {
    k1: Vec<K>,
    values: Vec<V>,
}

impl<K, V> Lut1Builder<K, V> {
    fn validate(&self) -> Result<(), String> {
        match (&self.k1, &self.values) {
            (Some(k1), Some(values)) if k1.len() != values.len() => Err(format!(
                "expected {} values to match the key axis, found {}",
                k1.len(),
                values.len()
            )),
            _ => Ok(()),
        }
    }
}

/// A two dimensional table stored in row major order.
///
/// `values[i][j]` is the entry at `(k1[i], k2[j])`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct Lut2<K1, K2, V> {
    k1: Vec<K1>,
    k2: Vec<K2>,
    values: Vec<Vec<V>>,
}

impl<K1, K2, V> Lut2Builder<K1, K2, V> {
    fn validate(&self) -> Result<(), String> {
        let (Some(k1), Some(k2), Some(values)) = (&self.k1, &self.k2, &self.values) else {
            return Ok(());
        };
        if values.len() != k1.len() {
            return Err(format!(
                "expected {} rows to match the first key axis, found {}",
                k1.len(),
                values.len()
            ));
        }
        if let Some((i, row)) = values.iter().enumerate().find(|(_, r)| r.len() != k2.len()) {
            return Err(format!(
                "expected row {i} to have {} entries, found {}",
                k2.len(),
                row.len()
            ));
        }
        Ok(())
    }
}

impl<K, V> Lut1<K, V> {
    pub fn builder() -> Lut1Builder<K, V> {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.k1.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k1.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.k1
    }

    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Returns the key and value stored at index `idx`.
    pub fn entry(&self, idx: usize) -> Option<(&K, &V)> {
        Some((self.k1.get(idx)?, self.values.get(idx)?))
    }
}

impl<K, V> Lut1<K, V>
where
    K: PartialOrd,
{
    /// Returns the index of the first key strictly less than `k`.
    ///
    /// Intended for key axes sorted in decreasing order, where this selects
    /// the nearest tabulated key below `k`. Keys equal to `k` are skipped.
    pub fn first_below(&self, k: &K) -> Option<usize> {
        self.k1.iter().position(|x| x < k)
    }

    /// Returns the entry at [`Lut1::first_below`].
    pub fn get_below(&self, k: &K) -> Option<(&K, &V)> {
        self.entry(self.first_below(k)?)
    }
}

impl<K1, K2, V> Lut2<K1, K2, V> {
    pub fn builder() -> Lut2Builder<K1, K2, V> {
        Default::default()
    }

    #[inline]
    pub fn k1(&self) -> &[K1] {
        &self.k1
    }

    #[inline]
    pub fn k2(&self) -> &[K2] {
        &self.k2
    }
}

impl<V> Lut2<f64, f64, V> {
    /// Returns the entry stored at the grid point `(k1, k2)`.
    ///
    /// Keys match when they agree to within [`KEY_RTOL`]. Returns [`None`]
    /// if either key is not on the grid.
    pub fn get_exact(&self, k1: f64, k2: f64) -> Option<&V> {
        let i1 = position_of(&self.k1, k1)?;
        let i2 = position_of(&self.k2, k2)?;
        self.values.get(i1)?.get(i2)
    }
}

fn position_of(keys: &[f64], k: f64) -> Option<usize> {
    keys.iter()
        .position(|&x| (x - k).abs() <= KEY_RTOL * x.abs().max(k.abs()))
}

pub type FloatLut1<V> = Lut1<f64, V>;
pub type FloatLut2<V> = Lut2<f64, f64, V>;

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    fn descending() -> FloatLut1<u32> {
        FloatLut1::builder()
            .k1(vec![25., 20., 15., 10.])
            .values(vec![0, 1, 2, 3])
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_below_is_stair_step() {
        let lut = descending();
        assert_eq!(lut.first_below(&30.), Some(0));
        assert_eq!(lut.first_below(&22.), Some(1));
        // an exact match is not strictly below the target
        assert_eq!(lut.first_below(&20.), Some(2));
        assert_eq!(lut.first_below(&10.5), Some(3));
        assert_eq!(lut.first_below(&10.), None);
        assert_eq!(lut.first_below(&1.), None);
    }

    #[test]
    fn test_get_below_returns_selected_key() {
        let lut = descending();
        let (k, v) = lut.get_below(&17.).unwrap();
        assert_float_eq!(*k, 15., abs <= 0.);
        assert_eq!(*v, 2);
    }

    #[test]
    fn test_lut1_rejects_misaligned_axes() {
        let res = FloatLut1::<u32>::builder()
            .k1(vec![3., 2., 1.])
            .values(vec![1, 2])
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn test_lut2_get_exact() {
        let lut = FloatLut2::builder()
            .k1(vec![1e-6, 2e-6])
            .k2(vec![0.3, 0.6])
            .values(vec![vec!['a', 'b'], vec!['c', 'd']])
            .build()
            .unwrap();

        assert_eq!(lut.get_exact(1e-6, 0.6), Some(&'b'));
        assert_eq!(lut.get_exact(2e-6, 0.1 + 0.2), Some(&'c'));
        assert_eq!(lut.get_exact(1.5e-6, 0.3), None);
        assert_eq!(lut.get_exact(2e-6, 0.5), None);
    }

    #[test]
    fn test_lut2_rejects_ragged_rows() {
        let res = FloatLut2::builder()
            .k1(vec![1., 2.])
            .k2(vec![1., 2.])
            .values(vec![vec![1., 2.], vec![3.]])
            .build();
        assert!(res.is_err());
    }
}
