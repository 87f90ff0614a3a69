//! Access to precomputed transistor characterization data.
//!
//! A characterization store holds, per process model, small-signal
//! parameters swept over bias point at a grid of gate lengths and
//! drain-source voltages. Every sweep consists of four aligned axes
//! (see [`Quantity`]); index `i` of each axis describes the same bias point,
//! and the gm/ID axis decreases from weak toward strong inversion.

use std::collections::HashMap;
use std::fmt::Display;

use arcstr::ArcStr;
use itertools::izip;
use serde::{Deserialize, Serialize};
use sublut::{FloatLut1, FloatLut2};

use self::error::StoreError;
use self::query::Query;
use crate::error::Result;

pub mod error;
pub mod query;

/// A characterized small-signal quantity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    /// Transconductance efficiency gm/ID, in 1/V.
    GmId,
    /// Intrinsic gain gm·ro.
    GmRo,
    /// Transit frequency, in Hz.
    Ft,
    /// Current density ID/W, in A/m.
    IdW,
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::GmId => write!(f, "gm/ID"),
            Self::GmRo => write!(f, "gm*ro"),
            Self::Ft => write!(f, "fT"),
            Self::IdW => write!(f, "ID/W"),
        }
    }
}

/// One tabulated bias point of a sweep.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub gm_id: f64,
    pub gm_ro: f64,
    pub ft: f64,
    pub id_w: f64,
}

/// The four aligned axes of one bias sweep.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub gm_id: Vec<f64>,
    pub gm_ro: Vec<f64>,
    pub ft: Vec<f64>,
    pub id_w: Vec<f64>,
}

impl Sweep {
    pub fn axis(&self, quantity: Quantity) -> &[f64] {
        match quantity {
            Quantity::GmId => &self.gm_id,
            Quantity::GmRo => &self.gm_ro,
            Quantity::Ft => &self.ft,
            Quantity::IdW => &self.id_w,
        }
    }
}

/// A source of characterization data.
pub trait CharStore {
    /// Makes the given process model available, failing with
    /// [`StoreError::ModelNotFound`] if the store does not know it.
    fn load(&self, model: &str) -> Result<()>;

    /// Retrieves one axis of the sweep identified by `query`.
    fn axis(&self, query: &Query, quantity: Quantity) -> Result<Vec<f64>>;

    /// Retrieves all four axes of a sweep as a table keyed by gm/ID.
    ///
    /// Fails if the sweep is empty or if any axis length differs from the
    /// gm/ID axis.
    fn sweep(&self, query: &Query) -> Result<FloatLut1<OperatingPoint>> {
        self.load(&query.model)?;
        let gm_id = self.axis(query, Quantity::GmId)?;
        if gm_id.is_empty() {
            return Err(StoreError::EmptySweep(query.model.clone()).into());
        }

        let aligned = |quantity: Quantity| -> Result<Vec<f64>> {
            let axis = self.axis(query, quantity)?;
            if axis.len() != gm_id.len() {
                return Err(StoreError::MismatchedAxes {
                    quantity,
                    expected: gm_id.len(),
                    found: axis.len(),
                }
                .into());
            }
            Ok(axis)
        };
        let gm_ro = aligned(Quantity::GmRo)?;
        let ft = aligned(Quantity::Ft)?;
        let id_w = aligned(Quantity::IdW)?;

        let points = izip!(&gm_id, &gm_ro, &ft, &id_w)
            .map(|(&gm_id, &gm_ro, &ft, &id_w)| OperatingPoint {
                gm_id,
                gm_ro,
                ft,
                id_w,
            })
            .collect();

        FloatLut1::builder()
            .k1(gm_id)
            .values(points)
            .build()
            .map_err(|err| StoreError::InvalidTable(err.to_string()).into())
    }
}

/// The sweeps of one process model on a grid of gate length × VDS.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTable {
    lut: FloatLut2<Sweep>,
}

impl ModelTable {
    /// Creates a table from gate lengths (meters), drain-source voltages
    /// (volts) and the sweeps taken at each grid point, with
    /// `sweeps[i][j]` measured at `(lengths[i], vds[j])`.
    pub fn new(lengths: Vec<f64>, vds: Vec<f64>, sweeps: Vec<Vec<Sweep>>) -> Result<Self> {
        let lut = FloatLut2::builder()
            .k1(lengths)
            .k2(vds)
            .values(sweeps)
            .build()
            .map_err(|err| StoreError::InvalidTable(err.to_string()))?;
        Ok(Self { lut })
    }

    #[inline]
    pub fn lengths(&self) -> &[f64] {
        self.lut.k1()
    }

    #[inline]
    pub fn vds(&self) -> &[f64] {
        self.lut.k2()
    }

    #[inline]
    pub fn sweep(&self, length: f64, vds: f64) -> Option<&Sweep> {
        self.lut.get_exact(length, vds)
    }
}

/// An in-memory characterization store.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharDb {
    models: HashMap<ArcStr, ModelTable>,
}

impl CharDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the table for `model`.
    pub fn add_model(&mut self, model: impl Into<ArcStr>, table: ModelTable) {
        self.models.insert(model.into(), table);
    }

    pub fn model(&self, model: &str) -> Result<&ModelTable> {
        self.models
            .get(model)
            .ok_or_else(|| StoreError::ModelNotFound(ArcStr::from(model)).into())
    }

    pub fn models(&self) -> impl Iterator<Item = &ArcStr> + '_ {
        self.models.keys()
    }
}

impl CharStore for CharDb {
    fn load(&self, model: &str) -> Result<()> {
        self.model(model).map(|_| ())
    }

    fn axis(&self, query: &Query, quantity: Quantity) -> Result<Vec<f64>> {
        let sweep = self
            .model(&query.model)?
            .sweep(query.length, query.vds)
            .ok_or_else(|| StoreError::GridPointNotFound {
                model: query.model.clone(),
                length: query.length,
                vds: query.vds,
            })?;
        Ok(sweep.axis(quantity).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;

    fn sweep(n: usize) -> Sweep {
        Sweep {
            gm_id: (0..n).map(|i| 25. - 5. * i as f64).collect(),
            gm_ro: (0..n).map(|i| 40. + 10. * i as f64).collect(),
            ft: (0..n).map(|i| 1e8 * (i + 1) as f64).collect(),
            id_w: (0..n).map(|i| (i + 1) as f64 / 10.).collect(),
        }
    }

    fn db() -> CharDb {
        let mut db = CharDb::new();
        let table = ModelTable::new(vec![1e-6], vec![0.3, 0.6], vec![vec![sweep(4), sweep(3)]])
            .unwrap();
        db.add_model("nch", table);
        db
    }

    #[test]
    fn test_sweep_is_keyed_by_gm_id() {
        let lut = db().sweep(&Query::new("nch", 0.3, 1e-6)).unwrap();
        assert_eq!(lut.keys(), &[25., 20., 15., 10.]);
        let (_, op) = lut.get_below(&18.).unwrap();
        assert_eq!(
            *op,
            OperatingPoint {
                gm_id: 15.,
                gm_ro: 60.,
                ft: 3e8,
                id_w: 0.3
            }
        );
    }

    #[test]
    fn test_unknown_model() {
        let err = db().sweep(&Query::new("pch", 0.3, 1e-6)).unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Store(StoreError::ModelNotFound(m)) if m.as_str() == "pch"
        ));
    }

    #[test]
    fn test_off_grid_query() {
        let err = db().sweep(&Query::new("nch", 0.5, 1e-6)).unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Store(StoreError::GridPointNotFound { .. })
        ));
    }

    #[test]
    fn test_mismatched_axes() {
        let mut bad = sweep(3);
        bad.ft.pop();
        let mut db = CharDb::new();
        db.add_model(
            "nch",
            ModelTable::new(vec![1e-6], vec![0.3], vec![vec![bad]]).unwrap(),
        );
        let err = db.sweep(&Query::new("nch", 0.3, 1e-6)).unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Store(StoreError::MismatchedAxes {
                quantity: Quantity::Ft,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_empty_sweep() {
        let mut db = CharDb::new();
        db.add_model(
            "nch",
            ModelTable::new(vec![1e-6], vec![0.3], vec![vec![Sweep::default()]]).unwrap(),
        );
        assert!(db.sweep(&Query::new("nch", 0.3, 1e-6)).is_err());
    }

    #[test]
    fn test_ragged_grid_is_rejected() {
        assert!(ModelTable::new(vec![1e-6, 2e-6], vec![0.3], vec![vec![sweep(2)]]).is_err());
    }
}
