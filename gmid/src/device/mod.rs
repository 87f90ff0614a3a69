//! Single-transistor small-signal models.
//!
//! A device is described by a plain [`DeviceParams`] value. [`solve`] looks
//! up its operating point in a [`CharStore`] and returns a [`SmallSignal`]
//! model from which gm, ro, capacitances and width are derived.

use std::f64::consts::PI;

use arcstr::ArcStr;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use self::error::DeviceError;
use crate::error::Result;
use crate::log::{debug, warn};
use crate::store::query::Query;
use crate::store::{CharStore, OperatingPoint};

pub mod error;

/// Ratio of total gate capacitance to gate-source capacitance.
pub const CGG_CGS_RATIO: f64 = 2.5;

/// How unresolvable devices are handled.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Incomplete configurations and exhausted lookups both resolve to the
    /// zero operating point.
    Legacy,
    /// Incomplete configurations resolve to the zero operating point;
    /// exhausted lookups are errors.
    #[default]
    Standard,
    /// Incomplete configurations and exhausted lookups are both errors.
    Strict,
}

/// Outcome of resolving a device.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Resolved,
    /// One or more bias inputs were unset; all derived values are zero.
    Incomplete,
    /// The gm/ID target was not above any tabulated value; all derived values are zero.
    LookupExhausted,
}

/// Bias targets of one transistor.
///
/// All quantities are in SI units. A value of zero (or an empty model name)
/// means "not set".
#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct DeviceParams {
    /// Process model name, eg. `nch`.
    #[builder(setter(into))]
    pub model: ArcStr,
    /// Target gm/ID, in 1/V.
    pub gm_id: f64,
    /// Drain current, in amperes.
    pub id: f64,
    /// Gate length, in meters.
    pub length: f64,
    /// Drain-source voltage, in volts.
    pub vds: f64,
}

impl DeviceParams {
    #[inline]
    pub fn builder() -> DeviceParamsBuilder {
        DeviceParamsBuilder::default()
    }

    /// Returns a copy of these parameters biased at drain current `id`.
    pub fn with_id(&self, id: f64) -> Self {
        Self { id, ..self.clone() }
    }

    /// Names of the inputs that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model.is_empty() {
            missing.push("model");
        }
        for (name, value) in [
            ("gm_id", self.gm_id),
            ("id", self.id),
            ("length", self.length),
            ("vds", self.vds),
        ] {
            if value == 0.0 {
                missing.push(name);
            }
        }
        missing
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.missing().is_empty()
    }

    #[inline]
    pub fn query(&self) -> Query {
        Query::new(self.model.clone(), self.vds, self.length)
    }

    #[inline]
    pub fn solve(&self, store: &dyn CharStore, mode: LookupMode) -> Result<SmallSignal> {
        solve(self, store, mode)
    }
}

/// The small-signal model of a resolved device.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallSignal {
    params: DeviceParams,
    op: OperatingPoint,
    status: DeviceStatus,
}

impl SmallSignal {
    fn unresolved(params: &DeviceParams, status: DeviceStatus) -> Self {
        Self {
            params: params.clone(),
            op: OperatingPoint::default(),
            status,
        }
    }

    #[inline]
    pub fn params(&self) -> &DeviceParams {
        &self.params
    }

    /// The tabulated operating point selected for this device.
    #[inline]
    pub fn op(&self) -> &OperatingPoint {
        &self.op
    }

    #[inline]
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    /// Drain current, in amperes.
    #[inline]
    pub fn id(&self) -> f64 {
        self.params.id
    }

    /// Transconductance, in siemens.
    #[inline]
    pub fn gm(&self) -> f64 {
        self.op.gm_id * self.params.id
    }

    /// Output resistance, in ohms.
    pub fn ro(&self) -> f64 {
        let gm = self.gm();
        if gm == 0.0 {
            0.0
        } else {
            self.op.gm_ro / gm
        }
    }

    /// Total gate capacitance, in farads.
    pub fn cgg(&self) -> f64 {
        if self.op.ft == 0.0 {
            0.0
        } else {
            self.gm() / (2.0 * PI * self.op.ft)
        }
    }

    /// Gate-source capacitance, in farads.
    #[inline]
    pub fn cgs(&self) -> f64 {
        self.cgg() / CGG_CGS_RATIO
    }

    /// Transit frequency, in hertz.
    #[inline]
    pub fn ft(&self) -> f64 {
        self.op.ft
    }

    /// Channel width, in meters.
    pub fn width(&self) -> f64 {
        if self.op.id_w == 0.0 {
            0.0
        } else {
            self.params.id / self.op.id_w
        }
    }
}

/// Resolves the small-signal model of the device described by `params`.
///
/// Selects the first tabulated bias point whose gm/ID is strictly less than
/// the target. Bias points are never interpolated.
pub fn solve(params: &DeviceParams, store: &dyn CharStore, mode: LookupMode) -> Result<SmallSignal> {
    let missing = params.missing();
    if !missing.is_empty() {
        if mode == LookupMode::Strict {
            return Err(DeviceError::Incomplete(missing).into());
        }
        debug!("skipping incomplete device (missing {})", missing.join(", "));
        return Ok(SmallSignal::unresolved(params, DeviceStatus::Incomplete));
    }

    let lut = store.sweep(&params.query())?;
    let Some((_, &op)) = lut.get_below(&params.gm_id) else {
        let min = lut.keys().iter().copied().fold(f64::INFINITY, f64::min);
        if mode != LookupMode::Legacy {
            return Err(DeviceError::LookupExhausted {
                model: params.model.clone(),
                target: params.gm_id,
                min,
            }
            .into());
        }
        warn!(
            "gm/ID target {} of model `{}` is not above any tabulated value (smallest is {}); using zero operating point",
            params.gm_id, params.model, min
        );
        return Ok(SmallSignal::unresolved(params, DeviceStatus::LookupExhausted));
    };

    debug!(
        "resolved `{}` (L = {:e}, VDS = {}): gm/ID {} -> {}, gm*ro = {}, fT = {:e}",
        params.model, params.length, params.vds, params.gm_id, op.gm_id, op.gm_ro, op.ft
    );

    Ok(SmallSignal {
        params: params.clone(),
        op,
        status: DeviceStatus::Resolved,
    })
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::error::ErrorSource;
    use crate::store::{CharDb, ModelTable, Sweep};

    fn db() -> CharDb {
        let sweep = Sweep {
            gm_id: vec![24., 20., 16., 12.],
            gm_ro: vec![80., 60., 40., 20.],
            ft: vec![1e7, 5e7, 1e8, 4e8],
            id_w: vec![0.05, 0.25, 1., 4.],
        };
        let mut db = CharDb::new();
        db.add_model(
            "nch",
            ModelTable::new(vec![1e-6], vec![0.3], vec![vec![sweep]]).unwrap(),
        );
        db
    }

    fn params(gm_id: f64) -> DeviceParams {
        DeviceParams::builder()
            .model("nch")
            .gm_id(gm_id)
            .id(2e-6)
            .length(1e-6)
            .vds(0.3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_derived_quantities() {
        let dev = solve(&params(18.), &db(), LookupMode::Standard).unwrap();
        assert_eq!(dev.status(), DeviceStatus::Resolved);
        assert_float_eq!(dev.op().gm_id, 16., abs <= 0.);
        assert_float_eq!(dev.gm(), 32e-6, r2nd <= 1e-12);
        assert_float_eq!(dev.ro(), 40. / 32e-6, r2nd <= 1e-12);
        assert_float_eq!(dev.cgg(), 32e-6 / (2. * PI * 1e8), r2nd <= 1e-12);
        assert_float_eq!(dev.cgs(), dev.cgg() / 2.5, r2nd <= 1e-12);
        assert_float_eq!(dev.width(), 2e-6, r2nd <= 1e-12);
    }

    #[test]
    fn test_exact_table_value_selects_next_entry() {
        let dev = solve(&params(20.), &db(), LookupMode::Standard).unwrap();
        assert_float_eq!(dev.op().gm_id, 16., abs <= 0.);
    }

    #[test]
    fn test_missing_inputs() {
        let p = DeviceParams {
            model: arcstr::literal!("nch"),
            gm_id: 20.,
            ..Default::default()
        };
        assert_eq!(p.missing(), vec!["id", "length", "vds"]);
        assert!(!p.is_valid());
        assert!(params(20.).is_valid());
    }

    #[test]
    fn test_incomplete_device_is_zero() {
        let p = params(20.).with_id(0.);
        let dev = solve(&p, &db(), LookupMode::Standard).unwrap();
        assert_eq!(dev.status(), DeviceStatus::Incomplete);
        assert_eq!(dev.gm(), 0.);
        assert_eq!(dev.ro(), 0.);
        assert_eq!(dev.cgg(), 0.);
        assert_eq!(dev.width(), 0.);

        let err = solve(&p, &db(), LookupMode::Strict).unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Device(DeviceError::Incomplete(m)) if m == &vec!["id"]
        ));
    }

    #[test]
    fn test_exhausted_lookup() {
        let err = solve(&params(12.), &db(), LookupMode::Standard).unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Device(DeviceError::LookupExhausted { min, .. }) if *min == 12.
        ));

        let dev = solve(&params(12.), &db(), LookupMode::Legacy).unwrap();
        assert_eq!(dev.status(), DeviceStatus::LookupExhausted);
        assert_eq!(dev.gm(), 0.);
        assert_eq!(dev.ro(), 0.);
    }
}
