//! Queries to select characterization sweeps.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// Identifies one bias sweep of a process model: the model name plus
/// the drain-source voltage and gate length the sweep was taken at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub(crate) model: ArcStr,
    /// Drain-source voltage, in volts.
    pub(crate) vds: f64,
    /// Gate length, in meters.
    pub(crate) length: f64,
}

impl Query {
    #[inline]
    pub fn new(model: impl Into<ArcStr>, vds: f64, length: f64) -> Self {
        Self {
            model: model.into(),
            vds,
            length,
        }
    }

    #[inline]
    pub fn model(&self) -> &ArcStr {
        &self.model
    }

    #[inline]
    pub fn vds(&self) -> f64 {
        self.vds
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }
}
