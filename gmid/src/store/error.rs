//! Characterization store error handling.

use arcstr::ArcStr;
use thiserror::Error;

use super::Quantity;

/// An error type for the characterization store API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("no characterization data for model `{0}`")]
    ModelNotFound(ArcStr),

    #[error("model `{model}` has no sweep at L = {length:e} m, VDS = {vds} V")]
    GridPointNotFound { model: ArcStr, length: f64, vds: f64 },

    #[error("{quantity} axis has {found} points, but the gm/ID axis has {expected}")]
    MismatchedAxes {
        quantity: Quantity,
        expected: usize,
        found: usize,
    },

    #[error("empty sweep for model `{0}`")]
    EmptySweep(ArcStr),

    #[error("malformed table: {0}")]
    InvalidTable(String),
}
