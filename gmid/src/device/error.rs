use arcstr::ArcStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error("incomplete device configuration (missing {})", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("gm/ID target {target} is not above any tabulated value of model `{model}` (smallest is {min})")]
    LookupExhausted { model: ArcStr, target: f64, min: f64 },
}
