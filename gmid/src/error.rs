use std::fmt::{Debug, Display};

use arcstr::ArcStr;
use thiserror::Error;

use crate::device::error::DeviceError;
use crate::stability::StabilityError;
use crate::store::error::StoreError;

pub type Result<T> = std::result::Result<T, SizingError>;

pub struct SizingError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl SizingError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    /// The contexts in which the error occurred, innermost first.
    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for SizingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for SizingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for SizingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for SizingError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl SizingError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<SizingError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    ResolveDevice { role: ArcStr, model: ArcStr },
    ParseConfig,
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            ResolveDevice { role, model } => {
                write!(f, "resolving {role} device (model `{model}`)")
            }
            ParseConfig => write!(f, "parsing amplifier configuration"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("error accessing characterization data: {0}")]
    Store(#[from] StoreError),

    #[error("error resolving device: {0}")]
    Device(#[from] DeviceError),

    #[error("error evaluating stability: {0}")]
    Stability(#[from] StabilityError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),
}
