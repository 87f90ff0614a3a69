//! Open-loop frequency response and phase margin of an all-pole amplifier model.
//!
//! The transfer function is built from the pole list alone:
//!
//! ```text
//! H(s) = K / ((s + w1)(s + w2)...(s + wn)),    K = w1·w2·...·wn · A0
//! ```
//!
//! where `wi = 2π·fi` and `A0` is the DC gain, so that `H(0) = A0`.
//! Zeros are not part of the model.

use std::f64::consts::PI;

use derive_builder::Builder;
use itertools::{Itertools, MinMaxResult};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

/// Sweep points per decade used by [`FrequencySweep::spanning`].
pub const DEFAULT_POINTS_PER_DECADE: usize = 50;
/// Decades swept below the lowest pole by [`FrequencySweep::spanning`].
pub const DECADES_BELOW: i32 = 2;
/// Decades swept above the highest pole by [`FrequencySweep::spanning`].
pub const DECADES_ABOVE: i32 = 4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StabilityError {
    #[error("at least one pole is required")]
    NoPoles,

    #[error("pole frequencies must be positive and finite, found {0}")]
    InvalidPole(f64),

    #[error("DC gain must be positive and finite, found {0}")]
    InvalidGain(f64),

    #[error("invalid frequency sweep: {0}")]
    InvalidSweep(String),

    #[error("magnitude never falls below {cl_gain_db} dB within the sweep")]
    NoCrossover { cl_gain_db: f64 },
}

/// A logarithmic frequency sweep.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct FrequencySweep {
    /// Start frequency, in hertz.
    pub fstart: f64,
    /// Stop frequency, in hertz.
    pub fstop: f64,
    #[builder(default = "DEFAULT_POINTS_PER_DECADE")]
    pub points_per_decade: usize,
}

impl FrequencySweep {
    #[inline]
    pub fn builder() -> FrequencySweepBuilder {
        FrequencySweepBuilder::default()
    }

    /// A sweep from [`DECADES_BELOW`] decades below the lowest pole to
    /// [`DECADES_ABOVE`] decades above the highest.
    pub fn spanning(poles: &[f64]) -> Result<Self> {
        validate_poles(poles)?;
        let (lo, hi) = match poles.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => return Err(StabilityError::NoPoles.into()),
            MinMaxResult::OneElement(p) => (p, p),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        Ok(Self {
            fstart: lo * 10f64.powi(-DECADES_BELOW),
            fstop: hi * 10f64.powi(DECADES_ABOVE),
            points_per_decade: DEFAULT_POINTS_PER_DECADE,
        })
    }

    fn validate(&self) -> Result<()> {
        if !(self.fstart > 0.0 && self.fstop > self.fstart && self.fstop.is_finite()) {
            return Err(StabilityError::InvalidSweep(format!(
                "expected 0 < fstart < fstop, found fstart = {}, fstop = {}",
                self.fstart, self.fstop
            ))
            .into());
        }
        if self.points_per_decade == 0 {
            return Err(
                StabilityError::InvalidSweep("points per decade must be nonzero".into()).into(),
            );
        }
        Ok(())
    }

    /// The swept frequencies, in hertz, in increasing order.
    pub fn frequencies(&self) -> Vec<f64> {
        let ppd = self.points_per_decade.max(1) as f64;
        let decades = (self.fstop / self.fstart).log10();
        let total_points = (ppd * decades).ceil() as usize + 1;
        (0..total_points)
            .map(|i| self.fstart * 10f64.powf(i as f64 / ppd))
            .filter(|&f| f <= self.fstop * (1.0 + 1e-9))
            .collect()
    }
}

/// Frequency response samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bode {
    freq: Vec<f64>,
    mag_db: Vec<f64>,
    phase_deg: Vec<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMargin {
    /// Phase margin, in degrees.
    pub degrees: f64,
    /// First swept frequency at which the magnitude is below the target, in hertz.
    pub frequency: f64,
}

impl Bode {
    /// Creates a response from aligned samples.
    ///
    /// Fails with [`StabilityError::InvalidSweep`] if the three sequences
    /// differ in length.
    pub fn new(freq: Vec<f64>, mag_db: Vec<f64>, phase_deg: Vec<f64>) -> Result<Self> {
        if mag_db.len() != freq.len() || phase_deg.len() != freq.len() {
            return Err(StabilityError::InvalidSweep(format!(
                "expected {} magnitude and phase samples, found {} and {}",
                freq.len(),
                mag_db.len(),
                phase_deg.len()
            ))
            .into());
        }
        Ok(Self {
            freq,
            mag_db,
            phase_deg,
        })
    }

    /// Frequencies, in hertz.
    #[inline]
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    /// Magnitude, in dB.
    #[inline]
    pub fn mag_db(&self) -> &[f64] {
        &self.mag_db
    }

    /// Unwrapped phase, in degrees.
    #[inline]
    pub fn phase_deg(&self) -> &[f64] {
        &self.phase_deg
    }

    /// Phase margin at the first frequency where the magnitude falls below `cl_gain_db`.
    pub fn phase_margin(&self, cl_gain_db: f64) -> Result<PhaseMargin> {
        let crossover = self
            .mag_db
            .iter()
            .position(|&m| m < cl_gain_db)
            .and_then(|idx| Some((*self.freq.get(idx)?, *self.phase_deg.get(idx)?)));
        let (frequency, phase) = crossover.ok_or(StabilityError::NoCrossover { cl_gain_db })?;
        Ok(PhaseMargin {
            degrees: 180.0 + phase,
            frequency,
        })
    }
}

/// An all-pole transfer function `num / den(s)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    num: f64,
    /// Denominator coefficients, highest power of `s` first.
    den: Vec<f64>,
}

impl TransferFunction {
    /// Builds the transfer function with poles at `poles` (in hertz) and DC gain `gain`.
    pub fn from_poles(poles: &[f64], gain: f64) -> Result<Self> {
        validate_poles(poles)?;
        if !(gain > 0.0 && gain.is_finite()) {
            return Err(StabilityError::InvalidGain(gain).into());
        }
        let omegas = poles.iter().map(|p| 2.0 * PI * p).collect::<Vec<_>>();
        let den = characteristic_polynomial(&omegas);
        let num = omegas.iter().product::<f64>() * gain;
        Ok(Self { num, den })
    }

    #[inline]
    pub fn numerator(&self) -> f64 {
        self.num
    }

    #[inline]
    pub fn denominator(&self) -> &[f64] {
        &self.den
    }

    /// Value of the transfer function at DC.
    pub fn dc_gain(&self) -> f64 {
        self.num / self.den.last().copied().unwrap_or(1.0)
    }

    /// Evaluates the transfer function at `s = j·2π·freq`.
    pub fn eval(&self, freq: f64) -> Complex64 {
        let s = Complex64::new(0.0, 2.0 * PI * freq);
        let den = self
            .den
            .iter()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c);
        Complex64::new(self.num, 0.0) / den
    }

    pub fn bode(&self, sweep: &FrequencySweep) -> Result<Bode> {
        sweep.validate()?;
        let freq = sweep.frequencies();
        let mut mag_db = Vec::with_capacity(freq.len());
        let mut phase_deg = Vec::with_capacity(freq.len());

        let mut prev: Option<(f64, f64)> = None;
        for &f in freq.iter() {
            let h = self.eval(f);
            mag_db.push(20.0 * h.norm().log10());
            let raw = h.arg().to_degrees();
            let unwrapped = match prev {
                None => raw,
                Some((prev_raw, prev_unwrapped)) => {
                    let mut delta = raw - prev_raw;
                    while delta > 180.0 {
                        delta -= 360.0;
                    }
                    while delta <= -180.0 {
                        delta += 360.0;
                    }
                    prev_unwrapped + delta
                }
            };
            phase_deg.push(unwrapped);
            prev = Some((raw, unwrapped));
        }

        Ok(Bode {
            freq,
            mag_db,
            phase_deg,
        })
    }
}

/// Coefficients of `(s + r1)(s + r2)...(s + rn)`, highest power first.
///
/// Coefficient `k` is the `k`-th elementary symmetric polynomial of the roots.
pub fn characteristic_polynomial(roots: &[f64]) -> Vec<f64> {
    let mut coeffs = vec![1.0];
    for &r in roots {
        let mut next = coeffs.clone();
        next.push(0.0);
        for (i, &c) in coeffs.iter().enumerate() {
            next[i + 1] += c * r;
        }
        coeffs = next;
    }
    coeffs
}

/// Phase margin of the all-pole model with poles `poles` (in hertz) and DC
/// gain `gain`, at closed-loop gain `cl_gain_db`.
pub fn phase_margin(poles: &[f64], gain: f64, cl_gain_db: f64) -> Result<PhaseMargin> {
    let tf = TransferFunction::from_poles(poles, gain)?;
    tf.bode(&FrequencySweep::spanning(poles)?)?
        .phase_margin(cl_gain_db)
}

fn validate_poles(poles: &[f64]) -> Result<()> {
    if poles.is_empty() {
        return Err(StabilityError::NoPoles.into());
    }
    if let Some(&p) = poles.iter().find(|&&p| !(p > 0.0 && p.is_finite())) {
        return Err(StabilityError::InvalidPole(p).into());
    }
    Ok(())
}
