use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Default, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum SiPrefix {
    Atto,
    Femto,
    Pico,
    Nano,
    Micro,
    Milli,
    #[default]
    None,
    Kilo,
    Mega,
    Giga,
    Tera,
}

impl SiPrefix {
    const ALL: [SiPrefix; 11] = [
        SiPrefix::Atto,
        SiPrefix::Femto,
        SiPrefix::Pico,
        SiPrefix::Nano,
        SiPrefix::Micro,
        SiPrefix::Milli,
        SiPrefix::None,
        SiPrefix::Kilo,
        SiPrefix::Mega,
        SiPrefix::Giga,
        SiPrefix::Tera,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            SiPrefix::Atto => 1e-18,
            SiPrefix::Femto => 1e-15,
            SiPrefix::Pico => 1e-12,
            SiPrefix::Nano => 1e-9,
            SiPrefix::Micro => 1e-6,
            SiPrefix::Milli => 1e-3,
            SiPrefix::None => 1e0,
            SiPrefix::Kilo => 1e3,
            SiPrefix::Mega => 1e6,
            SiPrefix::Giga => 1e9,
            SiPrefix::Tera => 1e12,
        }
    }

    /// Returns the largest prefix whose multiplier does not exceed `|value|`.
    ///
    /// Zero and non-finite values use [`SiPrefix::None`]. Values outside the
    /// supported range clamp to [`SiPrefix::Atto`] or [`SiPrefix::Tera`].
    pub fn for_value(value: f64) -> Self {
        let mag = value.abs();
        if mag == 0.0 || !mag.is_finite() {
            return SiPrefix::None;
        }
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|p| mag >= p.multiplier())
            .unwrap_or(SiPrefix::Atto)
    }
}

impl Display for SiPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match *self {
            Self::Atto => "a",
            Self::Femto => "f",
            Self::Pico => "p",
            Self::Nano => "n",
            Self::Micro => "u",
            Self::Milli => "m",
            Self::None => "",
            Self::Kilo => "k",
            Self::Mega => "M",
            Self::Giga => "G",
            Self::Tera => "T",
        };
        write!(f, "{s}")
    }
}

/// A value displayed in engineering notation with a unit, eg. `12.5uA`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Eng<'a> {
    pub value: f64,
    pub unit: &'a str,
}

impl<'a> Eng<'a> {
    #[inline]
    pub fn new(value: f64, unit: &'a str) -> Self {
        Self { value, unit }
    }
}

impl Display for Eng<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = SiPrefix::for_value(self.value);
        let scaled = self.value / prefix.multiplier();
        let precision = f.precision().unwrap_or(3);
        write!(f, "{scaled:.precision$}{prefix}{}", self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_for_value() {
        assert_eq!(SiPrefix::for_value(4.4e-6), SiPrefix::Micro);
        assert_eq!(SiPrefix::for_value(-2.0e3), SiPrefix::Kilo);
        assert_eq!(SiPrefix::for_value(0.5), SiPrefix::Milli);
        assert_eq!(SiPrefix::for_value(0.0), SiPrefix::None);
        assert_eq!(SiPrefix::for_value(1e-21), SiPrefix::Atto);
        assert_eq!(SiPrefix::for_value(f64::INFINITY), SiPrefix::None);
    }

    #[test]
    fn test_eng_display() {
        assert_eq!(format!("{}", Eng::new(600e-15, "F")), "600.000fF");
        assert_eq!(format!("{:.1}", Eng::new(1.26e6, "Hz")), "1.3MHz");
        assert_eq!(format!("{:.0}", Eng::new(3.3e5, "Ohm")), "330kOhm");
    }
}
