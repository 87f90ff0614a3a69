//! Amplifier topologies composed from gm/ID device models.
//!
//! A topology owns a fixed roster of devices, each tagged with a [`Role`].
//! [`solve`] assigns drain currents from the [`Bias`], resolves every device
//! against a characterization store and composes the results into stage
//! gains, output resistances, poles and zeros. Frequencies are in hertz and
//! gains are linear ratios.

use std::f64::consts::PI;
use std::fmt::Display;
use std::ops::Index;

use derive_builder::Builder;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::device::{self, DeviceParams, LookupMode, SmallSignal};
use crate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use crate::log::debug;
use crate::stability::{self, PhaseMargin};
use crate::store::CharStore;

pub mod folded_cascode;
pub mod ota;
pub mod two_stage;

pub use folded_cascode::{FoldedCascode, FoldedCascodeTwoStage};
pub use ota::ThreeMirrorOta;
pub use two_stage::TwoStageMiller;

/// Gate capacitances loading a diode-connected mirror node.
pub(crate) const MIRROR_NODE_GATES: f64 = 2.0;
/// Gate capacitances loading a cascode source node.
pub(crate) const CASCODE_NODE_GATES: f64 = 1.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    FoldedCascode1Stage,
    FoldedCascode2Stage,
    ThreeMirrorOta,
    TwoStageMiller,
}

impl Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::FoldedCascode1Stage => write!(f, "single-stage folded cascode"),
            Self::FoldedCascode2Stage => write!(f, "two-stage folded cascode"),
            Self::ThreeMirrorOta => write!(f, "three-current-mirror OTA"),
            Self::TwoStageMiller => write!(f, "two-stage Miller amplifier"),
        }
    }
}

/// The position a device occupies in a topology.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Single-polarity input pair device.
    Input,
    InputNmos,
    InputPmos,
    NmosMirror,
    NmosCascode,
    PmosMirror,
    PmosCascode,
    /// PMOS current source of a folded cascode.
    PmosSource,
    OutputNmos,
    OutputPmos,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match *self {
            Self::Input => "input",
            Self::InputNmos => "NMOS input",
            Self::InputPmos => "PMOS input",
            Self::NmosMirror => "NMOS mirror",
            Self::NmosCascode => "NMOS cascode",
            Self::PmosMirror => "PMOS mirror",
            Self::PmosCascode => "PMOS cascode",
            Self::PmosSource => "PMOS current source",
            Self::OutputNmos => "NMOS output",
            Self::OutputPmos => "PMOS output",
        };
        write!(f, "{s}")
    }
}

/// Topology-level bias values, in SI units.
#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct Bias {
    /// Tail current of the input pair.
    pub itail: f64,
    /// Output stage current.
    pub iout: f64,
    /// Load capacitance.
    pub cl: f64,
    /// Miller compensation capacitance.
    pub cc: f64,
    /// Closed-loop gain at which phase margin is evaluated, in dB.
    pub cl_gain_db: f64,
    /// Supply voltage.
    pub vdd: f64,
}

impl Bias {
    #[inline]
    pub fn builder() -> BiasBuilder {
        BiasBuilder::default()
    }

    /// Checks that every value is finite and that currents, capacitances
    /// and the supply are not negative.
    pub fn validate(&self) -> Result<()> {
        if !self.cl_gain_db.is_finite() {
            return Err(ErrorSource::InvalidConfig(format!(
                "closed-loop gain must be finite, found {}",
                self.cl_gain_db
            ))
            .into());
        }
        for (name, value) in [
            ("itail", self.itail),
            ("iout", self.iout),
            ("cl", self.cl),
            ("cc", self.cc),
            ("vdd", self.vdd),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ErrorSource::InvalidConfig(format!(
                    "{name} must be finite and non-negative, found {value}"
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Small-signal summary of one gain stage.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Effective transconductance, in siemens.
    pub gm: f64,
    /// Output resistance, in ohms.
    pub rout: f64,
}

impl Stage {
    #[inline]
    pub fn gain(&self) -> f64 {
        self.gm * self.rout
    }
}

/// The result of composing resolved devices.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub stages: Vec<Stage>,
    pub poles: Vec<f64>,
    pub zeros: Vec<f64>,
}

/// Resolved devices of a topology, in roster order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    entries: Vec<(Role, SmallSignal)>,
}

impl Devices {
    pub fn get(&self, role: Role) -> Option<&SmallSignal> {
        self.entries.iter().find(|(r, _)| *r == role).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &SmallSignal)> + '_ {
        self.entries.iter().map(|(r, d)| (*r, d))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Role, SmallSignal)> for Devices {
    fn from_iter<T: IntoIterator<Item = (Role, SmallSignal)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Index<Role> for Devices {
    type Output = SmallSignal;

    /// # Panics
    ///
    /// Panics if no device has the given role.
    fn index(&self, role: Role) -> &Self::Output {
        self.get(role)
            .unwrap_or_else(|| panic!("no {role} device in roster"))
    }
}

/// Behavior shared by all amplifier topologies.
#[enum_dispatch]
pub trait TopologyEngine {
    fn kind(&self) -> TopologyKind;

    /// Checks topology parameters that are not part of any device.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// The device roster with drain currents assigned from `bias`.
    fn roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)>;

    /// Total current drawn from the supply, in amperes.
    fn supply_current(&self, bias: &Bias) -> f64;

    /// Combines resolved devices into stages, poles and zeros.
    ///
    /// `devices` contains exactly the roles returned by [`TopologyEngine::roster`].
    fn compose(&self, bias: &Bias, devices: &Devices) -> Composition;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[enum_dispatch(TopologyEngine)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    FoldedCascode(FoldedCascode),
    FoldedCascodeTwoStage(FoldedCascodeTwoStage),
    ThreeMirrorOta(ThreeMirrorOta),
    TwoStageMiller(TwoStageMiller),
}

/// Everything needed to size an amplifier.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct AmplifierConfig {
    #[builder(setter(into))]
    pub topology: Topology,
    #[builder(default)]
    #[serde(default)]
    pub bias: Bias,
    #[builder(default)]
    #[serde(default)]
    pub lookup: LookupMode,
}

impl AmplifierConfig {
    #[inline]
    pub fn builder() -> AmplifierConfigBuilder {
        AmplifierConfigBuilder::default()
    }

    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        with_err_context(toml::from_str(s), || ErrorContext::ParseConfig)
    }

    #[inline]
    pub fn kind(&self) -> TopologyKind {
        self.topology.kind()
    }

    #[inline]
    pub fn solve(&self, store: &dyn CharStore) -> Result<SmallSignalModel> {
        solve(self, store)
    }
}

/// Per-device dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSize {
    pub role: Role,
    /// Width, in meters.
    pub width: f64,
    /// Length, in meters.
    pub length: f64,
}

/// A solved amplifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallSignalModel {
    kind: TopologyKind,
    bias: Bias,
    supply_current: f64,
    devices: Devices,
    composition: Composition,
}

impl SmallSignalModel {
    #[inline]
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    #[inline]
    pub fn bias(&self) -> &Bias {
        &self.bias
    }

    #[inline]
    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    #[inline]
    pub fn device(&self, role: Role) -> Option<&SmallSignal> {
        self.devices.get(role)
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.composition.stages
    }

    /// Transconductance of the first stage, in siemens.
    pub fn gm(&self) -> f64 {
        self.stages().first().map(|s| s.gm).unwrap_or_default()
    }

    /// Total gain as a linear ratio: the product of all stage gains.
    pub fn gain(&self) -> f64 {
        self.stages().iter().map(Stage::gain).product()
    }

    #[inline]
    pub fn gain_db(&self) -> f64 {
        20.0 * self.gain().log10()
    }

    /// Output resistance of the first stage, the node that sets the dominant pole.
    pub fn rout(&self) -> f64 {
        self.stages().first().map(|s| s.rout).unwrap_or_default()
    }

    /// Output resistance of the last stage.
    pub fn output_rout(&self) -> f64 {
        self.stages().last().map(|s| s.rout).unwrap_or_default()
    }

    /// Poles, in hertz, in the order the topology defines them.
    #[inline]
    pub fn poles(&self) -> &[f64] {
        &self.composition.poles
    }

    /// Zeros, in hertz.
    #[inline]
    pub fn zeros(&self) -> &[f64] {
        &self.composition.zeros
    }

    #[inline]
    pub fn supply_current(&self) -> f64 {
        self.supply_current
    }

    /// Static power, in watts.
    #[inline]
    pub fn power(&self) -> f64 {
        self.bias.vdd * self.supply_current
    }

    pub fn sizes(&self) -> Vec<DeviceSize> {
        self.devices
            .iter()
            .map(|(role, d)| DeviceSize {
                role,
                width: d.width(),
                length: d.params().length,
            })
            .collect()
    }

    /// Phase margin at the bias's closed-loop gain.
    pub fn phase_margin(&self) -> Result<PhaseMargin> {
        stability::phase_margin(self.poles(), self.gain(), self.bias.cl_gain_db)
    }
}

/// Assigns currents, resolves every device and composes the amplifier.
pub fn solve(config: &AmplifierConfig, store: &dyn CharStore) -> Result<SmallSignalModel> {
    let topology = &config.topology;
    let bias = &config.bias;
    bias.validate()?;
    topology.validate()?;

    let devices = topology
        .roster(bias)
        .into_iter()
        .map(|(role, params)| -> Result<(Role, SmallSignal)> {
            let dev = with_err_context(device::solve(&params, store, config.lookup), || {
                ErrorContext::ResolveDevice {
                    role: role.to_string().into(),
                    model: params.model.clone(),
                }
            })?;
            Ok((role, dev))
        })
        .collect::<Result<Devices>>()?;

    let composition = topology.compose(bias, &devices);
    debug!(
        "composed {}: stages = {:?}, poles = {:?}, zeros = {:?}",
        topology.kind(),
        composition.stages,
        composition.poles,
        composition.zeros
    );

    Ok(SmallSignalModel {
        kind: topology.kind(),
        bias: bias.clone(),
        supply_current: topology.supply_current(bias),
        devices,
        composition,
    })
}

fn div_or_zero(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Pole of a node with resistance `r` and capacitance `c`.
pub(crate) fn rc_pole(r: f64, c: f64) -> f64 {
    div_or_zero(1.0, 2.0 * PI * r * c)
}

/// Pole of a node driven by transconductance `gm` into capacitance `c`.
pub(crate) fn gm_pole(gm: f64, c: f64) -> f64 {
    div_or_zero(gm, 2.0 * PI * c)
}

/// Pole of an internal node set by `dev` and loaded by `gates` gate-source capacitances of it.
pub(crate) fn internal_pole(dev: &SmallSignal, gates: f64) -> f64 {
    gm_pole(dev.gm(), gates * dev.cgs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_poles_are_zero() {
        assert_eq!(rc_pole(0.0, 1e-12), 0.0);
        assert_eq!(gm_pole(1e-3, 0.0), 0.0);
        assert_eq!(internal_pole(&SmallSignal::default(), MIRROR_NODE_GATES), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_missing_role_panics() {
        let devices = Devices::default();
        let _ = &devices[Role::Input];
    }
}
