//! Three-current-mirror OTA with a PMOS input pair and cascoded output mirrors.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::{
    internal_pole, rc_pole, Bias, Composition, Devices, Role, Stage, TopologyEngine, TopologyKind,
};
use crate::device::DeviceParams;
use crate::error::{ErrorSource, Result};
use crate::impedance::{cascode, parallel};

/// Gate capacitances loading each mirror node of the OTA.
const OTA_NODE_GATES: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct ThreeMirrorOta {
    pub input: DeviceParams,
    pub nmos_mirror: DeviceParams,
    pub nmos_cascode: DeviceParams,
    pub pmos_mirror: DeviceParams,
    pub pmos_cascode: DeviceParams,
    /// Current gain B of the output mirrors.
    pub mirror_ratio: f64,
}

impl Default for ThreeMirrorOta {
    fn default() -> Self {
        Self {
            input: DeviceParams::default(),
            nmos_mirror: DeviceParams::default(),
            nmos_cascode: DeviceParams::default(),
            pmos_mirror: DeviceParams::default(),
            pmos_cascode: DeviceParams::default(),
            mirror_ratio: 1.0,
        }
    }
}

impl ThreeMirrorOta {
    #[inline]
    pub fn builder() -> ThreeMirrorOtaBuilder {
        ThreeMirrorOtaBuilder::default()
    }
}

impl TopologyEngine for ThreeMirrorOta {
    fn kind(&self) -> TopologyKind {
        TopologyKind::ThreeMirrorOta
    }

    fn validate(&self) -> Result<()> {
        if !(self.mirror_ratio.is_finite() && self.mirror_ratio > 0.0) {
            return Err(ErrorSource::InvalidConfig(format!(
                "mirror ratio must be finite and positive, found {}",
                self.mirror_ratio
            ))
            .into());
        }
        Ok(())
    }

    fn roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)> {
        let id_in = bias.itail / 2.0;
        let id_out = self.mirror_ratio * id_in;
        vec![
            (Role::Input, self.input.with_id(id_in)),
            (Role::NmosMirror, self.nmos_mirror.with_id(id_out)),
            (Role::NmosCascode, self.nmos_cascode.with_id(id_out)),
            (Role::PmosMirror, self.pmos_mirror.with_id(id_out)),
            (Role::PmosCascode, self.pmos_cascode.with_id(id_out)),
        ]
    }

    fn supply_current(&self, bias: &Bias) -> f64 {
        bias.itail * (1.0 + self.mirror_ratio)
    }

    fn compose(&self, bias: &Bias, devices: &Devices) -> Composition {
        let (nm, nc) = (&devices[Role::NmosMirror], &devices[Role::NmosCascode]);
        let (pm, pc) = (&devices[Role::PmosMirror], &devices[Role::PmosCascode]);

        let stage = Stage {
            gm: self.mirror_ratio * devices[Role::Input].gm(),
            rout: parallel(&[
                cascode(nm.ro(), nc.ro(), nc.gm()),
                cascode(pm.ro(), pc.ro(), pc.gm()),
            ]),
        };

        Composition {
            poles: vec![
                rc_pole(stage.rout, bias.cl),
                internal_pole(nm, OTA_NODE_GATES),
                internal_pole(nc, OTA_NODE_GATES),
                internal_pole(pm, OTA_NODE_GATES),
            ],
            zeros: Vec::new(),
            stages: vec![stage],
        }
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_mirror_ratio_defaults_to_unity() {
        assert_eq!(ThreeMirrorOta::default().mirror_ratio, 1.0);
        assert_eq!(ThreeMirrorOta::builder().build().unwrap().mirror_ratio, 1.0);
    }

    #[test]
    fn test_roster_currents() {
        let ota = ThreeMirrorOta::builder().mirror_ratio(3.0).build().unwrap();
        let bias = Bias::builder().itail(20e-6).build().unwrap();

        let roster = ota.roster(&bias);
        assert_eq!(roster.len(), 5);
        for (role, params) in roster {
            let expected = if role == Role::Input { 10e-6 } else { 30e-6 };
            assert_float_eq!(params.id, expected, r2nd <= 1e-12, "{}", role);
        }
        assert_eq!(ota.supply_current(&bias), 80e-6);
    }

    #[test]
    fn test_mirror_ratio_must_be_positive() {
        assert!(ThreeMirrorOta::default().validate().is_ok());
        for ratio in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let ota = ThreeMirrorOta::builder().mirror_ratio(ratio).build().unwrap();
            let err = ota.validate().unwrap_err();
            assert!(matches!(err.source(), ErrorSource::InvalidConfig(_)));
        }
    }
}
