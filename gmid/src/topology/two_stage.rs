//! Two-stage Miller-compensated amplifier with a PMOS input pair.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::{
    gm_pole, internal_pole, rc_pole, Bias, Composition, Devices, Role, Stage, TopologyEngine,
    TopologyKind, CASCODE_NODE_GATES, MIRROR_NODE_GATES,
};
use crate::device::DeviceParams;
use crate::impedance::{cascode, parallel};

#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct TwoStageMiller {
    pub input: DeviceParams,
    pub nmos_mirror: DeviceParams,
    /// Cascode device of the first-stage mirror, if any.
    #[builder(setter(strip_option))]
    pub nmos_cascode: Option<DeviceParams>,
    pub output_nmos: DeviceParams,
    pub output_pmos: DeviceParams,
}

impl TwoStageMiller {
    #[inline]
    pub fn builder() -> TwoStageMillerBuilder {
        TwoStageMillerBuilder::default()
    }

    #[inline]
    pub fn is_cascoded(&self) -> bool {
        self.nmos_cascode.is_some()
    }
}

impl TopologyEngine for TwoStageMiller {
    fn kind(&self) -> TopologyKind {
        TopologyKind::TwoStageMiller
    }

    fn roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)> {
        let id = bias.itail / 2.0;
        let mut roster = vec![
            (Role::Input, self.input.with_id(id)),
            (Role::NmosMirror, self.nmos_mirror.with_id(id)),
        ];
        if let Some(ref cas) = self.nmos_cascode {
            roster.push((Role::NmosCascode, cas.with_id(id)));
        }
        roster.push((Role::OutputNmos, self.output_nmos.with_id(bias.iout)));
        roster.push((Role::OutputPmos, self.output_pmos.with_id(bias.iout)));
        roster
    }

    fn supply_current(&self, bias: &Bias) -> f64 {
        bias.itail + bias.iout
    }

    fn compose(&self, bias: &Bias, devices: &Devices) -> Composition {
        let input = &devices[Role::Input];
        let mirror = &devices[Role::NmosMirror];
        let cas = devices.get(Role::NmosCascode).filter(|_| self.is_cascoded());
        let (n, p) = (&devices[Role::OutputNmos], &devices[Role::OutputPmos]);

        let r_mirror = match cas {
            Some(c) => cascode(mirror.ro(), c.ro(), c.gm()),
            None => mirror.ro(),
        };
        let first = Stage {
            gm: input.gm(),
            rout: parallel(&[input.ro(), r_mirror]),
        };
        let second = Stage {
            gm: n.gm(),
            rout: parallel(&[n.ro(), p.ro()]),
        };

        let dominant = rc_pole(first.rout, bias.cc * (1.0 + second.gain()));
        let poles = match cas {
            // the high-impedance first stage leaves the output node set by gm2
            Some(c) => vec![
                dominant,
                gm_pole(second.gm, bias.cl + n.cgg()),
                internal_pole(mirror, MIRROR_NODE_GATES),
                internal_pole(c, CASCODE_NODE_GATES),
            ],
            None => vec![
                dominant,
                rc_pole(second.rout, bias.cl),
                internal_pole(mirror, MIRROR_NODE_GATES),
            ],
        };

        Composition {
            stages: vec![first, second],
            poles,
            zeros: Vec::new(),
        }
    }
}
