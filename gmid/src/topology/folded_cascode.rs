//! Full input-swing folded cascode with complementary input pairs,
//! optionally followed by a Miller-compensated common-source stage.

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
pub struct FoldedCascode {
    pub input_nmos: DeviceParams,
    pub input_pmos: DeviceParams,
    pub nmos_mirror: DeviceParams,
    pub nmos_cascode: DeviceParams,
    pub pmos_source: DeviceParams,
    pub pmos_cascode: DeviceParams,
    /// Models the pole-zero doublet of the NMOS mirror node by adding a
    /// zero at twice the mirror pole.
    pub mirror_zero: bool,
}

impl FoldedCascode {
    #[inline]
    pub fn builder() -> FoldedCascodeBuilder {
        FoldedCascodeBuilder::default()
    }

    fn first_stage_roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)> {
        let id = bias.itail / 2.0;
        vec![
            (Role::InputNmos, self.input_nmos.with_id(id)),
            (Role::InputPmos, self.input_pmos.with_id(id)),
            (Role::NmosMirror, self.nmos_mirror.with_id(id)),
            (Role::NmosCascode, self.nmos_cascode.with_id(id)),
            (Role::PmosSource, self.pmos_source.with_id(id)),
            (Role::PmosCascode, self.pmos_cascode.with_id(id)),
        ]
    }

    /// The folded first stage. Only the weaker input pair is relied on for gm.
    fn first_stage(&self, devices: &Devices) -> Stage {
        let gm = devices[Role::InputNmos]
            .gm()
            .min(devices[Role::InputPmos].gm());

        let nmos = {
            let (m, c) = (&devices[Role::NmosMirror], &devices[Role::NmosCascode]);
            cascode(m.ro(), c.ro(), c.gm())
        };
        let pmos = {
            let (s, c) = (&devices[Role::PmosSource], &devices[Role::PmosCascode]);
            cascode(s.ro(), c.ro(), c.gm())
        };

        Stage {
            gm,
            rout: parallel(&[nmos, pmos]),
        }
    }

    fn mirror_pole(&self, devices: &Devices) -> f64 {
        internal_pole(&devices[Role::NmosMirror], MIRROR_NODE_GATES)
    }

    fn zeros(&self, devices: &Devices) -> Vec<f64> {
        if self.mirror_zero {
            vec![2.0 * self.mirror_pole(devices)]
        } else {
            Vec::new()
        }
    }
}

impl TopologyEngine for FoldedCascode {
    fn kind(&self) -> TopologyKind {
        TopologyKind::FoldedCascode1Stage
    }

    fn roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)> {
        self.first_stage_roster(bias)
    }

    fn supply_current(&self, bias: &Bias) -> f64 {
        bias.itail
    }

    fn compose(&self, bias: &Bias, devices: &Devices) -> Composition {
        let stage = self.first_stage(devices);
        Composition {
            poles: vec![rc_pole(stage.rout, bias.cl), self.mirror_pole(devices)],
            zeros: self.zeros(devices),
            stages: vec![stage],
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct FoldedCascodeTwoStage {
    pub first_stage: FoldedCascode,
    /// Common-source amplifying device of the second stage.
    pub output_nmos: DeviceParams,
    /// Current source load of the second stage.
    pub output_pmos: DeviceParams,
}

impl FoldedCascodeTwoStage {
    #[inline]
    pub fn builder() -> FoldedCascodeTwoStageBuilder {
        FoldedCascodeTwoStageBuilder::default()
    }
}

impl TopologyEngine for FoldedCascodeTwoStage {
    fn kind(&self) -> TopologyKind {
        TopologyKind::FoldedCascode2Stage
    }

    fn roster(&self, bias: &Bias) -> Vec<(Role, DeviceParams)> {
        let mut roster = self.first_stage.first_stage_roster(bias);
        roster.push((Role::OutputNmos, self.output_nmos.with_id(bias.iout)));
        roster.push((Role::OutputPmos, self.output_pmos.with_id(bias.iout)));
        roster
    }

    fn supply_current(&self, bias: &Bias) -> f64 {
        bias.itail + bias.iout
    }

    fn compose(&self, bias: &Bias, devices: &Devices) -> Composition {
        let first = self.first_stage.first_stage(devices);
        let (n, p) = (&devices[Role::OutputNmos], &devices[Role::OutputPmos]);
        let second = Stage {
            gm: n.gm(),
            rout: parallel(&[n.ro(), p.ro()]),
        };

        // Cc is Miller-multiplied by the second stage onto the first stage output
        let dominant = rc_pole(first.rout, bias.cc * (1.0 + second.gain()));
        let output = gm_pole(second.gm, bias.cl);

        Composition {
            poles: vec![
                dominant,
                output,
                self.first_stage.mirror_pole(devices),
                internal_pole(&devices[Role::NmosCascode], CASCODE_NODE_GATES),
            ],
            zeros: self.first_stage.zeros(devices),
            stages: vec![first, second],
        }
    }
}
