//! Structured summaries of solved amplifiers.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::device::DeviceStatus;
use crate::log::{debug, info, Log};
use crate::stability::PhaseMargin;
use crate::topology::{Role, SmallSignalModel, TopologyKind};
use crate::units::Eng;

/// Sizing and bias of one resolved device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub role: Role,
    pub model: ArcStr,
    /// Width, in meters.
    pub width: f64,
    /// Length, in meters.
    pub length: f64,
    /// Drain current, in amperes.
    pub id: f64,
    /// The tabulated gm/ID actually selected, in 1/V.
    pub gm_id: f64,
    pub gm: f64,
    pub ro: f64,
    pub status: DeviceStatus,
}

/// Figures of merit of a solved amplifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characterization {
    pub kind: TopologyKind,
    /// Linear DC gain.
    pub gain: f64,
    pub gain_db: f64,
    /// Output resistance of the first stage, in ohms.
    pub rout: f64,
    /// Output resistance of the last stage, in ohms.
    pub output_rout: f64,
    /// Static power, in watts.
    pub power: f64,
    /// Poles, in hertz.
    pub poles: Vec<f64>,
    /// Zeros, in hertz.
    pub zeros: Vec<f64>,
    /// `None` if the phase margin could not be evaluated.
    pub phase_margin: Option<PhaseMargin>,
    pub devices: Vec<DeviceSummary>,
}

impl SmallSignalModel {
    /// Summarizes this amplifier, including its phase margin when one exists.
    pub fn characterize(&self) -> Characterization {
        let phase_margin = match self.phase_margin() {
            Ok(pm) => Some(pm),
            Err(err) => {
                debug!("no phase margin for {}: {}", self.kind(), err.source());
                None
            }
        };

        let devices = self
            .devices()
            .iter()
            .map(|(role, dev)| DeviceSummary {
                role,
                model: dev.params().model.clone(),
                width: dev.width(),
                length: dev.params().length,
                id: dev.id(),
                gm_id: dev.op().gm_id,
                gm: dev.gm(),
                ro: dev.ro(),
                status: dev.status(),
            })
            .collect();

        Characterization {
            kind: self.kind(),
            gain: self.gain(),
            gain_db: self.gain_db(),
            rout: self.rout(),
            output_rout: self.output_rout(),
            power: self.power(),
            poles: self.poles().to_vec(),
            zeros: self.zeros().to_vec(),
            phase_margin,
            devices,
        }
    }
}

impl Characterization {
    /// Devices that did not resolve to a tabulated operating point.
    pub fn unresolved(&self) -> impl Iterator<Item = &DeviceSummary> {
        self.devices
            .iter()
            .filter(|d| d.status != DeviceStatus::Resolved)
    }
}

impl Log for Characterization {
    fn log(&self) {
        info!("{}", self.kind);
        info!(
            "gain: {:.1} dB, first stage rout: {}, output rout: {}, power: {}",
            self.gain_db,
            Eng::new(self.rout, "Ohm"),
            Eng::new(self.output_rout, "Ohm"),
            Eng::new(self.power, "W"),
        );
        for (i, p) in self.poles.iter().enumerate() {
            info!("pole {}: {}", i + 1, Eng::new(*p, "Hz"));
        }
        for (i, z) in self.zeros.iter().enumerate() {
            info!("zero {}: {}", i + 1, Eng::new(*z, "Hz"));
        }
        match self.phase_margin {
            Some(pm) => info!(
                "phase margin: {:.1} deg at {}",
                pm.degrees,
                Eng::new(pm.frequency, "Hz")
            ),
            None => info!("phase margin: n/a"),
        }
        for d in self.devices.iter() {
            info!(
                "{} ({}): W = {}, L = {}, Id = {}, gm/ID = {}, status = {:?}",
                d.role,
                d.model,
                Eng::new(d.width, "m"),
                Eng::new(d.length, "m"),
                Eng::new(d.id, "A"),
                d.gm_id,
                d.status,
            );
        }
    }
}
