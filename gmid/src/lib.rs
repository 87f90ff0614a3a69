//! gm/ID based sizing of CMOS amplifiers.
//!
//! Devices are resolved against tabulated transistor characterization data
//! and composed into closed-form gain, pole and stability estimates for
//! several standard amplifier topologies.

pub mod characterize;
pub mod device;
pub mod error;
pub mod impedance;
pub mod log;
pub mod stability;
pub mod store;
pub mod topology;
pub mod units;
