#![allow(dead_code)]

use gmid::device::DeviceParams;
use gmid::store::{CharDb, ModelTable, Sweep};

/// Gate lengths of the fixture grid, in meters.
pub const LENGTHS: [f64; 5] = [1e-6, 2e-6, 5e-6, 6e-6, 10e-6];
/// Drain-source voltages of the fixture grid, in volts.
pub const VDS: [f64; 3] = [0.3, 0.5, 0.6];
/// Number of bias points per sweep.
pub const POINTS: usize = 12;

/// gm/ID of bias point `i`: 28, 26, ..., 6.
pub fn gm_id(i: usize) -> f64 {
    28. - 2. * i as f64
}

/// gm·ro of bias point `i` at grid point (`l`, `v`) of a model with intrinsic
/// gain scaled by `scale`.
pub fn gm_ro(i: usize, l: usize, v: usize, scale: f64) -> f64 {
    scale * (10. + 4. * i as f64) * (LENGTHS[l] * 1e6) * (v + 1) as f64 / 4.
}

/// Transit frequency of bias point `i` at gate length index `l`.
pub fn ft(i: usize, l: usize, scale: f64) -> f64 {
    let l_um = LENGTHS[l] * 1e6;
    scale * 1e9 * (i + 1) as f64 / (l_um * l_um)
}

/// Current density of bias point `i` at gate length index `l`.
pub fn id_w(i: usize, l: usize, scale: f64) -> f64 {
    scale * (i + 1) as f64 / (LENGTHS[l] * 1e6)
}

fn table(gain_scale: f64, speed_scale: f64) -> ModelTable {
    let sweeps = (0..LENGTHS.len())
        .map(|l| {
            (0..VDS.len())
                .map(|v| Sweep {
                    gm_id: (0..POINTS).map(gm_id).collect(),
                    gm_ro: (0..POINTS).map(|i| gm_ro(i, l, v, gain_scale)).collect(),
                    ft: (0..POINTS).map(|i| ft(i, l, speed_scale)).collect(),
                    id_w: (0..POINTS).map(|i| id_w(i, l, speed_scale)).collect(),
                })
                .collect()
        })
        .collect();
    ModelTable::new(LENGTHS.to_vec(), VDS.to_vec(), sweeps).unwrap()
}

/// A store with NMOS and PMOS models in a core and a 2.5 V flavor.
pub fn char_db() -> CharDb {
    let mut db = CharDb::new();
    db.add_model("nch", table(1.0, 1.0));
    db.add_model("pch", table(0.8, 0.4));
    db.add_model("nch_25", table(1.5, 0.5));
    db.add_model("pch_25", table(1.2, 0.2));
    db
}

pub fn device(model: &str, gm_id: f64, length: f64, vds: f64) -> DeviceParams {
    DeviceParams::builder()
        .model(model)
        .gm_id(gm_id)
        .length(length)
        .vds(vds)
        .build()
        .unwrap()
}
