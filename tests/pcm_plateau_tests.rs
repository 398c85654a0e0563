// Enthalpy-method plateau: while the hottest cells sit inside the latent
// band, the peak temperature holds at the melt onset until the per-cell
// latent capacity is exhausted, so dT/dt inside the band is strictly below
// the pre-band rate under the same power.

mod common;

use chamber_heat_rust::boundary::LatentBand;
use chamber_heat_rust::material::{MaterialKind, MaterialSpec};
use chamber_heat_rust::sim::Simulation;
use more_asserts::{assert_ge, assert_gt, assert_lt};

const MELT_LOW_K: f64 = 305.0;
const MELT_HIGH_K: f64 = 308.0;

fn pcm_config() -> chamber_heat_rust::config::RunConfig {
    let mut config = common::insulated_water(20, 1e-3, 4.0e-3, 0.1);
    config.material = MaterialSpec::Named(MaterialKind::ParaffinPcm);
    config.boundary.latent_band = Some(LatentBand {
        t_melt_low_k: MELT_LOW_K,
        t_melt_high_k: MELT_HIGH_K,
        latent_heat_j_per_kg: 2.0e5,
    });
    config.max_steps = 200;
    config.save_interval = 1;
    config
}

#[test]
fn peak_plateaus_at_melt_onset_until_latent_capacity_fills() {
    let mut sim = Simulation::new(pcm_config()).unwrap();
    let outcome = sim.run().unwrap();
    let history = &outcome.history;

    // Pre-band phase exists and rises
    let first_at_band = history
        .iter()
        .position(|s| (s.peak_k - MELT_LOW_K).abs() < 1e-6)
        .expect("peak never reached the melt onset");
    assert_gt!(first_at_band, 2);
    let pre_band_rate = (history[first_at_band - 1].peak_k - history[0].peak_k)
        / (first_at_band - 1) as f64;
    assert_gt!(pre_band_rate, 0.0);

    // Plateau phase: peak pinned at the onset for many consecutive steps
    let plateau_len = history[first_at_band..]
        .iter()
        .take_while(|s| (s.peak_k - MELT_LOW_K).abs() < 1e-6)
        .count();
    assert_ge!(plateau_len, 10);

    // In-band rate is strictly below the pre-band rate for identical power
    let plateau_rate = (history[first_at_band + plateau_len - 1].peak_k
        - history[first_at_band].peak_k)
        / plateau_len as f64;
    assert_lt!(plateau_rate, 0.1 * pre_band_rate);

    assert_gt!(outcome.latent_stored_j, 0.0);
}

#[test]
fn rise_resumes_after_the_band() {
    let mut config = pcm_config();
    // Enough steps and power to saturate the hottest cells' accumulators
    config.chambers[0].q_high_w = 0.5;
    config.chambers[0].q_low_w = 0.5;
    config.max_steps = 400;
    let mut sim = Simulation::new(config).unwrap();
    let outcome = sim.run().unwrap();

    assert_gt!(outcome.metric.peak_t_k, MELT_LOW_K + 0.5);
}
