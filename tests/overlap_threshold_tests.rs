// Multi-chamber thermal overlap as a function of pitch-to-diameter ratio.
//
// A 3x3 array of 4 mm chambers in an insulated water slab: at tight pitch
// neighboring plumes merge and the mean peak rise exceeds the isolated
// baseline; past P/D ~ 2.5 the chambers are thermally independent within a
// few percent over the run horizon.

mod common;

use chamber_heat_rust::sim::{
    run_spacing_sweep, SpacingSweepConfig, SuperpositionMode,
};
use more_asserts::{assert_gt, assert_lt};

fn sweep_config(mode: SuperpositionMode) -> SpacingSweepConfig {
    let mut template = common::insulated_water(80, 1e-3, 4.0e-3, 5.0);
    template.max_steps = 40;
    SpacingSweepConfig {
        template,
        pitches_pd: vec![1.5, 2.0, 2.5, 3.0],
        n_side: 3,
        mode,
    }
}

#[test]
fn overlap_gain_decreases_with_pitch_and_crosses_the_threshold() {
    let outcome = run_spacing_sweep(&sweep_config(SuperpositionMode::CoupledFull)).unwrap();

    assert_gt!(outcome.isolated_peak_rise_k, 0.0);
    let gains: Vec<f64> = outcome.results.iter().map(|r| r.overlap_gain).collect();
    assert_eq!(gains.len(), 4);
    for pair in gains.windows(2) {
        assert_gt!(pair[0], pair[1]);
    }

    // Tight pitches interact, wide ones do not
    assert_gt!(gains[1], 0.05, "P/D = 2.0 should still overlap");
    assert_lt!(gains[3], 0.05, "P/D = 3.0 should be independent");
    assert_eq!(outcome.threshold_pd, Some(2.0));
}

#[test]
fn linear_superposition_tracks_the_coupled_run_far_from_edges() {
    let coupled = run_spacing_sweep(&sweep_config(SuperpositionMode::CoupledFull)).unwrap();
    let linear =
        run_spacing_sweep(&sweep_config(SuperpositionMode::LinearSuperposition)).unwrap();

    // Same isolated baseline, same threshold decision
    assert_eq!(coupled.threshold_pd, linear.threshold_pd);

    // Constant-coefficient diffusion is linear, so the approximation should
    // agree closely away from the boundary
    for (c, l) in coupled.results.iter().zip(linear.results.iter()) {
        let denom = c.mean_peak_rise_k.max(1e-9);
        let rel = (c.mean_peak_rise_k - l.mean_peak_rise_k).abs() / denom;
        assert_lt!(rel, 0.10, "pitch P/D = {} diverged", c.pd);
    }
}

#[test]
fn sweep_requires_a_single_template_chamber() {
    let mut config = sweep_config(SuperpositionMode::CoupledFull);
    let extra = config.template.chambers[0].clone();
    config.template.chambers.push(extra);
    assert!(run_spacing_sweep(&config).is_err());
}
