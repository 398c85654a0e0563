// SIM-HT-MULTI: multi-chamber spacing sweep and overlap threshold.
//
// Usage: spacing_sweep [config.json] [results_dir]

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;

use chamber_heat_rust::config::RunConfig;
use chamber_heat_rust::errors::SimError;
use chamber_heat_rust::sim::{run_spacing_sweep, SpacingSweepConfig, SuperpositionMode};

fn run() -> Result<(), SimError> {
    let args: Vec<String> = std::env::args().collect();
    let template = match args.get(1) {
        Some(path) => RunConfig::load_json(path)?,
        None => {
            let mut config = RunConfig::lab_default();
            config.chambers[0].q_high_w = 5.0;
            config.chambers[0].q_low_w = 5.0;
            config.max_steps = 1500;
            config
        }
    };
    let results_dir = args.get(2).map(String::as_str).unwrap_or("results");

    let sweep = SpacingSweepConfig {
        template,
        pitches_pd: vec![1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        n_side: 3,
        mode: SuperpositionMode::CoupledFull,
    };
    let outcome = run_spacing_sweep(&sweep)?;

    println!(
        "isolated baseline rise: {}",
        format!("{:.2} K", outcome.isolated_peak_rise_k).cyan()
    );
    for result in &outcome.results {
        match &result.error {
            None => println!(
                "P/D={:.2} | eff/chamber {:.3} | gain {:.3} | penalty {:.3}",
                result.pd,
                result.efficiency_per_chamber,
                result.overlap_gain,
                result.overlap_penalty
            ),
            Some(error) => {
                println!("P/D={:.2} | {}", result.pd, format!("failed: {}", error).red())
            }
        }
    }
    match outcome.threshold_pd {
        Some(pd) => println!("{} P/D = {:.2}", "overlap threshold:".bold(), pd),
        None => println!("no pitch cleared the 5% overlap-gain threshold"),
    }

    let record = outcome.to_metrics_record("SIM-HT-MULTI", &sweep);
    let path = record.save(Path::new(results_dir))?;
    println!("{} {}", "saved".green(), path.display());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", "error:".red().bold(), error);
            ExitCode::FAILURE
        }
    }
}
