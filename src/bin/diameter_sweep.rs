// SIM-HT-CONJ: chamber-diameter sweep with full energy accounting.
//
// Usage: diameter_sweep [config.json] [results_dir]

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;

use chamber_heat_rust::config::RunConfig;
use chamber_heat_rust::errors::SimError;
use chamber_heat_rust::sim::{run_diameter_sweep, DiameterSweepConfig};

fn run() -> Result<(), SimError> {
    let args: Vec<String> = std::env::args().collect();
    let template = match args.get(1) {
        Some(path) => RunConfig::load_json(path)?,
        None => {
            let mut config = RunConfig::lab_default();
            // Slab-face film so larger chambers pay for their longer runs
            config.boundary.face_h_w_m2_k = 150.0;
            config
        }
    };
    let results_dir = args.get(2).map(String::as_str).unwrap_or("results");

    let sweep = DiameterSweepConfig {
        template,
        diameters_m: vec![4.0e-3, 8.0e-3, 12.0e-3],
        monotonic_tol: 0.02,
    };
    let outcome = run_diameter_sweep(&sweep)?;

    for run in &outcome.runs {
        match &run.outcome {
            Ok(result) => println!(
                "d={:>5.1} mm | eff_global={:.3} eff_local={:.3} | peak {:.1} K | stop {}",
                run.diameter_m * 1e3,
                result.metric.global_efficiency,
                result.metric.local_efficiency,
                result.metric.peak_t_k,
                result.stop_reason.as_str()
            ),
            Err(error) => println!(
                "d={:>5.1} mm | {}",
                run.diameter_m * 1e3,
                format!("failed: {}", error).red()
            ),
        }
    }
    for violation in &outcome.monotonic_violations {
        println!("{} {}", "⚠️".yellow(), violation);
    }

    let record = outcome.to_metrics_record("SIM-HT-CONJ", &sweep);
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
