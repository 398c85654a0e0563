// SIM-EN-MC: Monte Carlo daily energy balance with correlation comparison.
//
// Usage: energy_balance_mc [config.json] [results_dir]

use std::path::Path;
use std::process::ExitCode;

use colored::Colorize;

use chamber_heat_rust::energy_balance::{
    CopulaSpec, EnergyBalanceConfig, EnergyBalanceSampler, EnergyBalanceStats,
};
use chamber_heat_rust::errors::SimError;

fn print_stats(label: &str, stats: &EnergyBalanceStats) {
    println!(
        "{:<12} P5 {:>8.1} | P50 {:>8.1} | P95 {:>8.1} Wh | mean {:>8.1} | failures {}",
        label,
        stats.p5_wh,
        stats.p50_wh,
        stats.p95_wh,
        stats.mean_wh,
        format!("{:.4}", stats.failure_probability).yellow()
    );
}

fn load_config(path: &str) -> Result<EnergyBalanceConfig, SimError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SimError::InvalidConfiguration(format!("failed to read {}: {}", path, e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| SimError::InvalidConfiguration(format!("failed to parse config: {}", e)))
}

fn run() -> Result<(), SimError> {
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => load_config(path)?,
        None => EnergyBalanceConfig {
            copula: CopulaSpec::adverse(0.6),
            ..EnergyBalanceConfig::default()
        },
    };
    let results_dir = args.get(2).map(String::as_str).unwrap_or("results");

    let sampler = EnergyBalanceSampler::new(config)?;
    let comparison = sampler.compare_with_independent()?;
    print_stats("independent", &comparison.independent);
    print_stats("correlated", &comparison.correlated);
    println!(
        "{} {:+.4}",
        "failure probability delta:".bold(),
        comparison.failure_delta
    );

    let mut record = sampler.to_metrics_record(&comparison.correlated, "SIM-EN-MC");
    record.insert(
        "failure_probability_independent",
        comparison.independent.failure_probability,
    );
    record.insert("failure_delta", comparison.failure_delta);
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
