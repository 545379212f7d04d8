//! ssiprobe CLI: run the anomaly catalog against the in-memory store.
//!
//! Exit status:
//! - `0`: every run passed
//! - `1`: a serializable run did not end with exactly one winner, or a
//!   final-state check failed
//! - `2`: configuration or harness error

mod cli;

use std::path::Path;
use std::process;

use clap::ArgMatches;
use ssiprobe::{catalog, Driver, DriverReport, MemoryStore, ProbeConfig, CONFIG_FILE_NAME};
use tracing_subscriber::EnvFilter;

use cli::build_cli;

fn main() {
    let matches = build_cli().get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if matches.get_flag("list") {
        for scenario in catalog::all() {
            println!("{:<14} {}", scenario.name(), scenario.description());
        }
        return;
    }

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let driver = match Driver::from_config(MemoryStore::new(), &config) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let report = match driver.run_catalog() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    if matches.get_flag("json") {
        print_json(&report);
    } else {
        print_summary(&report);
    }

    if !report.passed() {
        process::exit(1);
    }
}

/// Config file (explicit, or `./ssiprobe.toml` if present), then CLI overrides.
fn load_config(matches: &ArgMatches) -> Result<ProbeConfig, ssiprobe::Error> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ProbeConfig::from_file(Path::new(path))?,
        None if Path::new(CONFIG_FILE_NAME).exists() => {
            ProbeConfig::from_file(Path::new(CONFIG_FILE_NAME))?
        }
        None => ProbeConfig::default(),
    };

    if let Some(isolation) = matches.get_one::<String>("isolation") {
        config.isolation = isolation.clone();
    }
    if let Some(scenarios) = matches.get_many::<String>("scenario") {
        config.scenarios = scenarios.cloned().collect();
    }
    if let Some(repeat) = matches.get_one::<u32>("repeat") {
        config.repeat = *repeat;
    }
    if let Some(timeout) = matches.get_one::<u64>("barrier-timeout-ms") {
        config.barrier_timeout_ms = Some(*timeout);
    }

    config.validate()?;
    Ok(config)
}

fn print_json(report: &DriverReport) {
    for run in &report.runs {
        match serde_json::to_string(run) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("failed to serialize run {}: {}", run.report.run_id, e),
        }
    }
}

fn print_summary(report: &DriverReport) {
    for run in &report.runs {
        println!(
            "{:<14} {:<16} {:<22} Loser: {} | Winner: {}",
            run.report.scenario,
            run.report.isolation.as_str(),
            run.outcome.to_string(),
            run.report.loser,
            run.report.winner,
        );
        if let Some(check) = &run.check_error {
            println!("    final state check failed: {}", check);
        }
    }
    let failed = report.failures().count();
    println!(
        "{} run(s), {} passed, {} failed",
        report.runs.len(),
        report.runs.len() - failed,
        failed
    );
}
