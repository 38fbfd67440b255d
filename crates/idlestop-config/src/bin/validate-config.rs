//! Config validation CLI tool
//!
//! Validates an idlestop configuration file and reports any errors.

use idlestop_api::{EmptyDirPolicy, MalformedMarkerPolicy};
use idlestop_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) if path == "-h" || path == "--help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Some(path) => PathBuf::from(path),
        None => default_config_path(),
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        eprintln!();
        print_usage();
        return ExitCode::from(1);
    }

    match idlestop_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", idlestop_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Markers: {}/*.{}",
                policy.markers.dir.display(),
                policy.markers.extension
            );
            println!(
                "  Empty directory counts as: {}",
                match policy.markers.empty_dir {
                    EmptyDirPolicy::Idle => "idle",
                    EmptyDirPolicy::Busy => "busy",
                }
            );
            println!(
                "  Malformed markers: {}",
                match policy.markers.malformed {
                    MalformedMarkerPolicy::Fail => "fail the evaluation",
                    MalformedMarkerPolicy::TreatAsBusy => "count as busy",
                }
            );
            if policy.markers.idle_quiet_minutes > 0 {
                println!("  Idle quiet period: {} min", policy.markers.idle_quiet_minutes);
            }
            println!(
                "  Billing: {} min cycles, shut down with < {} min left",
                policy.billing.cycle_length_minutes, policy.billing.threshold_minutes
            );
            if policy.billing.paid_on_boot_minutes > 0 {
                println!("  Paid on boot: {} min", policy.billing.paid_on_boot_minutes);
            }
            println!(
                "  Shutdown command: {}{}",
                policy.shutdown.command.join(" "),
                if policy.shutdown.dry_run { " (dry run)" } else { "" }
            );

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                idlestop_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                idlestop_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                idlestop_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                idlestop_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        idlestop_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    let default_path = default_config_path();
    eprintln!("Usage: validate-config [config-file]");
    eprintln!();
    eprintln!("Validates an idlestop configuration file.");
    eprintln!();
    eprintln!("If no path is provided, uses: {}", default_path.display());
}
