//! RPI topology audit tool.
//!
//! Loads a topology file, validates the static configuration and can run the
//! assembly phase as a dry run.
//!
//! # Architecture Overview
//!
//! ```text
//!   topology.toml ──▶ config (load + validate) ──▶ CLI overrides (-a/-p)
//!                                                         │
//!                          ┌──────────────────────────────┤
//!                          ▼                              ▼
//!                  thresholds / check            lifecycle::startup
//!                   (print & exit)          allocator → buffers → watchdog
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use rpi_topology::config::{load_config, validate_config, ConfigError, TopologyConfig, ValidationError};
use rpi_topology::config::validation::ping_table;
use rpi_topology::lifecycle::{assemble, CommLink};
use rpi_topology::observability::logging::init_logging;
use rpi_topology::topology::allocation::{AssemblyAllocator, BoundedAllocator};
use rpi_topology::topology::{ComponentId, EndpointConfig, MallocAllocator, MALLOCATOR};

#[derive(Parser)]
#[command(name = "rpi-topology")]
#[command(about = "Audit and dry-run the RPI deployment topology", long_about = None)]
struct Cli {
    /// Topology file (TOML). The built-in reference topology is used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ground-link host, overrides the file.
    #[arg(short = 'a', long)]
    address: Option<String>,

    /// Ground-link port, overrides the file.
    #[arg(short, long)]
    port: Option<u32>,

    /// Log level, overrides the file.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the topology file and report every problem
    Check,
    /// Print the effective ping thresholds
    Thresholds {
        #[arg(long)]
        json: bool,
    },
    /// Run the assembly phase and tear it down again
    Assemble {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ThresholdRow {
    component: ComponentId,
    warn: u32,
    fatal: u32,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(ConfigError::Validation(errors)) => {
                report_problems(&path.display().to_string(), &errors);
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        },
        None => TopologyConfig::default(),
    };

    apply_overrides(&cli, &mut config);
    if let Err(errors) = validate_config(&config) {
        report_problems("command line", &errors);
        return Ok(ExitCode::FAILURE);
    }
    init_logging(&config.observability)?;

    tracing::info!(
        config = ?cli.config,
        host = %config.endpoint.host_name,
        port = config.endpoint.port_number,
        "rpi-topology v0.1.0 starting"
    );

    match cli.command {
        Commands::Check => {
            if let Err(e) = CommLink::from_endpoint(&config.endpoint) {
                eprintln!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
            println!("ok: {} supervised components", config.ping.len());
        }
        Commands::Thresholds { json } => {
            let table = ping_table(&config).map_err(|errors| format!("{} threshold error(s)", errors.len()))?;
            let rows: Vec<_> = table
                .iter()
                .map(|(component, entry)| ThresholdRow {
                    component,
                    warn: entry.warn,
                    fatal: entry.fatal,
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{:<20} {:>5} {:>5}", "COMPONENT", "WARN", "FATAL");
                for row in rows {
                    println!("{:<20} {:>5} {:>5}", row.component, row.warn, row.fatal);
                }
            }
        }
        Commands::Assemble { json } => {
            let bounded;
            let allocator: &dyn AssemblyAllocator = match config.assembly.memory_budget_bytes {
                Some(budget) => {
                    bounded = BoundedAllocator::new(MallocAllocator, budget);
                    &bounded
                }
                None => &MALLOCATOR,
            };

            let topology = match assemble(&config, allocator) {
                Ok(topology) => topology,
                Err(e) => {
                    tracing::error!(error = %e, "Assembly failed, refusing to start");
                    eprintln!("assembly failed: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            };

            let summary = topology.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                match &summary.comm {
                    Some(link) => println!("ground link:    {}:{}", link.host, link.port),
                    None => println!("ground link:    disabled"),
                }
                println!("allocated:      {} bytes in {} bins", summary.allocated_bytes, summary.buffer_bins);
                println!("supervised:     {} components", summary.supervised);
                println!("warn policy:    {}", summary.warn_policy);
            }
        }
    }

    tracing::info!("Done");
    Ok(ExitCode::SUCCESS)
}

fn report_problems(source: &str, errors: &[ValidationError]) {
    eprintln!("{}: {} problem(s)", source, errors.len());
    for error in errors {
        eprintln!("  - {}", error);
    }
}

/// Fold `-a`/`-p`/`--log-level` into the loaded configuration.
///
/// The result must pass `validate_config` again before it is used.
fn apply_overrides(cli: &Cli, config: &mut TopologyConfig) {
    if cli.address.is_some() || cli.port.is_some() {
        let host = cli
            .address
            .clone()
            .unwrap_or_else(|| config.endpoint.host_name.to_string());
        let port = cli.port.unwrap_or(config.endpoint.port_number);
        config.endpoint = EndpointConfig::new(host, port);
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
}
