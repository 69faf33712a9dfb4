//! Ellipso command-line interface.
//!
//! Run simulations from TOML configuration files:
//! ```sh
//! ellipso-cli run job.toml
//! ellipso-cli validate job.toml
//! ellipso-cli materials
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ellipso_materials::library;

#[derive(Parser)]
#[command(name = "ellipso-cli")]
#[command(about = "Ellipso: thin-film ellipsometry forward simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation or training sweep from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the built-in materials.
    Materials,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Ellipso forward simulator");
            println!("=========================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let prepared = runner::prepare(&job)?;
            let result = runner::run_job(&job, &prepared)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            match &result {
                runner::JobOutput::Spectrum(spectrum) => {
                    if job.output.save_csv {
                        runner::write_spectrum_csv(spectrum, &out_dir.join("spectrum.csv"), &job, &prepared.stack)?;
                    }
                    if job.output.save_json {
                        runner::write_spectrum_json(spectrum, &out_dir.join("spectrum.json"))?;
                    }
                }
                runner::JobOutput::ThicknessSweep(sweep) => {
                    write_sweep(&sweep.records, &out_dir, &job, &prepared)?;
                }
                runner::JobOutput::ParameterSweep(sweep) => {
                    write_sweep(&sweep.records, &out_dir, &job, &prepared)?;
                }
            }

            println!("Simulation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let prepared = runner::prepare(&job)?;
            if runner::plan_sweep(&job, &prepared)?.is_some() {
                println!("Sweep parameters are valid");
            }
            println!(
                "Configuration is valid: {} ({} media, {} wavelengths in [{}, {}] nm)",
                config.display(),
                prepared.stack.media_count(),
                prepared.grid.len(),
                prepared.grid.first(),
                prepared.grid.last()
            );
            Ok(())
        }
        Commands::Materials => {
            println!("Available materials:");
            println!();
            for (id, description) in library::BUILTIN_MATERIALS {
                println!("    {:<8} {}", id, description);
            }
            println!();
            println!("  Inline materials: constant, nk_file, lorentz, doped, maxwell_garnett");
            Ok(())
        }
    }
}

fn write_sweep(
    records: &[ellipso_core::sweep::SweepRecord],
    out_dir: &std::path::Path,
    job: &config::JobConfig,
    prepared: &runner::PreparedJob,
) -> anyhow::Result<()> {
    if job.output.save_csv {
        runner::write_sweep_csv(records, &out_dir.join("supervector.csv"), job, &prepared.stack)?;
    }
    if job.output.save_json {
        runner::write_sweep_json(records, &out_dir.join("supervector.json"))?;
    }
    Ok(())
}
