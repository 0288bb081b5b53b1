//! Crossbar Simulator CLI.
//!
//! Loads a configuration and a workload, programs the weight matrix into a
//! simulated crossbar and runs the input vector through it.
//!
//! # Usage
//!
//! ```text
//! cim-crossbar --config configs/analog/SYM_ADC_1.json --workload workload.json --repeat 100
//! ```
//!
//! Logging is controlled with `RUST_LOG` (for example `RUST_LOG=cim_crossbar=debug`).

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use cim_crossbar::config::Config;
use cim_crossbar::sim::{run_workload, Workload};
use cim_crossbar::xbar::Crossbar;

/// Command-line arguments for the crossbar simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Analog In-Memory Computing Crossbar Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    #[arg(short, long)]
    workload: String,

    /// Number of MVMs to run with the workload vector.
    #[arg(short, long, default_value_t = 1)]
    repeat: u64,

    /// Print the crossbar summary on exit.
    #[arg(short, long)]
    verbose: bool,
}

/// Main entry point for the crossbar simulator.
///
/// # Behavior
///
/// 1. **Configuration**: Loads and validates the JSON or TOML configuration.
/// 2. **Workload**: Reads the matrix and vector from the workload file.
/// 3. **Simulation**: Writes the matrix once, runs `--repeat` MVMs.
/// 4. **Report**: Prints the last result vector and the crossbar counters.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });
    config.general.verbose |= args.verbose;

    let workload = Workload::from_file(&args.workload).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });

    println!("Crossbar Configuration");
    println!("----------------------");
    println!("  Mapping Mode:       {}", config.xbar.m_mode);
    println!("  Dimensions:         {} x {}", config.xbar.m, config.xbar.n);
    println!("  Split:              {:?}", config.xbar.split);
    println!("  Input Bits:         {}", config.xbar.i_bit);
    println!(
        "  ADC:                {:?} ({} bit, alpha {})",
        config.adc.kind, config.adc.resolution, config.adc.alpha
    );
    println!(
        "  Read Disturb:       {}",
        if config.read_disturb.enabled {
            format!("{:?}", config.read_disturb.mitigation)
        } else {
            "Disabled".to_string()
        }
    );
    println!("----------------------");

    let mut xbar = Crossbar::new(&config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });

    match run_workload(&mut xbar, &workload, args.repeat) {
        Ok(result) => {
            println!("[*] Result: {:?}", result);
            println!(
                "[*] writes={} mvms={} refreshes={} refreshed_cells={}",
                xbar.write_count(),
                xbar.mvm_count(),
                xbar.refresh_count(),
                xbar.refreshed_cell_count()
            );
            if let Some(rd) = xbar.read_disturb() {
                if rd.run_out_of_bounds() {
                    println!("[*] WARNING: read disturb model left its fitted range");
                }
            }
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {}", e);
            drop(xbar);
            process::exit(1);
        }
    }
}
