//! MESI coherence simulator CLI.
//!
//! This binary is the front end for the coherence library. It performs:
//! 1. **Trace runs:** Load `core<i>.trace` files from a directory and replay them.
//! 2. **Demo run:** With no trace directory, run a small built-in sharing scenario.
//! 3. **Reporting:** Print the statistics report; exit non-zero on a protocol violation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use coherence::config::Config;
use coherence::sim::loader;
use coherence::soc::System;

#[derive(Parser, Debug)]
#[command(
    name = "mesi-sim",
    author,
    version,
    about = "Cycle-stepped MESI snooping-bus coherence simulator",
    long_about = "Replay per-core load/store traces through a shared-bus MESI \
multiprocessor model.\n\nTraces are plain text, one operation per line:\n  \
ld 0x1000\n  st 0x1000 42\n\nExamples:\n  mesi-sim run --cores 2 --trace-dir traces/\n  \
mesi-sim run --config system.json --max-cycles 5000"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run traces (or the built-in demo) to completion.
    Run {
        /// Number of cores in the system.
        #[arg(short, long, default_value_t = 2)]
        cores: usize,

        /// Cycle bound; the run also stops when all traces are drained.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Directory containing core0.trace, core1.trace, ...
        #[arg(short, long)]
        trace_dir: Option<PathBuf>,

        /// JSON configuration file (overrides --cores).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the MESI state of this address in every cache after the run.
        #[arg(long, value_parser = parse_hex)]
        inspect: Vec<u32>,
    },
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let t = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(t, 16).map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            cores,
            max_cycles,
            trace_dir,
            config,
            inspect,
        } => cmd_run(cores, max_cycles, trace_dir, config, inspect),
    }
}

/// Builds the system, installs traces, and runs until quiescence or the
/// cycle bound. A protocol violation is fatal: the diagnostic and the stats
/// collected so far are printed and the process exits with code 1.
fn cmd_run(
    cores: usize,
    max_cycles: Option<u64>,
    trace_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    inspect: Vec<u32>,
) {
    let config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("error: cannot read config {}: {}", path.display(), e);
                process::exit(1);
            });
            serde_json::from_str::<Config>(&text).unwrap_or_else(|e| {
                eprintln!("error: malformed config {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => {
            let mut c = Config::default();
            c.system.num_cores = cores;
            c
        }
    };

    let num_cores = config.system.num_cores;
    let max_cycles = max_cycles.unwrap_or(config.general.max_cycles);
    let mut sys = System::with_config(config);

    match trace_dir {
        Some(dir) => {
            let traces = loader::load_core_traces(&dir, num_cores).unwrap_or_else(|e| {
                eprintln!("error: {}", e);
                process::exit(1);
            });
            for (i, ops) in traces.into_iter().enumerate() {
                let core = sys.get_core_mut(i);
                for op in ops {
                    core.add_op(op.kind, op.addr, op.data);
                }
            }
        }
        None => {
            println!("[*] no trace directory; running built-in demo");
            install_demo(&mut sys);
        }
    }

    println!(
        "[*] running {} cores for up to {} cycles",
        num_cores, max_cycles
    );

    if let Err(e) = sys.run(max_cycles) {
        eprintln!("\n[!] PROTOCOL VIOLATION: {}", e);
        sys.stats().print();
        process::exit(1);
    }

    if sys.is_done() {
        println!("[*] all traces drained after {} cycles", sys.cycle());
    } else {
        println!("[*] cycle bound reached at {}", sys.cycle());
    }

    for addr in inspect {
        let states: Vec<String> = (0..num_cores)
            .map(|i| format!("cache{}={}", i, sys.get_cache(i).state_for(addr)))
            .collect();
        println!("  {:#x}: {}", addr, states.join(" "));
    }

    sys.stats().print();
}

/// A two-core producer/consumer demo: core 0 stores then evicts, core 1
/// picks the value up through a dirty flush.
fn install_demo(sys: &mut System) {
    let c0 = sys.get_core_mut(0);
    c0.add_store(0xA400, 5);
    c0.add_load(0xB400);
    if sys.num_cores() > 1 {
        let c1 = sys.get_core_mut(1);
        c1.add_load(0xA400);
    }
}
