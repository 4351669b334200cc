//! Interrupt controller simulator CLI.
//!
//! This binary runs the simulation and acts as its command surface. It performs:
//! 1. **Interactive run:** Generators and controller run in the background while
//!    stdin toggles masks, raises interrupts by hand, and quits.
//! 2. **Headless run:** `--duration-secs` runs for a fixed time without reading stdin.
//! 3. **Reporting:** Prints per-device statistics on exit, as a table or as JSON.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use irqsim_core::config::Config;
use irqsim_core::sim::command::{Command, CommandOutcome, HELP};
use irqsim_core::sim::events::{ChannelSink, Notification};
use irqsim_core::soc::devices::DeviceRegistry;
use irqsim_core::{Result, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "irqsim",
    author,
    version,
    about = "Priority interrupt controller simulator",
    long_about = "Simulates devices raising interrupts at random intervals and a single \
                  non-preemptive controller servicing them by priority.\n\nExamples:\n  \
                  irqsim\n  irqsim run --seed 42\n  irqsim run --config devices.json --duration-secs 10 --json-stats"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation (the default when no subcommand is given).
    Run(RunArgs),

    /// Print the effective device set and timing, then exit.
    Devices {
        /// JSON configuration file (defaults to keyboard/mouse/printer).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// JSON configuration file (defaults to keyboard/mouse/printer).
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for the random inter-arrival times (overrides the config file).
    #[arg(long)]
    seed: Option<u64>,

    /// Run for this many seconds without reading stdin, then shut down.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Print the final statistics as JSON.
    #[arg(long)]
    json_stats: bool,

    /// Log filter used when `RUST_LOG` is not set (e.g. `warn`, `info`, `irqsim_core=debug`).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run(args)) => cmd_run(&args),
        Some(Commands::Devices { config }) => cmd_devices(config.as_deref()),
        None => cmd_run(&RunArgs {
            log_level: "warn".to_string(),
            ..RunArgs::default()
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[!] {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

/// Lists the configured devices without starting anything.
fn cmd_devices(path: Option<&str>) -> Result<()> {
    let config = load_config(path)?;
    let registry = DeviceRegistry::from_config(&config.devices)?;
    println!("  #  {:<10} {:>5} {:>8}", "device", "prio", "isr");
    for (idx, dev) in registry.iter().enumerate() {
        println!(
            "  {:<2} {:<10} {:>5} {:>6}ms",
            idx + 1,
            dev.label(),
            dev.priority(),
            dev.handler_duration().as_millis()
        );
    }
    println!(
        "  interval: {} ms + U[0, {}) ms",
        config.generator.min_interval_ms, config.generator.interval_range_ms
    );
    Ok(())
}

/// Runs the simulator until `q`, end of input, the duration limit, or a worker failure.
fn cmd_run(args: &RunArgs) -> Result<()> {
    init_tracing(&args.log_level);

    let mut config = load_config(args.config.as_deref())?;
    if args.seed.is_some() {
        config.general.seed = args.seed;
    }
    tracing::debug!(?config, "configuration loaded");

    let (sink, rx) = ChannelSink::channel();
    let mut sim = Simulator::new(&config, Arc::new(sink))?;
    let display = spawn_display(rx, sim.registry().clone());

    println!("Event-driven simulation starting...");
    sim.start()?;

    match args.duration_secs {
        Some(secs) => {
            let _ = sim.wait_timeout(Duration::from_secs(secs));
        }
        None => console(&sim),
    }

    let joined = sim.join();
    let report = sim.stats();
    // Dropping the simulator drops the last channel sender and ends the display thread.
    drop(sim);
    let _ = display.join();

    if args.json_stats {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("[!] failed to encode stats: {e}"),
        }
    } else {
        report.print();
    }
    joined
}

/// Reads commands from stdin until quit, end of input, or shutdown from elsewhere.
fn console(sim: &Simulator) {
    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if sim.is_shutting_down() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let outcome = line
            .parse::<Command>()
            .and_then(|command| sim.execute(&command));
        match outcome {
            Ok(CommandOutcome::Toggled { label, masked }) => {
                println!(
                    "\n--- {label} is now {} ---",
                    if masked { "MASKED" } else { "ENABLED" }
                );
            }
            Ok(CommandOutcome::Raised { label }) => println!("--- raised {label} by hand ---"),
            Ok(CommandOutcome::Status(report)) => report.print(),
            Ok(CommandOutcome::Help) => println!("{HELP}"),
            Ok(CommandOutcome::Quit) => {
                println!("Shutting down...");
                break;
            }
            Err(e) => println!("Invalid: {e}"),
        }
        let _ = io::stdout().flush();
    }
    let _ = sim.shutdown();
}

/// Prints notifications as they arrive.
fn spawn_display(rx: Receiver<Notification>, registry: DeviceRegistry) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let label = |n: Notification| {
            registry
                .get(n.device())
                .map_or_else(|| n.device().to_string(), |d| d.label().to_string())
        };
        for n in rx {
            match n {
                Notification::Raised(_) => println!("\n>>> [{}] requests interrupt! <<<", label(n)),
                Notification::Dropped(_) => println!("{} interrupt ignored (masked)", label(n)),
                Notification::Dispatched(_) => {
                    println!("{} interrupt triggered -> handling ISR...", label(n));
                }
                Notification::Completed(_) => println!("{} ISR completed.", label(n)),
            }
        }
    })
}
