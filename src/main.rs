use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use rr_optimizer::config::Config;
use rr_optimizer::manager::permissions::ProtectionPolicy;
use rr_optimizer::manager::sampler::{self, Sampler, SamplerTick};
use rr_optimizer::manager::{operations, Manager};
use rr_optimizer::process;
use rr_optimizer::scheduler::selection::{parse_workload_spec, select_by_name};
use rr_optimizer::scheduler::{report, simulate, BurstSource, Selection, Ticks, Workload};

#[derive(Parser)]
#[command(name = "rr-optimizer")]
#[command(about = "Process inspection and Round-Robin scheduling simulator")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List running processes, one line per distinct name
    List,

    /// Terminate processes by name
    Kill {
        #[arg(required = true)]
        names: Vec<String>,

        /// Send SIGKILL instead of SIGTERM
        #[arg(long)]
        force: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the processes using the most memory
    Top {
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Show CPU, RAM and disk utilization
    Stats {
        /// Keep sampling until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Number of samples to take with --watch
        #[arg(long)]
        count: Option<usize>,
    },

    /// Simulate Round-Robin scheduling over selected workloads
    Simulate {
        /// Running process to include (repeat for each selection)
        #[arg(long = "pick", value_name = "NAME")]
        picks: Vec<String>,

        /// Offline workload as NAME=BURST (repeatable)
        #[arg(long = "workload", value_name = "NAME=BURST", conflicts_with = "picks")]
        workloads: Vec<String>,

        /// Burst time per picked process, in order (default: random)
        #[arg(long = "burst", value_name = "TICKS")]
        bursts: Vec<Ticks>,

        /// Seed for random burst times
        #[arg(long)]
        seed: Option<u64>,

        /// Time quantum
        #[arg(short, long)]
        quantum: Option<Ticks>,

        /// Print the dispatch order
        #[arg(long)]
        trace: bool,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::List => list_processes(&config),
        Command::Kill { names, force, yes } => kill_processes(&config, &names, force, yes),
        Command::Top { count } => show_top(&config, count),
        Command::Stats { watch, count } => show_stats(&config, watch, count),
        Command::Simulate {
            picks,
            workloads,
            bursts,
            seed,
            quantum,
            trace,
            json,
        } => {
            let quantum = quantum.unwrap_or(config.scheduler.quantum);
            let input = if workloads.is_empty() {
                picked_workloads(&config, &picks, bursts, seed)?
            } else {
                if !bursts.is_empty() {
                    bail!("--burst applies to --pick only; give bursts inline as NAME=BURST");
                }
                offline_workloads(&workloads)?
            };
            run_simulation(&input, quantum, trace, json)
        }
    }
}

fn open_manager(config: &Config) -> Result<Manager> {
    let policy = ProtectionPolicy::new(config.termination.protected.clone());
    Manager::new(policy).map_err(anyhow::Error::msg)
}

fn list_processes(config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let processes = manager.processes();
    for p in process::unique_by_name(&processes) {
        println!("{}  ->  {}", p.name, p.display_path());
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn kill_processes(config: &Config, names: &[String], force: bool, yes: bool) -> Result<()> {
    let mut manager = open_manager(config)?;

    let prompt = format!(
        "Are you sure you want to terminate {} process(es)? This action cannot be undone.",
        names.len()
    );
    if !yes && !confirm(&prompt)? {
        info!("Termination cancelled");
        return Ok(());
    }

    let result = operations::terminate_by_names(&manager, names, force);
    println!("{}", result);

    if let Err(e) = manager.refresh() {
        warn!("Could not refresh process list: {}", e);
    }
    Ok(())
}

fn show_top(config: &Config, count: Option<usize>) -> Result<()> {
    let manager = open_manager(config)?;
    let n = count.unwrap_or(config.sampler.top_n);
    print_top(&sampler::top_memory_consumers(&manager.processes(), n), n);
    Ok(())
}

fn print_top(top: &[sampler::MemoryConsumer], n: usize) {
    println!("Top {} RAM Apps:", n);
    if top.is_empty() {
        println!("None");
    }
    for (i, c) in top.iter().enumerate() {
        println!("{}. {} - {:.2}%", i + 1, c.name, c.memory_percent);
    }
}

fn show_stats(config: &Config, watch: bool, count: Option<usize>) -> Result<()> {
    let mut sampler = Sampler::new(
        Duration::from_millis(config.sampler.interval_ms),
        config.sampler.top_n,
        config.sampler.ram_alert_percent,
    );
    sampler.disk_path = config.sampler.disk_path.clone();

    let samples = if watch { count } else { Some(1) };
    let top_n = config.sampler.top_n;
    let threshold = config.sampler.ram_alert_percent;

    sampler
        .run(samples, |tick: &SamplerTick| {
            println!("CPU Usage: {:.1}%", tick.sample.cpu_percent);
            println!("RAM Usage: {:.1}%", tick.sample.ram_percent);
            match tick.sample.disk_percent {
                Some(percent) => println!("Disk Usage: {:.1}%", percent),
                None => println!("Disk Usage: unknown"),
            }
            print_top(&tick.top_memory, top_n);
            if tick.ram_alert {
                warn!("High RAM usage: {:.1}% exceeds {:.0}%", tick.sample.ram_percent, threshold);
            }
            println!();
        })
        .map_err(anyhow::Error::msg)
}

fn picked_workloads(
    config: &Config,
    picks: &[String],
    bursts: Vec<Ticks>,
    seed: Option<u64>,
) -> Result<Vec<Workload>> {
    let manager = open_manager(config)?;
    let candidates = select_by_name(&manager.processes(), picks)?;

    let selection = if bursts.is_empty() {
        let mut settings = config.scheduler.clone();
        settings.seed = seed.or(settings.seed);
        settings.random_selection()
    } else {
        Selection::new(config.scheduler.selection_size, BurstSource::Fixed(bursts))
    };

    Ok(selection.build(candidates)?)
}

fn offline_workloads(specs: &[String]) -> Result<Vec<Workload>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| parse_workload_spec(i, spec).map_err(anyhow::Error::from))
        .collect()
}

fn run_simulation(input: &[Workload], quantum: Ticks, trace: bool, json: bool) -> Result<()> {
    let result = simulate(input, quantum)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print!("{}", report::render_table(&result));
    if trace {
        println!();
        print!("{}", report::render_trace(&result));
    }
    Ok(())
}
