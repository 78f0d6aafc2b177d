mod config;
mod scenario;
mod strategy;
mod sweep;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, LoggingConfig};
use std::{path::PathBuf, time::Instant};
use strategy::{FloatBound, compare::Comparison};
use sweep::{
    SweepOptions,
    report::{SweepSummary, TableWriter},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rip-escape")]
#[command(about = "Work and power of rip current escape strategies", long_about = None)]
struct Cli {
    /// Path to configuration TOML (defaults to config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every combination of the configured parameter grid and write tables
    Sweep {
        /// Directory for the .dat tables (overrides sweep.output_directory)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Evaluate combinations on the rayon thread pool
        #[arg(long)]
        parallel: bool,
        #[arg(long, value_enum)]
        float_bound: Option<FloatBound>,
    },
    /// Compare the four strategies for one rip current against strategy 1
    Single {
        #[command(flatten)]
        overrides: SingleOverrides,
        #[arg(long, value_enum)]
        float_bound: Option<FloatBound>,
        /// Treat lx < wr/2 as outside the parallel strategy's domain
        #[arg(long)]
        lateral_clearance: bool,
        /// Print works, powers and ratios as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct SingleOverrides {
    /// Starting distance offshore [m]
    #[arg(long)]
    l: Option<f64>,
    /// Rip channel length [m]
    #[arg(long)]
    lr: Option<f64>,
    /// Distance swum parallel to shore [m]
    #[arg(long)]
    lx: Option<f64>,
    /// Escape speed [m/s]
    #[arg(long)]
    ve: Option<f64>,
    /// Rip channel current [m/s]
    #[arg(long)]
    vr: Option<f64>,
    /// Feeder channel current [m/s]
    #[arg(long)]
    vf: Option<f64>,
    /// Feeder channel width [m]
    #[arg(long)]
    wf: Option<f64>,
    /// Rip channel width [m]
    #[arg(long)]
    wr: Option<f64>,
}

impl SingleOverrides {
    fn apply(&self, single: &mut config::SingleCaseConfig) {
        let pairs = [
            (&mut single.l, self.l),
            (&mut single.lr, self.lr),
            (&mut single.lx, self.lx),
            (&mut single.ve, self.ve),
            (&mut single.vr, self.vr),
            (&mut single.vf, self.vf),
            (&mut single.wf, self.wf),
            (&mut single.wr, self.wr),
        ];
        for (slot, value) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;
    info!(
        combinations = config.sweep.grid.len(),
        sweep_float_bound = ?config.policies.sweep_float_bound,
        single_float_bound = ?config.policies.single_float_bound,
        "configuration instantiated"
    );
    info!(command = ?cli.cmd, "processing request");
    let start = Instant::now();

    match cli.cmd {
        Command::Sweep {
            output,
            parallel,
            float_bound,
        } => {
            if let Some(output) = output {
                config.sweep.output_directory = output;
            }
            config.sweep.parallel |= parallel;
            if let Some(bound) = float_bound {
                config.policies.sweep_float_bound = bound;
            }
            run_sweep(&config)?;
        }
        Command::Single {
            overrides,
            float_bound,
            lateral_clearance,
            json,
        } => {
            overrides.apply(&mut config.single);
            if let Some(bound) = float_bound {
                config.policies.single_float_bound = bound;
            }
            config.policies.lateral_clearance |= lateral_clearance;
            run_single(&config, json)?;
        }
    }

    let duration = start.elapsed();
    info!(duration_ms = duration.as_secs_f64() * 1000.0, duration = ?duration, "command complete");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let level = logging.level.clone().unwrap_or_else(|| "info".into());
    let filter = std::env::var("RUST_LOG").unwrap_or(level);
    let env_filter = EnvFilter::try_from(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn run_sweep(config: &Config) -> Result<()> {
    let grid = &config.sweep.grid;
    grid.check().context("invalid sweep grid")?;

    let options = SweepOptions {
        policy: config.policies.sweep_policy(),
        parallel: config.sweep.parallel,
    };
    let records = sweep::run_sweep(grid, options);

    let writer = TableWriter::create(&config.sweep.output_directory)?;
    let tables = writer.write_tables(&records)?;
    if config.sweep.write_parameters {
        writer.write_parameters(&records)?;
    }

    let summary = SweepSummary::build(grid, options.policy, &records);
    for tally in &summary.strategies {
        info!(
            strategy = tally.strategy.number(),
            valid = tally.work.valid,
            out_of_domain = tally.work.out_of_domain,
            division_by_zero = tally.work.division_by_zero,
            invalid = tally.work.invalid_parameter,
            "strategy work outcomes"
        );
    }
    if summary.x_coordinate.valid < summary.records {
        warn!(
            undefined = summary.records - summary.x_coordinate.valid,
            "some records have no l/wf coordinate"
        );
    }
    if config.sweep.write_summary {
        let summary_path = writer.directory().join("summary.json");
        summary.save(&summary_path)?;
        info!(summary = %summary_path.display(), "sweep summary saved");
    }

    info!(
        tables = tables.len(),
        directory = %writer.directory().display(),
        "sweep finished"
    );
    Ok(())
}

fn run_single(config: &Config, json: bool) -> Result<()> {
    let scenario = config.single.scenario();
    if let Err(err) = scenario.validate() {
        warn!(error = %err, "scenario rejected; every ratio will be undefined");
    }
    if !scenario.clears_rip_laterally() {
        warn!(
            lx = scenario.params.lx,
            half_rip_width = scenario.geometry.wr / 2.0,
            "lateral swim ends inside the rip channel; strategy 2 work includes a negative term"
        );
    }

    let comparison = Comparison::evaluate(scenario, config.policies.single_case_policy());
    for ratio in comparison.undefined() {
        warn!(ratio = %ratio.label(), outcome = ratio.outcome.marker(), "ratio undefined");
    }

    if json {
        let text = serde_json::to_string_pretty(&comparison).context("serialize comparison")?;
        println!("{text}");
    } else {
        print!("{comparison}");
    }
    Ok(())
}
