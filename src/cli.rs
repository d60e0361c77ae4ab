//! Command line surface of the `roofline` binary.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::{info, warn};

use crate::config::{ConfigBuilder, PlotStyle, RooflineConfig};
use crate::core::roofline::Roofline;
use crate::ingest::{load_platforms, load_workloads};
use crate::render::render;
use crate::report::write_table;

/// Compute the Roofline model of HW platforms running given applications
#[derive(Debug, Parser)]
#[command(name = "roofline")]
#[command(version)]
#[command(about = "Compute and plot the Roofline model of HW platforms and applications")]
pub struct Cli {
    /// HW platforms CSV file: name, GFLOP/s, GB/s, cost (stdin when omitted)
    #[arg(short = 'i', long = "hardware", value_name = "HW_CSV")]
    pub hardware: Option<PathBuf>,

    /// Applications CSV file: name, FLOP/byte[, label, GFLOP/s]* (stdin when omitted)
    #[arg(short = 'a', long = "apps", value_name = "APPS_CSV")]
    pub apps: Option<PathBuf>,

    /// Plot only the HW characteristics without any applications
    #[arg(long)]
    pub hw_only: bool,

    /// Add a panel normalized by platform cost
    #[arg(long)]
    pub normalize: bool,

    /// Use the hand-drawn sketch plot style
    #[arg(long)]
    pub xkcd: bool,

    /// Output image (.png or .svg)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Lowest intensity exponent of the sweep (2^START FLOP/byte)
    #[arg(long, allow_negative_numbers = true)]
    pub start: Option<i32>,

    /// Highest intensity exponent of the sweep (2^STOP FLOP/byte)
    #[arg(long, allow_negative_numbers = true)]
    pub stop: Option<i32>,

    /// Number of sweep points (default: one per exponent)
    #[arg(long)]
    pub points: Option<usize>,

    /// TOML configuration file
    #[arg(short, long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Print the achievable performance table as CSV on stdout
    #[arg(long)]
    pub table: bool,

    /// Skip rendering the chart
    #[arg(long)]
    pub no_plot: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Layer defaults, the optional config file, environment and flags.
    pub fn resolve_config(&self) -> Result<RooflineConfig> {
        let mut builder = ConfigBuilder::new();
        if let Some(path) = &self.config {
            builder = builder.from_file(path)?;
        }
        builder = builder.from_env()?;

        if let Some(start) = self.start {
            builder = builder.with_sweep_start(start);
        }
        if let Some(stop) = self.stop {
            builder = builder.with_sweep_stop(stop);
        }
        if let Some(points) = self.points {
            builder = builder.with_sweep_points(points);
        }
        if let Some(output) = &self.output {
            builder = builder.with_output(output);
        }
        if self.xkcd {
            builder = builder.with_style(PlotStyle::Sketch);
        }

        Ok(builder.validate()?.build())
    }
}

/// Run one invocation: ingest, compute, report, render.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;

    if !cli.hw_only && cli.hardware.is_none() && cli.apps.is_none() {
        bail!("HW CSV is read from stdin, so the applications CSV needs -a (or pass --hw-only)");
    }

    let platforms = load_platforms(cli.hardware.as_deref())?;
    if platforms.is_empty() {
        bail!("HW CSV contains no platforms");
    }
    let workloads = if cli.hw_only {
        info!("Plotting only HW characteristics without any applications...");
        Vec::new()
    } else {
        load_workloads(cli.apps.as_deref())?
    };

    for platform in &platforms {
        info!(
            "{}: {} GFLOP/s, {} GB/s, ridge point {:.3} FLOP/byte",
            platform.name(),
            platform.peak_performance(),
            platform.peak_bandwidth(),
            platform.ridge_point()
        );
    }
    for workload in &workloads {
        info!(
            "{}: {} FLOP/byte, {} measured point(s)",
            workload.name(),
            workload.arithmetic_intensity(),
            workload.points().len()
        );
    }

    let intensity = config.sweep.intensity()?;
    let model = Roofline::compute(&platforms, intensity, cli.normalize)?;

    if cli.table {
        write_table(io::stdout().lock(), &model).context("cannot write table")?;
    }

    if cli.no_plot {
        if !cli.table {
            warn!("--no-plot without --table produces no output");
        }
        return Ok(());
    }

    info!(
        "Plotting using {:?} style to {}",
        config.plot.style,
        config.plot.output.display()
    );
    render(&model, &workloads, &config.plot)?;
    Ok(())
}
