use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::PathBuf;

mod config;
mod parser;
mod datasets;
mod derive;
mod render;
mod output;
mod error;

use crate::config::Config;
use crate::output::FileTarget;
use crate::render::{Dashboard, View};

#[derive(Parser)]
#[command(name = "standup_results")]
#[command(about = "Derive chart series and summary statistics from the stent study results")]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Orthostatic BP table replacing the embedded one
    #[arg(long)]
    bp: Option<PathBuf>,

    /// MEQ table replacing the embedded one
    #[arg(long)]
    meq: Option<PathBuf>,

    /// CGI-I table replacing the embedded one
    #[arg(long)]
    cgi: Option<PathBuf>,

    /// Also write a markdown report
    #[arg(short, long)]
    report: bool,

    /// Results tab to show after the section becomes visible
    #[arg(long, value_enum, default_value = "hemodynamics")]
    view: ViewArg,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Hemodynamics,
    Medication,
    Clinical,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Hemodynamics => View::Hemodynamics,
            ViewArg::Medication => View::Medication,
            ViewArg::Clinical => View::Clinical,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    if cli.bp.is_some() {
        config.sources.bp = cli.bp.clone();
    }
    if cli.meq.is_some() {
        config.sources.meq = cli.meq.clone();
    }
    if cli.cgi.is_some() {
        config.sources.cgi = cli.cgi.clone();
    }

    let data = datasets::load(&config);
    let target = FileTarget::new(&cli.output)
        .with_context(|| format!("preparing output directory {:?}", cli.output))?;
    let mut dashboard = Dashboard::new(config, data, target);
    if !dashboard.has_data() {
        warn!("No data loaded; only placeholder stats will be written");
    }

    dashboard.clear()?;
    let mut rendered = dashboard.on_visibility_changed(true)?;
    let view = View::from(cli.view);
    if view != dashboard.view() {
        rendered = dashboard.switch_view(view)?;
    }

    if let Some(results) = rendered {
        output::save_summary(&results.summary, &cli.output)?;
        output::save_series_csv(&results, &cli.output)?;
        if cli.report {
            output::generate_report(&results.summary, &cli.output)?;
        }
        info!(
            "Average drop {:.1} -> {:.1} mmHg, MEQ reduction {:.1}%",
            results.summary.stats.avg_pre_drop,
            results.summary.stats.avg_post_drop,
            results.summary.stats.avg_meq_reduction
        );
    }

    dashboard.target().flush()?;
    info!("Results saved to {:?}", cli.output);

    Ok(())
}
