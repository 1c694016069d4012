//! FPY Dashboard - Main entry point
//!
//! Shows the weekly and quarterly first-pass-yield views and the weekly
//! shipped-units report in the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fpy_dashboard::aggregate::build_units_report;
use fpy_dashboard::aggregate::shipments::REPORT_WEEK_CHOICES;
use fpy_dashboard::calendar::shift_quarter;
use fpy_dashboard::client::fetch_report_weeks;
use fpy_dashboard::config::validate_weeks;
use fpy_dashboard::display;
use fpy_dashboard::{
    Config, Dashboard, DashboardView, HttpStatsClient, Msg, RecordStatsClient, Session,
    StatsClient,
};

#[derive(Parser)]
#[command(name = "fpy-dashboard")]
#[command(author, version, about = "Weekly and quarterly first-pass-yield statistics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read shipment records from a JSON file instead of the REST API
    #[arg(long, global = true, env = "FPY_RECORDS")]
    records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show FPY for one week against the all-time baseline
    Weekly {
        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        anchor: Option<String>,

        /// Number of weeks to load (4, 6, 8, 12, 16 or 26)
        #[arg(short, long)]
        weeks: Option<u32>,

        /// Step this many weeks back from the newest loaded week
        #[arg(long, default_value = "0")]
        older: usize,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the quarterly FPY overview
    Quarter {
        /// Any date inside the quarter (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Quarters to move from that date, e.g. -1 for the previous one
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,

        /// Focus the weekly view on this bar (1 = oldest week)
        #[arg(long)]
        focus: Option<usize>,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show units shipped per week, by model type
    Report {
        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        anchor: Option<String>,

        /// Number of weeks (4, 6, 8 or 12)
        #[arg(short, long)]
        weeks: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit configuration
    Config {
        /// Print current configuration
        #[arg(long)]
        show: bool,

        /// Create default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = if let Some(ref path) = cli.config {
        Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };
    config.validate()?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Weekly {
            anchor,
            weeks,
            older,
            json,
        }) => {
            let client = build_client(&config, cli.records.as_deref())?;
            run_weekly(&config, client, anchor.as_deref(), weeks, older, json).await
        }

        Some(Commands::Quarter {
            date,
            offset,
            focus,
            json,
        }) => {
            let client = build_client(&config, cli.records.as_deref())?;
            run_quarter(&config, client, date.as_deref(), offset, focus, json).await
        }

        Some(Commands::Report {
            anchor,
            weeks,
            json,
        }) => {
            let client = build_client(&config, cli.records.as_deref())?;
            run_report(&config, client, anchor.as_deref(), weeks, json).await
        }

        Some(Commands::Config { show, init }) => {
            if init {
                let default_config = Config::default();
                default_config.save()?;
                println!(
                    "Created default configuration at {}",
                    Config::config_path()?.display()
                );
            } else if show {
                let contents = toml::to_string_pretty(&config)?;
                println!("{contents}");
            } else {
                println!("Configuration path: {}", Config::config_path()?.display());
            }
            Ok(())
        }

        None => {
            // Default: both views for today
            let client = build_client(&config, cli.records.as_deref())?;
            let mut session = new_session(&config, client, None, None, None)?;
            session.start();
            if !settle(&mut session).await {
                return Ok(());
            }
            display::display_dashboard(&session.view());
            Ok(())
        }
    }
}

fn build_client(
    config: &Config,
    records: Option<&std::path::Path>,
) -> anyhow::Result<Arc<dyn StatsClient>> {
    if let Some(path) = records {
        let client = RecordStatsClient::from_path(path)
            .with_context(|| format!("Failed to read records from {}", path.display()))?;
        info!("Using {} local shipment records", client.shipments().len());
        Ok(Arc::new(client))
    } else {
        let client = HttpStatsClient::new(&config.api)?;
        info!("Using statistics API at {}", config.api.base_url);
        Ok(Arc::new(client))
    }
}

fn new_session(
    config: &Config,
    client: Arc<dyn StatsClient>,
    anchor: Option<&str>,
    weeks: Option<u32>,
    quarter_date: Option<NaiveDate>,
) -> anyhow::Result<Session<dyn StatsClient>> {
    let calendar = config.calendar();
    let anchor = anchor.map_or_else(|| calendar.today(), |s| calendar.date_or_today(s));
    let weeks = weeks.unwrap_or(config.dashboard.weeks);
    validate_weeks(weeks)?;

    let dashboard = Dashboard::anchored(calendar, anchor)
        .with_weeks(weeks)
        .with_quarter_date(quarter_date.unwrap_or(anchor))
        .with_tab_window(config.dashboard.tab_window);
    Ok(Session::new(client, dashboard))
}

/// Wait for every stream, or for Ctrl-C. Returns `false` when interrupted.
async fn settle(session: &mut Session<dyn StatsClient>) -> bool {
    tokio::select! {
        () = session.settle() => true,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            false
        }
    }
}

fn print_view(view: &DashboardView, json: bool, weekly: bool, quarter: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    if quarter {
        display::print_section("Quarterly overview");
        print!("{}", display::render_quarter_panel(&view.quarter));
    }
    if weekly {
        display::print_section("Weekly detail");
        print!("{}", display::render_weekly_panel(&view.weekly));
    }
    Ok(())
}

async fn run_weekly(
    config: &Config,
    client: Arc<dyn StatsClient>,
    anchor: Option<&str>,
    weeks: Option<u32>,
    older: usize,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = new_session(config, client, anchor, weeks, None)?;
    session.start();
    if !settle(&mut session).await {
        return Ok(());
    }

    for _ in 0..older {
        session.dispatch(Msg::OlderWeek);
    }
    print_view(&session.view(), json, true, false)
}

async fn run_quarter(
    config: &Config,
    client: Arc<dyn StatsClient>,
    date: Option<&str>,
    offset: i32,
    focus: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let calendar = config.calendar();
    let date = date.map_or_else(|| calendar.today(), |s| calendar.date_or_today(s));
    let quarter_date = shift_quarter(date, offset)?;
    info!("Showing {}", calendar.quarter_of(quarter_date));

    let mut session = new_session(config, client, None, None, Some(quarter_date))?;
    session.start();
    if !settle(&mut session).await {
        return Ok(());
    }

    let Some(bar) = focus else {
        return print_view(&session.view(), json, false, true);
    };
    if bar == 0 {
        bail!("--focus counts bars from 1");
    }
    session.dispatch(Msg::FocusQuarterWeek(bar - 1));
    if !settle(&mut session).await {
        return Ok(());
    }
    print_view(&session.view(), json, true, true)
}

async fn run_report(
    config: &Config,
    client: Arc<dyn StatsClient>,
    anchor: Option<&str>,
    weeks: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let calendar = config.calendar();
    let anchor = anchor.map_or_else(|| calendar.today(), |s| calendar.date_or_today(s));
    let weeks = weeks.unwrap_or(config.report.weeks);
    if !REPORT_WEEK_CHOICES.contains(&weeks) {
        bail!("weeks must be one of {REPORT_WEEK_CHOICES:?}, got {weeks}");
    }

    let shipment_weeks = fetch_report_weeks(client.as_ref(), anchor, weeks)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Failed to load weekly data.")))?;
    let report = build_units_report(&shipment_weeks);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display::display_units_report(&report, weeks);
    }
    Ok(())
}
