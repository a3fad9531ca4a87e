use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use project_pulse::alert::engine::evaluate_alerts;
use project_pulse::alert::rules::AlertEventKind;
use project_pulse::alert::sink::{AlertSink, StdoutSink, WebhookSink};
use project_pulse::config::{Config, ConfigOverrides};
use project_pulse::evm::history::summarize_timeline;
use project_pulse::evm::EvmSummary;
use project_pulse::output::csv::{dashboard_to_csv, history_to_csv};
use project_pulse::output::json::render_json;
use project_pulse::output::table::{
    render_critical_path_table, render_dashboard_table, render_evm_table, render_history_table,
    render_score_table, render_wbs_table,
};
use project_pulse::portfolio::metrics::{refresh_activity, refresh_project};
use project_pulse::portfolio::scoring::{activity_breakdown, project_breakdown};
use project_pulse::portfolio::{sample_portfolio, PerformanceDashboard};
use project_pulse::server::{compute_and_store_dashboard, compute_and_store_evm, run_server};
use project_pulse::store::PortfolioStore;
use project_pulse::wbs::critical_path::compute_critical_path;
use project_pulse::wbs::sample_forest;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScoreKind {
    Activity,
    Project,
}

#[derive(Debug, Parser)]
#[command(
    name = "project-pulse",
    about = "Portfolio performance and schedule intelligence"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Organizational unit to scope to; overrides the config default.
    #[arg(short, long)]
    unit: Option<String>,
    #[arg(long)]
    db: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Roll the portfolio up into the organization dashboard.
    Dashboard,
    /// Compute and record an EVM sample for a project.
    Evm {
        #[arg(short, long)]
        project: String,
        /// Measurement date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show a project's recorded EVM sample history.
    History {
        #[arg(short, long)]
        project: String,
    },
    /// Compute the critical path over a project's WBS.
    CriticalPath {
        #[arg(short, long)]
        project: String,
    },
    /// Print a project's work breakdown structure.
    Wbs {
        #[arg(short, long)]
        project: String,
    },
    /// Explain the point score of an activity or project.
    Score {
        #[arg(value_enum)]
        kind: ScoreKind,
        id: String,
    },
    /// Recompute the dashboard on an interval and deliver alerts.
    Watch {
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
        #[arg(long, default_value_t = 1)]
        iterations: u32,
    },
    /// Populate the store with a demo portfolio and WBS.
    Seed,
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        unit: cli.unit.clone(),
        db_path: cli.db.clone(),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let store = PortfolioStore::open(&config.resolved_db_path())?;

    match &cli.command {
        Commands::Dashboard => {
            let dashboard = compute_and_store_dashboard(&store, config.unit_filter())?;
            print_dashboard(&dashboard, cli.output)?;
        }
        Commands::Evm { project, as_of } => {
            let as_of = parse_date(as_of.as_deref())?;
            let summary = compute_and_store_evm(&store, project, as_of)?;
            print_evm(&summary, cli.output)?;
        }
        Commands::History { project } => {
            let samples = store.load_evm_history(project)?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_history_table(&samples));
                    println!("{}", summarize_timeline(&samples));
                }
                OutputFormat::Json => println!("{}", render_json(&samples)?),
                OutputFormat::Csv => println!("{}", history_to_csv(&samples)?),
            }
        }
        Commands::CriticalPath { project } => {
            let forest = store
                .load_wbs(project)?
                .ok_or_else(|| anyhow!("no WBS stored for project: {project}"))?;
            let result = compute_critical_path(&forest);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_critical_path_table(&result, &forest))
                }
                OutputFormat::Json => println!("{}", render_json(&result)?),
                OutputFormat::Csv => {
                    warn!("CSV output for critical-path not implemented, using JSON");
                    println!("{}", render_json(&result)?);
                }
            }
        }
        Commands::Wbs { project } => {
            let forest = store
                .load_wbs(project)?
                .ok_or_else(|| anyhow!("no WBS stored for project: {project}"))?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_wbs_table(&forest)),
                OutputFormat::Json => println!("{}", render_json(&forest)?),
                OutputFormat::Csv => {
                    warn!("CSV output for wbs not implemented, using JSON");
                    println!("{}", render_json(&forest)?);
                }
            }
        }
        Commands::Score { kind, id } => {
            let (label, breakdown) = match kind {
                ScoreKind::Activity => {
                    let activity = store
                        .load_activities(None)?
                        .into_iter()
                        .find(|a| a.id == *id)
                        .ok_or_else(|| anyhow!("unknown activity: {id}"))?;
                    (activity.name.clone(), activity_breakdown(&activity))
                }
                ScoreKind::Project => {
                    let project = store
                        .load_projects(None)?
                        .into_iter()
                        .find(|p| p.id == *id)
                        .ok_or_else(|| anyhow!("unknown project: {id}"))?;
                    (project.name.clone(), project_breakdown(&project))
                }
            };
            match cli.output {
                OutputFormat::Table => println!("{}", render_score_table(&label, &breakdown)),
                OutputFormat::Json => println!("{}", render_json(&breakdown)?),
                OutputFormat::Csv => {
                    warn!("CSV output for score not implemented, using JSON");
                    println!("{}", render_json(&breakdown)?);
                }
            }
        }
        Commands::Watch {
            interval_secs,
            iterations,
        } => {
            run_watch_loop(&store, &config, *interval_secs, *iterations).await?;
        }
        Commands::Seed => {
            seed_store(&store)?;
            println!("Seeded demo portfolio: 3 activities, 2 projects, 1 WBS tree.");
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map_err(|e| anyhow!("invalid date '{raw}': {e}")),
        None => Ok(Utc::now().date_naive()),
    }
}

fn seed_store(store: &PortfolioStore) -> Result<()> {
    let (activities, projects) = sample_portfolio();
    let as_of = Utc::now().date_naive();
    for activity in &activities {
        store.upsert_activity(&refresh_activity(activity))?;
    }
    for project in &projects {
        store.upsert_project(&refresh_project(project, as_of))?;
    }
    store.save_wbs("proj-dc-migration", &sample_forest())?;
    Ok(())
}

async fn run_watch_loop(
    store: &PortfolioStore,
    config: &Config,
    interval_secs: u64,
    iterations: u32,
) -> Result<()> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if config.alerts.enable_stdout {
        sinks.push(Box::new(StdoutSink));
    }
    if !config.alerts.webhook.trim().is_empty() {
        sinks.push(Box::new(WebhookSink::new(config.alerts.webhook.clone())));
    }

    let interval = Duration::from_secs(interval_secs.max(1));
    let scope = config.unit_filter().unwrap_or("all").to_string();
    let total_iterations = iterations.max(1);

    for i in 0..total_iterations {
        info!("watch iteration {}", i + 1);
        let previous = store.load_dashboard(&scope)?;
        let current = compute_and_store_dashboard(store, config.unit_filter())?;

        let alerts = apply_alert_rules(evaluate_alerts(previous.as_ref(), &current), config);
        for alert in &alerts {
            for sink in &sinks {
                if let Err(err) = sink.send(alert).await {
                    warn!("failed sending alert: {err}");
                }
            }
        }

        if i + 1 < total_iterations {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(())
}

fn apply_alert_rules(
    alerts: Vec<project_pulse::alert::engine::AlertEvent>,
    config: &Config,
) -> Vec<project_pulse::alert::engine::AlertEvent> {
    alerts
        .into_iter()
        .filter(|event| match event.kind {
            AlertEventKind::StalledActivities => config.alerts.rules.stalled_activities,
            AlertEventKind::CriticalProjects => config.alerts.rules.critical_projects,
            AlertEventKind::OverloadedResources => config.alerts.rules.overloaded_resources,
            AlertEventKind::ScoreDrop => config.alerts.rules.score_drop,
        })
        .collect()
}

fn print_dashboard(dashboard: &PerformanceDashboard, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_dashboard_table(dashboard)),
        OutputFormat::Json => println!("{}", render_json(dashboard)?),
        OutputFormat::Csv => println!("{}", dashboard_to_csv(dashboard)?),
    }
    Ok(())
}

fn print_evm(summary: &EvmSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_evm_table(summary)),
        OutputFormat::Json => println!("{}", render_json(summary)?),
        OutputFormat::Csv => {
            warn!("CSV output for evm not implemented, using JSON");
            println!("{}", render_json(summary)?);
        }
    }
    Ok(())
}
