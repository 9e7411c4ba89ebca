use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use staged_deletion::{
    Calendar, Clock, DeletionRecord, DeletionStatus, DeletionWorkflow, InMemoryRecordStore,
    InMemoryResources, InMemoryWorkflow, Interval, MailOutbox, RecordStore, ResourceId,
    SystemClock, WorkflowConfig, spawn_sweep_worker,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "staged-deletion")]
#[command(about = "Inspect and simulate the staged deletion workflow")]
struct Cli {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize an interval such as "3 weeks" or "P1M"
    Interval { text: String },
    /// Print the effective configuration as JSON
    Config,
    /// Show the projected phase dates of a record
    Timeline {
        #[arg(long)]
        status: DeletionStatus,
        /// End date as YYYY-MM-DD
        #[arg(long)]
        end_date: NaiveDate,
    },
    /// Run the sweep once a day against in-memory resources
    Simulate {
        #[arg(long, default_value_t = 5)]
        resources: u64,
        #[arg(long, default_value_t = 120)]
        days: u32,
        /// First simulated day as YYYY-MM-DD; today when omitted
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Days between the end dates of consecutive resources
        #[arg(long, default_value_t = 7)]
        spacing: i32,
    },
    /// Run the sweep worker on the wall clock until interrupted
    Run {
        #[arg(long, default_value_t = 3)]
        resources: u64,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Command::Interval { text } => {
            let interval: Interval = text.parse()?;
            println!(
                "{} ({} months, {} days)",
                interval,
                interval.month_component(),
                interval.day_component()
            );
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Timeline { status, end_date } => timeline(&config, status, end_date),
        Command::Simulate {
            resources,
            days,
            start,
            spacing,
        } => simulate(&config, resources, days, start, spacing).await,
        Command::Run {
            resources,
            duration_secs,
        } => run(&config, resources, duration_secs.map(Duration::from_secs)).await,
    }
}

async fn load_config(path: Option<&Path>) -> Result<WorkflowConfig> {
    match path {
        Some(path) => WorkflowConfig::load(path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(WorkflowConfig::default()),
    }
}

fn timeline(config: &WorkflowConfig, status: DeletionStatus, end_date: NaiveDate) -> Result<()> {
    let policy = config.policy()?;
    let calendar = policy.calendar();
    let record = DeletionRecord::new(ResourceId(0), calendar.date_start(end_date)?, status);
    let timeline = policy.timeline(&record)?;

    let show = |at: Option<DateTime<Utc>>| {
        at.map(|at| calendar.format_date(at))
            .unwrap_or_else(|| "-".to_string())
    };
    println!("status:       {}", status);
    println!("notification: {}", show(timeline.notification));
    println!("staging:      {}", show(timeline.staging));
    println!("deletion:     {}", show(timeline.deletion));
    Ok(())
}

async fn simulate(
    config: &WorkflowConfig,
    resource_count: u64,
    days: u32,
    start: Option<NaiveDate>,
    spacing: i32,
) -> Result<()> {
    let calendar = Calendar::from_offset_minutes(config.utc_offset_minutes)?;
    let start = match start {
        Some(date) => calendar.date_start(date)?,
        None => calendar.start_of_day(SystemClock.now())?,
    };
    let harness = InMemoryWorkflow::starting_at(config, start)?;
    let workflow = &harness.workflow;

    for index in 0..resource_count {
        let id = harness.resources.create(format!("resource-{}", index + 1)).await;
        let offset = i32::try_from(index)
            .ok()
            .and_then(|index| index.checked_mul(spacing))
            .ok_or_else(|| anyhow!("resource spacing overflows"))?;
        let end_date = calendar.shift(start, Interval::days(offset))?;
        harness
            .store
            .upsert(DeletionRecord::new(id, end_date, DeletionStatus::Scheduled))
            .await?;
    }

    for _ in 0..days {
        let now = harness.clock.now();
        let report = workflow.sweep().await?;
        if report.transitions() > 0 || !report.is_clean() {
            println!(
                "{}: notified {}, staged {}, deleted {}, restored {}, failed {}",
                calendar.format_date(now),
                report.notified,
                report.staged,
                report.deleted,
                report.restored,
                report.failures.len()
            );
        }
        harness.clock.advance(&calendar, Interval::days(1))?;
    }

    println!();
    println!("remaining records:");
    for record in harness.store.list_all().await? {
        println!(
            "  {:>4}  {:<20}  {}",
            record.resource_id.0,
            record.status,
            calendar.format_date(record.end_date)
        );
    }
    println!("mails sent: {}", harness.outbox.sent().await.len());
    Ok(())
}

async fn run(config: &WorkflowConfig, resource_count: u64, duration: Option<Duration>) -> Result<()> {
    let store = Arc::new(InMemoryRecordStore::new());
    let resources = Arc::new(InMemoryResources::new(config.staging_area.clone()));
    let outbox = Arc::new(MailOutbox::new());
    let workflow = Arc::new(DeletionWorkflow::new(
        config.policy()?,
        store.clone(),
        resources.clone(),
        outbox.clone(),
        Arc::new(SystemClock),
    ));

    let now = workflow.now();
    for index in 0..resource_count {
        let id = resources.create(format!("resource-{}", index + 1)).await;
        store
            .upsert(DeletionRecord::new(id, now, DeletionStatus::Scheduled))
            .await?;
    }

    println!(
        "sweeping every {}s, staging area '{}'",
        config.sweep_interval_secs,
        resources.staging_area()
    );
    let worker = spawn_sweep_worker(workflow, config.sweep_interval_duration());

    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?,
    }

    let runs = worker.stop().await?;
    println!("sweeps run: {}", runs);
    for record in store.list_all().await? {
        println!("  {:>4}  {}", record.resource_id.0, record.status);
    }
    println!("mails sent: {}", outbox.sent().await.len());
    Ok(())
}
