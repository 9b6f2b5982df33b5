use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod db;
mod deadline;
mod error;
mod filters;
mod models;
mod priority;
mod reminders;
mod report;
mod snapshot;
mod stats;
mod upload;
mod view;

use config::AppConfig;
use deadline::DEFAULT_PRIORITY_LIMIT;
use filters::{CategorySelector, ViewState};
use models::{DocumentKind, EventFields, EventPatch, EventStatus};
use reminders::ReminderLedger;
use snapshot::{SnapshotHolder, SnapshotUpdate};

#[derive(Parser)]
#[command(name = "event-deadline-tracker")]
#[command(about = "Track registration deadlines for events you plan to attend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample events
    Seed,
    /// Import events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Add an event
    Add {
        #[arg(long)]
        name: String,
        /// Registration deadline (RFC 3339, YYYY-MM-DDTHH:MM or YYYY-MM-DD)
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        event_date: Option<NaiveDate>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<EventStatus>,
        /// Remind me when the deadline is a day away
        #[arg(long)]
        reminder: bool,
    },
    /// Change fields of an existing event
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        event_date: Option<NaiveDate>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<EventStatus>,
        #[arg(long)]
        reminder: Option<bool>,
    },
    /// Delete an event
    Delete { id: Uuid },
    /// List events for a category/status selection
    List {
        /// Category name, "all", or "priority" to sort by deadline
        #[arg(long, default_value = "all")]
        category: CategorySelector,
        #[arg(long, value_parser = parse_status)]
        status: Option<EventStatus>,
        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show summary counters
    Stats,
    /// Show the events that need action soonest
    Priority {
        #[arg(long, default_value_t = DEFAULT_PRIORITY_LIMIT)]
        limit: usize,
    },
    /// Print reminders for deadlines due within a day
    Remind,
    /// Upload a certificate or brochure and attach it to an event
    Attach {
        id: Uuid,
        #[arg(long, value_enum)]
        kind: DocumentKind,
        #[arg(long)]
        file: PathBuf,
    },
    /// Remove a certificate or brochure link from an event
    Detach {
        id: Uuid,
        #[arg(long, value_enum)]
        kind: DocumentKind,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "all")]
        category: CategorySelector,
        #[arg(long, value_parser = parse_status)]
        status: Option<EventStatus>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Keep refreshing events and fire reminders until interrupted
    Watch {
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
        #[arg(long, default_value = "all")]
        category: CategorySelector,
        #[arg(long, value_parser = parse_status)]
        status: Option<EventStatus>,
    },
}

fn parse_status(value: &str) -> Result<EventStatus, String> {
    EventStatus::parse(value).ok_or_else(|| "status must not be empty".to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn view_state(category: CategorySelector, status: Option<EventStatus>) -> ViewState {
    ViewState::default().with_category(category).with_status(status)
}

fn check_deadline(raw: &str) -> anyhow::Result<()> {
    if deadline::parse_deadline(raw).is_none() {
        anyhow::bail!("registration deadline '{raw}' is not a recognised date or timestamp");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} events from {}.", csv.display());
        }
        Commands::Add {
            name,
            deadline,
            category,
            source,
            event_date,
            link,
            notes,
            status,
            reminder,
        } => {
            check_deadline(&deadline)?;
            let fields = EventFields {
                name,
                category,
                source,
                event_date,
                registration_deadline: deadline,
                link,
                notes,
                status,
                reminder,
            };
            let event = db::create_event(&pool, &fields).await?;
            println!("Added {} ({}).", event.name, event.id);
        }
        Commands::Update {
            id,
            name,
            deadline,
            category,
            source,
            event_date,
            link,
            notes,
            status,
            reminder,
        } => {
            if let Some(raw) = &deadline {
                check_deadline(raw)?;
            }
            let patch = EventPatch {
                name,
                category,
                source,
                event_date,
                registration_deadline: deadline,
                link,
                notes,
                status,
                reminder,
                ..Default::default()
            };
            let event = db::update_event(&pool, id, patch).await?;
            println!("Updated {} ({}).", event.name, event.id);
        }
        Commands::Delete { id } => {
            db::delete_event(&pool, id).await?;
            println!("Deleted {id}.");
        }
        Commands::List {
            category,
            status,
            json,
        } => {
            let events = db::list_events(&pool).await?;
            let state = view_state(category, status);
            let visible = filters::apply_filters(&events, &state, Utc::now());

            if json {
                let records: Vec<_> = visible.iter().map(|entry| entry.event).collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if visible.is_empty() {
                println!("No events found.");
            } else {
                for entry in visible.iter() {
                    println!("- {} {}", entry.event.id, report::format_entry(entry));
                }
            }
        }
        Commands::Stats => {
            let events = db::list_events(&pool).await?;
            let stats = stats::compute_stats(&events, Utc::now());
            println!("Total events: {}", stats.total);
            println!("Urgent: {}", stats.urgent_count);
            println!("Registered: {}", stats.registered_count);
            println!("Certificates pending: {}", stats.pending_certificate_count);
        }
        Commands::Priority { limit } => {
            let events = db::list_events(&pool).await?;
            let ranked = priority::top_priority(&events, limit, Utc::now());

            if ranked.is_empty() {
                println!("Nothing pending.");
                return Ok(());
            }

            println!("Needs attention:");
            for (index, entry) in ranked.iter().enumerate() {
                println!("#{} {}", index + 1, report::format_entry(entry));
            }
        }
        Commands::Remind => {
            let events = db::list_events(&pool).await?;
            let mut ledger = ReminderLedger::new();
            let fired = reminders::check_reminders(&events, &mut ledger, Utc::now());

            if fired.is_empty() {
                println!("No reminders due.");
            }
            for reminder in fired {
                println!("🔔 {}", reminder.message);
            }
        }
        Commands::Attach { id, kind, file } => {
            let storage = upload::BlobStorage::new(config.storage()?.clone());
            let event = db::fetch_event(&pool, id).await?;
            let uploaded = storage
                .upload(&file, kind)
                .await
                .with_context(|| format!("upload failed; {} left unchanged", event.name))?;
            let event = db::update_event(&pool, id, EventPatch::attach(kind, uploaded.url)).await?;
            println!(
                "Attached {} to {}: {}",
                kind.folder(),
                event.name,
                kind.url_of(&event).unwrap_or_default()
            );
        }
        Commands::Detach { id, kind } => {
            let event = db::fetch_event(&pool, id).await?;
            if kind.url_of(&event).is_none() {
                println!("{} has no {} attached.", event.name, kind.folder());
                return Ok(());
            }
            db::update_event(&pool, id, EventPatch::clear(kind)).await?;
            println!("Removed {} from {}.", kind.folder(), event.name);
        }
        Commands::Report {
            category,
            status,
            out,
        } => {
            let events = db::list_events(&pool).await?;
            let state = view_state(category, status);
            let now = Utc::now();
            let dashboard = view::derive_dashboard(&events, &state, now, DEFAULT_PRIORITY_LIMIT);
            let report = report::build_report(&state, now, &dashboard);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch {
            interval_secs,
            category,
            status,
        } => {
            watch(&pool, view_state(category, status), interval_secs).await?;
        }
    }

    Ok(())
}

/// One session: the ledger lives for the lifetime of this loop.
async fn watch(pool: &PgPool, state: ViewState, interval_secs: u64) -> anyhow::Result<()> {
    let mut holder = SnapshotHolder::new();
    let mut ledger = ReminderLedger::new();
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));

    tracing::info!(interval_secs, category = %state.category, "watching for deadlines");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(reminded = ledger.len(), "watch stopped");
                return Ok(());
            }
        }

        let ticket = holder.begin_fetch();
        let result = db::list_events(pool).await;
        match holder.complete(ticket, result) {
            SnapshotUpdate::Applied { events } => tracing::debug!(events, "snapshot refreshed"),
            SnapshotUpdate::Failed if !holder.is_loaded() => continue,
            _ => {}
        }

        let now = Utc::now();
        let dashboard = view::derive_dashboard(holder.events(), &state, now, DEFAULT_PRIORITY_LIMIT);
        println!(
            "{} events, {} urgent, {} shown",
            dashboard.stats.total,
            dashboard.stats.urgent_count,
            dashboard.visible.len()
        );

        for reminder in reminders::check_reminders(holder.events(), &mut ledger, now) {
            println!("🔔 {}", reminder.message);
        }
    }
}
