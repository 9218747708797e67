#![forbid(unsafe_code)]

mod config;

use config::{Command, RunnerConfig};
use rp_core::entity::EntityType;
use rp_storage::{SqliteStore, StoreError};
use rp_sync::{
    CancelToken, EntitySynchronizer, HttpSource, Orchestrator, RunOutcome, RunReport, SourceError,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("data source: {0}")]
    Source(#[from] SourceError),
    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}

impl RunError {
    /// Configuration problems exit with 2, like argument errors.
    fn exit_code(&self) -> i32 {
        match self {
            Self::Source(SourceError::Config(_)) => 2,
            Self::Store(err) if err.is_invalid_input() => 2,
            _ => 1,
        }
    }
}

#[derive(Serialize)]
struct CheckpointLine {
    entity: &'static str,
    cursor: i64,
    updated_at_ms: Option<i64>,
}

#[derive(Serialize)]
struct StatusOutput {
    storage_dir: String,
    checkpoints: Vec<CheckpointLine>,
}

#[derive(Serialize)]
struct EntityLine {
    entity: &'static str,
    pages: u64,
    fetched: u64,
    processed: u64,
    record_failures: u64,
    page_failures: u64,
    cursor: i64,
}

#[derive(Serialize)]
struct ReportOutput {
    outcome: &'static str,
    rounds: u32,
    entities: Vec<EntityLine>,
}

fn status_output(store: &SqliteStore) -> Result<StatusOutput, StoreError> {
    let rows = store.checkpoint_list()?;
    let checkpoints = EntityType::ALL
        .into_iter()
        .map(|entity| {
            let row = rows.iter().find(|row| row.entity == entity);
            CheckpointLine {
                entity: entity.as_str(),
                cursor: row.map_or(0, |row| row.cursor.get()),
                updated_at_ms: row.map(|row| row.updated_at_ms),
            }
        })
        .collect();
    Ok(StatusOutput {
        storage_dir: store.storage_dir().display().to_string(),
        checkpoints,
    })
}

fn report_output(report: &RunReport) -> ReportOutput {
    ReportOutput {
        outcome: match report.outcome {
            RunOutcome::Converged => "converged",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::RoundLimit => "round_limit",
        },
        rounds: report.rounds,
        entities: report
            .entities
            .iter()
            .map(|stats| EntityLine {
                entity: stats.entity.as_str(),
                pages: stats.pages,
                fetched: stats.fetched,
                processed: stats.processed,
                record_failures: stats.record_failures,
                page_failures: stats.page_failures,
                cursor: stats.checkpoint.get(),
            })
            .collect(),
    }
}

fn print_status(status: &StatusOutput) {
    println!("storage: {}", status.storage_dir);
    for line in &status.checkpoints {
        match line.updated_at_ms {
            Some(updated_at_ms) => println!(
                "{:<11} cursor={:<16} updated_at_ms={updated_at_ms}",
                line.entity, line.cursor
            ),
            None => println!("{:<11} cursor={:<16} (never synced)", line.entity, line.cursor),
        }
    }
}

fn print_report(report: &ReportOutput) {
    println!("outcome: {} after {} round(s)", report.outcome, report.rounds);
    for line in &report.entities {
        println!(
            "{:<11} pages={} fetched={} processed={} record_failures={} page_failures={} cursor={}",
            line.entity,
            line.pages,
            line.fetched,
            line.processed,
            line.record_failures,
            line.page_failures,
            line.cursor
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RunError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Stops the run between pages once `max_runtime` has elapsed.
fn spawn_deadline(cancel: &CancelToken, max_runtime: Duration) {
    let cancel = cancel.clone();
    std::thread::spawn(move || {
        std::thread::sleep(max_runtime);
        log::info!("max runtime reached, stopping after the current page");
        cancel.cancel();
    });
}

fn run(cfg: RunnerConfig) -> Result<(), RunError> {
    if cfg.status_only {
        let store = SqliteStore::open(&cfg.storage_dir)?;
        let status = status_output(&store)?;
        if cfg.json {
            print_json(&status)?;
        } else {
            print_status(&status);
        }
        return Ok(());
    }

    // Validate the source before touching the store or starting a round.
    let source = HttpSource::new(cfg.http_source_config())?;
    let store = SqliteStore::open(&cfg.storage_dir)?;
    log::info!(
        "syncing {:?} into {}",
        cfg.entities,
        store.storage_dir().display()
    );

    let cancel = CancelToken::new();
    if let Some(max_runtime_s) = cfg.max_runtime_s {
        spawn_deadline(&cancel, Duration::from_secs(max_runtime_s));
    }

    let mut orchestrator =
        Orchestrator::new(EntitySynchronizer::new(source, store)).with_max_rounds(cfg.max_rounds);
    let report = orchestrator.run_to_convergence(&cfg.entities, &cancel);
    let output = report_output(&report);
    if cfg.json {
        print_json(&output)?;
    } else {
        print_report(&output);
    }
    if report.outcome != RunOutcome::Converged {
        log::warn!("run ended before convergence; the next run resumes from the checkpoints");
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match config::parse_args() {
        Ok(Command::Help) => {
            print!("{}", config::usage());
            return;
        }
        Ok(Command::Run(cfg)) => cfg,
        Err(err) => {
            eprintln!("{err}\n\n{}", config::usage());
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cfg) {
        log::error!("{err}");
        std::process::exit(err.exit_code());
    }
}
