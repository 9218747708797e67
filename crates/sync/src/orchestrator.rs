#![forbid(unsafe_code)]

use crate::source::DataSource;
use crate::synchronizer::{EntitySynchronizer, PageReport};
use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop signal, checked between pages and between rounds.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// A full round advanced no checkpoint.
    Converged,
    Cancelled,
    RoundLimit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityStats {
    pub entity: EntityType,
    pub pages: u64,
    pub fetched: u64,
    pub processed: u64,
    pub record_failures: u64,
    pub page_failures: u64,
    pub checkpoint: Cursor,
}

impl EntityStats {
    fn new(entity: EntityType) -> Self {
        Self {
            entity,
            pages: 0,
            fetched: 0,
            processed: 0,
            record_failures: 0,
            page_failures: 0,
            checkpoint: Cursor::BEGINNING,
        }
    }

    fn record_page(&mut self, report: &PageReport) {
        self.pages += 1;
        self.fetched += report.fetched as u64;
        self.processed += report.processed as u64;
        self.record_failures += report.failures.len() as u64;
        self.checkpoint = report.checkpoint_after;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub rounds: u32,
    pub outcome: RunOutcome,
    pub entities: Vec<EntityStats>,
}

impl RunReport {
    pub fn stats(&self, entity: EntityType) -> Option<&EntityStats> {
        self.entities.iter().find(|stats| stats.entity == entity)
    }

    pub fn total_processed(&self) -> u64 {
        self.entities.iter().map(|stats| stats.processed).sum()
    }
}

/// Drives every entity type one page per round until nothing moves.
#[derive(Debug)]
pub struct Orchestrator<S> {
    synchronizer: EntitySynchronizer<S>,
    max_rounds: Option<u32>,
}

impl<S: DataSource> Orchestrator<S> {
    pub fn new(synchronizer: EntitySynchronizer<S>) -> Self {
        Self {
            synchronizer,
            max_rounds: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn synchronizer(&self) -> &EntitySynchronizer<S> {
        &self.synchronizer
    }

    /// Runs rounds over `entities` (in the given order, duplicates dropped).
    ///
    /// A round gives every entity type one page. The run converges after the
    /// first round in which no checkpoint advanced. A failed page only costs
    /// its own entity type that round; the others still take their turn.
    pub fn run_to_convergence(
        &mut self,
        entities: &[EntityType],
        cancel: &CancelToken,
    ) -> RunReport {
        let mut order: Vec<EntityType> = Vec::with_capacity(entities.len());
        for entity in entities {
            if !order.contains(entity) {
                order.push(*entity);
            }
        }
        let mut stats: Vec<EntityStats> = order.iter().copied().map(EntityStats::new).collect();

        let mut rounds = 0u32;
        let outcome = loop {
            if cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            if self.max_rounds.is_some_and(|max| rounds >= max) {
                break RunOutcome::RoundLimit;
            }
            rounds += 1;

            let mut progress = false;
            for stat in stats.iter_mut() {
                if cancel.is_cancelled() {
                    break;
                }
                match self.synchronizer.sync_next_page(stat.entity) {
                    Ok(report) => {
                        progress |= report.advanced;
                        stat.record_page(&report);
                    }
                    Err(err) => {
                        stat.page_failures += 1;
                        log::warn!("round {rounds}: {err}");
                    }
                }
            }

            if cancel.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            if !progress {
                break RunOutcome::Converged;
            }
            log::debug!("round {rounds} made progress");
        };

        let report = RunReport {
            rounds,
            outcome,
            entities: stats,
        };
        log::info!(
            "sync finished: {:?} after {} round(s), {} record(s) processed",
            report.outcome,
            report.rounds,
            report.total_processed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
