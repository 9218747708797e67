#![forbid(unsafe_code)]
#![allow(dead_code)]

use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use rp_sync::{CancelToken, DataSource, Page, SourceError};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("rp_sync_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[derive(Clone, Copy, Debug)]
enum Failure {
    Transport,
    Decode,
}

impl Failure {
    fn error(self) -> SourceError {
        match self {
            Self::Transport => SourceError::Transport("connection refused".to_string()),
            Self::Decode => SourceError::Decode("expected value at line 1 column 1".to_string()),
        }
    }
}

/// In-memory provider: serves the stored records after the requested cursor,
/// `page_size` at a time, with optional injected fetch failures.
pub struct ScriptedSource {
    records: HashMap<EntityType, Vec<Value>>,
    page_size: usize,
    failures: Mutex<HashMap<EntityType, (usize, Failure)>>,
    calls: Mutex<Vec<(EntityType, Cursor)>>,
    cancel_on_call: Option<(usize, CancelToken)>,
}

impl ScriptedSource {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: HashMap::new(),
            page_size,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            cancel_on_call: None,
        }
    }

    pub fn with_records(mut self, entity: EntityType, records: Vec<Value>) -> Self {
        self.records.insert(entity, records);
        self
    }

    /// The next `count` fetches of `entity` fail with a transport error.
    pub fn failing(self, entity: EntityType, count: usize) -> Self {
        self.inject(entity, count, Failure::Transport)
    }

    /// The next `count` fetches of `entity` return a body that does not decode.
    pub fn undecodable(self, entity: EntityType, count: usize) -> Self {
        self.inject(entity, count, Failure::Decode)
    }

    fn inject(self, entity: EntityType, count: usize, failure: Failure) -> Self {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(entity, (count, failure));
        self
    }

    /// Cancels `token` while serving the `call`-th fetch (1-based).
    pub fn cancelling_on_call(mut self, call: usize, token: CancelToken) -> Self {
        self.cancel_on_call = Some((call, token));
        self
    }

    pub fn calls(&self) -> Vec<(EntityType, Cursor)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl DataSource for ScriptedSource {
    fn fetch_page(&self, entity: EntityType, after: Cursor) -> Result<Page, SourceError> {
        let call = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push((entity, after));
            calls.len()
        };
        if let Some((at, token)) = &self.cancel_on_call {
            if *at == call {
                token.cancel();
            }
        }

        {
            let mut failures = self.failures.lock().expect("failures lock");
            if let Some((remaining, failure)) = failures.get_mut(&entity) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(failure.error());
                }
            }
        }

        let field = entity.cursor_field();
        let records = self
            .records
            .get(&entity)
            .map(|all| {
                all.iter()
                    .filter(|record| {
                        record[field]
                            .as_i64()
                            .is_some_and(|cursor| cursor > after.get())
                    })
                    .take(self.page_size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Page { records })
    }
}
