#![forbid(unsafe_code)]

//! Incremental, checkpointed pull of provider entities into the store.

mod error;
mod http;
mod orchestrator;
mod source;
mod synchronizer;

pub use error::{PageError, RecordError, RecordFailure};
pub use http::{DEFAULT_API_BASE, DEFAULT_TIMEOUT, HttpSource, HttpSourceConfig};
pub use orchestrator::{CancelToken, EntityStats, Orchestrator, RunOutcome, RunReport};
pub use source::{DataSource, Page, SourceError, decode_page};
pub use synchronizer::{EntitySynchronizer, PageReport};
