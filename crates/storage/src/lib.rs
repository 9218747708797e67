#![forbid(unsafe_code)]

//! SQLite persistence for the sync engine: reference-data resolution,
//! primary-entity writes and per-entity checkpoints.

mod store;

pub use store::*;
