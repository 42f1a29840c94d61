//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for the local capture store.
//!
//! - `CaptureRepository` - predicate-filtered fetch, keyed upsert, predicate
//!   delete, durable save, and browsing queries

pub mod capture;

pub use capture::{CaptureRepository, SqliteCaptureRepository};
