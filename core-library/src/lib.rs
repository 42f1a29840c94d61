//! # Capture Library Module
//!
//! Owns the local capture store: the durable mirror of the remote capture
//! collection that the sync engine reconciles on every pass.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - The [`CaptureRecord`](models::CaptureRecord) model
//! - Declarative predicates and browsing queries
//! - The [`CaptureRepository`](repositories::CaptureRepository) store contract

pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{library_filename, CaptureId, CaptureRecord, ProcessingStatus};
pub use query::{CaptureFilter, CapturePredicate, CaptureQuery, CaptureSort, SortOrder};
pub use repositories::{CaptureRepository, SqliteCaptureRepository};
