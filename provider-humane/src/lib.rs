//! # Humane Center Provider
//!
//! Implements the `ContentService` trait over the capture REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Paginated capture listing, newest first
//! - Single memory lookup by identifier
//! - Asset downloads with per-file access tokens
//! - Exponential backoff for rate limiting and server errors

pub mod connector;
pub mod error;
pub mod types;

pub use connector::HumaneCenterConnector;
pub use error::{HumaneError, Result};
pub use types::PageableContentEnvelope;
