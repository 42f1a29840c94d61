//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (currently `core-service`). Host applications can depend on
//! `pinsync-workspace` and enable `desktop-shims` to get the capture sync
//! service with the desktop bridge adapters wired in.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CaptureSyncService, CoreError};
