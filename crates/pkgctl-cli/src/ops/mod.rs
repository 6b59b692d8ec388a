//! Operation handlers (spec §4.9, C9). Each module implements one row of
//! the operation table and returns the process exit code (spec §7).

pub mod database;
pub mod deptest;
pub mod files;
pub mod query;
pub mod remove;
pub mod sync;
pub mod upgrade;

use crate::config::Config;
use pkgctl_core::{Backend, Callbacks};
use std::sync::Arc;

/// Shared read-only context every handler runs against.
pub struct OpContext<'a> {
    pub config: &'a Config,
    pub backend: &'a dyn Backend,
    pub callbacks: Arc<dyn Callbacks>,
}

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_INVALID: i32 = 2;
