//! Front-end driver library: operation dispatch, config resolution,
//! transaction orchestration and the interactive terminal renderer
//! (spec §2).

pub mod args;
pub mod callbacks_impl;
pub mod config;
pub mod dbinfo;
pub mod driver;
pub mod ini;
pub mod multibar;
pub mod ops;
pub mod output;
pub mod signal;
pub mod term;
