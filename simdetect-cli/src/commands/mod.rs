//! CLI command implementations.

pub mod common;
pub mod config;
pub mod detect;
pub mod filters;
