//! CLI subcommand modules.
//!
//! This module contains the implementations for all lastro CLI subcommands.

pub(crate) mod config;
pub(crate) mod growth;
pub(crate) mod multiples;
pub(crate) mod run;
