//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod execute;
pub(crate) mod lookup;
pub(crate) mod tools;
