//! CLI subcommands

pub mod get;
pub mod serve;
pub mod tail;
