//! CLI subcommand implementations.

pub mod review;
pub mod run;
pub mod serve;
