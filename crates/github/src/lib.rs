//! GitHub integration for mendbot.

pub mod client;

pub use client::GithubClient;
