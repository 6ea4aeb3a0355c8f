//! Security module for mendbot — command policy, path filtering, and secret
//! redaction.
//!
//! Provides:
//! - **Policy**: the deny-then-allow gates guarding the command tool
//! - **Path filtering**: hidden/artifact exclusion for directory listings
//! - **Secrets**: token masking for anything that reaches a log line
//!
//! The policy is a tripwire against accidental foot-guns, not a sandbox:
//! substring checks cannot catch quoting tricks, and an allowed program
//! still runs with the process's full privileges. The allow-list is the
//! primary gate.

pub mod path;
pub mod policy;
pub mod secrets;

pub use path::is_excluded;
pub use policy::{CommandPolicy, PolicyViolation};
pub use secrets::{leaks_any, redact};
