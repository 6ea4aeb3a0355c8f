//! Command policy — the two gates every agent command passes before a
//! subprocess is spawned.
//!
//! Gate one is a deny-list of substrings, checked case-insensitively over
//! the whole command line. Gate two is an allow-list of program names,
//! matched exactly against the first whitespace-delimited token. Deny runs
//! first so a forbidden pattern is reported even when the program itself is
//! allowed.

/// Error returned when a command is rejected by policy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PolicyViolation {
    #[error("command contains forbidden pattern '{pattern}'")]
    ForbiddenPattern { pattern: String },

    #[error("program '{program}' is not in the allowed list")]
    ProgramNotAllowed { program: String },
}

/// The capability policy for the command tool.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    allowed_commands: Vec<String>,
    forbidden_patterns: Vec<String>,
}

impl CommandPolicy {
    pub fn new(allowed_commands: Vec<String>, forbidden_patterns: Vec<String>) -> Self {
        Self {
            allowed_commands,
            forbidden_patterns,
        }
    }

    /// Check one command line. `Ok(())` means both gates passed.
    ///
    /// An empty command has no leading program and fails the allow gate.
    pub fn check(&self, command: &str) -> Result<(), PolicyViolation> {
        let lowered = command.to_lowercase();
        for pattern in &self.forbidden_patterns {
            if lowered.contains(&pattern.to_lowercase()) {
                return Err(PolicyViolation::ForbiddenPattern {
                    pattern: pattern.clone(),
                });
            }
        }

        let program = command.split_whitespace().next().unwrap_or_default();
        if !self.allowed_commands.iter().any(|allowed| allowed == program) {
            return Err(PolicyViolation::ProgramNotAllowed {
                program: program.to_string(),
            });
        }

        Ok(())
    }
}
