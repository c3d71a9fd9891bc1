//! # Confirmation Gate
//!
//! Operations that change or remove remote state declare a [`ConfirmImpact`].
//! Before such an operation is dispatched the pipeline asks a
//! [`ConfirmationGate`] whether to go ahead. A declined confirmation ends the
//! invocation without a remote call and without an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::Mutex;

/// How disruptive an operation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmImpact {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfirmImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfirmImpact::None => "none",
            ConfirmImpact::Low => "low",
            ConfirmImpact::Medium => "medium",
            ConfirmImpact::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown confirm impact '{0}' (expected none, low, medium or high)")]
pub struct ParseImpactError(String);

impl FromStr for ConfirmImpact {
    type Err = ParseImpactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ConfirmImpact::None),
            "low" => Ok(ConfirmImpact::Low),
            "medium" => Ok(ConfirmImpact::Medium),
            "high" => Ok(ConfirmImpact::High),
            _ => Err(ParseImpactError(s.to_string())),
        }
    }
}

/// What the gate is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub operation: &'static str,
    pub target: String,
    pub impact: ConfirmImpact,
}

impl fmt::Display for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on '{}' (impact: {})", self.operation, self.target, self.impact)
    }
}

/// Decides whether a state-changing operation may proceed.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        true
    }
}

/// Declines everything. Used for non-interactive runs without `--force`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

impl ConfirmationGate for AutoDecline {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        false
    }
}

/// Asks on `output` and reads a `y`/`yes` answer from `input`.
///
/// Anything else, including end of input or an I/O error, declines.
pub struct PromptGate<R, W> {
    io: Mutex<(R, W)>,
}

impl<R, W> PromptGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }
}

impl<R, W> ConfirmationGate for PromptGate<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&self, request: &ConfirmRequest) -> bool {
        let Ok(mut io) = self.io.lock() else {
            return false;
        };
        let (input, output) = &mut *io;
        if write!(output, "Perform {request}? [y/N] ")
            .and_then(|_| output.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}
