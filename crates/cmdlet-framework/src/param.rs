//! # Parameter Requirements
//!
//! Every bound parameter is an `Option<T>`: `None` means the caller never
//! supplied it, `Some(value)` means it was supplied (even when `value` is
//! `false`, `0` or empty). Operations mark some parameters as required through
//! a [`Requirements`] collector. A required parameter that is missing or blank
//! yields a [`Diagnostic`]; it never stops the invocation, the remote API has
//! the final say on validity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Values that can be bound but still carry nothing.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for &str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Blank for HashMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Blank for BTreeMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! never_blank {
    ($($t:ty),*) => {
        $(impl Blank for $t {
            fn is_blank(&self) -> bool {
                false
            }
        })*
    };
}

never_blank!(bool, i32, i64, u32, u64, f64);

/// What was wrong with a required parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Missing,
    Blank,
}

/// A non-fatal finding recorded while building an invocation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub parameter: &'static str,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Missing => {
                write!(f, "required parameter '{}' was not supplied", self.parameter)
            }
            DiagnosticKind::Blank => write!(
                f,
                "required parameter '{}' was supplied with an empty value",
                self.parameter
            ),
        }
    }
}

/// Collects diagnostics for required parameters.
#[derive(Debug, Default)]
pub struct Requirements {
    diagnostics: Vec<Diagnostic>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic if `value` is unbound or blank.
    pub fn require<T: Blank>(&mut self, parameter: &'static str, value: &Option<T>) -> &mut Self {
        let kind = match value {
            None => Some(DiagnosticKind::Missing),
            Some(v) if v.is_blank() => Some(DiagnosticKind::Blank),
            Some(_) => None,
        };
        if let Some(kind) = kind {
            self.diagnostics.push(Diagnostic { parameter, kind });
        }
        self
    }

    /// Records a diagnostic unless at least one of the grouped values is bound.
    ///
    /// Used for required parameters that arrive flattened into several
    /// optional fields (e.g. a destination split into To/Cc/Bcc lists).
    pub fn require_any(&mut self, parameter: &'static str, bound: &[bool]) -> &mut Self {
        if !bound.iter().any(|b| *b) {
            self.diagnostics.push(Diagnostic {
                parameter,
                kind: DiagnosticKind::Missing,
            });
        }
        self
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
