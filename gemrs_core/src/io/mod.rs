//! Module for reading and writing Models
use std::fmt::{Display, Formatter};

use log::warn;
use thiserror::Error;

use crate::metabolic_model::model::Model;

pub mod gpr_parse;
pub mod json;
pub mod sbml;

/// Recoverable problem with a single record of a document.
///
/// The offending value is dropped or replaced by a default and reading continues.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Warning {
    #[error("Malformed gene reaction rule '{rule}', read as an OR of its genes")]
    MalformedGeneRule { rule: String },
    #[error("Metabolite '{metabolite}' has an invalid formula '{formula}', formula dropped")]
    InvalidFormula { metabolite: String, formula: String },
    #[error("Reaction '{reaction}' references undeclared gene product '{gene}', gene created")]
    UnknownGeneProduct { reaction: String, gene: String },
    #[error("Annotation '{uri}' of '{element}' does not resolve through identifiers.org, skipped")]
    UnresolvableAnnotation { element: String, uri: String },
    #[error("Reaction '{reaction}' has no {bound} flux bound, default used")]
    MissingFluxBound { reaction: String, bound: String },
    #[error("Objective references unknown reaction '{reaction}', skipped")]
    UnknownObjectiveReaction { reaction: String },
    #[error("'{element}' links unknown reference '{reference}', link dropped")]
    UnknownReference { element: String, reference: String },
}

/// Warnings collected while processing a document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Document (or element) the warnings refer to
    path: Option<String>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: &str) -> Self {
        Diagnostics {
            path: Some(path.to_string()),
            warnings: Vec::new(),
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Record a warning, it is logged as it is recorded
    pub fn warn(&mut self, warning: Warning) {
        match &self.path {
            Some(path) => warn!("{}: {}", path, warning),
            None => warn!("{}", warning),
        }
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Take over the warnings of `other`
    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            writeln!(f, "{}:", path)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }
        Ok(())
    }
}

/// Observer of a long running read or write.
///
/// Progress is reported per top level list, the cancellation flag is checked between records.
pub trait Progress {
    fn set_label(&mut self, _label: &str) {}

    fn set_range(&mut self, _min: usize, _max: usize) {}

    fn set_value(&mut self, _value: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Progress sink that ignores every update and never cancels
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Whether a read or write ran to the end
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Completion {
    Complete,
    /// Stopped at a record boundary on request, the result is partial and must be discarded
    Cancelled,
}

/// Model read from a document together with the warnings raised while reading it
#[derive(Debug)]
pub struct ReadOutcome {
    pub model: Model,
    pub diagnostics: Diagnostics,
    pub completion: Completion,
}

impl ReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}
