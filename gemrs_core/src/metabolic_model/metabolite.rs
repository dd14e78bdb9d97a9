//! This module provides the metabolite struct representing a metabolite, and chemical formula
//! parsing used for elemental accounting
use std::hash::Hash;
use std::sync::LazyLock;

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use thiserror::Error;

use crate::metabolic_model::annotation::{impl_annotatable, Annotation};

static FORMULA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z][a-z]*[0-9]*)+$").unwrap());

static ELEMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]*)([0-9]*)").unwrap());

/// Represents a metabolite
///
/// Formula, charge and compartment changes affect the balance of every reaction the
/// metabolite takes part in, so they are only changed through the owning
/// [`Model`](crate::metabolic_model::model::Model).
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    #[builder(setter(into))]
    id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    compartment: Option<String>,
    /// Electrical charge of the Metabolite, `None` if unknown
    #[builder(default = "Some(0)")]
    charge: Option<i32>,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    formula: Option<String>,
    /// Free text comment
    #[builder(default = "None")]
    pub comment: Option<String>,
    /// Metabolite annotations
    #[builder(default = "IndexSet::new()")]
    pub annotation: IndexSet<Annotation>,
}

impl_annotatable!(Metabolite);

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // Hash only depends on id
    }
}

impl Metabolite {
    /// Create a new metabolite with only an id
    pub fn new_id_only(id: &str) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: Some(0),
            formula: None,
            comment: None,
            annotation: IndexSet::new(),
        }
    }

    /// Create a new metabolite
    pub fn new(
        id: &str,
        name: Option<&str>,
        compartment: Option<&str>,
        formula: Option<&str>,
        charge: Option<i32>,
    ) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: name.map(str::to_string),
            compartment: compartment.map(str::to_string),
            charge,
            formula: formula.map(str::to_string),
            comment: None,
            annotation: IndexSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn compartment(&self) -> Option<&str> {
        self.compartment.as_deref()
    }

    pub fn charge(&self) -> Option<i32> {
        self.charge
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Element counts of the formula.
    ///
    /// `None` if the metabolite has no formula or the formula is not valid.
    pub fn elements(&self) -> Option<IndexMap<String, f64>> {
        self.formula.as_deref().and_then(|f| parse_formula(f).ok())
    }

    pub(crate) fn set_formula(&mut self, formula: Option<String>) {
        self.formula = formula.filter(|f| !f.is_empty());
    }

    pub(crate) fn set_charge(&mut self, charge: Option<i32>) {
        self.charge = charge;
    }

    pub(crate) fn set_compartment(&mut self, compartment: Option<String>) {
        self.compartment = compartment;
    }
}

/// Check whether a string is an acceptable chemical formula, e.g. `C6H12O6`
pub fn is_valid_formula(formula: &str) -> bool {
    FORMULA_PATTERN.is_match(formula)
}

/// Parse a chemical formula into a map of element to count
///
/// # Examples
/// ```rust
/// use gemrs_core::metabolic_model::metabolite::parse_formula;
/// let elements = parse_formula("C6H12O6").unwrap();
/// assert_eq!(elements["C"], 6.);
/// assert_eq!(elements["H"], 12.);
/// ```
pub fn parse_formula(formula: &str) -> Result<IndexMap<String, f64>, FormulaError> {
    if !is_valid_formula(formula) {
        return Err(FormulaError::InvalidFormula(formula.to_string()));
    }
    let mut elements: IndexMap<String, f64> = IndexMap::new();
    for capture in ELEMENT_PATTERN.captures_iter(formula) {
        let count = match &capture[2] {
            "" => 1.,
            digits => digits
                .parse::<f64>()
                .map_err(|_| FormulaError::InvalidFormula(formula.to_string()))?,
        };
        *elements.entry(capture[1].to_string()).or_insert(0.) += count;
    }
    Ok(elements)
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("'{0}' is not a valid chemical formula")]
    InvalidFormula(String),
}
