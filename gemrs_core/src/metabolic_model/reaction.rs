//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};

use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::metabolic_model::annotation::{impl_annotatable, Annotation};
use crate::metabolic_model::balance::BalanceStatus;
use crate::metabolic_model::gene::Gpr;

/// Represents a reaction in the metabolic model
///
/// Stoichiometry, bounds and the gene association are changed through the owning
/// [`Model`](crate::metabolic_model::model::Model), which keeps the derived balance status and
/// the gene and metabolite indices consistent.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    id: String,
    /// Metabolite stoichiometry of the reaction, negative for substrates
    #[builder(default = "IndexMap::new()")]
    metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule to determine if reaction is active
    #[builder(default = "None")]
    gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "default_lower_bound()")]
    lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "default_upper_bound()")]
    upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Coefficient of the reaction in the objective function
    #[builder(default = "0.")]
    pub objective_coefficient: f64,
    /// Free text comment
    #[builder(default = "None")]
    pub comment: Option<String>,
    /// Reaction Annotations
    #[builder(default = "IndexSet::new()")]
    pub annotation: IndexSet<Annotation>,
    /// Charge and elemental balance, kept current by the model
    #[builder(setter(skip))]
    balance: BalanceStatus,
}

impl_annotatable!(Reaction);

impl ReactionBuilder {
    fn validate(&self) -> Result<(), String> {
        let lower = self.lower_bound.unwrap_or_else(default_lower_bound);
        let upper = self.upper_bound.unwrap_or_else(default_upper_bound);
        if lower > upper {
            return Err(format!(
                "lower bound {} is greater than upper bound {}",
                lower, upper
            ));
        }
        if let Some(metabolites) = &self.metabolites {
            if let Some((id, _)) = metabolites.iter().find(|(_, c)| **c == 0.) {
                return Err(format!("metabolite {} has a zero coefficient", id));
            }
        }
        Ok(())
    }
}

impl Reaction {
    /// Create a new reaction with default bounds and no metabolites
    pub fn new_id_only(id: &str) -> Reaction {
        Reaction {
            id: id.to_string(),
            metabolites: IndexMap::new(),
            name: None,
            gpr: None,
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            subsystem: None,
            objective_coefficient: 0.,
            comment: None,
            annotation: IndexSet::new(),
            balance: BalanceStatus::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Map of metabolite id to stoichiometric coefficient
    pub fn metabolites(&self) -> &IndexMap<String, f64> {
        &self.metabolites
    }

    pub fn coefficient(&self, metabolite_id: &str) -> Option<f64> {
        self.metabolites.get(metabolite_id).copied()
    }

    pub fn gpr(&self) -> Option<&Gpr> {
        self.gpr.as_ref()
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn balance(&self) -> &BalanceStatus {
        &self.balance
    }

    /// Whether the reaction can carry flux in the reverse direction
    pub fn reversible(&self) -> bool {
        self.lower_bound < 0.
    }

    /// Ids of the genes referenced by the gene association
    pub fn genes(&self) -> IndexSet<String> {
        self.gpr.as_ref().map(Gpr::genes).unwrap_or_default()
    }

    /// Gene reaction rule string, empty if there is no gene association
    pub fn gene_reaction_rule(&self) -> String {
        match &self.gpr {
            Some(gpr) => gpr.to_string_id(),
            None => String::new(),
        }
    }

    /// Metabolite ids with a negative coefficient
    pub fn reactants(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, c)| **c < 0.)
            .map(|(m, _)| m.as_str())
            .collect()
    }

    /// Metabolite ids with a positive coefficient
    pub fn products(&self) -> Vec<&str> {
        self.metabolites
            .iter()
            .filter(|(_, c)| **c > 0.)
            .map(|(m, _)| m.as_str())
            .collect()
    }

    pub(crate) fn metabolites_mut(&mut self) -> &mut IndexMap<String, f64> {
        &mut self.metabolites
    }

    pub(crate) fn set_gpr(&mut self, gpr: Option<Gpr>) {
        self.gpr = gpr.and_then(Gpr::prune);
    }

    pub(crate) fn take_gpr(&mut self) -> Option<Gpr> {
        self.gpr.take()
    }

    pub(crate) fn set_bounds_unchecked(&mut self, lower_bound: f64, upper_bound: f64) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }

    pub(crate) fn set_balance(&mut self, balance: BalanceStatus) {
        self.balance = balance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GprOperatorType;

    #[test]
    fn builder_defaults() {
        let reaction = ReactionBuilder::default().id("PFK").build().unwrap();
        assert_eq!(reaction.id(), "PFK");
        assert_eq!(reaction.lower_bound(), -1000.);
        assert_eq!(reaction.upper_bound(), 1000.);
        assert_eq!(reaction.objective_coefficient, 0.);
        assert!(reaction.reversible());
        assert_eq!(reaction.gene_reaction_rule(), "");
    }

    #[test]
    fn builder_rejects_inverted_bounds() {
        let result = ReactionBuilder::default()
            .id("bad")
            .lower_bound(10.)
            .upper_bound(0.)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_zero_coefficient() {
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), 0.);
        let result = ReactionBuilder::default()
            .id("bad")
            .metabolites(metabolites)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reactants_and_products() {
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), -1.);
        metabolites.insert("f6p_c".to_string(), -1.);
        metabolites.insert("adp_c".to_string(), 1.);
        metabolites.insert("fdp_c".to_string(), 1.);
        let reaction = ReactionBuilder::default()
            .id("PFK")
            .metabolites(metabolites)
            .lower_bound(0.)
            .build()
            .unwrap();
        assert_eq!(reaction.reactants(), vec!["atp_c", "f6p_c"]);
        assert_eq!(reaction.products(), vec!["adp_c", "fdp_c"]);
        assert!(!reaction.reversible());
        assert_eq!(reaction.coefficient("adp_c"), Some(1.));
        assert_eq!(reaction.coefficient("h_c"), None);
    }

    #[test]
    fn gene_association_is_pruned() {
        let mut reaction = Reaction::new_id_only("PFK");
        reaction.set_gpr(Some(Gpr::new_group(
            GprOperatorType::Or,
            vec![Gpr::new_gene_node("b3916")],
        )));
        assert_eq!(reaction.gpr(), Some(&Gpr::new_gene_node("b3916")));
        assert_eq!(reaction.gene_reaction_rule(), "b3916");
    }
}
