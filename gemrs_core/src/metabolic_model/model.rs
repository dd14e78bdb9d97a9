//! This module provides the Model struct for representing an entire metabolic model
use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use thiserror::Error;

use crate::io::gpr_parse::parse_gpr_permissive;
use crate::io::Diagnostics;
use crate::metabolic_model::balance::check_balance;
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::events::{ChangeNotifier, ListenerId, ModelChange};
use crate::metabolic_model::evidence::{EntityKind, EntityRef, Evidence};
use crate::metabolic_model::gene::{Gene, GeneActivity, Gpr};
use crate::metabolic_model::metabolite::{parse_formula, FormulaError, Metabolite};
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::reference::Reference;
use crate::metabolic_model::test_case::TestCase;

/// Represents a Genome Scale Metabolic Model
///
/// The model owns every entity. Reactions refer to metabolites and genes by id only, and the
/// model keeps a reverse index from metabolite and gene ids to the reactions using them. All
/// edits that touch stoichiometry, formulas, charges or gene associations go through the model
/// so that balance status and indices never go stale.
#[derive(Clone, Debug)]
pub struct Model {
    /// Id associated with the Model
    pub id: String,
    /// Human readable name of the model
    pub name: Option<String>,
    compartments: IndexMap<String, Compartment>,
    metabolites: IndexMap<String, Metabolite>,
    reactions: IndexMap<String, Reaction>,
    genes: IndexMap<String, Gene>,
    references: IndexMap<String, Reference>,
    evidences: IndexMap<String, Evidence>,
    test_cases: IndexMap<String, TestCase>,
    /// Metabolite id to ids of the reactions it takes part in
    metabolite_index: HashMap<String, IndexSet<String>>,
    /// Gene id to ids of the reactions whose gene association mentions it
    gene_index: HashMap<String, IndexSet<String>>,
    notifier: ChangeNotifier,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("A {kind} with id '{id}' already exists in the model")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Metabolite '{0}' is not part of the model")]
    UnknownMetabolite(String),
    #[error("Reaction '{0}' is not part of the model")]
    UnknownReaction(String),
    #[error("Gene '{0}' is not part of the model")]
    UnknownGene(String),
    #[error("Reference '{0}' is not part of the model")]
    UnknownReference(String),
    #[error("Metabolite '{metabolite}' is still used by {reactions} reaction(s)")]
    MetaboliteInUse { metabolite: String, reactions: usize },
    #[error("Lower bound {lower} of reaction '{reaction}' is greater than its upper bound {upper}")]
    InvalidBounds {
        reaction: String,
        lower: f64,
        upper: f64,
    },
    #[error("Metabolite '{metabolite}' has a zero coefficient in reaction '{reaction}'")]
    ZeroCoefficient { reaction: String, metabolite: String },
    #[error(transparent)]
    InvalidFormula(#[from] FormulaError),
}

impl ModelError {
    fn duplicate(kind: &'static str, id: &str) -> Self {
        ModelError::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }
}

fn check_bounds(reaction: &str, lower: f64, upper: f64) -> Result<(), ModelError> {
    if lower > upper {
        return Err(ModelError::InvalidBounds {
            reaction: reaction.to_string(),
            lower,
            upper,
        });
    }
    Ok(())
}

fn check_coefficients(reaction: &str, metabolites: &IndexMap<String, f64>) -> Result<(), ModelError> {
    match metabolites.iter().find(|(_, c)| **c == 0.) {
        Some((metabolite, _)) => Err(ModelError::ZeroCoefficient {
            reaction: reaction.to_string(),
            metabolite: metabolite.clone(),
        }),
        None => Ok(()),
    }
}

impl Model {
    /// Create an empty model
    pub fn new(id: &str) -> Self {
        Model {
            id: id.to_string(),
            name: None,
            compartments: IndexMap::new(),
            metabolites: IndexMap::new(),
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            references: IndexMap::new(),
            evidences: IndexMap::new(),
            test_cases: IndexMap::new(),
            metabolite_index: HashMap::new(),
            gene_index: HashMap::new(),
            notifier: ChangeNotifier::default(),
        }
    }

    // region Accessors

    pub fn compartments(&self) -> &IndexMap<String, Compartment> {
        &self.compartments
    }

    pub fn metabolites(&self) -> &IndexMap<String, Metabolite> {
        &self.metabolites
    }

    pub fn reactions(&self) -> &IndexMap<String, Reaction> {
        &self.reactions
    }

    pub fn genes(&self) -> &IndexMap<String, Gene> {
        &self.genes
    }

    pub fn references(&self) -> &IndexMap<String, Reference> {
        &self.references
    }

    pub fn evidences(&self) -> &IndexMap<String, Evidence> {
        &self.evidences
    }

    pub fn test_cases(&self) -> &IndexMap<String, TestCase> {
        &self.test_cases
    }

    pub fn compartment(&self, id: &str) -> Option<&Compartment> {
        self.compartments.get(id)
    }

    pub fn metabolite(&self, id: &str) -> Option<&Metabolite> {
        self.metabolites.get(id)
    }

    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.get(id)
    }

    pub fn gene(&self, id: &str) -> Option<&Gene> {
        self.genes.get(id)
    }

    pub fn reference(&self, id: &str) -> Option<&Reference> {
        self.references.get(id)
    }

    /// Map of reaction id to objective coefficient for every reaction in the objective
    pub fn objective(&self) -> IndexMap<String, f64> {
        self.reactions
            .values()
            .filter(|r| r.objective_coefficient != 0.)
            .map(|r| (r.id().to_string(), r.objective_coefficient))
            .collect()
    }

    /// Reactions whose gene association references `gene_id`
    pub fn reactions_of_gene(&self, gene_id: &str) -> Vec<&Reaction> {
        self.indexed_reactions(self.gene_index.get(gene_id))
    }

    /// Reactions in which `metabolite_id` takes part
    pub fn reactions_of_metabolite(&self, metabolite_id: &str) -> Vec<&Reaction> {
        self.indexed_reactions(self.metabolite_index.get(metabolite_id))
    }

    fn indexed_reactions(&self, ids: Option<&IndexSet<String>>) -> Vec<&Reaction> {
        match ids {
            Some(ids) => ids.iter().filter_map(|id| self.reactions.get(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Distinct compartments of the metabolites taking part in `reaction`
    pub fn reaction_compartments(&self, reaction: &Reaction) -> IndexSet<&str> {
        reaction
            .metabolites()
            .keys()
            .filter_map(|m| self.metabolites.get(m))
            .filter_map(|m| m.compartment())
            .collect()
    }

    /// Exchange, demand or sink reaction: all metabolites share exactly one compartment and
    /// they sit on one side of the reaction only
    pub fn is_boundary(&self, reaction: &Reaction) -> bool {
        self.reaction_compartments(reaction).len() == 1
            && (reaction.reactants().is_empty() || reaction.products().is_empty())
    }

    /// Reaction whose metabolites span more than one compartment
    pub fn is_transport(&self, reaction: &Reaction) -> bool {
        self.reaction_compartments(reaction).len() > 1
    }

    /// Evaluate the gene association of a reaction against the activity of the model's genes.
    ///
    /// Reactions without a gene association are always active. Returns `None` for an
    /// unknown reaction.
    pub fn reaction_activity(&self, reaction_id: &str) -> Option<GeneActivity> {
        let reaction = self.reactions.get(reaction_id)?;
        Some(match reaction.gpr() {
            None => GeneActivity::Active,
            Some(gpr) => gpr.eval(&|gene: &str| {
                self.genes
                    .get(gene)
                    .map(|g| g.activity)
                    .unwrap_or(GeneActivity::Active)
            }),
        })
    }

    // endregion Accessors

    // region Observers

    /// Register a listener called with every change applied to the model
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ModelChange) + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // endregion Observers

    // region Adding entities

    pub fn add_compartment(&mut self, compartment: Compartment) -> Result<(), ModelError> {
        if self.compartments.contains_key(&compartment.id) {
            return Err(ModelError::duplicate("compartment", &compartment.id));
        }
        let id = compartment.id.clone();
        self.compartments.insert(id.clone(), compartment);
        self.notifier.notify(ModelChange::CompartmentAdded(id));
        Ok(())
    }

    /// Add a metabolite to the model, creating an unnamed compartment for it if needed
    pub fn add_metabolite(&mut self, metabolite: Metabolite) -> Result<(), ModelError> {
        if self.metabolites.contains_key(metabolite.id()) {
            return Err(ModelError::duplicate("metabolite", metabolite.id()));
        }
        if let Some(compartment) = metabolite.compartment() {
            self.adopt_compartment(compartment);
        }
        let id = metabolite.id().to_string();
        self.metabolites.insert(id.clone(), metabolite);
        self.notifier.notify(ModelChange::MetaboliteAdded(id));
        Ok(())
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use gemrs_core::metabolic_model::gene::GeneBuilder;
    /// use gemrs_core::metabolic_model::model::Model;
    /// let mut model = Model::new("e_coli_core");
    /// let new_gene = GeneBuilder::default().id("b1241").build().unwrap();
    /// model.add_gene(new_gene).unwrap();
    /// assert!(model.gene("b1241").is_some());
    /// ```
    pub fn add_gene(&mut self, gene: Gene) -> Result<(), ModelError> {
        if self.genes.contains_key(gene.id()) {
            return Err(ModelError::duplicate("gene", gene.id()));
        }
        let id = gene.id().to_string();
        self.genes.insert(id.clone(), gene);
        self.notifier.notify(ModelChange::GeneAdded(id));
        Ok(())
    }

    /// Add a reaction to the model
    ///
    /// Metabolites and genes referenced by the reaction that the model does not know yet are
    /// created as minimal records.
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use gemrs_core::metabolic_model::model::Model;
    /// use gemrs_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new("e_coli_core");
    /// let mut metabolites = IndexMap::new();
    /// metabolites.insert("glc__D_e".to_string(), -1.);
    /// let new_reaction = ReactionBuilder::default()
    ///     .id("EX_glc__D_e")
    ///     .metabolites(metabolites)
    ///     .build()
    ///     .unwrap();
    /// model.add_reaction(new_reaction).unwrap();
    /// assert!(model.metabolite("glc__D_e").is_some());
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        self.add_reaction_with(reaction, Vec::new(), Vec::new())
    }

    /// Add a reaction along with candidate records for the metabolites and genes it references.
    ///
    /// A candidate is adopted if the reaction references it and the model has no entity with
    /// its id yet. Candidates whose id is already taken are dropped in favour of the model's
    /// own record, as are candidates the reaction does not reference.
    pub fn add_reaction_with(
        &mut self,
        mut reaction: Reaction,
        metabolites: Vec<Metabolite>,
        genes: Vec<Gene>,
    ) -> Result<(), ModelError> {
        let id = reaction.id().to_string();
        if self.reactions.contains_key(&id) {
            return Err(ModelError::duplicate("reaction", &id));
        }
        check_bounds(&id, reaction.lower_bound(), reaction.upper_bound())?;
        check_coefficients(&id, reaction.metabolites())?;

        for metabolite in metabolites {
            if reaction.metabolites().contains_key(metabolite.id())
                && !self.metabolites.contains_key(metabolite.id())
            {
                self.add_metabolite(metabolite)?;
            }
        }
        self.adopt_metabolites(reaction.metabolites())?;

        let referenced_genes = reaction.genes();
        for gene in genes {
            if referenced_genes.contains(gene.id()) && !self.genes.contains_key(gene.id()) {
                self.add_gene(gene)?;
            }
        }
        let gpr = reaction.take_gpr();
        if let Some(gpr) = &gpr {
            self.adopt_genes(gpr);
        }
        reaction.set_gpr(gpr);

        self.reactions.insert(id.clone(), reaction);
        self.index_reaction(&id);
        self.rebalance(&id);
        self.notifier.notify(ModelChange::ReactionAdded(id));
        Ok(())
    }

    pub fn add_reference(&mut self, reference: Reference) -> Result<(), ModelError> {
        if self.references.contains_key(&reference.id) {
            return Err(ModelError::duplicate("reference", &reference.id));
        }
        let id = reference.id.clone();
        self.references.insert(id.clone(), reference);
        self.notifier.notify(ModelChange::ReferenceAdded(id));
        Ok(())
    }

    /// Add an evidence record, every linked reference must already be part of the model
    pub fn add_evidence(&mut self, evidence: Evidence) -> Result<(), ModelError> {
        if self.evidences.contains_key(&evidence.id) {
            return Err(ModelError::duplicate("evidence", &evidence.id));
        }
        self.check_references(&evidence.references)?;
        let id = evidence.id.clone();
        self.evidences.insert(id.clone(), evidence);
        self.notifier.notify(ModelChange::EvidenceAdded(id));
        Ok(())
    }

    /// Add a test case, every linked reference must already be part of the model
    pub fn add_test_case(&mut self, test_case: TestCase) -> Result<(), ModelError> {
        if self.test_cases.contains_key(&test_case.id) {
            return Err(ModelError::duplicate("test case", &test_case.id));
        }
        self.check_references(&test_case.references)?;
        let id = test_case.id.clone();
        self.test_cases.insert(id.clone(), test_case);
        self.notifier.notify(ModelChange::TestCaseAdded(id));
        Ok(())
    }

    fn check_references(&self, references: &IndexSet<String>) -> Result<(), ModelError> {
        match references.iter().find(|r| !self.references.contains_key(*r)) {
            Some(missing) => Err(ModelError::UnknownReference(missing.clone())),
            None => Ok(()),
        }
    }

    fn adopt_compartment(&mut self, id: &str) {
        if !self.compartments.contains_key(id) {
            debug!("Creating unnamed compartment {}", id);
            self.compartments
                .insert(id.to_string(), Compartment::new(id, None));
            self.notifier
                .notify(ModelChange::CompartmentAdded(id.to_string()));
        }
    }

    fn adopt_metabolites(&mut self, stoichiometry: &IndexMap<String, f64>) -> Result<(), ModelError> {
        for id in stoichiometry.keys() {
            if !self.metabolites.contains_key(id) {
                debug!("Creating metabolite {} referenced by a reaction", id);
                self.add_metabolite(Metabolite::new_id_only(id))?;
            }
        }
        Ok(())
    }

    fn adopt_genes(&mut self, gpr: &Gpr) {
        for id in gpr.genes() {
            if !self.genes.contains_key(&id) {
                debug!("Creating gene {} referenced by a gene association", id);
                self.genes.insert(id.clone(), Gene::new_id_only(&id));
                self.notifier.notify(ModelChange::GeneAdded(id));
            }
        }
    }

    // endregion Adding entities

    // region Editing entities

    /// Apply `edit` to the metabolite's free fields (name, comment, annotations)
    pub fn update_metabolite<F>(&mut self, id: &str, edit: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut Metabolite),
    {
        let metabolite = self
            .metabolites
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownMetabolite(id.to_string()))?;
        edit(metabolite);
        self.notifier
            .notify(ModelChange::MetaboliteUpdated(id.to_string()));
        Ok(())
    }

    /// Apply `edit` to the reaction's free fields (name, subsystem, objective, comment,
    /// annotations)
    pub fn update_reaction<F>(&mut self, id: &str, edit: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut Reaction),
    {
        let reaction = self
            .reactions
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownReaction(id.to_string()))?;
        edit(reaction);
        self.notifier
            .notify(ModelChange::ReactionUpdated(id.to_string()));
        Ok(())
    }

    pub fn update_gene<F>(&mut self, id: &str, edit: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut Gene),
    {
        let gene = self
            .genes
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownGene(id.to_string()))?;
        edit(gene);
        Ok(())
    }

    /// Set the chemical formula of a metabolite and rebalance every reaction using it.
    ///
    /// An empty formula unsets it.
    pub fn set_metabolite_formula(&mut self, id: &str, formula: Option<&str>) -> Result<(), ModelError> {
        let formula = formula.filter(|f| !f.is_empty());
        if let Some(formula) = formula {
            parse_formula(formula)?;
        }
        let metabolite = self
            .metabolites
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownMetabolite(id.to_string()))?;
        metabolite.set_formula(formula.map(str::to_string));
        self.rebalance_metabolite(id);
        self.notifier
            .notify(ModelChange::MetaboliteUpdated(id.to_string()));
        Ok(())
    }

    /// Set the charge of a metabolite and rebalance every reaction using it
    pub fn set_metabolite_charge(&mut self, id: &str, charge: Option<i32>) -> Result<(), ModelError> {
        let metabolite = self
            .metabolites
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownMetabolite(id.to_string()))?;
        metabolite.set_charge(charge);
        self.rebalance_metabolite(id);
        self.notifier
            .notify(ModelChange::MetaboliteUpdated(id.to_string()));
        Ok(())
    }

    pub fn set_metabolite_compartment(
        &mut self,
        id: &str,
        compartment: Option<&str>,
    ) -> Result<(), ModelError> {
        if !self.metabolites.contains_key(id) {
            return Err(ModelError::UnknownMetabolite(id.to_string()));
        }
        if let Some(compartment) = compartment {
            self.adopt_compartment(compartment);
        }
        if let Some(metabolite) = self.metabolites.get_mut(id) {
            metabolite.set_compartment(compartment.map(str::to_string));
        }
        self.notifier
            .notify(ModelChange::MetaboliteUpdated(id.to_string()));
        Ok(())
    }

    pub fn set_bounds(&mut self, reaction_id: &str, lower: f64, upper: f64) -> Result<(), ModelError> {
        check_bounds(reaction_id, lower, upper)?;
        let reaction = self
            .reactions
            .get_mut(reaction_id)
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.to_string()))?;
        reaction.set_bounds_unchecked(lower, upper);
        self.notifier
            .notify(ModelChange::ReactionUpdated(reaction_id.to_string()));
        Ok(())
    }

    /// Replace the stoichiometry of a reaction, creating unknown metabolites
    pub fn set_stoichiometry(
        &mut self,
        reaction_id: &str,
        metabolites: IndexMap<String, f64>,
    ) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownReaction(reaction_id.to_string()));
        }
        check_coefficients(reaction_id, &metabolites)?;
        self.adopt_metabolites(&metabolites)?;
        self.unindex_reaction(reaction_id);
        if let Some(reaction) = self.reactions.get_mut(reaction_id) {
            *reaction.metabolites_mut() = metabolites;
        }
        self.index_reaction(reaction_id);
        self.rebalance(reaction_id);
        self.notifier
            .notify(ModelChange::ReactionUpdated(reaction_id.to_string()));
        Ok(())
    }

    /// Set (or add) the coefficient of a single metabolite in a reaction
    pub fn set_coefficient(
        &mut self,
        reaction_id: &str,
        metabolite_id: &str,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        let mut metabolites = self.stoichiometry_of(reaction_id)?;
        metabolites.insert(metabolite_id.to_string(), coefficient);
        self.set_stoichiometry(reaction_id, metabolites)
    }

    /// Remove a metabolite from a reaction, returning its former coefficient
    pub fn remove_metabolite_from_reaction(
        &mut self,
        reaction_id: &str,
        metabolite_id: &str,
    ) -> Result<f64, ModelError> {
        let mut metabolites = self.stoichiometry_of(reaction_id)?;
        let coefficient = metabolites
            .shift_remove(metabolite_id)
            .ok_or_else(|| ModelError::UnknownMetabolite(metabolite_id.to_string()))?;
        self.set_stoichiometry(reaction_id, metabolites)?;
        Ok(coefficient)
    }

    fn stoichiometry_of(&self, reaction_id: &str) -> Result<IndexMap<String, f64>, ModelError> {
        self.reactions
            .get(reaction_id)
            .map(|r| r.metabolites().clone())
            .ok_or_else(|| ModelError::UnknownReaction(reaction_id.to_string()))
    }

    /// Parse `rule` and make it the gene association of the reaction.
    ///
    /// Malformed rules do not fail, they fall back to an OR of every gene mentioned and the
    /// returned diagnostics carry a warning. Genes unknown to the model are created.
    pub fn set_gene_reaction_rule(
        &mut self,
        reaction_id: &str,
        rule: &str,
    ) -> Result<Diagnostics, ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownReaction(reaction_id.to_string()));
        }
        let mut diagnostics = Diagnostics::with_path(&format!("reaction {}", reaction_id));
        let known_genes = self.genes.len();
        let gpr = parse_gpr_permissive(rule, &mut self.genes, &mut diagnostics);
        let created: Vec<String> = self.genes.keys().skip(known_genes).cloned().collect();
        for id in created {
            self.notifier.notify(ModelChange::GeneAdded(id));
        }
        self.replace_gpr(reaction_id, gpr);
        Ok(diagnostics)
    }

    /// Replace the gene association of a reaction with an already built tree
    pub fn set_gene_association(&mut self, reaction_id: &str, gpr: Option<Gpr>) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownReaction(reaction_id.to_string()));
        }
        if let Some(gpr) = &gpr {
            self.adopt_genes(gpr);
        }
        self.replace_gpr(reaction_id, gpr);
        Ok(())
    }

    fn replace_gpr(&mut self, reaction_id: &str, gpr: Option<Gpr>) {
        self.unindex_reaction(reaction_id);
        if let Some(reaction) = self.reactions.get_mut(reaction_id) {
            reaction.set_gpr(gpr);
        }
        self.index_reaction(reaction_id);
        self.notifier
            .notify(ModelChange::ReactionUpdated(reaction_id.to_string()));
    }

    // endregion Editing entities

    // region Removing entities

    /// Remove a reaction. Its metabolites and genes stay in the model even if unused now
    /// (see [`Model::remove_orphans`]).
    pub fn remove_reaction(&mut self, id: &str) -> Result<Reaction, ModelError> {
        if !self.reactions.contains_key(id) {
            return Err(ModelError::UnknownReaction(id.to_string()));
        }
        self.unindex_reaction(id);
        let reaction = self
            .reactions
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownReaction(id.to_string()))?;
        self.drop_evidences_about(&EntityRef::new(EntityKind::Reaction, id));
        self.notifier
            .notify(ModelChange::ReactionRemoved(id.to_string()));
        Ok(reaction)
    }

    /// Remove a metabolite no reaction uses anymore
    pub fn remove_metabolite(&mut self, id: &str) -> Result<Metabolite, ModelError> {
        if let Some(reactions) = self.metabolite_index.get(id) {
            if !reactions.is_empty() {
                return Err(ModelError::MetaboliteInUse {
                    metabolite: id.to_string(),
                    reactions: reactions.len(),
                });
            }
        }
        let metabolite = self
            .metabolites
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownMetabolite(id.to_string()))?;
        self.drop_evidences_about(&EntityRef::new(EntityKind::Metabolite, id));
        self.notifier
            .notify(ModelChange::MetaboliteRemoved(id.to_string()));
        Ok(metabolite)
    }

    /// Remove a gene from the model.
    ///
    /// The gene is cut out of every gene association (which is pruned afterwards), test cases
    /// setting the gene and evidences about it are removed.
    pub fn remove_gene(&mut self, id: &str) -> Result<Gene, ModelError> {
        if !self.genes.contains_key(id) {
            return Err(ModelError::UnknownGene(id.to_string()));
        }
        let affected: Vec<String> = self
            .gene_index
            .get(id)
            .map(|reactions| reactions.iter().cloned().collect())
            .unwrap_or_default();
        for reaction_id in affected {
            self.unindex_reaction(&reaction_id);
            if let Some(reaction) = self.reactions.get_mut(&reaction_id) {
                let remaining = reaction.take_gpr().and_then(|gpr| gpr.without_gene(id));
                reaction.set_gpr(remaining);
            }
            self.index_reaction(&reaction_id);
            self.notifier
                .notify(ModelChange::ReactionUpdated(reaction_id));
        }

        let stale_tests: Vec<String> = self
            .test_cases
            .values()
            .filter(|t| t.genes().contains(id))
            .map(|t| t.id.clone())
            .collect();
        for test_id in stale_tests {
            debug!("Removing test case {} setting gene {}", test_id, id);
            self.test_cases.shift_remove(&test_id);
            self.notifier.notify(ModelChange::TestCaseRemoved(test_id));
        }
        self.drop_evidences_about(&EntityRef::new(EntityKind::Gene, id));

        self.gene_index.remove(id);
        let gene = self
            .genes
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownGene(id.to_string()))?;
        self.notifier.notify(ModelChange::GeneRemoved(id.to_string()));
        Ok(gene)
    }

    /// Remove a reference and unlink it from every evidence and test case
    pub fn remove_reference(&mut self, id: &str) -> Result<Reference, ModelError> {
        let reference = self
            .references
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownReference(id.to_string()))?;
        for evidence in self.evidences.values_mut() {
            evidence.references.shift_remove(id);
        }
        for test_case in self.test_cases.values_mut() {
            test_case.references.shift_remove(id);
        }
        self.notifier
            .notify(ModelChange::ReferenceRemoved(id.to_string()));
        Ok(reference)
    }

    pub fn remove_evidence(&mut self, id: &str) -> Option<Evidence> {
        let evidence = self.evidences.shift_remove(id)?;
        self.notifier
            .notify(ModelChange::EvidenceRemoved(id.to_string()));
        Some(evidence)
    }

    pub fn remove_test_case(&mut self, id: &str) -> Option<TestCase> {
        let test_case = self.test_cases.shift_remove(id)?;
        self.notifier
            .notify(ModelChange::TestCaseRemoved(id.to_string()));
        Some(test_case)
    }

    /// Remove every metabolite and gene no reaction references.
    ///
    /// Returns the ids of the removed metabolites and genes.
    pub fn remove_orphans(&mut self) -> (Vec<String>, Vec<String>) {
        let orphan_metabolites: Vec<String> = self
            .metabolites
            .keys()
            .filter(|m| self.metabolite_index.get(*m).map_or(true, IndexSet::is_empty))
            .cloned()
            .collect();
        let orphan_genes: Vec<String> = self
            .genes
            .keys()
            .filter(|g| self.gene_index.get(*g).map_or(true, IndexSet::is_empty))
            .cloned()
            .collect();
        let mut removed_metabolites = Vec::new();
        for id in orphan_metabolites {
            if self.remove_metabolite(&id).is_ok() {
                removed_metabolites.push(id);
            }
        }
        let mut removed_genes = Vec::new();
        for id in orphan_genes {
            if self.remove_gene(&id).is_ok() {
                removed_genes.push(id);
            }
        }
        debug!(
            "Removed {} orphan metabolites and {} orphan genes",
            removed_metabolites.len(),
            removed_genes.len()
        );
        (removed_metabolites, removed_genes)
    }

    /// Remove evidences whose subject is `entity` and clear targets pointing at it
    fn drop_evidences_about(&mut self, entity: &EntityRef) {
        let stale: Vec<String> = self
            .evidences
            .values()
            .filter(|e| e.entity.as_ref() == Some(entity))
            .map(|e| e.id.clone())
            .collect();
        for id in stale {
            self.evidences.shift_remove(&id);
            self.notifier.notify(ModelChange::EvidenceRemoved(id));
        }
        for evidence in self.evidences.values_mut() {
            if evidence.target.as_ref() == Some(entity) {
                evidence.target = None;
            }
        }
    }

    // endregion Removing entities

    // region Index maintenance

    fn index_reaction(&mut self, reaction_id: &str) {
        if let Some(reaction) = self.reactions.get(reaction_id) {
            for metabolite in reaction.metabolites().keys() {
                self.metabolite_index
                    .entry(metabolite.clone())
                    .or_default()
                    .insert(reaction_id.to_string());
            }
            for gene in reaction.genes() {
                self.gene_index
                    .entry(gene)
                    .or_default()
                    .insert(reaction_id.to_string());
            }
        }
    }

    fn unindex_reaction(&mut self, reaction_id: &str) {
        if let Some(reaction) = self.reactions.get(reaction_id) {
            for metabolite in reaction.metabolites().keys() {
                if let Some(reactions) = self.metabolite_index.get_mut(metabolite) {
                    reactions.shift_remove(reaction_id);
                    if reactions.is_empty() {
                        self.metabolite_index.remove(metabolite);
                    }
                }
            }
            for gene in reaction.genes() {
                if let Some(reactions) = self.gene_index.get_mut(&gene) {
                    reactions.shift_remove(reaction_id);
                    if reactions.is_empty() {
                        self.gene_index.remove(&gene);
                    }
                }
            }
        }
    }

    fn rebalance(&mut self, reaction_id: &str) {
        let metabolites = &self.metabolites;
        if let Some(reaction) = self.reactions.get_mut(reaction_id) {
            let status = check_balance(
                reaction
                    .metabolites()
                    .iter()
                    .filter_map(|(id, coefficient)| metabolites.get(id).map(|m| (m, *coefficient))),
            );
            reaction.set_balance(status);
        }
    }

    fn rebalance_metabolite(&mut self, metabolite_id: &str) {
        let reactions: Vec<String> = self
            .metabolite_index
            .get(metabolite_id)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();
        for reaction_id in reactions {
            self.rebalance(&reaction_id);
        }
    }

    // endregion Index maintenance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Warning;
    use crate::metabolic_model::balance::{BalanceState, ChargeBalance, ElementBalance};
    use crate::metabolic_model::gene::{GeneBuilder, GprOperatorType};
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::metabolic_model::test_case::GeneSetting;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stoichiometry(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries.iter().map(|(m, c)| (m.to_string(), *c)).collect()
    }

    /// H2O -> H + OH with fully specified metabolites
    fn water_model() -> Model {
        let mut model = Model::new("water");
        model
            .add_metabolite(Metabolite::new("h2o_c", None, Some("c"), Some("H2O"), Some(0)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("h_c", None, Some("c"), Some("H"), Some(1)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("oh_c", None, Some("c"), Some("HO"), Some(-1)))
            .unwrap();
        let reaction = ReactionBuilder::default()
            .id("SPLIT")
            .metabolites(stoichiometry(&[("h2o_c", -1.), ("h_c", 1.), ("oh_c", 1.)]))
            .build()
            .unwrap();
        model.add_reaction(reaction).unwrap();
        model
    }

    fn gene_model() -> Model {
        let mut model = Model::new("genes");
        for (id, activity) in [
            ("active_gene1", GeneActivity::Active),
            ("active_gene2", GeneActivity::Active),
            ("inactive_gene1", GeneActivity::Inactive),
        ] {
            let gene = GeneBuilder::default()
                .id(id)
                .activity(activity)
                .build()
                .unwrap();
            model.add_gene(gene).unwrap();
        }
        model
            .add_reaction(Reaction::new_id_only("R1"))
            .unwrap();
        model
    }

    #[test]
    fn metabolite_adopts_compartment() {
        let mut model = Model::new("test");
        model
            .add_metabolite(Metabolite::new("glc__D_e", None, Some("e"), None, None))
            .unwrap();
        let compartment = model.compartment("e").unwrap();
        assert_eq!(compartment.id, "e");
        assert_eq!(compartment.name, None);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut model = water_model();
        assert_eq!(
            model.add_metabolite(Metabolite::new_id_only("h2o_c")),
            Err(ModelError::DuplicateId {
                kind: "metabolite",
                id: "h2o_c".to_string()
            })
        );
        assert!(model.add_reaction(Reaction::new_id_only("SPLIT")).is_err());
        model.add_gene(Gene::new_id_only("b0001")).unwrap();
        assert!(model.add_gene(Gene::new_id_only("b0001")).is_err());
    }

    #[test]
    fn reaction_adopts_metabolites_and_genes() {
        let mut model = Model::new("test");
        let gpr = Gpr::new_group(
            GprOperatorType::And,
            vec![Gpr::new_gene_node("b1"), Gpr::new_gene_node("b2")],
        );
        let reaction = ReactionBuilder::default()
            .id("R1")
            .metabolites(stoichiometry(&[("a_c", -1.), ("b_c", 1.)]))
            .gpr(Some(gpr))
            .build()
            .unwrap();
        model.add_reaction(reaction).unwrap();
        assert!(model.metabolite("a_c").is_some());
        assert!(model.metabolite("b_c").is_some());
        assert!(model.gene("b1").is_some());
        assert!(model.gene("b2").is_some());
        assert_eq!(model.reactions_of_gene("b1")[0].id(), "R1");
        assert_eq!(model.reactions_of_metabolite("b_c")[0].id(), "R1");
    }

    #[test]
    fn existing_records_win_over_candidates() {
        let mut model = Model::new("test");
        model
            .add_metabolite(Metabolite::new("a_c", Some("model copy"), Some("c"), None, None))
            .unwrap();
        let reaction = ReactionBuilder::default()
            .id("R1")
            .metabolites(stoichiometry(&[("a_c", -2.), ("b_c", 1.)]))
            .build()
            .unwrap();
        model
            .add_reaction_with(
                reaction,
                vec![
                    Metabolite::new("a_c", Some("candidate"), Some("c"), None, None),
                    Metabolite::new("b_c", Some("candidate"), Some("c"), None, None),
                    Metabolite::new("unused_c", None, Some("c"), None, None),
                ],
                vec![],
            )
            .unwrap();
        assert_eq!(model.metabolite("a_c").unwrap().name.as_deref(), Some("model copy"));
        assert_eq!(model.metabolite("b_c").unwrap().name.as_deref(), Some("candidate"));
        assert!(model.metabolite("unused_c").is_none());
        assert_eq!(model.reaction("R1").unwrap().coefficient("a_c"), Some(-2.));
    }

    #[test]
    fn balance_follows_metabolite_edits() {
        let mut model = water_model();
        let balance = model.reaction("SPLIT").unwrap().balance().clone();
        assert_eq!(balance.balanced, BalanceState::Balanced);

        model.set_metabolite_formula("oh_c", None).unwrap();
        let balance = model.reaction("SPLIT").unwrap().balance().clone();
        assert_eq!(balance.elements, ElementBalance::Unknown);
        assert_eq!(balance.balanced, BalanceState::Unknown);

        model.set_metabolite_formula("oh_c", Some("HO")).unwrap();
        model.set_metabolite_charge("oh_c", Some(0)).unwrap();
        let balance = model.reaction("SPLIT").unwrap().balance().clone();
        assert_eq!(balance.charge, ChargeBalance::Imbalanced(1.));
        assert_eq!(balance.balanced, BalanceState::Unbalanced);
    }

    #[test]
    fn invalid_formula_rejected() {
        let mut model = water_model();
        assert!(matches!(
            model.set_metabolite_formula("oh_c", Some("h-o")),
            Err(ModelError::InvalidFormula(_))
        ));
        assert_eq!(model.metabolite("oh_c").unwrap().formula(), Some("HO"));
    }

    #[test]
    fn balance_follows_stoichiometry_edits() {
        let mut model = water_model();
        model.set_coefficient("SPLIT", "h_c", 2.).unwrap();
        assert_eq!(
            model.reaction("SPLIT").unwrap().balance().balanced,
            BalanceState::Unbalanced
        );
        model.set_coefficient("SPLIT", "h_c", 1.).unwrap();
        assert_eq!(
            model.reaction("SPLIT").unwrap().balance().balanced,
            BalanceState::Balanced
        );
        assert_eq!(
            model.set_coefficient("SPLIT", "h_c", 0.),
            Err(ModelError::ZeroCoefficient {
                reaction: "SPLIT".to_string(),
                metabolite: "h_c".to_string()
            })
        );
        assert_eq!(model.remove_metabolite_from_reaction("SPLIT", "oh_c"), Ok(1.));
        assert!(model.reactions_of_metabolite("oh_c").is_empty());
        assert_eq!(
            model.reaction("SPLIT").unwrap().balance().balanced,
            BalanceState::Unbalanced
        );
    }

    #[test]
    fn invalid_bounds_rejected() {
        let mut model = water_model();
        assert!(model.set_bounds("SPLIT", 0., 10.).is_ok());
        assert_eq!(model.reaction("SPLIT").unwrap().lower_bound(), 0.);
        assert!(matches!(
            model.set_bounds("SPLIT", 10., 0.),
            Err(ModelError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn metabolite_in_use() {
        let mut model = water_model();
        assert_eq!(
            model.remove_metabolite("h2o_c"),
            Err(ModelError::MetaboliteInUse {
                metabolite: "h2o_c".to_string(),
                reactions: 1
            })
        );
        model.remove_reaction("SPLIT").unwrap();
        assert!(model.metabolite("h2o_c").is_some());
        assert!(model.remove_metabolite("h2o_c").is_ok());
    }

    #[test]
    fn remove_orphans() {
        let mut model = water_model();
        model.add_gene(Gene::new_id_only("unused")).unwrap();
        model.add_metabolite(Metabolite::new_id_only("lonely_c")).unwrap();
        let (metabolites, genes) = model.remove_orphans();
        assert_eq!(metabolites, vec!["lonely_c".to_string()]);
        assert_eq!(genes, vec!["unused".to_string()]);
        assert_eq!(model.metabolites().len(), 3);
    }

    #[test]
    fn remove_gene_cascades() {
        let mut model = Model::new("test");
        model.add_reaction(Reaction::new_id_only("R1")).unwrap();
        model
            .set_gene_reaction_rule("R1", "(a and b) or c")
            .unwrap();
        let mut knockout = TestCase::new("t1", "knockout of a");
        knockout
            .gene_settings
            .push(GeneSetting::new("a", GeneActivity::Inactive));
        model.add_test_case(knockout).unwrap();
        model.add_test_case(TestCase::new("t2", "wild type")).unwrap();
        model
            .add_evidence(Evidence::new(
                "e1",
                Some(EntityRef::new(EntityKind::Gene, "a")),
                "Present",
            ))
            .unwrap();
        let mut targeted = Evidence::new(
            "e2",
            Some(EntityRef::new(EntityKind::Reaction, "R1")),
            "Catalyzed by",
        );
        targeted.target = Some(EntityRef::new(EntityKind::Gene, "a"));
        model.add_evidence(targeted).unwrap();

        model.remove_gene("a").unwrap();
        assert_eq!(model.reaction("R1").unwrap().gene_reaction_rule(), "(b or c)");
        assert!(model.gene("a").is_none());
        assert!(model.reactions_of_gene("a").is_empty());
        assert!(model.test_cases().get("t1").is_none());
        assert!(model.test_cases().get("t2").is_some());
        assert!(model.evidences().get("e1").is_none());
        assert_eq!(model.evidences()["e2"].target, None);
        assert_eq!(
            model.remove_gene("a"),
            Err(ModelError::UnknownGene("a".to_string()))
        );
    }

    #[test]
    fn malformed_rule_falls_back() {
        let mut model = Model::new("test");
        model.add_reaction(Reaction::new_id_only("R1")).unwrap();
        let diagnostics = model
            .set_gene_reaction_rule("R1", "(geneA OR geneB AND")
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics.warnings()[0] {
            Warning::MalformedGeneRule { rule } => assert_eq!(rule, "(geneA OR geneB AND"),
            other => panic!("Expected a malformed rule warning, got {:?}", other),
        }
        let reaction = model.reaction("R1").unwrap();
        assert_eq!(reaction.gene_reaction_rule(), "(geneA or geneB)");
        assert!(model.gene("geneA").is_some());
        assert!(model.gene("geneB").is_some());
    }

    #[test]
    fn reaction_activity() {
        let mut model = gene_model();
        assert_eq!(model.reaction_activity("R1"), Some(GeneActivity::Active));
        model
            .set_gene_reaction_rule("R1", "active_gene1 and inactive_gene1")
            .unwrap();
        assert_eq!(model.reaction_activity("R1"), Some(GeneActivity::Inactive));
        model
            .set_gene_reaction_rule("R1", "(active_gene1 and inactive_gene1) or active_gene2")
            .unwrap();
        assert_eq!(model.reaction_activity("R1"), Some(GeneActivity::Active));
        model
            .update_gene("active_gene2", |g| g.activity = GeneActivity::Inactive)
            .unwrap();
        assert_eq!(model.reaction_activity("R1"), Some(GeneActivity::Inactive));
        assert_eq!(model.reaction_activity("missing"), None);
    }

    #[test]
    fn boundary_and_transport() {
        let mut model = Model::new("test");
        model
            .add_metabolite(Metabolite::new("glc__D_e", None, Some("e"), None, None))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("glc__D_c", None, Some("c"), None, None))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("g6p_c", None, Some("c"), None, None))
            .unwrap();
        let exchange = ReactionBuilder::default()
            .id("EX_glc__D_e")
            .metabolites(stoichiometry(&[("glc__D_e", -1.)]))
            .build()
            .unwrap();
        let transport = ReactionBuilder::default()
            .id("GLCt")
            .metabolites(stoichiometry(&[("glc__D_e", -1.), ("glc__D_c", 1.)]))
            .build()
            .unwrap();
        let internal = ReactionBuilder::default()
            .id("HEX1")
            .metabolites(stoichiometry(&[("glc__D_c", -1.), ("g6p_c", 1.)]))
            .build()
            .unwrap();
        for reaction in [exchange, transport, internal] {
            model.add_reaction(reaction).unwrap();
        }
        let exchange = model.reaction("EX_glc__D_e").unwrap();
        assert!(model.is_boundary(exchange));
        assert!(!model.is_transport(exchange));
        let transport = model.reaction("GLCt").unwrap();
        assert!(!model.is_boundary(transport));
        assert!(model.is_transport(transport));
        let internal = model.reaction("HEX1").unwrap();
        assert!(!model.is_boundary(internal));
        assert!(!model.is_transport(internal));

        let empty = Reaction::new_id_only("EMPTY");
        assert!(!model.is_boundary(&empty));
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("DM_x")
                    .metabolites(stoichiometry(&[("x", -1.)]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert!(model.metabolite("x").unwrap().compartment().is_none());
        assert!(!model.is_boundary(model.reaction("DM_x").unwrap()));
    }

    #[test]
    fn remove_reference_unlinks() {
        let mut model = Model::new("test");
        model.add_reference(Reference::new("ref_1")).unwrap();
        let mut evidence = Evidence::new("e1", None, "Present");
        evidence.references.insert("ref_1".to_string());
        model.add_evidence(evidence).unwrap();
        let mut dangling = Evidence::new("e2", None, "Present");
        dangling.references.insert("ref_2".to_string());
        assert_eq!(
            model.add_evidence(dangling),
            Err(ModelError::UnknownReference("ref_2".to_string()))
        );
        model.remove_reference("ref_1").unwrap();
        assert!(model.evidences()["e1"].references.is_empty());
    }

    #[test]
    fn listeners_see_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut model = Model::new("test");
        let sink = seen.clone();
        model.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        let reaction = ReactionBuilder::default()
            .id("R1")
            .metabolites(stoichiometry(&[("a_c", -1.)]))
            .build()
            .unwrap();
        model.add_reaction(reaction).unwrap();
        model.remove_reaction("R1").unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                ModelChange::MetaboliteAdded("a_c".to_string()),
                ModelChange::ReactionAdded("R1".to_string()),
                ModelChange::ReactionRemoved("R1".to_string()),
            ]
        );
        let copy = model.clone();
        assert_eq!(copy.reactions().len(), 0);
    }
}
