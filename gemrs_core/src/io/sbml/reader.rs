//! Reading SBML documents into a [`Model`]
use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexSet;
use log::{debug, info};

use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::io::sbml::annotation::read_annotation;
use crate::io::sbml::dom::{parse_document, XmlElement};
use crate::io::sbml::gene_association::read_association;
use crate::io::sbml::{parse_number, IdCodec, SbmlError, FBC_NS, GEM_NS, SBML_NS};
use crate::io::{Completion, Diagnostics, NoProgress, Progress, ReadOutcome, Warning};
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::evidence::{EntityKind, EntityRef, Evidence};
use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::{is_valid_formula, Metabolite};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::metabolic_model::reference::{Author, Reference};
use crate::metabolic_model::test_case::{
    GeneSetting, Outcome, OutcomeOperator, ReactionSetting, TestCase,
};

/// Read an SBML file
///
/// # Examples
/// ```no_run
/// use gemrs_core::io::sbml::read_sbml;
/// let outcome = read_sbml("e_coli_core.xml").unwrap();
/// for warning in outcome.diagnostics.warnings() {
///     println!("{}", warning);
/// }
/// println!("{} reactions", outcome.model.reactions().len());
/// ```
pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<ReadOutcome, SbmlError> {
    read_sbml_with_progress(path, &mut NoProgress)
}

/// Read an SBML file, reporting progress per record.
///
/// When `progress` asks for cancellation the records read so far are returned with
/// [`Completion::Cancelled`].
pub fn read_sbml_with_progress<P: AsRef<Path>>(
    path: P,
    progress: &mut dyn Progress,
) -> Result<ReadOutcome, SbmlError> {
    let path = path.as_ref();
    info!("Reading SBML document {}", path.display());
    let xml = std::fs::read_to_string(path)?;
    let diagnostics = Diagnostics::with_path(&path.display().to_string());
    read_document(&xml, diagnostics, progress)
}

/// Read an SBML document held in memory
pub fn read_sbml_str(xml: &str) -> Result<ReadOutcome, SbmlError> {
    read_document(xml, Diagnostics::new(), &mut NoProgress)
}

fn read_document(
    xml: &str,
    diagnostics: Diagnostics,
    progress: &mut dyn Progress,
) -> Result<ReadOutcome, SbmlError> {
    let root = parse_document(xml)?;
    if !root.is(SBML_NS, "sbml") {
        return Err(SbmlError::MalformedRoot(format!(
            "expected <sbml> in namespace {}, found <{}>",
            SBML_NS, root.name
        )));
    }
    match root.attr("level") {
        Some("3") => {}
        other => {
            return Err(SbmlError::MalformedRoot(format!(
                "only SBML level 3 is supported, document has level {}",
                other.unwrap_or("none")
            )))
        }
    }
    let element = root
        .child(SBML_NS, "model")
        .ok_or_else(|| SbmlError::MissingElement("model".to_string()))?;

    let mut reader = ModelReader {
        ids: IdCodec::from_configuration(),
        parameters: HashMap::new(),
        diagnostics,
        progress,
    };
    let mut model = Model::new(element.attr("id").unwrap_or_default());
    model.name = element.attr("name").map(str::to_string);
    let completion = reader.read_model(element, &mut model)?;
    info!(
        "Read model {} with {} metabolites, {} reactions and {} genes",
        model.id,
        model.metabolites().len(),
        model.reactions().len(),
        model.genes().len()
    );
    Ok(ReadOutcome {
        model,
        diagnostics: reader.diagnostics,
        completion,
    })
}

struct ModelReader<'p> {
    ids: IdCodec,
    /// Flux bound parameters by id
    parameters: HashMap<String, f64>,
    diagnostics: Diagnostics,
    progress: &'p mut dyn Progress,
}

impl ModelReader<'_> {
    fn read_model(&mut self, element: &XmlElement, model: &mut Model) -> Result<Completion, SbmlError> {
        let compartments = element.list_items(SBML_NS, "listOfCompartments", "compartment");
        if !self.each("compartments", &compartments, |_, item| {
            let id = item.required_attr("id")?;
            model.add_compartment(Compartment::new(id, item.attr("name")))?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        let species = element.list_items(SBML_NS, "listOfSpecies", "species");
        if !self.each("metabolites", &species, |reader, item| {
            let metabolite = reader.read_species(item)?;
            model.add_metabolite(metabolite)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        let products = element.list_items(FBC_NS, "listOfGeneProducts", "geneProduct");
        if !self.each("genes", &products, |reader, item| {
            let gene = reader.read_gene_product(item)?;
            model.add_gene(gene)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        for parameter in element.list_items(SBML_NS, "listOfParameters", "parameter") {
            let id = parameter.required_attr("id")?;
            let value = parse_number(parameter.required_attr("value")?)?;
            self.parameters.insert(id.to_string(), value);
        }
        debug!("Read {} parameters", self.parameters.len());

        let reactions = element.list_items(SBML_NS, "listOfReactions", "reaction");
        if !self.each("reactions", &reactions, |reader, item| {
            let reaction = reader.read_reaction(item, model)?;
            model.add_reaction(reaction)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        self.read_objective(element, model)?;

        let references = element.list_items(GEM_NS, "listOfReferences", "reference");
        if !self.each("references", &references, |reader, item| {
            let reference = reader.read_reference(item)?;
            model.add_reference(reference)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        let tests = element.list_items(GEM_NS, "listOfTests", "test");
        if !self.each("test cases", &tests, |reader, item| {
            let test_case = reader.read_test_case(item, model)?;
            model.add_test_case(test_case)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }

        let evidences = element.list_items(GEM_NS, "listOfEvidences", "evidence");
        if !self.each("evidences", &evidences, |reader, item| {
            let evidence = reader.read_evidence(item, model)?;
            model.add_evidence(evidence)?;
            Ok(())
        })? {
            return Ok(Completion::Cancelled);
        }
        Ok(Completion::Complete)
    }

    /// Read every item of a list, returns false if reading was cancelled
    fn each<'e, F>(&mut self, label: &str, items: &[&'e XmlElement], mut read: F) -> Result<bool, SbmlError>
    where
        F: FnMut(&mut Self, &'e XmlElement) -> Result<(), SbmlError>,
    {
        debug!("Reading {} {}", items.len(), label);
        self.progress.set_label(&format!("Reading {}", label));
        self.progress.set_range(0, items.len());
        for (position, item) in items.iter().enumerate() {
            if self.progress.is_cancelled() {
                info!("Reading cancelled while reading {}", label);
                return Ok(false);
            }
            read(self, *item)?;
            self.progress.set_value(position + 1);
        }
        Ok(true)
    }

    fn read_species(&mut self, item: &XmlElement) -> Result<Metabolite, SbmlError> {
        let wire_id = item.required_attr("id")?;
        let id = self.ids.metabolite_from_wire(wire_id);
        let charge = match item.attr_ns_or_plain(FBC_NS, "charge") {
            Some(charge) => Some(
                charge
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| SbmlError::InvalidNumber(charge.to_string()))?,
            ),
            None => None,
        };
        let formula = match item.attr_ns_or_plain(FBC_NS, "chemicalFormula") {
            Some(formula) if formula.is_empty() => None,
            Some(formula) if !is_valid_formula(formula) => {
                self.diagnostics.warn(Warning::InvalidFormula {
                    metabolite: id.clone(),
                    formula: formula.to_string(),
                });
                None
            }
            formula => formula,
        };
        let mut metabolite =
            Metabolite::new(&id, item.attr("name"), item.attr("compartment"), formula, charge);
        let (annotation, comment) = read_annotation(item, wire_id, &mut self.diagnostics);
        metabolite.annotation = annotation;
        metabolite.comment = comment;
        Ok(metabolite)
    }

    fn read_gene_product(&mut self, item: &XmlElement) -> Result<Gene, SbmlError> {
        let wire_id = item.required_attr_ns(FBC_NS, "id")?;
        let id = self.ids.gene_from_wire(wire_id);
        let mut gene = Gene::new(
            &id,
            item.attr_ns_or_plain(FBC_NS, "name"),
            item.attr_ns(GEM_NS, "genome"),
        );
        gene.activity = match item.attr_ns(GEM_NS, "activity") {
            None | Some("active") => GeneActivity::Active,
            Some("inactive") => GeneActivity::Inactive,
            Some(other) => return Err(SbmlError::invalid_value(&item.name, "activity", other)),
        };
        let (annotation, comment) = read_annotation(item, wire_id, &mut self.diagnostics);
        gene.annotation = annotation;
        gene.comment = comment;
        Ok(gene)
    }

    fn bound(&mut self, item: &XmlElement, reaction: &str, attribute: &str, default: f64) -> Result<f64, SbmlError> {
        match item.attr_ns_or_plain(FBC_NS, attribute) {
            Some(parameter) => self.parameters.get(parameter).copied().ok_or_else(|| {
                SbmlError::MissingBoundDefinition {
                    reaction: reaction.to_string(),
                    parameter: parameter.to_string(),
                }
            }),
            None => {
                let bound = if attribute == "lowerFluxBound" { "lower" } else { "upper" };
                self.diagnostics.warn(Warning::MissingFluxBound {
                    reaction: reaction.to_string(),
                    bound: bound.to_string(),
                });
                Ok(default)
            }
        }
    }

    fn read_reaction(&mut self, item: &XmlElement, model: &Model) -> Result<Reaction, SbmlError> {
        let wire_id = item.required_attr("id")?;
        let id = self.ids.reaction_from_wire(wire_id);
        let mut reaction = Reaction::new_id_only(&id);
        reaction.name = item.attr("name").map(str::to_string);
        reaction.subsystem = item.attr_ns(GEM_NS, "subsystem").map(str::to_string);

        let lower_bound = self.bound(item, &id, "lowerFluxBound", default_lower_bound())?;
        let upper_bound = self.bound(item, &id, "upperFluxBound", default_upper_bound())?;
        reaction.set_bounds_unchecked(lower_bound, upper_bound);

        for (list, sign) in [("listOfReactants", -1.), ("listOfProducts", 1.)] {
            for reference in item.list_items(SBML_NS, list, "speciesReference") {
                let species = reference.required_attr("species")?;
                let metabolite = self.ids.metabolite_from_wire(species);
                if model.metabolite(&metabolite).is_none() {
                    return Err(SbmlError::UnknownSpecies {
                        reaction: id,
                        species: species.to_string(),
                    });
                }
                let stoichiometry = match reference.attr("stoichiometry") {
                    Some(value) => parse_number(value)?,
                    None => 1.,
                };
                *reaction.metabolites_mut().entry(metabolite).or_insert(0.) += sign * stoichiometry;
            }
        }
        reaction.metabolites_mut().retain(|metabolite, coefficient| {
            if *coefficient == 0. {
                debug!("Dropping metabolite {} with zero net coefficient from {}", metabolite, id);
            }
            *coefficient != 0.
        });

        if let Some(association) = item.child(FBC_NS, "geneProductAssociation") {
            let gpr = read_association(association, &self.ids)?;
            if let Some(gpr) = &gpr {
                for gene in gpr.genes() {
                    if model.gene(&gene).is_none() {
                        self.diagnostics.warn(Warning::UnknownGeneProduct {
                            reaction: id.clone(),
                            gene,
                        });
                    }
                }
            }
            reaction.set_gpr(gpr);
        }

        let (annotation, comment) = read_annotation(item, wire_id, &mut self.diagnostics);
        reaction.annotation = annotation;
        reaction.comment = comment;
        Ok(reaction)
    }

    /// Set objective coefficients from the active objective, or the first one
    fn read_objective(&mut self, element: &XmlElement, model: &mut Model) -> Result<(), SbmlError> {
        let list = match element.child(FBC_NS, "listOfObjectives") {
            Some(list) => list,
            None => return Ok(()),
        };
        let objectives: Vec<&XmlElement> = list.children_named(FBC_NS, "objective").collect();
        let active = list.attr_ns_or_plain(FBC_NS, "activeObjective");
        let objective = objectives
            .iter()
            .find(|o| active.is_some() && o.attr_ns_or_plain(FBC_NS, "id") == active)
            .or_else(|| objectives.first());
        let objective = match objective {
            Some(objective) => *objective,
            None => return Ok(()),
        };
        let sign = match objective.attr_ns_or_plain(FBC_NS, "type") {
            Some("minimize") => -1.,
            _ => 1.,
        };
        for flux in objective.list_items(FBC_NS, "listOfFluxObjectives", "fluxObjective") {
            let reaction = self
                .ids
                .reaction_from_wire(flux.required_attr_ns(FBC_NS, "reaction")?);
            let coefficient = match flux.attr_ns_or_plain(FBC_NS, "coefficient") {
                Some(value) => parse_number(value)?,
                None => 1.,
            };
            if model.reaction(&reaction).is_none() {
                self.diagnostics
                    .warn(Warning::UnknownObjectiveReaction { reaction });
                continue;
            }
            model.update_reaction(&reaction, |r| r.objective_coefficient = sign * coefficient)?;
        }
        Ok(())
    }

    fn read_reference(&mut self, item: &XmlElement) -> Result<Reference, SbmlError> {
        let mut reference = Reference::new(item.required_attr("id")?);
        let optional = |name: &str| item.attr(name).map(str::to_string);
        reference.pmid = optional("pmid");
        reference.pmc = optional("pmc");
        reference.doi = optional("doi");
        reference.year = optional("year");
        reference.url = optional("url");
        reference.title = item.child_text(GEM_NS, "title");
        reference.journal = item.child_text(GEM_NS, "journal");
        for author in item.list_items(GEM_NS, "listOfAuthors", "author") {
            reference.authors.push(Author::new(
                author.attr("lastname").unwrap_or_default(),
                author.attr("firstname").unwrap_or_default(),
                author.attr("initials").unwrap_or_default(),
            ));
        }
        let (annotation, _) = read_annotation(item, &reference.id, &mut self.diagnostics);
        reference.annotation = annotation;
        Ok(reference)
    }

    /// Links to known references, unknown ones are dropped with a warning
    fn reference_links(&mut self, item: &XmlElement, owner: &str, model: &Model) -> Result<IndexSet<String>, SbmlError> {
        let mut references = IndexSet::new();
        for link in item.list_items(GEM_NS, "listOfReferenceLinks", "referenceLink") {
            let reference = link.required_attr("reference")?;
            if model.reference(reference).is_some() {
                references.insert(reference.to_string());
            } else {
                self.diagnostics.warn(Warning::UnknownReference {
                    element: owner.to_string(),
                    reference: reference.to_string(),
                });
            }
        }
        Ok(references)
    }

    fn read_test_case(&mut self, item: &XmlElement, model: &Model) -> Result<TestCase, SbmlError> {
        let mut test_case = TestCase::new(
            item.required_attr("id")?,
            item.attr("description").unwrap_or_default(),
        );
        for setting in item.list_items(GEM_NS, "listOfReactionSettings", "reactionSetting") {
            let reaction = self.ids.reaction_from_wire(setting.required_attr("reaction")?);
            test_case.reaction_settings.push(ReactionSetting::new(
                &reaction,
                parse_number(setting.required_attr("lowerBound")?)?,
                parse_number(setting.required_attr("upperBound")?)?,
                match setting.attr("objectiveCoefficient") {
                    Some(value) => parse_number(value)?,
                    None => 0.,
                },
            ));
        }
        for setting in item.list_items(GEM_NS, "listOfGeneSettings", "geneSetting") {
            let gene = self.ids.gene_from_wire(setting.required_attr("gene")?);
            let activity = match setting.required_attr("activity")? {
                "active" => GeneActivity::Active,
                "inactive" => GeneActivity::Inactive,
                other => return Err(SbmlError::invalid_value(&setting.name, "activity", other)),
            };
            test_case.gene_settings.push(GeneSetting::new(&gene, activity));
        }
        for outcome in item.list_items(GEM_NS, "listOfOutcomes", "outcome") {
            let reaction = self.ids.reaction_from_wire(outcome.required_attr("reaction")?);
            let operator = outcome.required_attr("operator")?;
            let operator = OutcomeOperator::from_str(operator)
                .ok_or_else(|| SbmlError::invalid_value(&outcome.name, "operator", operator))?;
            let value = parse_number(outcome.required_attr("value")?)?;
            test_case.outcomes.push(Outcome::new(&reaction, operator, value));
        }
        test_case.references = self.reference_links(item, &test_case.id, model)?;
        Ok(test_case)
    }

    fn entity(&self, item: &XmlElement, kind: &str, id: &str) -> Result<Option<EntityRef>, SbmlError> {
        let (kind, wire_id) = match (item.attr(kind), item.attr(id)) {
            (Some(kind), Some(wire_id)) => (kind, wire_id),
            _ => return Ok(None),
        };
        let kind = EntityKind::from_str(kind)
            .ok_or_else(|| SbmlError::invalid_value(&item.name, "entity type", kind))?;
        let id = match kind {
            EntityKind::Metabolite => self.ids.metabolite_from_wire(wire_id),
            EntityKind::Reaction => self.ids.reaction_from_wire(wire_id),
            EntityKind::Gene => self.ids.gene_from_wire(wire_id),
        };
        Ok(Some(EntityRef::new(kind, &id)))
    }

    fn read_evidence(&mut self, item: &XmlElement, model: &Model) -> Result<Evidence, SbmlError> {
        let entity = self.entity(item, "entityType", "entity")?;
        let mut evidence = Evidence::new(
            item.required_attr("id")?,
            entity,
            item.attr("assertion").unwrap_or_default(),
        );
        evidence.eco = item.attr("eco").map(str::to_string);
        evidence.target = self.entity(item, "targetType", "target")?;
        evidence.comment = item.child_text(GEM_NS, "comment");
        evidence.references = self.reference_links(item, &evidence.id, model)?;
        Ok(evidence)
    }
}
