//! Writing a [`Model`] as an SBML document
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::io::sbml::annotation::{write_annotation, write_comment};
use crate::io::sbml::gene_association::write_association;
use crate::io::sbml::{
    format_number, IdCodec, SbmlError, BQBIOL_NS, FBC_NS, GEM_NS, RDF_NS, SBML_NS,
};
use crate::io::{Completion, NoProgress, Progress};
use crate::metabolic_model::evidence::{EntityKind, EntityRef};
use crate::metabolic_model::gene::GeneActivity;
use crate::metabolic_model::model::Model;

const FLUX_UNIT: &str = "mmol_per_gDW_per_hr";

/// Write `model` to an SBML file
///
/// # Examples
/// ```no_run
/// use gemrs_core::io::sbml::write_sbml;
/// use gemrs_core::metabolic_model::model::Model;
/// let model = Model::new("empty");
/// write_sbml(&model, "empty.xml").unwrap();
/// ```
pub fn write_sbml<P: AsRef<Path>>(model: &Model, path: P) -> Result<Completion, SbmlError> {
    write_sbml_with_progress(model, path, &mut NoProgress)
}

/// Write `model` to an SBML file, reporting progress per record.
///
/// The document is assembled in memory, a cancelled write leaves `path` untouched.
pub fn write_sbml_with_progress<P: AsRef<Path>>(
    model: &Model,
    path: P,
    progress: &mut dyn Progress,
) -> Result<Completion, SbmlError> {
    let path = path.as_ref();
    info!("Writing model {} to {}", model.id, path.display());
    match render(model, progress)? {
        Some(document) => {
            std::fs::write(path, document)?;
            Ok(Completion::Complete)
        }
        None => {
            info!("Writing {} cancelled, no file written", path.display());
            Ok(Completion::Cancelled)
        }
    }
}

/// Render `model` as an SBML document string
pub fn write_sbml_string(model: &Model) -> Result<String, SbmlError> {
    let document = render(model, &mut NoProgress)?.unwrap_or_default();
    String::from_utf8(document).map_err(|e| SbmlError::Utf8(e.utf8_error()))
}

fn render(model: &Model, progress: &mut dyn Progress) -> Result<Option<Vec<u8>>, SbmlError> {
    let mut writer = ModelWriter {
        xml: Writer::new_with_indent(Vec::new(), b' ', 2),
        ids: IdCodec::from_configuration(),
        progress,
    };
    if writer.write_document(model)? {
        Ok(Some(writer.xml.into_inner()))
    } else {
        Ok(None)
    }
}

/// Flux bound values and the parameter ids they are written as
#[derive(Debug, Default)]
struct BoundParameters {
    parameters: IndexMap<String, f64>,
}

impl BoundParameters {
    fn new() -> Self {
        let mut parameters = IndexMap::new();
        parameters.insert("cobra_default_lb".to_string(), default_lower_bound());
        parameters.insert("cobra_default_ub".to_string(), default_upper_bound());
        parameters.insert("cobra_0_bound".to_string(), 0.);
        BoundParameters { parameters }
    }

    /// Parameter id for `value`, registering a new parameter the first time a value is seen
    fn id_for(&mut self, value: f64) -> String {
        if let Some((id, _)) = self.parameters.iter().find(|(_, v)| **v == value) {
            return id.clone();
        }
        let id = if value.is_nan() {
            "bound_nan".to_string()
        } else {
            let sign = if value < 0. { "neg" } else { "pos" };
            let magnitude = if value.is_infinite() {
                "inf".to_string()
            } else {
                format!("{}", value.abs()).replace('.', "_")
            };
            format!("bound_{}_{}", sign, magnitude)
        };
        self.parameters.insert(id.clone(), value);
        id
    }
}

fn start<'a>(tag: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(tag);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    element
}

struct ModelWriter<'p> {
    xml: Writer<Vec<u8>>,
    ids: IdCodec,
    progress: &'p mut dyn Progress,
}

impl ModelWriter<'_> {
    fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), SbmlError> {
        self.xml.write_event(Event::Start(start(tag, attributes)))?;
        Ok(())
    }

    fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), SbmlError> {
        self.xml.write_event(Event::Empty(start(tag, attributes)))?;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<(), SbmlError> {
        self.xml.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<(), SbmlError> {
        self.open(tag, &[])?;
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        self.close(tag)
    }

    /// Announce a list of `len` records
    fn begin(&mut self, label: &str, len: usize) {
        debug!("Writing {} {}", len, label);
        self.progress.set_label(&format!("Writing {}", label));
        self.progress.set_range(0, len);
    }

    /// Check for cancellation before record `position`
    fn proceed(&mut self, position: usize) -> bool {
        if position > 0 {
            self.progress.set_value(position);
        }
        !self.progress.is_cancelled()
    }

    /// Write the whole document, returns false if writing was cancelled
    fn write_document(&mut self, model: &Model) -> Result<bool, SbmlError> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.open(
            "sbml",
            &[
                ("xmlns", SBML_NS),
                ("level", "3"),
                ("version", "1"),
                ("sboTerm", "SBO:0000624"),
                ("xmlns:fbc", FBC_NS),
                ("fbc:required", "false"),
                ("xmlns:gem", GEM_NS),
                ("xmlns:rdf", RDF_NS),
                ("xmlns:bqbiol", BQBIOL_NS),
            ],
        )?;
        let mut attributes = vec![("id", model.id.as_str())];
        if let Some(name) = &model.name {
            attributes.push(("name", name.as_str()));
        }
        attributes.push(("fbc:strict", "true"));
        self.open("model", &attributes)?;

        self.write_units()?;
        let completed = self.write_compartments(model)?
            && self.write_species(model)?
            && self.write_gene_products(model)?
            && self.write_reactions(model)?
            && self.write_references(model)?;
        if !completed {
            return Ok(false);
        }
        self.write_tests(model)?;
        self.write_evidences(model)?;

        self.close("model")?;
        self.close("sbml")?;
        Ok(true)
    }

    fn write_units(&mut self) -> Result<(), SbmlError> {
        self.open("listOfUnitDefinitions", &[])?;
        self.open("unitDefinition", &[("id", FLUX_UNIT)])?;
        self.open("listOfUnits", &[])?;
        self.empty(
            "unit",
            &[("kind", "mole"), ("scale", "-3"), ("multiplier", "1"), ("exponent", "1")],
        )?;
        self.empty(
            "unit",
            &[("kind", "gram"), ("scale", "0"), ("multiplier", "1"), ("exponent", "-1")],
        )?;
        self.empty(
            "unit",
            &[("kind", "second"), ("scale", "0"), ("multiplier", "3600"), ("exponent", "-1")],
        )?;
        self.close("listOfUnits")?;
        self.close("unitDefinition")?;
        self.close("listOfUnitDefinitions")
    }

    fn write_compartments(&mut self, model: &Model) -> Result<bool, SbmlError> {
        self.begin("compartments", model.compartments().len());
        self.open("listOfCompartments", &[])?;
        for (position, compartment) in model.compartments().values().enumerate() {
            if !self.proceed(position) {
                return Ok(false);
            }
            let mut attributes = vec![("id", compartment.id.as_str())];
            if let Some(name) = &compartment.name {
                attributes.push(("name", name.as_str()));
            }
            attributes.push(("constant", "true"));
            self.empty("compartment", &attributes)?;
        }
        self.close("listOfCompartments")?;
        Ok(self.proceed(model.compartments().len()))
    }

    fn write_species(&mut self, model: &Model) -> Result<bool, SbmlError> {
        self.begin("metabolites", model.metabolites().len());
        self.open("listOfSpecies", &[])?;
        for (position, metabolite) in model.metabolites().values().enumerate() {
            if !self.proceed(position) {
                return Ok(false);
            }
            let wire_id = self.ids.metabolite_to_wire(metabolite.id());
            let charge = metabolite.charge().map(|c| c.to_string());
            let mut attributes = vec![("id", wire_id.as_str()), ("metaid", wire_id.as_str())];
            if let Some(name) = &metabolite.name {
                attributes.push(("name", name.as_str()));
            }
            if let Some(compartment) = metabolite.compartment() {
                attributes.push(("compartment", compartment));
            }
            attributes.extend([
                ("hasOnlySubstanceUnits", "false"),
                ("boundaryCondition", "false"),
                ("constant", "false"),
            ]);
            if let Some(charge) = &charge {
                attributes.push(("fbc:charge", charge.as_str()));
            }
            if let Some(formula) = metabolite.formula() {
                attributes.push(("fbc:chemicalFormula", formula));
            }
            if metabolite.annotation.is_empty() && metabolite.comment.is_none() {
                self.empty("species", &attributes)?;
            } else {
                self.open("species", &attributes)?;
                write_annotation(
                    &mut self.xml,
                    &wire_id,
                    &metabolite.annotation,
                    metabolite.comment.as_deref(),
                )?;
                self.close("species")?;
            }
        }
        self.close("listOfSpecies")?;
        Ok(self.proceed(model.metabolites().len()))
    }

    fn write_gene_products(&mut self, model: &Model) -> Result<bool, SbmlError> {
        self.begin("genes", model.genes().len());
        self.open("fbc:listOfGeneProducts", &[])?;
        for (position, gene) in model.genes().values().enumerate() {
            if !self.proceed(position) {
                return Ok(false);
            }
            let wire_id = self.ids.gene_to_wire(gene.id());
            let mut attributes = vec![("fbc:id", wire_id.as_str()), ("metaid", wire_id.as_str())];
            if let Some(name) = &gene.name {
                attributes.push(("fbc:name", name.as_str()));
            }
            attributes.push(("fbc:label", gene.id()));
            if let Some(genome) = &gene.genome {
                attributes.push(("gem:genome", genome.as_str()));
            }
            if gene.activity == GeneActivity::Inactive {
                attributes.push(("gem:activity", "inactive"));
            }
            if gene.annotation.is_empty() && gene.comment.is_none() {
                self.empty("fbc:geneProduct", &attributes)?;
            } else {
                self.open("fbc:geneProduct", &attributes)?;
                write_annotation(&mut self.xml, &wire_id, &gene.annotation, gene.comment.as_deref())?;
                self.close("fbc:geneProduct")?;
            }
        }
        self.close("fbc:listOfGeneProducts")?;
        Ok(self.proceed(model.genes().len()))
    }

    fn write_reactions(&mut self, model: &Model) -> Result<bool, SbmlError> {
        let mut parameters = BoundParameters::new();
        let bounds: Vec<(String, String)> = model
            .reactions()
            .values()
            .map(|r| (parameters.id_for(r.lower_bound()), parameters.id_for(r.upper_bound())))
            .collect();
        debug!("Writing {} flux bound parameters", parameters.parameters.len());
        self.open("listOfParameters", &[])?;
        for (id, value) in &parameters.parameters {
            let value = format_number(*value);
            self.empty(
                "parameter",
                &[
                    ("id", id.as_str()),
                    ("value", value.as_str()),
                    ("sboTerm", "SBO:0000626"),
                    ("constant", "true"),
                    ("units", FLUX_UNIT),
                ],
            )?;
        }
        self.close("listOfParameters")?;

        self.begin("reactions", model.reactions().len());
        self.open("listOfReactions", &[])?;
        for (position, (reaction, (lower, upper))) in
            model.reactions().values().zip(&bounds).enumerate()
        {
            if !self.proceed(position) {
                return Ok(false);
            }
            let wire_id = self.ids.reaction_to_wire(reaction.id());
            let mut attributes = vec![("id", wire_id.as_str()), ("metaid", wire_id.as_str())];
            if let Some(name) = &reaction.name {
                attributes.push(("name", name.as_str()));
            }
            attributes.extend([
                ("reversible", if reaction.reversible() { "true" } else { "false" }),
                ("fast", "false"),
                ("fbc:lowerFluxBound", lower.as_str()),
                ("fbc:upperFluxBound", upper.as_str()),
            ]);
            if let Some(subsystem) = &reaction.subsystem {
                attributes.push(("gem:subsystem", subsystem.as_str()));
            }
            self.open("reaction", &attributes)?;
            write_annotation(
                &mut self.xml,
                &wire_id,
                &reaction.annotation,
                reaction.comment.as_deref(),
            )?;
            for (list, reactants) in [("listOfReactants", true), ("listOfProducts", false)] {
                let participants: Vec<(&String, &f64)> = reaction
                    .metabolites()
                    .iter()
                    .filter(|(_, c)| (**c < 0.) == reactants)
                    .collect();
                if participants.is_empty() {
                    continue;
                }
                self.open(list, &[])?;
                for (metabolite, coefficient) in participants {
                    let species = self.ids.metabolite_to_wire(metabolite);
                    let stoichiometry = format_number(coefficient.abs());
                    self.empty(
                        "speciesReference",
                        &[
                            ("species", species.as_str()),
                            ("stoichiometry", stoichiometry.as_str()),
                            ("constant", "true"),
                        ],
                    )?;
                }
                self.close(list)?;
            }
            if let Some(gpr) = reaction.gpr() {
                write_association(&mut self.xml, gpr, &self.ids)?;
            }
            self.close("reaction")?;
        }
        self.close("listOfReactions")?;
        if !self.proceed(model.reactions().len()) {
            return Ok(false);
        }
        self.write_objective(model)?;
        Ok(true)
    }

    fn write_objective(&mut self, model: &Model) -> Result<(), SbmlError> {
        let objective = model.objective();
        if objective.is_empty() {
            return Ok(());
        }
        self.open("fbc:listOfObjectives", &[("fbc:activeObjective", "obj")])?;
        self.open("fbc:objective", &[("fbc:id", "obj"), ("fbc:type", "maximize")])?;
        self.open("fbc:listOfFluxObjectives", &[])?;
        for (reaction, coefficient) in &objective {
            let wire_id = self.ids.reaction_to_wire(reaction);
            let coefficient = format_number(*coefficient);
            self.empty(
                "fbc:fluxObjective",
                &[
                    ("fbc:reaction", wire_id.as_str()),
                    ("fbc:coefficient", coefficient.as_str()),
                ],
            )?;
        }
        self.close("fbc:listOfFluxObjectives")?;
        self.close("fbc:objective")?;
        self.close("fbc:listOfObjectives")
    }

    fn write_references(&mut self, model: &Model) -> Result<bool, SbmlError> {
        if model.references().is_empty() {
            return Ok(true);
        }
        self.begin("references", model.references().len());
        self.open("gem:listOfReferences", &[])?;
        for (position, reference) in model.references().values().enumerate() {
            if !self.proceed(position) {
                return Ok(false);
            }
            let mut attributes = vec![("id", reference.id.as_str())];
            if !reference.annotation.is_empty() {
                attributes.push(("metaid", reference.id.as_str()));
            }
            for (name, value) in [
                ("pmid", &reference.pmid),
                ("pmc", &reference.pmc),
                ("doi", &reference.doi),
                ("year", &reference.year),
                ("url", &reference.url),
            ] {
                if let Some(value) = value {
                    attributes.push((name, value.as_str()));
                }
            }
            self.open("gem:reference", &attributes)?;
            if let Some(title) = &reference.title {
                self.text_element("gem:title", title)?;
            }
            if let Some(journal) = &reference.journal {
                self.text_element("gem:journal", journal)?;
            }
            if !reference.authors.is_empty() {
                self.open("gem:listOfAuthors", &[])?;
                for author in &reference.authors {
                    self.empty(
                        "gem:author",
                        &[
                            ("lastname", author.lastname.as_str()),
                            ("firstname", author.firstname.as_str()),
                            ("initials", author.initials.as_str()),
                        ],
                    )?;
                }
                self.close("gem:listOfAuthors")?;
            }
            write_annotation(&mut self.xml, &reference.id, &reference.annotation, None)?;
            self.close("gem:reference")?;
        }
        self.close("gem:listOfReferences")?;
        Ok(self.proceed(model.references().len()))
    }

    fn write_reference_links<'a, I>(&mut self, references: I) -> Result<(), SbmlError>
    where
        I: ExactSizeIterator<Item = &'a String>,
    {
        if references.len() == 0 {
            return Ok(());
        }
        self.open("gem:listOfReferenceLinks", &[])?;
        for reference in references {
            self.empty("gem:referenceLink", &[("reference", reference.as_str())])?;
        }
        self.close("gem:listOfReferenceLinks")
    }

    fn write_tests(&mut self, model: &Model) -> Result<(), SbmlError> {
        if model.test_cases().is_empty() {
            return Ok(());
        }
        debug!("Writing {} test cases", model.test_cases().len());
        self.open("gem:listOfTests", &[])?;
        for test in model.test_cases().values() {
            self.open(
                "gem:test",
                &[("id", test.id.as_str()), ("description", test.description.as_str())],
            )?;
            if !test.reaction_settings.is_empty() {
                self.open("gem:listOfReactionSettings", &[])?;
                for setting in &test.reaction_settings {
                    let reaction = self.ids.reaction_to_wire(&setting.reaction);
                    let lower = format_number(setting.lower_bound);
                    let upper = format_number(setting.upper_bound);
                    let objective = format_number(setting.objective_coefficient);
                    self.empty(
                        "gem:reactionSetting",
                        &[
                            ("reaction", reaction.as_str()),
                            ("lowerBound", lower.as_str()),
                            ("upperBound", upper.as_str()),
                            ("objectiveCoefficient", objective.as_str()),
                        ],
                    )?;
                }
                self.close("gem:listOfReactionSettings")?;
            }
            if !test.gene_settings.is_empty() {
                self.open("gem:listOfGeneSettings", &[])?;
                for setting in &test.gene_settings {
                    let gene = self.ids.gene_to_wire(&setting.gene);
                    let activity = match setting.activity {
                        GeneActivity::Active => "active",
                        GeneActivity::Inactive => "inactive",
                    };
                    self.empty(
                        "gem:geneSetting",
                        &[("gene", gene.as_str()), ("activity", activity)],
                    )?;
                }
                self.close("gem:listOfGeneSettings")?;
            }
            if !test.outcomes.is_empty() {
                self.open("gem:listOfOutcomes", &[])?;
                for outcome in &test.outcomes {
                    let reaction = self.ids.reaction_to_wire(&outcome.reaction);
                    let value = format_number(outcome.value);
                    self.empty(
                        "gem:outcome",
                        &[
                            ("reaction", reaction.as_str()),
                            ("operator", outcome.operator.as_str()),
                            ("value", value.as_str()),
                        ],
                    )?;
                }
                self.close("gem:listOfOutcomes")?;
            }
            self.write_reference_links(test.references.iter())?;
            self.close("gem:test")?;
        }
        self.close("gem:listOfTests")
    }

    fn entity_wire_id(&self, entity: &EntityRef) -> String {
        match entity.kind {
            EntityKind::Metabolite => self.ids.metabolite_to_wire(&entity.id),
            EntityKind::Reaction => self.ids.reaction_to_wire(&entity.id),
            EntityKind::Gene => self.ids.gene_to_wire(&entity.id),
        }
    }

    fn write_evidences(&mut self, model: &Model) -> Result<(), SbmlError> {
        if model.evidences().is_empty() {
            return Ok(());
        }
        debug!("Writing {} evidences", model.evidences().len());
        self.open("gem:listOfEvidences", &[])?;
        for evidence in model.evidences().values() {
            let entity = evidence.entity.as_ref().map(|e| self.entity_wire_id(e));
            let target = evidence.target.as_ref().map(|e| self.entity_wire_id(e));
            let mut attributes = vec![
                ("id", evidence.id.as_str()),
                ("assertion", evidence.assertion.as_str()),
            ];
            if let Some(eco) = &evidence.eco {
                attributes.push(("eco", eco.as_str()));
            }
            if let (Some(kind), Some(id)) = (&evidence.entity, &entity) {
                attributes.push(("entityType", kind.kind.as_str()));
                attributes.push(("entity", id.as_str()));
            }
            if let (Some(kind), Some(id)) = (&evidence.target, &target) {
                attributes.push(("targetType", kind.kind.as_str()));
                attributes.push(("target", id.as_str()));
            }
            self.open("gem:evidence", &attributes)?;
            if let Some(comment) = &evidence.comment {
                write_comment(&mut self.xml, comment)?;
            }
            self.write_reference_links(evidence.references.iter())?;
            self.close("gem:evidence")?;
        }
        self.close("gem:listOfEvidences")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sbml::read_sbml_str;
    use crate::io::Warning;
    use crate::metabolic_model::metabolite::Metabolite;
    use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};

    fn document(model_body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="{}" xmlns:fbc="{}" xmlns:rdf="{}" xmlns:bqbiol="{}" level="3" version="1">
  <model id="m" fbc:strict="true">
    <listOfCompartments><compartment id="c" constant="true"/></listOfCompartments>
    <listOfSpecies>
      <species id="M_a_c" compartment="c" hasOnlySubstanceUnits="false" boundaryCondition="false" constant="false"/>
    </listOfSpecies>
    <fbc:listOfGeneProducts>
      <fbc:geneProduct fbc:id="G_g1" fbc:label="g1"/>
    </fbc:listOfGeneProducts>
    <listOfParameters>
      <parameter id="cobra_default_lb" value="-1000" constant="true"/>
      <parameter id="cobra_default_ub" value="1000" constant="true"/>
    </listOfParameters>
    {}
  </model>
</sbml>"#,
            SBML_NS, FBC_NS, RDF_NS, BQBIOL_NS, model_body
        )
    }

    #[test]
    fn bound_parameters_are_shared() {
        let mut model = Model::new("m");
        model.add_reaction(Reaction::new_id_only("R1")).unwrap();
        model.add_reaction(Reaction::new_id_only("R2")).unwrap();
        let irreversible = ReactionBuilder::default()
            .id("R3")
            .lower_bound(0.)
            .upper_bound(12.5)
            .build()
            .unwrap();
        model.add_reaction(irreversible).unwrap();
        let xml = write_sbml_string(&model).unwrap();
        assert_eq!(xml.matches(r#"<parameter id="cobra_default_lb""#).count(), 1);
        assert_eq!(xml.matches(r#"fbc:lowerFluxBound="cobra_default_lb""#).count(), 2);
        assert_eq!(xml.matches(r#"fbc:upperFluxBound="cobra_default_ub""#).count(), 2);
        assert!(xml.contains(r#"fbc:lowerFluxBound="cobra_0_bound""#));
        assert!(xml.contains(r#"<parameter id="bound_pos_12_5" value="12.5""#));
        let read = read_sbml_str(&xml).unwrap().model;
        assert_eq!(read.reaction("R3").unwrap().upper_bound(), 12.5);
    }

    #[test]
    fn bound_parameter_names() {
        let mut parameters = BoundParameters::new();
        assert_eq!(parameters.id_for(-1000.), "cobra_default_lb");
        assert_eq!(parameters.id_for(0.), "cobra_0_bound");
        assert_eq!(parameters.id_for(-0.), "cobra_0_bound");
        assert_eq!(parameters.id_for(f64::NEG_INFINITY), "bound_neg_inf");
        assert_eq!(parameters.id_for(-2.5), "bound_neg_2_5");
        assert_eq!(parameters.id_for(-2.5), "bound_neg_2_5");
        assert_eq!(parameters.parameters.len(), 5);
    }

    #[test]
    fn unknown_gene_node_is_fatal() {
        let xml = document(
            r#"<listOfReactions><reaction id="R_r" reversible="true" fast="false"
                fbc:lowerFluxBound="cobra_default_lb" fbc:upperFluxBound="cobra_default_ub">
              <fbc:geneProductAssociation><fbc:xor><fbc:geneProductRef fbc:geneProduct="G_g1"/></fbc:xor></fbc:geneProductAssociation>
            </reaction></listOfReactions>"#,
        );
        assert!(matches!(read_sbml_str(&xml), Err(SbmlError::UnknownNodeTag(tag)) if tag == "xor"));
    }

    #[test]
    fn undefined_bound_parameter_is_fatal() {
        let xml = document(
            r#"<listOfReactions><reaction id="R_r" reversible="true" fast="false"
                fbc:lowerFluxBound="R_r_lower_bound" fbc:upperFluxBound="cobra_default_ub"/>
            </listOfReactions>"#,
        );
        match read_sbml_str(&xml) {
            Err(SbmlError::MissingBoundDefinition { reaction, parameter }) => {
                assert_eq!(reaction, "r");
                assert_eq!(parameter, "R_r_lower_bound");
            }
            other => panic!("Expected MissingBoundDefinition, got {:?}", other),
        }
    }

    #[test]
    fn undeclared_species_is_fatal() {
        let xml = document(
            r#"<listOfReactions><reaction id="R_r" reversible="true" fast="false"
                fbc:lowerFluxBound="cobra_default_lb" fbc:upperFluxBound="cobra_default_ub">
              <listOfReactants><speciesReference species="M_missing" stoichiometry="1" constant="true"/></listOfReactants>
            </reaction></listOfReactions>"#,
        );
        assert!(matches!(
            read_sbml_str(&xml),
            Err(SbmlError::UnknownSpecies { species, .. }) if species == "M_missing"
        ));
    }

    #[test]
    fn wrong_root() {
        let xml = format!(r#"<sbml xmlns="{}" level="2" version="4"/>"#, SBML_NS);
        assert!(matches!(read_sbml_str(&xml), Err(SbmlError::MalformedRoot(_))));
        assert!(matches!(
            read_sbml_str(r#"<notsbml level="3"/>"#),
            Err(SbmlError::MalformedRoot(_))
        ));
        let xml = format!(r#"<sbml xmlns="{}" level="3" version="1"/>"#, SBML_NS);
        assert!(matches!(read_sbml_str(&xml), Err(SbmlError::MissingElement(_))));
    }

    #[test]
    fn recoverable_problems_are_warnings() {
        let xml = document(
            r##"<listOfReactions>
              <reaction id="R_r" metaid="R_r" reversible="true" fast="false" fbc:upperFluxBound="cobra_default_ub">
                <annotation><rdf:RDF><rdf:Description rdf:about="#R_r"><bqbiol:is><rdf:Bag>
                  <rdf:li rdf:resource="https://www.example.org/reaction/1"/>
                </rdf:Bag></bqbiol:is></rdf:Description></rdf:RDF></annotation>
                <listOfProducts><speciesReference species="M_a_c" constant="true"/></listOfProducts>
                <fbc:geneProductAssociation>
                  <fbc:or><fbc:geneProductRef fbc:geneProduct="G_g1"/><fbc:geneProductRef fbc:geneProduct="G_g2"/></fbc:or>
                </fbc:geneProductAssociation>
              </reaction>
            </listOfReactions>
            <fbc:listOfObjectives fbc:activeObjective="obj">
              <fbc:objective fbc:id="obj" fbc:type="minimize">
                <fbc:listOfFluxObjectives>
                  <fbc:fluxObjective fbc:reaction="R_r" fbc:coefficient="1"/>
                  <fbc:fluxObjective fbc:reaction="R_missing" fbc:coefficient="1"/>
                </fbc:listOfFluxObjectives>
              </fbc:objective>
            </fbc:listOfObjectives>"##,
        );
        let outcome = read_sbml_str(&xml).unwrap();
        let reaction = outcome.model.reaction("r").unwrap();
        assert_eq!(reaction.lower_bound(), default_lower_bound());
        assert_eq!(reaction.coefficient("a_c"), Some(1.));
        assert_eq!(reaction.objective_coefficient, -1.);
        assert!(reaction.annotation.is_empty());
        assert!(outcome.model.gene("g2").is_some());
        assert_eq!(
            outcome.diagnostics.warnings(),
            &[
                Warning::MissingFluxBound {
                    reaction: "r".to_string(),
                    bound: "lower".to_string()
                },
                Warning::UnknownGeneProduct {
                    reaction: "r".to_string(),
                    gene: "g2".to_string()
                },
                Warning::UnresolvableAnnotation {
                    element: "R_r".to_string(),
                    uri: "https://www.example.org/reaction/1".to_string()
                },
                Warning::UnknownObjectiveReaction {
                    reaction: "missing".to_string()
                },
            ]
        );
    }

    #[test]
    fn species_without_charge() {
        let mut model = Model::new("m");
        model
            .add_metabolite(Metabolite::new("x_c", None, Some("c"), None, None))
            .unwrap();
        let xml = write_sbml_string(&model).unwrap();
        assert!(!xml.contains("fbc:charge"));
        assert!(!xml.contains("fbc:chemicalFormula"));
        let read = read_sbml_str(&xml).unwrap().model;
        assert_eq!(read.metabolite("x_c").unwrap().charge(), None);
        assert_eq!(read.compartments().len(), 1);
    }
}
