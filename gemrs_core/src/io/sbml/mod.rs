//! Reading and writing models as SBML level 3 version 1 documents with the flux balance
//! constraints (fbc) package.
//!
//! Subsystems, comments, references, test cases and evidences, which SBML has no place for,
//! are written in an additional namespace bound to the `gem` prefix.
use log::warn;
use thiserror::Error;

use crate::configuration::id_prefixes;
use crate::metabolic_model::model::ModelError;

mod annotation;
mod dom;
mod gene_association;
mod reader;
mod writer;

pub use reader::{read_sbml, read_sbml_str, read_sbml_with_progress};
pub use writer::{write_sbml, write_sbml_string, write_sbml_with_progress};

pub const SBML_NS: &str = "http://www.sbml.org/sbml/level3/version1/core";
pub const FBC_NS: &str = "http://www.sbml.org/sbml/level3/version1/fbc/version2";
pub const GEM_NS: &str = "http://www.gemrs.org/sbml-extension/v1";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const BQBIOL_NS: &str = "http://biomodels.net/biology-qualifiers/";

/// Replacement for `.` in gene ids on the wire
pub const DOT_ESCAPE: &str = "__DOT__";

/// Errors which abort reading or writing a document
#[derive(Debug, Error)]
pub enum SbmlError {
    #[error("Malformed root element: {0}")]
    MalformedRoot(String),
    #[error("Missing required element <{0}>")]
    MissingElement(String),
    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
    #[error("Unknown element <{0}> in gene product association")]
    UnknownNodeTag(String),
    #[error("Reaction '{reaction}' uses undefined bound parameter '{parameter}'")]
    MissingBoundDefinition { reaction: String, parameter: String },
    #[error("Reaction '{reaction}' references undeclared species '{species}'")]
    UnknownSpecies { reaction: String, species: String },
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("Element <{element}> has invalid {attribute} '{value}'")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
    },
    #[error("Namespace prefix '{0}' is not declared")]
    UndeclaredPrefix(String),
    #[error("Invalid model content: {0}")]
    Model(#[from] ModelError),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SbmlError {
    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        SbmlError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn invalid_value(element: &str, attribute: &str, value: &str) -> Self {
        SbmlError::InvalidValue {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

/// Maps in-memory ids to wire ids and back.
///
/// Wire ids carry a per kind prefix, gene ids additionally have every `.` escaped.
///
/// The escape is not injective: a gene id that already contains the literal `__DOT__` is
/// read back with a `.` in its place. Writing such an id logs a warning.
#[derive(Clone, Debug)]
pub(crate) struct IdCodec {
    metabolite: String,
    gene: String,
    reaction: String,
}

impl IdCodec {
    /// Codec using the prefixes of the current configuration
    pub(crate) fn from_configuration() -> Self {
        let (metabolite, gene, reaction) = id_prefixes();
        IdCodec {
            metabolite,
            gene,
            reaction,
        }
    }

    pub(crate) fn metabolite_to_wire(&self, id: &str) -> String {
        format!("{}{}", self.metabolite, id)
    }

    pub(crate) fn metabolite_from_wire(&self, id: &str) -> String {
        id.strip_prefix(self.metabolite.as_str())
            .unwrap_or(id)
            .to_string()
    }

    pub(crate) fn gene_to_wire(&self, id: &str) -> String {
        if id.contains(DOT_ESCAPE) {
            warn!("Gene id {} contains {} and will be read back changed", id, DOT_ESCAPE);
        }
        format!("{}{}", self.gene, id.replace('.', DOT_ESCAPE))
    }

    pub(crate) fn gene_from_wire(&self, id: &str) -> String {
        id.strip_prefix(self.gene.as_str())
            .unwrap_or(id)
            .replace(DOT_ESCAPE, ".")
    }

    pub(crate) fn reaction_to_wire(&self, id: &str) -> String {
        format!("{}{}", self.reaction, id)
    }

    pub(crate) fn reaction_from_wire(&self, id: &str) -> String {
        id.strip_prefix(self.reaction.as_str())
            .unwrap_or(id)
            .to_string()
    }
}

/// Format a number the way SBML expects it, infinities as `INF`/`-INF`
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format!("{}", value)
    }
}

pub(crate) fn parse_number(value: &str) -> Result<f64, SbmlError> {
    match value.trim() {
        "INF" | "inf" | "Infinity" | "infinity" => Ok(f64::INFINITY),
        "-INF" | "-inf" | "-Infinity" | "-infinity" => Ok(f64::NEG_INFINITY),
        "NaN" | "nan" => Ok(f64::NAN),
        other => other
            .parse::<f64>()
            .map_err(|_| SbmlError::InvalidNumber(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Completion, NoProgress, Progress, Warning};
    use crate::metabolic_model::annotation::{Annotatable, Annotation, AnnotationType};
    use crate::metabolic_model::compartment::Compartment;
    use crate::metabolic_model::evidence::{EntityKind, EntityRef, Evidence};
    use crate::metabolic_model::gene::{Gene, GeneActivity, GprOperatorType};
    use crate::metabolic_model::metabolite::Metabolite;
    use crate::metabolic_model::model::Model;
    use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};
    use crate::metabolic_model::reference::{Author, Reference};
    use crate::metabolic_model::test_case::{
        GeneSetting, Outcome, OutcomeOperator, ReactionSetting, TestCase,
    };
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn stoichiometry(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries.iter().map(|(m, c)| (m.to_string(), *c)).collect()
    }

    /// Small glycolysis fragment touching every part of the document
    fn curated_model() -> Model {
        let mut model = Model::new("iTest");
        model.name = Some("Test model".to_string());
        model
            .add_compartment(Compartment::new("c", Some("cytosol")))
            .unwrap();
        model
            .add_compartment(Compartment::new("e", Some("extracellular space")))
            .unwrap();

        let mut glc_e = Metabolite::new("glc__D_e", Some("D-Glucose"), Some("e"), Some("C6H12O6"), Some(0));
        glc_e.add_annotation(Annotation::new("chebi", "CHEBI:4167"));
        glc_e.add_annotation(Annotation::with_type("kegg.compound", "C00031", AnnotationType::Has));
        glc_e.comment = Some("Carbon source".to_string());
        model.add_metabolite(glc_e).unwrap();
        model
            .add_metabolite(Metabolite::new("glc__D_c", Some("D-Glucose"), Some("c"), Some("C6H12O6"), Some(0)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("atp_c", Some("ATP"), Some("c"), Some("C10H12N5O13P3"), Some(-4)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("adp_c", Some("ADP"), Some("c"), Some("C10H12N5O10P2"), Some(-3)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("g6p_c", None, Some("c"), Some("C6H11O9P"), Some(-2)))
            .unwrap();
        model
            .add_metabolite(Metabolite::new("h_c", None, Some("c"), Some("H"), None))
            .unwrap();

        let mut gene = Gene::new("b1.23", Some("glk"), Some("K-12 MG1655"));
        gene.add_annotation(Annotation::new("ncbigene", "946858"));
        model.add_gene(gene).unwrap();

        let exchange = ReactionBuilder::default()
            .id("EX_glc__D_e")
            .metabolites(stoichiometry(&[("glc__D_e", -1.)]))
            .lower_bound(-10.)
            .upper_bound(f64::INFINITY)
            .build()
            .unwrap();
        let transport = ReactionBuilder::default()
            .id("GLCt")
            .metabolites(stoichiometry(&[("glc__D_e", -1.), ("glc__D_c", 1.)]))
            .build()
            .unwrap();
        let mut hexokinase = ReactionBuilder::default()
            .id("HEX1")
            .name(Some("Hexokinase".to_string()))
            .subsystem(Some("Glycolysis".to_string()))
            .metabolites(stoichiometry(&[
                ("glc__D_c", -1.),
                ("atp_c", -1.),
                ("adp_c", 1.),
                ("g6p_c", 1.),
                ("h_c", 1.),
            ]))
            .lower_bound(0.)
            .upper_bound(1000.)
            .objective_coefficient(1.)
            .comment(Some("Irreversible".to_string()))
            .build()
            .unwrap();
        hexokinase.add_annotation(Annotation::new("ec-code", "2.7.1.1"));
        model.add_reaction(exchange).unwrap();
        model.add_reaction(transport).unwrap();
        model.add_reaction(hexokinase).unwrap();
        model
            .set_gene_reaction_rule("HEX1", "(b1.23 and b2) or b3")
            .unwrap();

        let mut reference = Reference::new("ref_1");
        reference.pmid = Some("20212490".to_string());
        reference.doi = Some("10.1038/nbt.1614".to_string());
        reference.year = Some("2010".to_string());
        reference.title = Some("What is flux balance analysis?".to_string());
        reference.journal = Some("Nat Biotechnol".to_string());
        reference.authors.push(Author::new("Orth", "Jeffrey", "JD"));
        reference.authors.push(Author::new("Palsson", "Bernhard", "BO"));
        reference.add_annotation(Annotation::new("pubmed", "20212490"));
        model.add_reference(reference).unwrap();

        let mut test = TestCase::new("test_1", "Growth on glucose");
        test.reaction_settings
            .push(ReactionSetting::new("EX_glc__D_e", -10., 0., 0.));
        test.gene_settings
            .push(GeneSetting::new("b1.23", GeneActivity::Inactive));
        test.outcomes
            .push(Outcome::new("HEX1", OutcomeOperator::GreaterThan, 0.5));
        test.references.insert("ref_1".to_string());
        model.add_test_case(test).unwrap();

        let mut evidence = Evidence::new(
            "ev_1",
            Some(EntityRef::new(EntityKind::Gene, "b1.23")),
            "Catalyzing reaction",
        );
        evidence.eco = Some("ECO:0000314".to_string());
        evidence.target = Some(EntityRef::new(EntityKind::Reaction, "HEX1"));
        evidence.comment = Some("Knockout abolishes activity".to_string());
        evidence.references.insert("ref_1".to_string());
        model.add_evidence(evidence).unwrap();
        model
    }

    #[test]
    fn id_codec() {
        let ids = IdCodec::from_configuration();
        assert_eq!(ids.gene_to_wire("b1.23"), "G_b1__DOT__23");
        assert_eq!(ids.gene_from_wire("G_b1__DOT__23"), "b1.23");
        assert_eq!(ids.metabolite_to_wire("atp_c"), "M_atp_c");
        assert_eq!(ids.metabolite_from_wire("M_atp_c"), "atp_c");
        assert_eq!(ids.metabolite_from_wire("atp_c"), "atp_c");
        assert_eq!(ids.reaction_from_wire("R_PFK"), "PFK");
        // a literal escape sequence in the id collapses to a dot
        let wire = ids.gene_to_wire("b__DOT__1");
        assert_eq!(wire, "G_b__DOT__1");
        assert_eq!(ids.gene_from_wire(&wire), "b.1");
    }

    #[test]
    fn annotated_reference_has_metaid() {
        let xml = write_sbml_string(&curated_model()).unwrap();
        let root = dom::parse_document(&xml).unwrap();
        let model = root.child(SBML_NS, "model").unwrap();
        let references = model.list_items(GEM_NS, "listOfReferences", "reference");
        assert_eq!(references.len(), 1);
        let reference = references[0];
        assert_eq!(reference.attr("metaid"), Some("ref_1"));
        let description = reference
            .child(SBML_NS, "annotation")
            .and_then(|a| a.child(RDF_NS, "RDF"))
            .and_then(|r| r.child(RDF_NS, "Description"))
            .unwrap();
        assert_eq!(description.attr_ns(RDF_NS, "about"), Some("#ref_1"));
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(f64::INFINITY), "INF");
        assert_eq!(format_number(-1000.), "-1000");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(parse_number("-INF").unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_number(" 3.5 ").unwrap(), 3.5);
        assert!(matches!(parse_number("ten"), Err(SbmlError::InvalidNumber(_))));
    }

    #[test]
    fn round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let original = curated_model();
        let xml = write_sbml_string(&original).unwrap();
        let outcome = read_sbml_str(&xml).unwrap();
        assert_eq!(outcome.completion, Completion::Complete);
        assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
        let model = outcome.model;

        assert_eq!(model.id, "iTest");
        assert_eq!(model.name.as_deref(), Some("Test model"));
        assert_eq!(model.compartments(), original.compartments());
        assert_eq!(model.metabolites(), original.metabolites());
        assert_eq!(model.genes(), original.genes());
        assert_eq!(model.references(), original.references());
        assert_eq!(model.test_cases(), original.test_cases());
        assert_eq!(model.evidences(), original.evidences());
        assert_eq!(model.reactions().len(), original.reactions().len());
        for (id, reaction) in original.reactions() {
            let read = model.reaction(id).unwrap();
            assert_eq!(read, reaction, "reaction {} differs", id);
        }
        assert_eq!(model.objective(), original.objective());
        assert_eq!(
            model.reaction("HEX1").unwrap().gene_reaction_rule(),
            "((b1.23 and b2) or b3)"
        );
    }

    #[test]
    fn round_trip_through_file() {
        let original = curated_model();
        let path = std::env::temp_dir().join(format!("gemrs_round_trip_{}.xml", std::process::id()));
        let completion = write_sbml(&original, &path).unwrap();
        assert_eq!(completion, Completion::Complete);
        let outcome = read_sbml(&path).unwrap();
        assert_eq!(outcome.diagnostics.path(), Some(path.display().to_string().as_str()));
        assert_eq!(outcome.model.reactions().len(), 3);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reads_fixture() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("test_data");
        path.push("textbook_fragment.xml");
        let outcome = read_sbml(&path).unwrap();
        let model = outcome.model;
        assert_eq!(model.id, "textbook_fragment");
        assert_eq!(model.metabolites().len(), 5);
        assert_eq!(model.reactions().len(), 3);
        let pgi = model.reaction("PGI").unwrap();
        assert_eq!(pgi.lower_bound(), -1000.);
        assert_eq!(pgi.coefficient("g6p_c"), Some(-1.));
        assert_eq!(pgi.gene_reaction_rule(), "(b4025 or b4025.1)");
        let exchange = model.reaction("EX_glc__D_e").unwrap();
        assert_eq!(exchange.lower_bound(), -10.);
        assert_eq!(exchange.objective_coefficient, 0.);
        assert_eq!(model.reaction("BIOMASS").unwrap().objective_coefficient, 1.);
        assert!(model.gene("b4025.1").is_some());
        assert_eq!(outcome.diagnostics.len(), 1);
        match &outcome.diagnostics.warnings()[0] {
            Warning::InvalidFormula { metabolite, formula } => {
                assert_eq!(metabolite, "biomass_c");
                assert_eq!(formula, "C6H12O6-R");
            }
            other => panic!("Unexpected warning {:?}", other),
        }
    }

    #[test]
    fn cancelled_write_leaves_no_file() {
        struct CancelImmediately;
        impl Progress for CancelImmediately {
            fn is_cancelled(&self) -> bool {
                true
            }
        }
        let path = std::env::temp_dir().join(format!("gemrs_cancelled_{}.xml", std::process::id()));
        let completion =
            write_sbml_with_progress(&curated_model(), &path, &mut CancelImmediately).unwrap();
        assert_eq!(completion, Completion::Cancelled);
        assert!(!path.exists());
    }

    #[test]
    fn cancelled_read_is_partial() {
        struct CancelAfterCompartments {
            records: usize,
        }
        impl Progress for CancelAfterCompartments {
            fn set_value(&mut self, _value: usize) {
                self.records += 1;
            }
            fn is_cancelled(&self) -> bool {
                self.records >= 2
            }
        }
        let path = std::env::temp_dir().join(format!("gemrs_partial_{}.xml", std::process::id()));
        write_sbml(&curated_model(), &path).unwrap();
        let outcome = read_sbml_with_progress(&path, &mut NoProgress).unwrap();
        assert!(outcome.is_complete());
        let outcome =
            read_sbml_with_progress(&path, &mut CancelAfterCompartments { records: 0 }).unwrap();
        assert_eq!(outcome.completion, Completion::Cancelled);
        assert_eq!(outcome.model.compartments().len(), 2);
        assert!(outcome.model.metabolites().is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn gene_group_kinds_survive() {
        let mut model = Model::new("m");
        model.add_reaction(Reaction::new_id_only("R1")).unwrap();
        model
            .set_gene_reaction_rule("R1", "a and (b or c) and d")
            .unwrap();
        let xml = write_sbml_string(&model).unwrap();
        let read = read_sbml_str(&xml).unwrap().model;
        let written = model.reaction("R1").unwrap().gpr().unwrap();
        let parsed = read.reaction("R1").unwrap().gpr().unwrap();
        assert_eq!(parsed, written);
        match parsed {
            crate::metabolic_model::gene::Gpr::Group(group) => {
                assert_eq!(group.kind, GprOperatorType::And)
            }
            _ => panic!("Expected an AND group"),
        }
    }
}
