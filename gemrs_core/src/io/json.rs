//! Module providing JSON IO for Models in the common cobra JSON layout
use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::io::{Completion, Diagnostics, ReadOutcome, Warning};
use crate::metabolic_model::annotation::Annotation;
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::{is_valid_formula, Metabolite};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::Reaction;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    compartments: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Annotations of a `{collection: [identifiers]}` object, single identifiers may be plain strings
fn annotations_from_json(value: Option<Value>) -> IndexSet<Annotation> {
    let mut annotations = IndexSet::new();
    if let Some(Value::Object(collections)) = value {
        for (collection, identifiers) in collections {
            match identifiers {
                Value::String(identifier) => {
                    annotations.insert(Annotation::new(&collection, &identifier));
                }
                Value::Array(identifiers) => {
                    for identifier in identifiers.iter().filter_map(Value::as_str) {
                        annotations.insert(Annotation::new(&collection, identifier));
                    }
                }
                other => debug!("Ignoring annotation {} of collection {}", other, collection),
            }
        }
    }
    annotations
}

fn annotations_to_json(annotations: &IndexSet<Annotation>) -> Option<Value> {
    if annotations.is_empty() {
        return None;
    }
    let mut collections: Map<String, Value> = Map::new();
    for annotation in annotations {
        let entry = collections
            .entry(annotation.collection.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(identifiers) = entry {
            identifiers.push(Value::String(annotation.identifier.clone()));
        }
    }
    Some(Value::Object(collections))
}

/// The comment is kept under the `comment` key of the notes object
fn comment_from_notes(notes: &Option<Value>) -> Option<String> {
    notes
        .as_ref()
        .and_then(|n| n.get("comment"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn comment_to_notes(comment: &Option<String>) -> Option<Value> {
    comment.as_ref().map(|c| {
        let mut notes = Map::new();
        notes.insert("comment".to_string(), Value::String(c.clone()));
        Value::Object(notes)
    })
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        let mut gene = Gene::new(&g.id, g.name.as_deref(), None);
        gene.comment = comment_from_notes(&g.notes);
        gene.annotation = annotations_from_json(g.annotation);
        gene
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id().to_string(),
            name: g.name.clone(),
            notes: comment_to_notes(&g.comment),
            annotation: annotations_to_json(&g.annotation),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id().to_string(),
            name: m.name.clone(),
            compartment: m.compartment().map(str::to_string),
            charge: m.charge(),
            formula: m.formula().map(str::to_string),
            notes: comment_to_notes(&m.comment),
            annotation: annotations_to_json(&m.annotation),
        }
    }
}

impl JsonMetabolite {
    /// Convert into a metabolite, an invalid formula is dropped with a warning
    fn into_metabolite(self, diagnostics: &mut Diagnostics) -> Metabolite {
        let formula = match self.formula {
            Some(formula) if formula.is_empty() => None,
            Some(formula) if !is_valid_formula(&formula) => {
                diagnostics.warn(Warning::InvalidFormula {
                    metabolite: self.id.clone(),
                    formula,
                });
                None
            }
            formula => formula,
        };
        let mut metabolite = Metabolite::new(
            &self.id,
            self.name.as_deref(),
            self.compartment.as_deref(),
            formula.as_deref(),
            self.charge,
        );
        metabolite.comment = comment_from_notes(&self.notes);
        metabolite.annotation = annotations_from_json(self.annotation);
        metabolite
    }
}

impl From<&Reaction> for JsonReaction {
    fn from(r: &Reaction) -> Self {
        Self {
            id: r.id().to_string(),
            name: r.name.clone(),
            metabolites: r.metabolites().clone(),
            lower_bound: r.lower_bound(),
            upper_bound: r.upper_bound(),
            gene_reaction_rule: r.gene_reaction_rule(),
            objective_coefficient: Some(r.objective_coefficient).filter(|c| *c != 0.),
            subsystem: r.subsystem.clone(),
            notes: comment_to_notes(&r.comment),
            annotation: annotations_to_json(&r.annotation),
        }
    }
}

impl Model {
    /// Read a model from a cobra JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<ReadOutcome, JsonError> {
        let path = path.as_ref();
        info!("Reading JSON model {}", path.display());
        let model_str = fs::read_to_string(path)?;
        let json_model = serde_json::from_str::<JsonModel>(&model_str)?;
        Model::from_json(json_model, Diagnostics::with_path(&path.display().to_string()))
    }

    /// Read a model from a cobra JSON string
    ///
    /// # Examples
    /// ```rust
    /// use gemrs_core::metabolic_model::model::Model;
    /// let json = r#"{
    ///     "id": "mini",
    ///     "metabolites": [{"id": "a_c", "compartment": "c", "formula": "H2O"}],
    ///     "reactions": [{"id": "EX_a", "metabolites": {"a_c": -1.0},
    ///                    "lower_bound": -10.0, "upper_bound": 1000.0,
    ///                    "gene_reaction_rule": "g1 or g2"}],
    ///     "genes": [{"id": "g1"}]
    /// }"#;
    /// let outcome = Model::from_json_str(json).unwrap();
    /// assert_eq!(outcome.model.genes().len(), 2);
    /// assert!(outcome.diagnostics.is_empty());
    /// ```
    pub fn from_json_str(json: &str) -> Result<ReadOutcome, JsonError> {
        let json_model = serde_json::from_str::<JsonModel>(json)?;
        Model::from_json(json_model, Diagnostics::new())
    }

    /// Write the model to a cobra JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let path = path.as_ref();
        info!("Writing model {} to {}", self.id, path.display());
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Serialize the model as a cobra JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel, mut diagnostics: Diagnostics) -> Result<ReadOutcome, JsonError> {
        let mut model = Model::new(json_model.id.as_deref().unwrap_or_default());
        model.name = json_model.name;
        for (id, name) in &json_model.compartments {
            let name = Some(name.as_str()).filter(|n| !n.is_empty());
            model.add_compartment(Compartment::new(id, name))?;
        }
        debug!("Reading {} metabolites", json_model.metabolites.len());
        for metabolite in json_model.metabolites {
            model.add_metabolite(metabolite.into_metabolite(&mut diagnostics))?;
        }
        debug!("Reading {} genes", json_model.genes.len());
        for gene in json_model.genes {
            model.add_gene(Gene::from(gene))?;
        }
        debug!("Reading {} reactions", json_model.reactions.len());
        for rxn in json_model.reactions {
            let mut reaction = Reaction::new_id_only(&rxn.id);
            reaction.name = rxn.name;
            reaction.subsystem = rxn.subsystem;
            reaction.objective_coefficient = rxn.objective_coefficient.unwrap_or(0.);
            reaction.comment = comment_from_notes(&rxn.notes);
            reaction.annotation = annotations_from_json(rxn.annotation);
            reaction.set_bounds_unchecked(rxn.lower_bound, rxn.upper_bound);
            *reaction.metabolites_mut() = rxn.metabolites;
            model.add_reaction(reaction)?;
            let rule_diagnostics = model.set_gene_reaction_rule(&rxn.id, &rxn.gene_reaction_rule)?;
            diagnostics.merge(rule_diagnostics);
        }
        info!(
            "Read model {} with {} metabolites, {} reactions and {} genes",
            model.id,
            model.metabolites().len(),
            model.reactions().len(),
            model.genes().len()
        );
        Ok(ReadOutcome {
            model,
            diagnostics,
            completion: Completion::Complete,
        })
    }

    fn to_json(&self) -> JsonModel {
        JsonModel {
            metabolites: self.metabolites().values().map(JsonMetabolite::from).collect(),
            reactions: self.reactions().values().map(JsonReaction::from).collect(),
            genes: self.genes().values().map(JsonGene::from).collect(),
            id: Some(self.id.clone()),
            name: self.name.clone(),
            compartments: self
                .compartments()
                .values()
                .map(|c| (c.id.clone(), c.name.clone().unwrap_or_default()))
                .collect(),
            version: Some("1".to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read or write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse json: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Invalid model content: {0}")]
    Model(#[from] ModelError),
}

// endregion Conversions
