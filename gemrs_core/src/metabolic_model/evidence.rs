//! Evidence records backing curation decisions
use std::fmt::{Display, Formatter};

use indexmap::IndexSet;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

/// Kind of model element an [`EntityRef`] points at
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum EntityKind {
    Metabolite,
    Reaction,
    Gene,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Metabolite => "metabolite",
            EntityKind::Reaction => "reaction",
            EntityKind::Gene => "gene",
        }
    }

    pub fn from_str(kind: &str) -> Option<Self> {
        match kind {
            "metabolite" => Some(EntityKind::Metabolite),
            "reaction" => Some(EntityKind::Reaction),
            "gene" => Some(EntityKind::Gene),
            _ => None,
        }
    }
}

/// Non-owning link to a model element by kind and id
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: &str) -> Self {
        EntityRef {
            kind,
            id: id.to_string(),
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.id)
    }
}

/// A curation assertion about a model element
#[derive(Clone, Debug, PartialEq)]
pub struct Evidence {
    pub id: String,
    /// Element the evidence is about
    pub entity: Option<EntityRef>,
    /// Assertion, e.g. `Present` or `Catalyzing reaction`
    pub assertion: String,
    /// Evidence and conclusion ontology code, e.g. `ECO:0000314`
    pub eco: Option<String>,
    /// Second element taking part in the assertion
    pub target: Option<EntityRef>,
    pub comment: Option<String>,
    /// Ids of supporting references
    pub references: IndexSet<String>,
}

impl Evidence {
    pub fn new(id: &str, entity: Option<EntityRef>, assertion: &str) -> Self {
        Evidence {
            id: id.to_string(),
            entity,
            assertion: assertion.to_string(),
            eco: None,
            target: None,
            comment: None,
            references: IndexSet::new(),
        }
    }

    /// Whether the evidence links to `entity`, either as subject or target
    pub fn mentions(&self, entity: &EntityRef) -> bool {
        self.entity.as_ref() == Some(entity) || self.target.as_ref() == Some(entity)
    }
}

/// Elements evidences can be attached to
pub trait Evidenced {
    fn entity_ref(&self) -> EntityRef;

    /// Evidences of `model` whose subject is this element
    fn evidences<'m>(&self, model: &'m Model) -> Vec<&'m Evidence> {
        let this = self.entity_ref();
        model
            .evidences()
            .values()
            .filter(|e| e.entity.as_ref() == Some(&this))
            .collect()
    }
}

impl Evidenced for Metabolite {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(EntityKind::Metabolite, self.id())
    }
}

impl Evidenced for Reaction {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(EntityKind::Reaction, self.id())
    }
}

impl Evidenced for Gene {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(EntityKind::Gene, self.id())
    }
}
