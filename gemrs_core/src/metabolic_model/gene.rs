//! This module provides the Gene struct, representing a gene, and the GPR tree, representing a
//! gene protein reaction rule
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use indexmap::IndexSet;
use uuid::Uuid;

use crate::metabolic_model::annotation::{impl_annotatable, Annotation};

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    #[builder(setter(into))]
    id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Strain or assembly the gene belongs to
    #[builder(default = "None")]
    pub genome: Option<String>,
    /// Whether this gene is currently active (see [`GeneActivity`])
    #[builder(default = "GeneActivity::Active")]
    pub activity: GeneActivity,
    /// Free text comment
    #[builder(default = "None")]
    pub comment: Option<String>,
    /// Gene Annotations
    #[builder(default = "IndexSet::new()")]
    pub annotation: IndexSet<Annotation>,
}

impl_annotatable!(Gene);

impl Gene {
    /// Create a minimal gene with only an id
    pub fn new_id_only(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            genome: None,
            activity: GeneActivity::Active,
            comment: None,
            annotation: IndexSet::new(),
        }
    }

    pub fn new(id: &str, name: Option<&str>, genome: Option<&str>) -> Gene {
        Gene {
            name: name.map(str::to_string),
            genome: genome.map(str::to_string),
            ..Gene::new_id_only(id)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Whether a gene is active or not
#[derive(Clone, Debug, Hash, Eq, PartialEq, Copy)]
pub enum GeneActivity {
    /// Gene is considered active
    Active,
    /// Gene is considered inactive
    Inactive,
}

/// Types of Allowed GPR Operations
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum GprOperatorType {
    /// Or, results in active if any child is active
    Or,
    /// And, results in active if all children are active
    And,
}

impl GprOperatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GprOperatorType::Or => "or",
            GprOperatorType::And => "and",
        }
    }
}

/// Boolean node of a GPR tree, combining its children with a single operator
#[derive(Clone, Debug, PartialEq)]
pub struct GeneGroup {
    /// Identifier of the group, kept stable through reads and writes
    pub id: String,
    pub kind: GprOperatorType,
    pub children: Vec<Gpr>,
}

impl GeneGroup {
    /// Create a new group with a freshly generated id
    pub fn new(kind: GprOperatorType, children: Vec<Gpr>) -> Self {
        Self::with_id(&new_group_id(), kind, children)
    }

    pub fn with_id(id: &str, kind: GprOperatorType, children: Vec<Gpr>) -> Self {
        GeneGroup {
            id: id.to_string(),
            kind,
            children,
        }
    }
}

/// Generate an identifier for a new gene group
pub fn new_group_id() -> String {
    format!("GG_{}", Uuid::new_v4().simple())
}

/// Representation of a Gene Protein Reaction Rule as a tree
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Boolean group of further nodes (see [`GeneGroup`])
    Group(GeneGroup),
    /// A terminal gene Node, holding the gene id
    GeneNode(String),
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

impl Gpr {
    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Create a new group node with a fresh id
    pub fn new_group(kind: GprOperatorType, children: Vec<Gpr>) -> Gpr {
        Gpr::Group(GeneGroup::new(kind, children))
    }

    /// Generate a GPR string with gene ids from the GPR tree
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Group(group) => {
                let parts: Vec<String> = group.children.iter().map(Gpr::to_string_id).collect();
                format!("({})", parts.join(&format!(" {} ", group.kind.as_str())))
            }
            Gpr::GeneNode(gene) => gene.to_string(),
        }
    }

    /// Ids of every gene referenced in the tree, in order of first appearance
    pub fn genes(&self) -> IndexSet<String> {
        let mut genes = IndexSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Gpr::GeneNode(gene) => {
                    genes.insert(gene.clone());
                }
                Gpr::Group(group) => stack.extend(group.children.iter().rev()),
            }
        }
        genes
    }

    /// Evaluate whether the rule is active given the activity of each gene
    pub fn eval<F>(&self, activity: &F) -> GeneActivity
    where
        F: Fn(&str) -> GeneActivity,
    {
        match self {
            Gpr::GeneNode(gene) => activity(gene),
            Gpr::Group(group) => {
                let mut results = group.children.iter().map(|c| c.eval(activity));
                let active = match group.kind {
                    GprOperatorType::Or => results.any(|a| a == GeneActivity::Active),
                    GprOperatorType::And => results.all(|a| a == GeneActivity::Active),
                };
                if active {
                    GeneActivity::Active
                } else {
                    GeneActivity::Inactive
                }
            }
        }
    }

    /// Simplify the tree.
    ///
    /// Groups left with zero or one child are replaced by their children, and groups nested
    /// directly in a group of the same kind are flattened into it. The root has no parent to
    /// hand its children to: a root with a single child is replaced by that child, a root
    /// without children yields `None`.
    pub fn prune(self) -> Option<Gpr> {
        match self {
            Gpr::GeneNode(_) => Some(self),
            Gpr::Group(mut group) => {
                let mut kept = Vec::with_capacity(group.children.len());
                for child in std::mem::take(&mut group.children) {
                    prune_into(child, group.kind, &mut kept);
                }
                match kept.len() {
                    0 => None,
                    1 => kept.pop(),
                    _ => {
                        group.children = kept;
                        Some(Gpr::Group(group))
                    }
                }
            }
        }
    }

    /// Remove every leaf referencing `gene_id` and prune the remaining tree
    pub fn without_gene(self, gene_id: &str) -> Option<Gpr> {
        self.remove_leaves(gene_id).and_then(Gpr::prune)
    }

    fn remove_leaves(self, gene_id: &str) -> Option<Gpr> {
        match self {
            Gpr::GeneNode(ref gene) if gene == gene_id => None,
            Gpr::GeneNode(_) => Some(self),
            Gpr::Group(mut group) => {
                group.children = std::mem::take(&mut group.children)
                    .into_iter()
                    .filter_map(|c| c.remove_leaves(gene_id))
                    .collect();
                Some(Gpr::Group(group))
            }
        }
    }

    /// Add `node` as an alternative to an existing rule.
    ///
    /// An existing top level OR group receives the node as an additional child, anything else
    /// is wrapped together with the node in a new OR group.
    pub fn add_alternative(root: Option<Gpr>, node: Gpr) -> Gpr {
        match root {
            None => node,
            Some(Gpr::Group(mut group)) if group.kind == GprOperatorType::Or => {
                group.children.push(node);
                Gpr::Group(group)
            }
            Some(existing) => Gpr::new_group(GprOperatorType::Or, vec![existing, node]),
        }
    }
}

/// Prune `node` as a child of a group of kind `parent_kind`, pushing whatever replaces it
/// onto `out`
fn prune_into(node: Gpr, parent_kind: GprOperatorType, out: &mut Vec<Gpr>) {
    match node {
        Gpr::GeneNode(_) => out.push(node),
        Gpr::Group(mut group) => {
            let mut kept = Vec::with_capacity(group.children.len());
            for child in std::mem::take(&mut group.children) {
                prune_into(child, group.kind, &mut kept);
            }
            if kept.len() <= 1 || group.kind == parent_kind {
                // Relocated children now sit below the parent, so they are pruned against it
                for child in kept {
                    prune_into(child, parent_kind, out);
                }
            } else {
                group.children = kept;
                out.push(Gpr::Group(group));
            }
        }
    }
}
