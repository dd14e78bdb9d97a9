//! Model test cases: condition settings with expected flux outcomes
use indexmap::IndexSet;

use crate::metabolic_model::gene::GeneActivity;

/// Override of a reaction's bounds and objective coefficient for a test
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionSetting {
    pub reaction: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub objective_coefficient: f64,
}

impl ReactionSetting {
    pub fn new(reaction: &str, lower_bound: f64, upper_bound: f64, objective_coefficient: f64) -> Self {
        ReactionSetting {
            reaction: reaction.to_string(),
            lower_bound,
            upper_bound,
            objective_coefficient,
        }
    }
}

/// Forced activity of a gene for a test
#[derive(Clone, Debug, PartialEq)]
pub struct GeneSetting {
    pub gene: String,
    pub activity: GeneActivity,
}

impl GeneSetting {
    pub fn new(gene: &str, activity: GeneActivity) -> Self {
        GeneSetting {
            gene: gene.to_string(),
            activity,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutcomeOperator {
    GreaterThan,
    LessThan,
}

impl OutcomeOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeOperator::GreaterThan => "greater",
            OutcomeOperator::LessThan => "less",
        }
    }

    pub fn from_str(operator: &str) -> Option<Self> {
        match operator {
            "greater" => Some(OutcomeOperator::GreaterThan),
            "less" => Some(OutcomeOperator::LessThan),
            _ => None,
        }
    }
}

/// Expected flux of a reaction after optimisation
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub reaction: String,
    pub operator: OutcomeOperator,
    pub value: f64,
}

impl Outcome {
    pub fn new(reaction: &str, operator: OutcomeOperator, value: f64) -> Self {
        Outcome {
            reaction: reaction.to_string(),
            operator,
            value,
        }
    }

    /// Check a flux value against the expectation
    pub fn is_met(&self, flux: f64) -> bool {
        match self.operator {
            OutcomeOperator::GreaterThan => flux > self.value,
            OutcomeOperator::LessThan => flux < self.value,
        }
    }
}

/// A named set of conditions and the outcomes expected under them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestCase {
    pub id: String,
    pub description: String,
    pub reaction_settings: Vec<ReactionSetting>,
    pub gene_settings: Vec<GeneSetting>,
    pub outcomes: Vec<Outcome>,
    pub references: IndexSet<String>,
}

impl TestCase {
    pub fn new(id: &str, description: &str) -> Self {
        TestCase {
            id: id.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    /// Ids of every reaction a setting or outcome refers to
    pub fn reactions(&self) -> IndexSet<&str> {
        self.reaction_settings
            .iter()
            .map(|s| s.reaction.as_str())
            .chain(self.outcomes.iter().map(|o| o.reaction.as_str()))
            .collect()
    }

    pub fn genes(&self) -> IndexSet<&str> {
        self.gene_settings.iter().map(|s| s.gene.as_str()).collect()
    }
}
