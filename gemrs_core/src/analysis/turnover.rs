//! Production and consumption rates of metabolite groups
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::analysis::{FluxSolution, MetricsError};
use crate::configuration::tolerance;
use crate::metabolic_model::model::Model;

/// Total flux into and out of a group of metabolites
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Turnover {
    /// Sum of the positive contributions of every member in every reaction
    pub production: f64,
    /// Sum of the negative contributions of every member in every reaction, as a positive number
    pub consumption: f64,
}

/// Turnover of each named group of metabolites.
///
/// Each group member taking part in a reaction contributes `flux * coefficient` on its own,
/// positive contributions count as production and negative ones as consumption. A reaction
/// converting one member into another therefore adds to both. Boundary and transport
/// reactions are not counted, they move metabolites without turning them over.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use gemrs_core::analysis::turnover::get_turnover;
/// use gemrs_core::metabolic_model::model::Model;
/// use gemrs_core::metabolic_model::reaction::ReactionBuilder;
/// let mut model = Model::new("m");
/// let mut metabolites = IndexMap::new();
/// metabolites.insert("pyr_c".to_string(), -1.);
/// metabolites.insert("lac__D_c".to_string(), 1.);
/// model.add_reaction(ReactionBuilder::default().id("LDH_D").metabolites(metabolites).build().unwrap()).unwrap();
/// let mut fluxes = IndexMap::new();
/// fluxes.insert("LDH_D".to_string(), 3.);
/// let mut groups = IndexMap::new();
/// groups.insert("Lactate".to_string(), vec!["lac__D_c".to_string()]);
/// let turnover = get_turnover(&model, &fluxes.into(), &groups).unwrap();
/// assert_eq!(turnover["Lactate"].production, 3.);
/// ```
pub fn get_turnover(
    model: &Model,
    solution: &FluxSolution,
    groups: &IndexMap<String, Vec<String>>,
) -> Result<IndexMap<String, Turnover>, MetricsError> {
    let tolerance = tolerance();
    let mut turnover = IndexMap::new();
    for (group, members) in groups {
        let mut reactions: IndexSet<&str> = IndexSet::new();
        for member in members {
            if model.metabolite(member).is_none() {
                return Err(MetricsError::UnknownMetabolite(member.clone()));
            }
            for reaction in model.reactions_of_metabolite(member) {
                if !model.is_boundary(reaction) && !model.is_transport(reaction) {
                    reactions.insert(reaction.id());
                }
            }
        }
        let mut totals = Turnover::default();
        for reaction_id in reactions {
            let flux = solution.flux(reaction_id)?;
            let reaction = match model.reaction(reaction_id) {
                Some(reaction) => reaction,
                None => continue,
            };
            for coefficient in members.iter().filter_map(|m| reaction.coefficient(m)) {
                let contribution = flux * coefficient;
                if contribution > tolerance {
                    totals.production += contribution;
                } else if contribution < -tolerance {
                    totals.consumption -= contribution;
                }
            }
        }
        debug!(
            "Turnover of {}: production {}, consumption {}",
            group, totals.production, totals.consumption
        );
        turnover.insert(group.clone(), totals);
    }
    Ok(turnover)
}
