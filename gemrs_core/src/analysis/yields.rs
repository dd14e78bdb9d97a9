//! Elemental yields of the products of a flux solution
use indexmap::IndexMap;
use log::debug;

use crate::analysis::{FluxSolution, MetricsError};
use crate::configuration::tolerance;
use crate::metabolic_model::model::Model;

/// Yields of every product, per element of its formula
#[derive(Clone, Debug, Default, PartialEq)]
pub struct YieldReport {
    /// False if the yields could not be computed, e.g. because a substrate has no formula
    pub status: bool,
    /// Product metabolite id to element to yield
    pub yields: IndexMap<String, IndexMap<String, f64>>,
}

/// Compute product yields relative to the elemental influx of all substrates.
///
/// The net exchange of each metabolite is summed over the boundary reactions. Metabolites
/// taken up are substrates, every substrate needs a formula or the report carries a false
/// status and no yields. Products get one yield per element of their formula,
/// `count * net_flux / influx(element)`, so yields of products are negative. Elements no
/// substrate supplies are skipped.
pub fn get_yields(model: &Model, solution: &FluxSolution) -> Result<YieldReport, MetricsError> {
    let tolerance = tolerance();
    let mut net_exchange: IndexMap<&str, f64> = IndexMap::new();
    for reaction in model.reactions().values() {
        if !model.is_boundary(reaction) {
            continue;
        }
        let flux = solution.flux(reaction.id())?;
        for (metabolite, coefficient) in reaction.metabolites() {
            *net_exchange.entry(metabolite.as_str()).or_insert(0.) += flux * coefficient;
        }
    }

    let mut influx: IndexMap<String, f64> = IndexMap::new();
    for (metabolite, net) in net_exchange.iter().filter(|(_, net)| **net > tolerance) {
        let elements = model.metabolite(metabolite).and_then(|m| m.elements());
        match elements {
            Some(elements) => {
                for (element, count) in elements {
                    *influx.entry(element).or_insert(0.) += count * net;
                }
            }
            None => {
                debug!("Substrate {} has no usable formula, yields unavailable", metabolite);
                return Ok(YieldReport::default());
            }
        }
    }

    let mut yields = IndexMap::new();
    for (metabolite, net) in net_exchange.iter().filter(|(_, net)| **net < -tolerance) {
        let elements = match model.metabolite(metabolite).and_then(|m| m.elements()) {
            Some(elements) => elements,
            None => continue,
        };
        let product_yields: IndexMap<String, f64> = elements
            .into_iter()
            .filter_map(|(element, count)| {
                let supplied = influx.get(&element).copied().unwrap_or(0.);
                if supplied.abs() > tolerance {
                    Some((element, count * net / supplied))
                } else {
                    None
                }
            })
            .collect();
        yields.insert(metabolite.to_string(), product_yields);
    }
    Ok(YieldReport {
        status: true,
        yields,
    })
}
