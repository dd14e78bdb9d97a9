//! Metrics derived from a flux solution of a model
use indexmap::IndexMap;
use thiserror::Error;

pub mod turnover;
pub mod yields;

/// Flux distribution produced by an external optimisation of a model
#[derive(Clone, Debug, PartialEq)]
pub struct FluxSolution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Flux of every reaction, keyed by reaction id
    pub fluxes: IndexMap<String, f64>,
}

impl FluxSolution {
    pub fn new(status: OptimizationStatus, objective_value: Option<f64>, fluxes: IndexMap<String, f64>) -> Self {
        FluxSolution {
            status,
            objective_value,
            fluxes,
        }
    }

    /// Flux of a reaction, failing if the solution has no value for it
    pub fn flux(&self, reaction_id: &str) -> Result<f64, MetricsError> {
        self.fluxes
            .get(reaction_id)
            .copied()
            .ok_or_else(|| MetricsError::MissingFlux(reaction_id.to_string()))
    }
}

/// A plain reaction to flux map is taken as an optimal solution without objective value
impl From<IndexMap<String, f64>> for FluxSolution {
    fn from(fluxes: IndexMap<String, f64>) -> Self {
        FluxSolution::new(OptimizationStatus::Optimal, None, fluxes)
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// An approximate solution has been found
    AlmostOptimal,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("Solution has no flux for reaction {0}")]
    MissingFlux(String),
    #[error("Metabolite {0} is not part of the model")]
    UnknownMetabolite(String),
}
