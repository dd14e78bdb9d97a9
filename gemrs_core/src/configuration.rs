use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub tolerance: f64,
    /// Prefix added to metabolite ids when written to SBML
    pub metabolite_prefix: String,
    /// Prefix added to gene ids when written to SBML
    pub gene_prefix: String,
    /// Prefix added to reaction ids when written to SBML
    pub reaction_prefix: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            metabolite_prefix: "M_".to_string(),
            gene_prefix: "G_".to_string(),
            reaction_prefix: "R_".to_string(),
        }
    }
}

/// Read the default lower bound, falling back to the built-in value if the lock is poisoned
pub(crate) fn default_lower_bound() -> f64 {
    CONFIGURATION
        .read()
        .map(|c| c.lower_bound)
        .unwrap_or(-1000.)
}

/// Read the default upper bound, falling back to the built-in value if the lock is poisoned
pub(crate) fn default_upper_bound() -> f64 {
    CONFIGURATION
        .read()
        .map(|c| c.upper_bound)
        .unwrap_or(1000.)
}

/// Read the numeric tolerance used for zero checks
pub(crate) fn tolerance() -> f64 {
    CONFIGURATION.read().map(|c| c.tolerance).unwrap_or(1e-07)
}

/// Snapshot of the (metabolite, gene, reaction) id prefixes
pub(crate) fn id_prefixes() -> (String, String, String) {
    match CONFIGURATION.read() {
        Ok(c) => (
            c.metabolite_prefix.clone(),
            c.gene_prefix.clone(),
            c.reaction_prefix.clone(),
        ),
        Err(_) => ("M_".to_string(), "G_".to_string(), "R_".to_string()),
    }
}
