//! Core rust implementation of gemrs, a crate for curating genome-scale metabolic models.
//!
//! The [`metabolic_model`] module holds the model graph, [`io`] reads and writes models as
//! SBML and cobra JSON, and [`analysis`] derives metrics from flux solutions.

pub mod analysis;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
