//! This module provides the Compartment struct
use std::fmt::{Display, Formatter};

/// A cellular compartment, identified by a short code such as `c` or `e`
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Compartment {
    /// Short identifier of the compartment
    pub id: String,
    /// Optional display name, e.g. `cytosol`
    pub name: Option<String>,
}

impl Compartment {
    pub fn new(id: &str, name: Option<&str>) -> Self {
        Compartment {
            id: id.to_string(),
            name: name.map(str::to_string),
        }
    }
}

impl Display for Compartment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
