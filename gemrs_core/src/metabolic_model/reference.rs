//! This module provides literature references and their authors
use std::fmt::{Display, Formatter};

use indexmap::IndexSet;

use crate::metabolic_model::annotation::{impl_annotatable, Annotation};

/// Author of a reference, compared by value
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct Author {
    pub lastname: String,
    pub firstname: String,
    pub initials: String,
}

impl Author {
    pub fn new(lastname: &str, firstname: &str, initials: &str) -> Self {
        Author {
            lastname: lastname.to_string(),
            firstname: firstname.to_string(),
            initials: initials.to_string(),
        }
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.initials.is_empty() {
            write!(f, "{}", self.lastname)
        } else {
            write!(f, "{} {}", self.lastname, self.initials)
        }
    }
}

/// A literature reference
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reference {
    pub id: String,
    pub pmid: Option<String>,
    pub pmc: Option<String>,
    pub doi: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub url: Option<String>,
    pub authors: Vec<Author>,
    pub annotation: IndexSet<Annotation>,
}

impl_annotatable!(Reference);

impl Reference {
    pub fn new(id: &str) -> Self {
        Reference {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Short citation, e.g. `Orth et al., 2010`
    pub fn citation(&self) -> String {
        let authors = match self.authors.as_slice() {
            [] => String::new(),
            [only] => only.lastname.clone(),
            [first, second] => format!("{} and {}", first.lastname, second.lastname),
            [first, ..] => format!("{} et al.", first.lastname),
        };
        match &self.year {
            Some(year) if !authors.is_empty() => format!("{}, {}", authors, year),
            Some(year) => year.clone(),
            None => authors,
        }
    }
}
