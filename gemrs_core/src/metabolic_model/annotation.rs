//! This module provides the Annotation value type linking model elements to external databases
use std::fmt::{Display, Formatter};

use indexmap::IndexSet;

/// Host every resolvable annotation URI must point at
pub const IDENTIFIERS_HOST: &str = "identifiers.org";

/// Relationship between an element and the database record an annotation points to
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum AnnotationType {
    /// The element is exactly the referenced record
    Is,
    /// The element is described by (a broader) referenced record
    Has,
}

impl AnnotationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Is => "is",
            AnnotationType::Has => "has",
        }
    }
}

/// Cross-database identifier link, compared and hashed by value
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Annotation {
    /// Database collection, e.g. `chebi` or `kegg.compound`
    pub collection: String,
    /// Identifier within the collection
    pub identifier: String,
    /// Kind of the link
    pub annotation_type: AnnotationType,
}

impl Annotation {
    /// Create a new annotation of type [`AnnotationType::Is`]
    pub fn new(collection: &str, identifier: &str) -> Self {
        Self::with_type(collection, identifier, AnnotationType::Is)
    }

    pub fn with_type(collection: &str, identifier: &str, annotation_type: AnnotationType) -> Self {
        Annotation {
            collection: collection.to_string(),
            identifier: identifier.to_string(),
            annotation_type,
        }
    }

    /// The MIRIAM resolvable URI of this annotation
    pub fn uri(&self) -> String {
        format!(
            "http://{}/{}/{}",
            IDENTIFIERS_HOST, self.collection, self.identifier
        )
    }

    /// Parse a MIRIAM URI back into an annotation.
    ///
    /// Returns `None` if the URI does not point at the identifiers.org resolver or lacks
    /// either a collection or an identifier.
    pub fn from_uri(uri: &str, annotation_type: AnnotationType) -> Option<Self> {
        let rest = uri
            .strip_prefix("http://")
            .or_else(|| uri.strip_prefix("https://"))?;
        let (host, path) = rest.split_once('/')?;
        if host != IDENTIFIERS_HOST {
            return None;
        }
        let (collection, identifier) = path.split_once('/')?;
        if collection.is_empty() || identifier.is_empty() {
            return None;
        }
        Some(Annotation::with_type(collection, identifier, annotation_type))
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.collection, self.identifier)
    }
}

/// Entities carrying a set of annotations
pub trait Annotatable {
    fn annotations(&self) -> &IndexSet<Annotation>;

    fn annotations_mut(&mut self) -> &mut IndexSet<Annotation>;

    /// Add an annotation, returning false if an equal one was already present
    fn add_annotation(&mut self, annotation: Annotation) -> bool {
        self.annotations_mut().insert(annotation)
    }

    fn remove_annotation(&mut self, annotation: &Annotation) -> bool {
        self.annotations_mut().shift_remove(annotation)
    }

    /// Annotations of a single relationship type, in insertion order
    fn annotations_of_type(&self, annotation_type: AnnotationType) -> Vec<&Annotation> {
        self.annotations()
            .iter()
            .filter(|a| a.annotation_type == annotation_type)
            .collect()
    }
}

/// Implement [`Annotatable`] for a struct with an `annotation: IndexSet<Annotation>` field
macro_rules! impl_annotatable {
    ($t:ty) => {
        impl $crate::metabolic_model::annotation::Annotatable for $t {
            fn annotations(&self) -> &indexmap::IndexSet<$crate::metabolic_model::annotation::Annotation> {
                &self.annotation
            }

            fn annotations_mut(
                &mut self,
            ) -> &mut indexmap::IndexSet<$crate::metabolic_model::annotation::Annotation> {
                &mut self.annotation
            }
        }
    };
}
pub(crate) use impl_annotatable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trip() {
        let annotation = Annotation::new("chebi", "CHEBI:17634");
        assert_eq!(annotation.uri(), "http://identifiers.org/chebi/CHEBI:17634");
        let parsed = Annotation::from_uri(&annotation.uri(), AnnotationType::Is).unwrap();
        assert_eq!(parsed, annotation);
    }

    #[test]
    fn identifier_keeps_slashes() {
        let parsed =
            Annotation::from_uri("https://identifiers.org/ec-code/1.1/1.1", AnnotationType::Has)
                .unwrap();
        assert_eq!(parsed.collection, "ec-code");
        assert_eq!(parsed.identifier, "1.1/1.1");
        assert_eq!(parsed.annotation_type, AnnotationType::Has);
    }

    #[test]
    fn foreign_host_rejected() {
        assert!(Annotation::from_uri("http://example.org/chebi/CHEBI:1", AnnotationType::Is).is_none());
        assert!(Annotation::from_uri("http://identifiers.org/chebi", AnnotationType::Is).is_none());
        assert!(Annotation::from_uri("not a uri", AnnotationType::Is).is_none());
    }

    #[test]
    fn equality_by_value() {
        let a = Annotation::new("kegg.compound", "C00031");
        let b = Annotation::new("kegg.compound", "C00031");
        let c = Annotation::with_type("kegg.compound", "C00031", AnnotationType::Has);
        let mut set = IndexSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(b));
        assert!(set.insert(c));
    }
}
