//! RDF annotation blocks and free text comments of model elements
use indexmap::IndexSet;
use log::debug;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::io::sbml::dom::XmlElement;
use crate::io::sbml::{SbmlError, BQBIOL_NS, GEM_NS, RDF_NS, SBML_NS};
use crate::io::{Diagnostics, Warning};
use crate::metabolic_model::annotation::{Annotation, AnnotationType};

fn qualifier(annotation_type: AnnotationType) -> &'static str {
    match annotation_type {
        AnnotationType::Is => "bqbiol:is",
        AnnotationType::Has => "bqbiol:isDescribedBy",
    }
}

/// Write the `<annotation>` child of an element.
///
/// Nothing is written when there is neither an annotation nor a comment.
pub(crate) fn write_annotation(
    writer: &mut Writer<Vec<u8>>,
    metaid: &str,
    annotations: &IndexSet<Annotation>,
    comment: Option<&str>,
) -> Result<(), SbmlError> {
    if annotations.is_empty() && comment.is_none() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("annotation")))?;
    if !annotations.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("rdf:RDF")))?;
        let mut description = BytesStart::new("rdf:Description");
        let about = format!("#{}", metaid);
        description.push_attribute(("rdf:about", about.as_str()));
        writer.write_event(Event::Start(description))?;
        for annotation_type in [AnnotationType::Is, AnnotationType::Has] {
            let mut bag: Vec<&Annotation> = annotations
                .iter()
                .filter(|a| a.annotation_type == annotation_type)
                .collect();
            if bag.is_empty() {
                continue;
            }
            let tag = qualifier(annotation_type);
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Start(BytesStart::new("rdf:Bag")))?;
            for annotation in bag.drain(..) {
                let mut item = BytesStart::new("rdf:li");
                let uri = annotation.uri();
                item.push_attribute(("rdf:resource", uri.as_str()));
                writer.write_event(Event::Empty(item))?;
            }
            writer.write_event(Event::End(BytesEnd::new("rdf:Bag")))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
        writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
    }
    if let Some(comment) = comment {
        write_comment(writer, comment)?;
    }
    writer.write_event(Event::End(BytesEnd::new("annotation")))?;
    Ok(())
}

pub(crate) fn write_comment(writer: &mut Writer<Vec<u8>>, comment: &str) -> Result<(), SbmlError> {
    writer.write_event(Event::Start(BytesStart::new("gem:comment")))?;
    writer.write_event(Event::Text(BytesText::new(comment)))?;
    writer.write_event(Event::End(BytesEnd::new("gem:comment")))?;
    Ok(())
}

/// Annotations and comment found in the `<annotation>` child of `element`.
///
/// URIs not pointing at identifiers.org are skipped with a warning.
pub(crate) fn read_annotation(
    element: &XmlElement,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> (IndexSet<Annotation>, Option<String>) {
    let mut annotations = IndexSet::new();
    let block = match element.child(SBML_NS, "annotation") {
        Some(block) => block,
        None => return (annotations, None),
    };
    for rdf in block.children_named(RDF_NS, "RDF") {
        for description in rdf.children_named(RDF_NS, "Description") {
            for qualifier in &description.children {
                let annotation_type = match (qualifier.namespace.as_deref(), qualifier.name.as_str()) {
                    (Some(BQBIOL_NS), "is") => AnnotationType::Is,
                    (Some(BQBIOL_NS), "isDescribedBy") => AnnotationType::Has,
                    (_, other) => {
                        debug!("Ignoring annotation qualifier {} of {}", other, owner);
                        continue;
                    }
                };
                for bag in qualifier.children_named(RDF_NS, "Bag") {
                    for item in bag.children_named(RDF_NS, "li") {
                        let uri = match item.attr_ns(RDF_NS, "resource") {
                            Some(uri) => uri,
                            None => continue,
                        };
                        match Annotation::from_uri(uri, annotation_type) {
                            Some(annotation) => {
                                annotations.insert(annotation);
                            }
                            None => diagnostics.warn(Warning::UnresolvableAnnotation {
                                element: owner.to_string(),
                                uri: uri.to_string(),
                            }),
                        }
                    }
                }
            }
        }
    }
    (annotations, block.child_text(GEM_NS, "comment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sbml::dom::parse_document;

    fn annotated(body: &str) -> XmlElement {
        let xml = format!(
            r#"<species xmlns="{}" xmlns:rdf="{}" xmlns:bqbiol="{}" xmlns:gem="{}" id="M_a">{}</species>"#,
            SBML_NS, RDF_NS, BQBIOL_NS, GEM_NS, body
        );
        parse_document(&xml).unwrap()
    }

    #[test]
    fn bad_uri_is_skipped() {
        let element = annotated(
            r##"<annotation><rdf:RDF><rdf:Description rdf:about="#M_a"><bqbiol:is><rdf:Bag>
                <rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:15377"/>
                <rdf:li rdf:resource="http://example.org/chebi/CHEBI:1"/>
            </rdf:Bag></bqbiol:is></rdf:Description></rdf:RDF>
            <gem:comment>checked</gem:comment></annotation>"##,
        );
        let mut diagnostics = Diagnostics::new();
        let (annotations, comment) = read_annotation(&element, "M_a", &mut diagnostics);
        assert_eq!(annotations.len(), 1);
        assert!(annotations.contains(&Annotation::new("chebi", "CHEBI:15377")));
        assert_eq!(comment.as_deref(), Some("checked"));
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnresolvableAnnotation {
                element: "M_a".to_string(),
                uri: "http://example.org/chebi/CHEBI:1".to_string()
            }]
        );
    }

    #[test]
    fn no_block_for_empty_annotation() {
        let mut writer = Writer::new(Vec::new());
        write_annotation(&mut writer, "M_a", &IndexSet::new(), None).unwrap();
        assert!(writer.into_inner().is_empty());
        let element = annotated("");
        let mut diagnostics = Diagnostics::new();
        let (annotations, comment) = read_annotation(&element, "M_a", &mut diagnostics);
        assert!(annotations.is_empty());
        assert_eq!(comment, None);
    }

    #[test]
    fn bags_per_type() {
        let mut annotations = IndexSet::new();
        annotations.insert(Annotation::new("chebi", "CHEBI:15377"));
        annotations.insert(Annotation::with_type("kegg.compound", "C00001", AnnotationType::Has));
        let mut writer = Writer::new(Vec::new());
        write_annotation(&mut writer, "M_h2o_c", &annotations, None).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert!(xml.contains(r##"<rdf:Description rdf:about="#M_h2o_c">"##));
        assert!(xml.contains(
            r#"<bqbiol:is><rdf:Bag><rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:15377"/></rdf:Bag></bqbiol:is>"#
        ));
        assert!(xml.contains("<bqbiol:isDescribedBy>"));
        assert!(!xml.contains("gem:comment"));
    }
}
