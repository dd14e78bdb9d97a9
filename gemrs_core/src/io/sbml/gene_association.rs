//! Gene product associations: GPR trees as nested `fbc:and`/`fbc:or` elements
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::io::sbml::dom::XmlElement;
use crate::io::sbml::{IdCodec, SbmlError, FBC_NS};
use crate::metabolic_model::gene::{new_group_id, GeneGroup, Gpr, GprOperatorType};

/// Write a GPR tree in preorder, groups keep their id in `fbc:id`
pub(crate) fn write_gpr(writer: &mut Writer<Vec<u8>>, gpr: &Gpr, ids: &IdCodec) -> Result<(), SbmlError> {
    match gpr {
        Gpr::GeneNode(gene) => {
            let mut reference = BytesStart::new("fbc:geneProductRef");
            let wire_id = ids.gene_to_wire(gene);
            reference.push_attribute(("fbc:geneProduct", wire_id.as_str()));
            writer.write_event(Event::Empty(reference))?;
        }
        Gpr::Group(group) => {
            let tag = match group.kind {
                GprOperatorType::And => "fbc:and",
                GprOperatorType::Or => "fbc:or",
            };
            let mut start = BytesStart::new(tag);
            start.push_attribute(("fbc:id", group.id.as_str()));
            writer.write_event(Event::Start(start))?;
            for child in &group.children {
                write_gpr(writer, child, ids)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

/// Write the `fbc:geneProductAssociation` of a reaction
pub(crate) fn write_association(
    writer: &mut Writer<Vec<u8>>,
    gpr: &Gpr,
    ids: &IdCodec,
) -> Result<(), SbmlError> {
    writer.write_event(Event::Start(BytesStart::new("fbc:geneProductAssociation")))?;
    write_gpr(writer, gpr, ids)?;
    writer.write_event(Event::End(BytesEnd::new("fbc:geneProductAssociation")))?;
    Ok(())
}

/// Read a single node of a gene product association
pub(crate) fn read_gpr(element: &XmlElement, ids: &IdCodec) -> Result<Gpr, SbmlError> {
    if element.namespace.as_deref() != Some(FBC_NS) {
        return Err(SbmlError::UnknownNodeTag(element.name.clone()));
    }
    let kind = match element.name.as_str() {
        "geneProductRef" => {
            let wire_id = element.required_attr_ns(FBC_NS, "geneProduct")?;
            return Ok(Gpr::GeneNode(ids.gene_from_wire(wire_id)));
        }
        "and" => GprOperatorType::And,
        "or" => GprOperatorType::Or,
        other => return Err(SbmlError::UnknownNodeTag(other.to_string())),
    };
    let children = element
        .children
        .iter()
        .map(|child| read_gpr(child, ids))
        .collect::<Result<Vec<Gpr>, SbmlError>>()?;
    let id = element
        .attr_ns_or_plain(FBC_NS, "id")
        .map(str::to_string)
        .unwrap_or_else(new_group_id);
    Ok(Gpr::Group(GeneGroup::with_id(&id, kind, children)))
}

/// Read the content of a `fbc:geneProductAssociation`.
///
/// Several top level nodes are read as alternatives of a new OR group.
pub(crate) fn read_association(association: &XmlElement, ids: &IdCodec) -> Result<Option<Gpr>, SbmlError> {
    let mut nodes = association
        .children
        .iter()
        .map(|child| read_gpr(child, ids))
        .collect::<Result<Vec<Gpr>, SbmlError>>()?;
    Ok(match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(Gpr::new_group(GprOperatorType::Or, nodes)),
    })
}
