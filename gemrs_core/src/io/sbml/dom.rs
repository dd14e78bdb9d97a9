//! Minimal namespace aware element tree built with the quick-xml reader
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::io::sbml::SbmlError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

/// Element with its namespace resolved, attributes, child elements and concatenated text
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Attribute without a namespace prefix
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute in `namespace`, falling back to the unprefixed attribute of the same name
    pub fn attr_ns_or_plain(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attr_ns(namespace, name).or_else(|| self.attr(name))
    }

    pub fn required_attr(&self, name: &str) -> Result<&str, SbmlError> {
        self.attr(name)
            .ok_or_else(|| SbmlError::missing_attribute(&self.name, name))
    }

    pub fn required_attr_ns(&self, namespace: &str, name: &str) -> Result<&str, SbmlError> {
        self.attr_ns_or_plain(namespace, name)
            .ok_or_else(|| SbmlError::missing_attribute(&self.name, name))
    }

    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Items of an optional `<list>` child, an absent list is empty
    pub fn list_items<'a>(&'a self, namespace: &'a str, list: &str, item: &'a str) -> Vec<&'a XmlElement> {
        match self.child(namespace, list) {
            Some(list) => list.children_named(namespace, item).collect(),
            None => Vec::new(),
        }
    }

    /// Trimmed text of a child element, `None` if absent or empty
    pub fn child_text(&self, namespace: &str, name: &str) -> Option<String> {
        self.child(namespace, name)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn namespace_uri(resolved: ResolveResult) -> Result<Option<String>, SbmlError> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Ok(Some(std::str::from_utf8(namespace.as_ref())?.to_string()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(SbmlError::UndeclaredPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn element_from(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart,
) -> Result<XmlElement, SbmlError> {
    let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let namespace = namespace_uri(resolved)?;
        let name = std::str::from_utf8(local.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push(XmlAttribute {
            namespace,
            name,
            value,
        });
    }
    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Hang a finished element below its parent, or make it the root
fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Parse a whole document into its root element
pub(crate) fn parse_document(xml: &str) -> Result<XmlElement, SbmlError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = namespace_uri(resolved)?;
        match event {
            Event::Start(start) => stack.push(element_from(&reader, namespace, &start)?),
            Event::Empty(start) => {
                let element = element_from(&reader, namespace, &start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(std::str::from_utf8(&data)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    root.ok_or_else(|| SbmlError::MalformedRoot("document has no root element".to_string()))
}
