//! Minimal element tree over `quick-xml` events.
//!
//! SOAP responses from vCenter are small and deeply nested; building a tree
//! first keeps the decoding code in `soap` declarative.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str;

use crate::error::{FactsError, FactsResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name, namespace prefix stripped
    pub name: String,
    /// Attributes keyed by their qualified name (`type`, `xsi:type`)
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Local part of the `xsi:type` attribute, whatever its prefix.
    pub fn xsi_type(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.ends_with(":type"))
            .map(|(_, v)| v.rsplit(':').next().unwrap_or(v))
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Descend through nested children by name.
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

pub fn parse(xml: &str) -> FactsResult<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(open_element(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = open_element(e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FactsError::parse("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FactsError::parse(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FactsError::parse("document ended inside an element"));
    }
    root.ok_or_else(|| FactsError::parse("empty XML document"))
}

fn open_element(e: &BytesStart) -> FactsResult<Element> {
    let name = str::from_utf8(e.local_name().as_ref())
        .map_err(|_| FactsError::parse("invalid UTF-8 in tag name"))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = str::from_utf8(attr.key.as_ref())
            .map_err(|_| FactsError::parse("invalid UTF-8 in attribute name"))?
            .to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_prefixes() {
        let doc = parse(
            r#"<?xml version="1.0"?>
            <soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
              <soapenv:Body>
                <val xsi:type="ManagedObjectReference" type="HostSystem">host-10</val>
                <empty/>
              </soapenv:Body>
            </soapenv:Envelope>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "Envelope");
        let val = doc.path(&["Body", "val"]).unwrap();
        assert_eq!(val.text, "host-10");
        assert_eq!(val.attr("type"), Some("HostSystem"));
        assert_eq!(val.xsi_type(), Some("ManagedObjectReference"));
        assert!(doc.path(&["Body", "empty"]).is_some());
    }

    #[test]
    fn test_text_is_unescaped() {
        let doc = parse("<name>R&amp;D &lt;lab&gt;</name>").unwrap();
        assert_eq!(doc.text, "R&D <lab>");
    }

    #[test]
    fn test_truncated_document_is_error() {
        assert!(parse("<a><b>text</b>").is_err());
        assert!(parse("").is_err());
    }
}
