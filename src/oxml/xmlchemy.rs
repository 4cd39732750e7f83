//! Ordered XML element tree
//!
//! Parts are parsed into a tree that keeps children in document order.
//! Shape z-order and text run order are document order, so an unordered
//! map representation is not an option here.

use std::io::Read;

use xml::reader::{EventReader, ParserConfig, XmlEvent};

use crate::exc::{PptxError, Result};

/// A single XML attribute with its optional namespace prefix
#[derive(Debug, Clone)]
pub struct XmlAttr {
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

/// An XML element: tag, attributes, ordered children, and direct text
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    prefix: Option<String>,
    tag: String,
    attrs: Vec<XmlAttr>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    pub fn new(tag: &str) -> Self {
        XmlElement {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Local tag name without prefix
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Look up an attribute value.
    ///
    /// A key with a prefix (`r:id`) matches exactly. A bare key prefers
    /// the unprefixed attribute of that name and falls back to any
    /// prefix, so `id` and `r:id` on the same element stay distinct.
    pub fn attr(&self, key: &str) -> Option<&str> {
        if let Some((prefix, name)) = key.split_once(':') {
            return self
                .attrs
                .iter()
                .find(|a| a.prefix.as_deref() == Some(prefix) && a.name == name)
                .map(|a| a.value.as_str());
        }
        self.attrs
            .iter()
            .find(|a| a.prefix.is_none() && a.name == key)
            .or_else(|| self.attrs.iter().find(|a| a.name == key))
            .map(|a| a.value.as_str())
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(|v| v.parse().ok())
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.parse().ok())
    }

    /// Boolean attributes are serialized as "1"/"0" or "true"/"false"
    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attr(key).map(|v| v == "1" || v == "true")
    }

    /// Ordered child elements, duplicates preserved
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First child with the given local name
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given local name, in document order
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First descendant with the given local name, depth-first
    pub fn find_descendant(&self, tag: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given local name, in document order
    pub fn find_all<'a>(&'a self, tag: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        self.collect_named(tag, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, tag: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.tag == tag {
                out.push(child);
            }
            child.collect_named(tag, out);
        }
    }

    /// Direct text content of this element only
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Concatenated text of this element and every descendant
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

/// Parser producing `XmlElement` trees
pub struct XmlParser;

impl XmlParser {
    /// Parse a complete XML document from a string
    pub fn parse_str(xml: &str) -> Result<XmlElement> {
        Self::parse_reader(xml.as_bytes(), "<string>")
    }

    /// Parse a complete XML document from bytes, naming the source part
    /// for error messages
    pub fn parse_bytes(bytes: &[u8], part: &str) -> Result<XmlElement> {
        Self::parse_reader(bytes, part)
    }

    fn parse_reader<R: Read>(source: R, part: &str) -> Result<XmlElement> {
        let config = ParserConfig::new()
            .whitespace_to_characters(true)
            .cdata_to_characters(true);
        let reader = EventReader::new_with_config(source, config);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        for event in reader {
            match event {
                Ok(XmlEvent::StartElement {
                    name, attributes, ..
                }) => {
                    let element = XmlElement {
                        prefix: name.prefix,
                        tag: name.local_name,
                        attrs: attributes
                            .into_iter()
                            .map(|a| XmlAttr {
                                prefix: a.name.prefix,
                                name: a.name.local_name,
                                value: a.value,
                            })
                            .collect(),
                        children: Vec::new(),
                        text: String::new(),
                    };
                    stack.push(element);
                }
                Ok(XmlEvent::EndElement { .. }) => {
                    let finished = stack.pop().ok_or_else(|| PptxError::XmlParse {
                        part: part.to_string(),
                        message: "unbalanced end element".to_string(),
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => root = Some(finished),
                    }
                }
                Ok(XmlEvent::Characters(chars)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&chars);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    return Err(PptxError::XmlParse {
                        part: part.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        root.ok_or_else(|| PptxError::XmlParse {
            part: part.to_string(),
            message: "document has no root element".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
        <p:spTree xmlns:p="urn:p" xmlns:a="urn:a" xmlns:r="urn:r">
            <p:sp id="1"><a:t>first</a:t></p:sp>
            <p:pic r:embed="rId3"/>
            <p:sp id="2"><a:t>second</a:t></p:sp>
        </p:spTree>"#;

    #[test]
    fn test_children_keep_document_order() {
        let root = XmlParser::parse_str(SAMPLE).unwrap();
        let tags: Vec<&str> = root.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["sp", "pic", "sp"]);
    }

    #[test]
    fn test_attr_prefix_handling() {
        let xml = r#"<p:sldId xmlns:p="urn:p" xmlns:r="urn:r" id="256" r:id="rId2"/>"#;
        let el = XmlParser::parse_str(xml).unwrap();
        assert_eq!(el.attr("id"), Some("256"));
        assert_eq!(el.attr("r:id"), Some("rId2"));
    }

    #[test]
    fn test_text_content_preserves_spaces() {
        let xml = r#"<a:t xmlns:a="urn:a"> spaced </a:t>"#;
        let el = XmlParser::parse_str(xml).unwrap();
        assert_eq!(el.text(), " spaced ");
    }

    #[test]
    fn test_find_all_is_document_order() {
        let root = XmlParser::parse_str(SAMPLE).unwrap();
        let texts: Vec<String> = root
            .find_all("t")
            .iter()
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(XmlParser::parse_str("<a><b></a>").is_err());
        assert!(XmlParser::parse_str("").is_err());
    }

    #[test]
    fn test_duplicate_children_preserved() {
        let root = XmlParser::parse_str(SAMPLE).unwrap();
        assert_eq!(root.children_named("sp").count(), 2);
        assert!(root.child("pic").is_some());
    }
}
