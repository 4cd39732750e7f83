//! Relationship (.rels) parsing and lookup

use crate::constants::rel_type;
use crate::exc::Result;
use crate::oxml::XmlParser;

/// Typed relationship kinds the renderer recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    Image,
    Slide,
    SlideLayout,
    SlideMaster,
    Theme,
    Hyperlink,
    Chart,
    OleObject,
    Other,
}

impl RelationshipType {
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            rel_type::IMAGE => RelationshipType::Image,
            rel_type::SLIDE => RelationshipType::Slide,
            rel_type::SLIDE_LAYOUT => RelationshipType::SlideLayout,
            rel_type::SLIDE_MASTER => RelationshipType::SlideMaster,
            rel_type::THEME => RelationshipType::Theme,
            rel_type::HYPERLINK => RelationshipType::Hyperlink,
            rel_type::CHART => RelationshipType::Chart,
            rel_type::OLE_OBJECT => RelationshipType::OleObject,
            _ => RelationshipType::Other,
        }
    }
}

/// A single relationship entry
#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: String,
    pub rel_type: RelationshipType,
    pub type_uri: String,
    pub target: String,
    /// `TargetMode="External"` targets are URLs, never part paths
    pub external: bool,
}

/// All outgoing relationships of one part
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// An empty table; used when a part has no `.rels` file
    pub fn empty() -> Self {
        Relationships::default()
    }

    /// Parse a `.rels` part
    pub fn from_xml(xml: &[u8], part: &str) -> Result<Self> {
        let root = XmlParser::parse_bytes(xml, part)?;
        let entries = root
            .children_named("Relationship")
            .filter_map(|rel| {
                let id = rel.attr("Id")?.to_string();
                let target = rel.attr("Target")?.to_string();
                let type_uri = rel.attr("Type").unwrap_or("").to_string();
                Some(Relationship {
                    id,
                    rel_type: RelationshipType::from_uri(&type_uri),
                    type_uri,
                    target,
                    external: rel.attr("TargetMode") == Some("External"),
                })
            })
            .collect();
        Ok(Relationships { entries })
    }

    /// Look up by relationship id (`rId7`)
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// All relationships of one type, in document order
    pub fn get_by_type(&self, rel_type: RelationshipType) -> Vec<&Relationship> {
        self.entries
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// First relationship of one type
    pub fn first_of_type(&self, rel_type: RelationshipType) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
            <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image3.png"/>
            <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
        </Relationships>"#;

    #[test]
    fn test_parse_and_lookup() {
        let rels = Relationships::from_xml(RELS.as_bytes(), "test.rels").unwrap();
        assert_eq!(rels.len(), 3);

        let image = rels.get("rId2").unwrap();
        assert_eq!(image.rel_type, RelationshipType::Image);
        assert_eq!(image.target, "../media/image3.png");
        assert!(!image.external);
    }

    #[test]
    fn test_external_mode() {
        let rels = Relationships::from_xml(RELS.as_bytes(), "test.rels").unwrap();
        assert!(rels.get("rId3").unwrap().external);
    }

    #[test]
    fn test_get_by_type() {
        let rels = Relationships::from_xml(RELS.as_bytes(), "test.rels").unwrap();
        assert_eq!(rels.get_by_type(RelationshipType::SlideLayout).len(), 1);
        assert!(rels.first_of_type(RelationshipType::Chart).is_none());
    }

    #[test]
    fn test_dangling_id_is_none() {
        let rels = Relationships::from_xml(RELS.as_bytes(), "test.rels").unwrap();
        assert!(rels.get("rId99").is_none());
    }
}
