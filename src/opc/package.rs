//! OPC package reading
//!
//! The part store warms eagerly: every entry is read into memory at
//! open. After that, part reads are pure and the package can be shared
//! across threads; the parsed-XML and relationship caches sit behind
//! read-write locks.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, RwLock};

use log::debug;
use zip::ZipArchive;

use crate::constants::parts;
use crate::exc::{PptxError, Result};
use crate::oxml::{XmlElement, XmlParser};

use super::packuri::PackUri;
use super::relationships::Relationships;

/// Content type table parsed from `[Content_Types].xml`
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let root = XmlParser::parse_bytes(xml, parts::CONTENT_TYPES)?;
        let mut defaults = HashMap::new();
        let mut overrides = HashMap::new();
        for child in root.children() {
            match child.tag() {
                "Default" => {
                    if let (Some(ext), Some(ct)) =
                        (child.attr("Extension"), child.attr("ContentType"))
                    {
                        defaults.insert(ext.to_ascii_lowercase(), ct.to_string());
                    }
                }
                "Override" => {
                    if let (Some(name), Some(ct)) =
                        (child.attr("PartName"), child.attr("ContentType"))
                    {
                        overrides.insert(PackUri::new(name).as_str().to_string(), ct.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(ContentTypes {
            defaults,
            overrides,
        })
    }

    /// Content type for a part path; overrides win over extension defaults
    pub fn get(&self, part_path: &str) -> Option<&str> {
        let normalized = PackUri::new(part_path);
        if let Some(ct) = self.overrides.get(normalized.as_str()) {
            return Some(ct);
        }
        let ext = normalized.filename().rsplit_once('.').map(|(_, e)| e)?;
        self.defaults.get(&ext.to_ascii_lowercase()).map(|s| s.as_str())
    }
}

/// An opened `.pptx` package
pub struct Package {
    parts: HashMap<String, Vec<u8>>,
    content_types: ContentTypes,
    xml_cache: RwLock<HashMap<String, Arc<XmlElement>>>,
    rels_cache: RwLock<HashMap<String, Arc<Relationships>>>,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Package {
    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Open a package from an in-memory buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| PptxError::Archive(format!("not a ZIP container: {e}")))?;

        let mut parts = HashMap::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = PackUri::new(entry.name()).as_str().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| PptxError::Archive(format!("truncated entry {name}: {e}")))?;
            parts.insert(name, data);
        }
        debug!("package warmed with {} parts", parts.len());

        let ct_bytes = parts.get(parts::CONTENT_TYPES).ok_or_else(|| {
            PptxError::Archive(format!("missing {}", parts::CONTENT_TYPES))
        })?;
        let content_types = ContentTypes::from_xml(ct_bytes)?;

        Ok(Package {
            parts,
            content_types,
            xml_cache: RwLock::new(HashMap::new()),
            rels_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(PackUri::new(path).as_str())
    }

    /// Raw bytes of a part
    pub fn part(&self, path: &str) -> Result<&[u8]> {
        let normalized = PackUri::new(path);
        self.parts
            .get(normalized.as_str())
            .map(|v| v.as_slice())
            .ok_or_else(|| PptxError::PartNotFound(normalized.as_str().to_string()))
    }

    /// Parse a part as XML; trees are cached and shared
    pub fn xml(&self, path: &str) -> Result<Arc<XmlElement>> {
        let key = PackUri::new(path).as_str().to_string();
        if let Some(tree) = self.xml_cache.read().expect("xml cache lock").get(&key) {
            return Ok(Arc::clone(tree));
        }
        let bytes = self.part(&key)?;
        let tree = Arc::new(XmlParser::parse_bytes(bytes, &key)?);
        self.xml_cache
            .write()
            .expect("xml cache lock")
            .insert(key, Arc::clone(&tree));
        Ok(tree)
    }

    /// Outgoing relationships of a part; a missing `.rels` file is an
    /// empty table, not an error
    pub fn relationships(&self, part_path: &str) -> Result<Arc<Relationships>> {
        let key = PackUri::new(part_path).as_str().to_string();
        if let Some(rels) = self.rels_cache.read().expect("rels cache lock").get(&key) {
            return Ok(Arc::clone(rels));
        }
        let rels_path = PackUri::new(&key).rels_path();
        let rels = match self.parts.get(rels_path.as_str()) {
            Some(bytes) => Arc::new(Relationships::from_xml(bytes, rels_path.as_str())?),
            None => Arc::new(Relationships::empty()),
        };
        self.rels_cache
            .write()
            .expect("rels cache lock")
            .insert(key, Arc::clone(&rels));
        Ok(rels)
    }

    /// Resolve a relationship target from a source part to a part path
    pub fn resolve_target(&self, from_part: &str, target: &str) -> String {
        PackUri::new(from_part).resolve(target).as_str().to_string()
    }

    /// All part paths, sorted
    pub fn part_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.parts.keys().map(|s| s.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = FileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const CONTENT_TYPES: &str = r#"<?xml version="1.0"?>
        <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
            <Default Extension="xml" ContentType="application/xml"/>
            <Default Extension="png" ContentType="image/png"/>
            <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
        </Types>"#;

    #[test]
    fn test_open_requires_content_types() {
        let data = build_zip(&[("ppt/presentation.xml", "<p:presentation/>")]);
        let err = Package::from_bytes(data).unwrap_err();
        assert!(matches!(err, PptxError::Archive(_)));
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let err = Package::from_bytes(b"not a zip at all".to_vec()).unwrap_err();
        assert!(matches!(err, PptxError::Archive(_)));
    }

    #[test]
    fn test_part_lookup() {
        let data = build_zip(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("ppt/presentation.xml", "<x/>"),
        ]);
        let package = Package::from_bytes(data).unwrap();
        assert!(package.has_part("ppt/presentation.xml"));
        assert!(package.part("ppt/presentation.xml").is_ok());
        assert!(matches!(
            package.part("ppt/missing.xml"),
            Err(PptxError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_missing_rels_is_empty_table() {
        let data = build_zip(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("ppt/slides/slide1.xml", "<x/>"),
        ]);
        let package = Package::from_bytes(data).unwrap();
        let rels = package.relationships("ppt/slides/slide1.xml").unwrap();
        assert!(rels.is_empty());
    }

    #[test]
    fn test_xml_cache_returns_shared_tree() {
        let data = build_zip(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("ppt/presentation.xml", r#"<p:presentation xmlns:p="urn:p"/>"#),
        ]);
        let package = Package::from_bytes(data).unwrap();
        let a = package.xml("ppt/presentation.xml").unwrap();
        let b = package.xml("ppt/presentation.xml").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_content_type_lookup() {
        let data = build_zip(&[("[Content_Types].xml", CONTENT_TYPES)]);
        let package = Package::from_bytes(data).unwrap();
        assert_eq!(
            package.content_types().get("ppt/media/image1.png"),
            Some("image/png")
        );
        assert_eq!(
            package.content_types().get("/ppt/presentation.xml"),
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml")
        );
    }

    #[test]
    fn test_resolve_target() {
        let data = build_zip(&[("[Content_Types].xml", CONTENT_TYPES)]);
        let package = Package::from_bytes(data).unwrap();
        assert_eq!(
            package.resolve_target("ppt/slides/slide1.xml", "../media/image3.png"),
            "ppt/media/image3.png"
        );
    }
}
