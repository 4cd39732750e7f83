//! Public API
//!
//! `Presentation` opens a `.pptx` package, exposes document metadata
//! and text extraction, and renders slides to raster images.

use std::path::Path;

use log::{info, warn};

use crate::constants::{parts, presentation};
use crate::exc::{PptxError, Result};
use crate::opc::{Package, RelationshipType};
use crate::oxml::shapes::{parse_shape_tree, ShapeNode};
use crate::oxml::XmlParser;
use crate::render::graphic_frame::PlaceholderFrames;
use crate::render::slide::render_slide;
use crate::render::{FontLibrary, MediaCache, RenderOptions, RenderReport, SlideRender};

/// Core document properties from `docProps/core.xml`
#[derive(Debug, Clone, Default)]
pub struct PresentationInfo {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub revision: Option<u32>,
    pub slide_count: usize,
}

/// An opened presentation, ready to render
pub struct Presentation {
    package: Package,
    info: PresentationInfo,
    slide_paths: Vec<String>,
    /// Slide extent in EMU from `p:sldSz`
    slide_size: (i64, i64),
    fonts: FontLibrary,
    media: MediaCache,
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("info", &self.info)
            .field("slide_paths", &self.slide_paths)
            .field("slide_size", &self.slide_size)
            .finish()
    }
}

impl Presentation {
    /// Open a presentation from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(Package::open(path)?)
    }

    /// Open a presentation from an in-memory buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let mut pres = Presentation {
            package,
            info: PresentationInfo::default(),
            slide_paths: Vec::new(),
            slide_size: (
                presentation::DEFAULT_WIDTH,
                presentation::DEFAULT_HEIGHT,
            ),
            fonts: FontLibrary::new(),
            media: MediaCache::new(),
        };
        pres.parse_structure()?;
        pres.parse_core_properties();
        Ok(pres)
    }

    /// Slide list and slide size from `ppt/presentation.xml`.
    /// Slide order is `sldIdLst` document order.
    fn parse_structure(&mut self) -> Result<()> {
        let root = self.package.xml(parts::PRESENTATION)?;

        if let Some(sld_sz) = root.child("sldSz") {
            self.slide_size = (
                sld_sz.attr_i64("cx").unwrap_or(presentation::DEFAULT_WIDTH),
                sld_sz.attr_i64("cy").unwrap_or(presentation::DEFAULT_HEIGHT),
            );
        }

        let rels = self.package.relationships(parts::PRESENTATION)?;
        if let Some(id_list) = root.child("sldIdLst") {
            for sld_id in id_list.children_named("sldId") {
                let Some(r_id) = sld_id.attr("r:id") else {
                    continue;
                };
                match rels.get(r_id) {
                    Some(rel) if rel.rel_type == RelationshipType::Slide => {
                        self.slide_paths
                            .push(self.package.resolve_target(parts::PRESENTATION, &rel.target));
                    }
                    Some(_) => {
                        return Err(PptxError::Relationship(format!(
                            "{r_id} does not target a slide"
                        )));
                    }
                    None => {
                        return Err(PptxError::Relationship(format!(
                            "dangling slide relationship {r_id}"
                        )));
                    }
                }
            }
        }

        // Decks without an id list: fall back to scanning part paths
        if self.slide_paths.is_empty() {
            self.slide_paths = self
                .package
                .part_paths()
                .into_iter()
                .filter(|p| {
                    p.starts_with("ppt/slides/slide") && p.ends_with(".xml")
                })
                .map(|p| p.to_string())
                .collect();
        }
        self.info.slide_count = self.slide_paths.len();
        Ok(())
    }

    fn parse_core_properties(&mut self) {
        let Ok(bytes) = self.package.part(parts::CORE_PROPERTIES) else {
            return;
        };
        let Ok(root) = XmlParser::parse_bytes(bytes, parts::CORE_PROPERTIES) else {
            warn!("core properties present but unparsable");
            return;
        };
        let text_of = |tag: &str| {
            root.find_descendant(tag)
                .map(|el| el.text_content())
                .filter(|s| !s.is_empty())
        };
        self.info.title = text_of("title");
        self.info.creator = text_of("creator");
        self.info.last_modified_by = text_of("lastModifiedBy");
        self.info.created = text_of("created");
        self.info.modified = text_of("modified");
        self.info.revision = root
            .find_descendant("revision")
            .and_then(|el| el.text_content().parse().ok());
    }

    pub fn info(&self) -> &PresentationInfo {
        &self.info
    }

    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Slide extent in EMU
    pub fn slide_size(&self) -> (i64, i64) {
        self.slide_size
    }

    /// All literal text per slide, in document order
    pub fn extract_text(&self) -> Result<Vec<Vec<String>>> {
        let mut slides = Vec::with_capacity(self.slide_paths.len());
        for path in &self.slide_paths {
            let xml = self.package.xml(path)?;
            let mut texts = Vec::new();
            if let Some(tree) = xml.child("cSld").and_then(|c| c.child("spTree")) {
                collect_text(&parse_shape_tree(tree), &mut texts);
            }
            slides.push(texts);
        }
        Ok(slides)
    }

    /// Render every slide. Failures are confined to their slide; the
    /// report carries one entry per slide in deck order.
    pub fn render(&self, options: &RenderOptions) -> RenderReport {
        let mut slides = Vec::with_capacity(self.slide_paths.len());
        for index in 0..self.slide_paths.len() {
            slides.push(self.render_slide(index, options));
        }
        let successful = slides.iter().filter(|s| s.success).count();
        info!(
            "rendered {successful}/{} slides at width {}",
            slides.len(),
            options.width
        );
        RenderReport {
            total_slides: slides.len(),
            successful_slides: successful,
            slides,
        }
    }

    /// Render a single slide by 0-based index
    pub fn render_slide(&self, index: usize, options: &RenderOptions) -> SlideRender {
        let slide_number = index + 1;
        let Some(part) = self.slide_paths.get(index) else {
            return SlideRender {
                slide_number,
                success: false,
                width: 0,
                height: 0,
                image_data: Vec::new(),
                error_message: Some(format!("slide index {index} out of range")),
            };
        };
        match render_slide(
            &self.package,
            part,
            slide_number,
            self.slide_size,
            options,
            &self.fonts,
            &self.media,
            &PlaceholderFrames,
        ) {
            Ok((image_data, width, height)) => SlideRender {
                slide_number,
                success: true,
                width,
                height,
                image_data,
                error_message: None,
            },
            Err(err) => {
                let err = err.on_slide(slide_number);
                warn!("{err}");
                SlideRender {
                    slide_number,
                    success: false,
                    width: 0,
                    height: 0,
                    image_data: Vec::new(),
                    error_message: Some(err.to_string()),
                }
            }
        }
    }
}

fn collect_text(nodes: &[ShapeNode], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            ShapeNode::Sp { text: Some(body), .. } => {
                out.extend(body.all_text().into_iter().filter(|t| !t.is_empty()));
            }
            ShapeNode::GrpSp { children, .. } => collect_text(children, out),
            ShapeNode::AlternateContent { choices, fallback } => {
                if let Some(first) = choices.first() {
                    collect_text(&first.shapes, out);
                } else {
                    collect_text(fallback, out);
                }
            }
            _ => {}
        }
    }
}
