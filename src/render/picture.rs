//! Picture decoding and blip fill placement
//!
//! `a:blip` references an image part through a relationship id. The
//! decode cache is presentation-scoped; WMF/EMF parts are skipped.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;
use tiny_skia::Pixmap;

use crate::exc::{PptxError, Result};
use crate::opc::Package;
use crate::oxml::XmlElement;
use crate::util::parse_percent;

/// A relative rectangle in fractions of the reference box
/// (`srcRect`/`fillRect`, stored as 1000ths of a percent in source)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl RelRect {
    pub fn from_element(el: &XmlElement) -> Self {
        let field = |name: &str| el.attr(name).and_then(parse_percent).unwrap_or(0.0);
        RelRect {
            left: field("l"),
            top: field("t"),
            right: field("r"),
            bottom: field("b"),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == RelRect::default()
    }
}

/// Tile placement for a tiled blip fill
#[derive(Debug, Clone, PartialEq)]
pub struct TileProps {
    pub align: String,
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip: String,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl TileProps {
    fn from_element(el: &XmlElement) -> Self {
        TileProps {
            align: el.attr("algn").unwrap_or("tl").to_string(),
            scale_x: el.attr("sx").and_then(parse_percent).unwrap_or(1.0),
            scale_y: el.attr("sy").and_then(parse_percent).unwrap_or(1.0),
            flip: el.attr("flip").unwrap_or("none").to_string(),
            offset_x: el.attr_i64("tx").unwrap_or(0),
            offset_y: el.attr_i64("ty").unwrap_or(0),
        }
    }
}

/// How a blip is placed into its destination rectangle
#[derive(Debug, Clone, PartialEq)]
pub enum BlipMode {
    /// Stretch into the destination, optionally inset by a fillRect
    Stretch(Option<RelRect>),
    Tile(TileProps),
}

/// A parsed `blipFill` (shape fill or picture fill)
#[derive(Debug, Clone, PartialEq)]
pub struct BlipFillProps {
    pub rel_id: String,
    pub src_rect: Option<RelRect>,
    pub mode: BlipMode,
}

impl BlipFillProps {
    /// Parse a `p:blipFill` / `a:blipFill` element
    pub fn from_element(el: &XmlElement) -> Option<Self> {
        let blip = el.child("blip")?;
        let rel_id = blip.attr("r:embed").or_else(|| blip.attr("embed"))?;
        let src_rect = el
            .child("srcRect")
            .map(RelRect::from_element)
            .filter(|r| !r.is_zero());
        let mode = if let Some(tile) = el.child("tile") {
            BlipMode::Tile(TileProps::from_element(tile))
        } else {
            BlipMode::Stretch(
                el.child("stretch")
                    .and_then(|s| s.child("fillRect"))
                    .map(RelRect::from_element)
                    .filter(|r| !r.is_zero()),
            )
        };
        Some(BlipFillProps {
            rel_id: rel_id.to_string(),
            src_rect,
            mode,
        })
    }
}

/// Presentation-scoped decoded media cache
pub struct MediaCache {
    decoded: RwLock<HashMap<String, Option<Arc<Pixmap>>>>,
}

impl MediaCache {
    pub fn new() -> Self {
        MediaCache {
            decoded: RwLock::new(HashMap::new()),
        }
    }

    /// Decode an image part into a pixmap. Unsupported vector formats
    /// (WMF/EMF) and decode failures yield `None` and are cached so
    /// the failure is logged once.
    pub fn decode(&self, package: &Package, part_path: &str) -> Option<Arc<Pixmap>> {
        if let Some(cached) = self.decoded.read().expect("media cache").get(part_path) {
            return cached.clone();
        }
        let decoded = self.decode_uncached(package, part_path);
        if let Err(err) = &decoded {
            debug!("media {part_path} not decoded: {err}");
        }
        let entry = decoded.ok().map(Arc::new);
        self.decoded
            .write()
            .expect("media cache")
            .insert(part_path.to_string(), entry.clone());
        entry
    }

    fn decode_uncached(&self, package: &Package, part_path: &str) -> Result<Pixmap> {
        let lower = part_path.to_ascii_lowercase();
        if lower.ends_with(".wmf") || lower.ends_with(".emf") {
            return Err(PptxError::UnsupportedFeature(format!(
                "vector metafile {part_path}"
            )));
        }
        let bytes = package.part(part_path)?;
        let image = image::load_from_memory(bytes).map_err(|e| PptxError::MediaDecode {
            part: part_path.to_string(),
            message: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| PptxError::MediaDecode {
            part: part_path.to_string(),
            message: "zero-sized image".to_string(),
        })?;
        for (pixel, chunk) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
            let a = chunk[3];
            // tiny-skia stores premultiplied channels
            let premul = |c: u8| ((c as u16 * a as u16) / 255) as u8;
            *pixel = tiny_skia::PremultipliedColorU8::from_rgba(
                premul(chunk[0]),
                premul(chunk[1]),
                premul(chunk[2]),
                a,
            )
            .unwrap_or(tiny_skia::PremultipliedColorU8::TRANSPARENT);
        }
        Ok(pixmap)
    }
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Crop a pixmap by a relative source rectangle
pub fn crop_pixmap(source: &Pixmap, src_rect: &RelRect) -> Option<Pixmap> {
    let w = source.width() as f64;
    let h = source.height() as f64;
    let x0 = (w * src_rect.left).round() as i32;
    let y0 = (h * src_rect.top).round() as i32;
    let x1 = (w * (1.0 - src_rect.right)).round() as i32;
    let y1 = (h * (1.0 - src_rect.bottom)).round() as i32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let rect = tiny_skia::IntRect::from_xywh(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)?;
    source.clone_rect(rect)
}

/// Tile alignment as a fractional anchor within the destination
pub fn tile_anchor(align: &str) -> (f64, f64) {
    match align {
        "tl" => (0.0, 0.0),
        "t" => (0.5, 0.0),
        "tr" => (1.0, 0.0),
        "l" => (0.0, 0.5),
        "ctr" => (0.5, 0.5),
        "r" => (1.0, 0.5),
        "bl" => (0.0, 1.0),
        "b" => (0.5, 1.0),
        "br" => (1.0, 1.0),
        _ => (0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    #[test]
    fn test_parse_stretch_blip_fill() {
        let xml = r#"<p:blipFill xmlns:p="urn:p" xmlns:a="urn:a" xmlns:r="urn:r">
            <a:blip r:embed="rId3"/>
            <a:srcRect l="10000" t="20000" r="10000" b="20000"/>
            <a:stretch><a:fillRect l="5000"/></a:stretch>
        </p:blipFill>"#;
        let el = XmlParser::parse_str(xml).unwrap();
        let props = BlipFillProps::from_element(&el).unwrap();
        assert_eq!(props.rel_id, "rId3");
        let src = props.src_rect.unwrap();
        assert_eq!(src.left, 0.1);
        assert_eq!(src.bottom, 0.2);
        assert!(matches!(props.mode, BlipMode::Stretch(Some(_))));
    }

    #[test]
    fn test_parse_tile_blip_fill() {
        let xml = r#"<a:blipFill xmlns:a="urn:a" xmlns:r="urn:r">
            <a:blip r:embed="rId2"/>
            <a:tile algn="ctr" sx="50000" sy="50000" flip="xy"/>
        </a:blipFill>"#;
        let el = XmlParser::parse_str(xml).unwrap();
        let props = BlipFillProps::from_element(&el).unwrap();
        let BlipMode::Tile(tile) = props.mode else {
            panic!("expected tile");
        };
        assert_eq!(tile.align, "ctr");
        assert_eq!(tile.scale_x, 0.5);
        assert_eq!(tile.flip, "xy");
    }

    #[test]
    fn test_blip_without_embed_is_none() {
        let xml = r#"<a:blipFill xmlns:a="urn:a"><a:blip/></a:blipFill>"#;
        let el = XmlParser::parse_str(xml).unwrap();
        assert!(BlipFillProps::from_element(&el).is_none());
    }

    #[test]
    fn test_crop_pixmap_fractions() {
        let mut source = Pixmap::new(100, 50).unwrap();
        source.fill(tiny_skia::Color::from_rgba8(10, 20, 30, 255));
        let cropped = crop_pixmap(
            &source,
            &RelRect {
                left: 0.1,
                top: 0.2,
                right: 0.1,
                bottom: 0.2,
            },
        )
        .unwrap();
        assert_eq!(cropped.width(), 80);
        assert_eq!(cropped.height(), 30);
    }

    #[test]
    fn test_degenerate_crop_is_none() {
        let source = Pixmap::new(10, 10).unwrap();
        let none = crop_pixmap(
            &source,
            &RelRect {
                left: 0.6,
                top: 0.0,
                right: 0.6,
                bottom: 0.0,
            },
        );
        assert!(none.is_none());
    }

    #[test]
    fn test_tile_anchor_table() {
        assert_eq!(tile_anchor("tl"), (0.0, 0.0));
        assert_eq!(tile_anchor("ctr"), (0.5, 0.5));
        assert_eq!(tile_anchor("br"), (1.0, 1.0));
        assert_eq!(tile_anchor("nonsense"), (0.0, 0.0));
    }

    #[test]
    fn test_decode_png_via_cache() {
        use std::io::Write;
        use zip::write::FileOptions;
        // A 2x1 red PNG built with the image crate
        let mut png_bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        zip.write_all(br#"<Types xmlns="urn:ct"/>"#).unwrap();
        zip.start_file("ppt/media/image1.png", FileOptions::default())
            .unwrap();
        zip.write_all(&png_bytes).unwrap();
        let package = Package::from_bytes(zip.finish().unwrap().into_inner()).unwrap();

        let cache = MediaCache::new();
        let pixmap = cache.decode(&package, "ppt/media/image1.png").unwrap();
        assert_eq!(pixmap.width(), 2);
        let pixel = pixmap.pixel(0, 0).unwrap();
        assert_eq!(pixel.red(), 255);
        // Cache hit returns the same allocation
        let again = cache.decode(&package, "ppt/media/image1.png").unwrap();
        assert!(Arc::ptr_eq(&pixmap, &again));
    }

    #[test]
    fn test_wmf_is_skipped() {
        use std::io::Write;
        use zip::write::FileOptions;
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        zip.write_all(br#"<Types xmlns="urn:ct"/>"#).unwrap();
        zip.start_file("ppt/media/pic.wmf", FileOptions::default())
            .unwrap();
        zip.write_all(b"\xd7\xcd\xc6\x9a").unwrap();
        let package = Package::from_bytes(zip.finish().unwrap().into_inner()).unwrap();
        let cache = MediaCache::new();
        assert!(cache.decode(&package, "ppt/media/pic.wmf").is_none());
    }
}
