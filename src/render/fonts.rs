//! Font resolution
//!
//! The platform font matching chain is deterministic: the run's
//! explicit typeface first, then the theme major/minor font, then a
//! fixed list of platform sans candidates. When no font file loads at
//! all, synthetic metrics keep layout deterministic; glyphs are
//! simply not painted in that case.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use ab_glyph::{Font, FontArc, ScaleFont};
use log::{debug, warn};

use crate::elements::path::Path;

/// Directories probed for font files, in order
const FONT_DIRS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
];

/// Last-resort family candidates, tried after the requested family
const FALLBACK_FAMILIES: [&str; 4] = ["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// Synthetic metrics used when no font file is available, as
/// fractions of the em size
const HEURISTIC_ADVANCE: f32 = 0.6;
const HEURISTIC_ASCENT: f32 = 0.8;
const HEURISTIC_DESCENT: f32 = 0.25;

/// Vertical metrics at a concrete pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

/// A resolved font: either a loaded face or the synthetic fallback
#[derive(Clone)]
pub struct FontHandle {
    font: Option<FontArc>,
}

impl FontHandle {
    fn scale(&self, px_size: f32) -> ab_glyph::PxScale {
        // Treat the pixel size as the em size
        let font = self.font.as_ref().expect("scale only called with a font");
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        ab_glyph::PxScale::from(px_size * font.height_unscaled() / units_per_em)
    }

    pub fn is_loaded(&self) -> bool {
        self.font.is_some()
    }

    pub fn metrics(&self, px_size: f32) -> LineMetrics {
        match &self.font {
            Some(font) => {
                let scaled = font.as_scaled(self.scale(px_size));
                LineMetrics {
                    ascent: scaled.ascent(),
                    descent: -scaled.descent(),
                    line_gap: scaled.line_gap(),
                }
            }
            None => LineMetrics {
                ascent: px_size * HEURISTIC_ASCENT,
                descent: px_size * HEURISTIC_DESCENT,
                line_gap: 0.0,
            },
        }
    }

    /// Advance width of a string in pixels, kerning applied
    pub fn measure(&self, text: &str, px_size: f32) -> f32 {
        match &self.font {
            Some(font) => {
                let scaled = font.as_scaled(self.scale(px_size));
                let mut width = 0.0;
                let mut previous = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            None => text.chars().count() as f32 * px_size * HEURISTIC_ADVANCE,
        }
    }

    /// Advance of a single character
    pub fn char_advance(&self, ch: char, px_size: f32) -> f32 {
        match &self.font {
            Some(font) => {
                let scaled = font.as_scaled(self.scale(px_size));
                scaled.h_advance(font.glyph_id(ch))
            }
            None => px_size * HEURISTIC_ADVANCE,
        }
    }

    /// Outline of one glyph as a fillable path in pixel units, with
    /// y growing downward and the origin at the pen position on the
    /// baseline. Returns the path and the advance width.
    pub fn glyph_path(&self, ch: char, px_size: f32) -> (Option<Path>, f32) {
        let Some(font) = &self.font else {
            return (None, self.char_advance(ch, px_size));
        };
        let id = font.glyph_id(ch);
        let scaled = font.as_scaled(self.scale(px_size));
        let advance = scaled.h_advance(id);
        let Some(outline) = font.outline(id) else {
            return (None, advance);
        };

        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        let factor = px_size / units_per_em;
        let fx = |v: f32| (v * factor) as f64;
        let fy = |v: f32| (-v * factor) as f64;

        let mut path = Path::new();
        let mut current: Option<ab_glyph::Point> = None;
        for curve in &outline.curves {
            let (start, end) = match curve {
                ab_glyph::OutlineCurve::Line(p0, p1) => (*p0, *p1),
                ab_glyph::OutlineCurve::Quad(p0, _, p2) => (*p0, *p2),
                ab_glyph::OutlineCurve::Cubic(p0, _, _, p3) => (*p0, *p3),
            };
            if current != Some(start) {
                path.move_to(fx(start.x), fy(start.y));
            }
            match curve {
                ab_glyph::OutlineCurve::Line(_, p1) => path.line_to(fx(p1.x), fy(p1.y)),
                ab_glyph::OutlineCurve::Quad(_, c, p2) => {
                    path.quad_to(fx(c.x), fy(c.y), fx(p2.x), fy(p2.y))
                }
                ab_glyph::OutlineCurve::Cubic(_, c1, c2, p3) => path.cubic_to(
                    fx(c1.x),
                    fy(c1.y),
                    fx(c2.x),
                    fy(c2.y),
                    fx(p3.x),
                    fy(p3.y),
                ),
            }
            current = Some(end);
        }
        (Some(path), advance)
    }
}

/// Presentation-scoped font loader and cache
pub struct FontLibrary {
    cache: RwLock<HashMap<String, Option<Arc<FontArc>>>>,
    warned: RwLock<bool>,
}

impl FontLibrary {
    pub fn new() -> Self {
        FontLibrary {
            cache: RwLock::new(HashMap::new()),
            warned: RwLock::new(false),
        }
    }

    /// Resolve a typeface through the fallback chain. Always returns
    /// a usable handle.
    pub fn resolve(&self, typeface: &str, bold: bool, italic: bool) -> FontHandle {
        let mut families: Vec<&str> = vec![typeface];
        families.extend(FALLBACK_FAMILIES.iter().filter(|f| **f != typeface));
        for family in families {
            if let Some(font) = self.load_family(family, bold, italic) {
                return FontHandle { font: Some((*font).clone()) };
            }
            // A styled face may be missing where the regular face exists
            if bold || italic {
                if let Some(font) = self.load_family(family, false, false) {
                    return FontHandle { font: Some((*font).clone()) };
                }
            }
        }
        let mut warned = self.warned.write().expect("font warn flag");
        if !*warned {
            warn!("no font files found; text will be measured but not painted");
            *warned = true;
        }
        FontHandle { font: None }
    }

    fn load_family(&self, family: &str, bold: bool, italic: bool) -> Option<Arc<FontArc>> {
        let key = format!("{family}|{bold}|{italic}");
        if let Some(cached) = self.cache.read().expect("font cache").get(&key) {
            return cached.clone();
        }
        let loaded = self.try_load(family, bold, italic).map(Arc::new);
        if loaded.is_some() {
            debug!("loaded font {key}");
        }
        self.cache
            .write()
            .expect("font cache")
            .insert(key, loaded.clone());
        loaded
    }

    fn try_load(&self, family: &str, bold: bool, italic: bool) -> Option<FontArc> {
        for candidate in font_file_candidates(family, bold, italic) {
            for dir in FONT_DIRS {
                let path = PathBuf::from(dir).join(&candidate);
                if let Ok(bytes) = std::fs::read(&path) {
                    if let Ok(font) = FontArc::try_from_vec(bytes) {
                        return Some(font);
                    }
                }
            }
        }
        None
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate file names for a family and style, most specific first
fn font_file_candidates(family: &str, bold: bool, italic: bool) -> Vec<String> {
    let compact: String = family.split_whitespace().collect();
    let style_dash = match (bold, italic) {
        (true, true) => "-BoldItalic",
        (true, false) => "-Bold",
        (false, true) => "-Italic",
        (false, false) => "-Regular",
    };
    let style_join = match (bold, italic) {
        (true, true) => "BoldOblique",
        (true, false) => "Bold",
        (false, true) => "Oblique",
        (false, false) => "",
    };
    let mut names = vec![
        format!("{compact}{style_dash}.ttf"),
        format!("{compact}{style_join}.ttf"),
        format!("{compact}.ttf"),
        format!("{}.ttf", family.to_lowercase().replace(' ', "")),
    ];
    // Well-known metric-compatible substitutes
    let substitute = match family {
        "Arial" | "Helvetica" | "Calibri" | "Calibri Light" => Some("LiberationSans"),
        "Times New Roman" | "Cambria" => Some("LiberationSerif"),
        "Courier New" | "Consolas" => Some("LiberationMono"),
        _ => None,
    };
    if let Some(sub) = substitute {
        names.push(format!("{sub}{style_dash}.ttf"));
    }
    names.push(format!("DejaVuSans{}.ttf", style_join));
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unloaded_handle_uses_heuristic_metrics() {
        let handle = FontHandle { font: None };
        let metrics = handle.metrics(20.0);
        assert_eq!(metrics.ascent, 16.0);
        assert_eq!(metrics.descent, 5.0);
        assert_eq!(handle.measure("abcd", 10.0), 4.0 * 6.0);
        let (path, advance) = handle.glyph_path('a', 10.0);
        assert!(path.is_none());
        assert_eq!(advance, 6.0);
    }

    #[test]
    fn test_measure_scales_linearly_without_font() {
        let handle = FontHandle { font: None };
        let narrow = handle.measure("xx", 10.0);
        let wide = handle.measure("xx", 20.0);
        assert!((wide - narrow * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_order_prefers_exact_family() {
        let names = font_file_candidates("DejaVu Sans", false, false);
        assert_eq!(names[0], "DejaVuSans-Regular.ttf");
        assert!(names.contains(&"DejaVuSans.ttf".to_string()));
    }

    #[test]
    fn test_resolution_always_yields_a_handle() {
        let library = FontLibrary::new();
        let handle = library.resolve("Surely Not A Real Font", true, true);
        // Either a fallback loaded from the system or the synthetic handle
        let _ = handle.measure("text", 12.0);
    }

    #[test]
    fn test_substitutes_for_office_fonts() {
        let names = font_file_candidates("Calibri", false, false);
        assert!(names.iter().any(|n| n.starts_with("LiberationSans")));
    }
}
