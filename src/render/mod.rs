//! Rendering pipeline
//!
//! One `RenderContext` per slide, sharing the package, resolved
//! theme, font library, and media cache. All paint operations happen
//! in document order on a canvas owned by the slide renderer.

pub mod bullet;
pub mod canvas;
pub mod fill;
pub mod fonts;
pub mod graphic_frame;
pub mod picture;
pub mod placeholder;
pub mod shape;
pub mod slide;
pub mod stroke;
pub mod text;

use serde::Serialize;

use crate::constants::render::DEFAULT_DPI;
use crate::elements::color::{ColorRef, Rgba, SchemeColors};
use crate::opc::Package;
use crate::oxml::Theme;

pub use canvas::Canvas;
pub use fonts::FontLibrary;
pub use graphic_frame::{GraphicFrameRenderer, PlaceholderFrames};
pub use picture::MediaCache;
pub use placeholder::HfFlags;

/// Output image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

/// Options for a presentation render
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output width in pixels; height follows the slide aspect ratio
    pub width: u32,
    pub format: OutputFormat,
    pub dpi: f32,
    /// JPEG quality, ignored for PNG
    pub jpeg_quality: u8,
}

impl RenderOptions {
    pub fn new(width: u32) -> Self {
        RenderOptions {
            width,
            format: OutputFormat::Png,
            dpi: DEFAULT_DPI,
            jpeg_quality: 90,
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }
}

/// Per-slide render outcome
#[derive(Debug, Clone, Serialize)]
pub struct SlideRender {
    pub slide_number: usize,
    pub success: bool,
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes; empty on failure. Omitted from JSON
    /// manifests.
    #[serde(skip)]
    pub image_data: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Whole-presentation render outcome
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub total_slides: usize,
    pub successful_slides: usize,
    pub slides: Vec<SlideRender>,
}

/// Per-slide rendering context. Cheap to clone; the clone shares the
/// package, caches, and theme.
pub struct RenderContext<'a> {
    pub package: &'a Package,
    pub theme: &'a Theme,
    /// Scheme colors with the master/slide color map applied
    pub colors: SchemeColors,
    pub fonts: &'a FontLibrary,
    pub media: &'a MediaCache,
    pub graphic_frames: &'a dyn GraphicFrameRenderer,
    /// Device pixels per EMU
    pub scale: f64,
    pub dpi: f32,
    /// 1-based slide number, substituted into slide-number fields
    pub slide_number: usize,
    /// The part whose relationships resolve `r:embed` references
    pub rels_part: String,
    pub hf: HfFlags,
}

impl<'a> RenderContext<'a> {
    /// Resolve a color reference against the effective scheme
    pub fn resolve_color(&self, color: &ColorRef) -> Rgba {
        color.resolve(&self.colors, None)
    }

    /// Resolve with a style-matrix placeholder color in scope
    pub fn resolve_color_ph(&self, color: &ColorRef, ph_clr: Option<Rgba>) -> Rgba {
        color.resolve(&self.colors, ph_clr)
    }

    /// Point size to device pixels. The canvas resolution follows the
    /// requested width, so the effective pixels-per-inch is derived
    /// from the EMU scale; the dpi option adjusts relative to 96.
    pub fn font_px(&self, pts: f32) -> f32 {
        let px_per_inch =
            (self.scale * crate::constants::emu::PER_INCH as f64) as f32 * (self.dpi / 96.0);
        pts * px_per_inch / 72.0
    }

    /// A context whose relationship lookups go through another part
    /// (background fills parsed from the layout or master)
    pub fn with_rels_part(&self, part: &str) -> RenderContext<'a> {
        RenderContext {
            package: self.package,
            theme: self.theme,
            colors: self.colors.clone(),
            fonts: self.fonts,
            media: self.media,
            graphic_frames: self.graphic_frames,
            scale: self.scale,
            dpi: self.dpi,
            slide_number: self.slide_number,
            rels_part: part.to_string(),
            hf: self.hf,
        }
    }
}
