//! Global constants - no hardcoding

/// English Metric Unit ratios
pub mod emu {
    pub const PER_INCH: i64 = 914_400;
    pub const PER_POINT: i64 = 12_700;
    pub const PER_CM: i64 = 360_000;
    pub const PER_MM: i64 = 36_000;
    /// Angles are stored in 60000ths of a degree
    pub const ANGLE_PER_DEGREE: i64 = 60_000;
    /// Percentages are stored in 1000ths of a percent
    pub const PER_PERCENT: i64 = 100_000;
    /// Font sizes are stored in hundredths of a point
    pub const CENTIPOINTS_PER_POINT: i64 = 100;
}

/// XML namespace URIs
pub mod ns {
    pub const DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    pub const PRESENTATIONML: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    pub const RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const MARKUP_COMPATIBILITY: &str =
        "http://schemas.openxmlformats.org/markup-compatibility/2006";
}

/// Relationship type URIs recognized by the renderer
pub mod rel_type {
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const OLE_OBJECT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject";
}

/// Well-known part paths
pub mod parts {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const PRESENTATION: &str = "ppt/presentation.xml";
    pub const CORE_PROPERTIES: &str = "docProps/core.xml";
}

/// Presentation defaults
pub mod presentation {
    /// 4:3 slide size in EMU (10" x 7.5")
    pub const DEFAULT_WIDTH: i64 = 9_144_000;
    pub const DEFAULT_HEIGHT: i64 = 6_858_000;
}

/// Text body defaults
pub mod text {
    /// Default body insets in EMU: left, top, right, bottom
    pub const INSET_LEFT: i64 = 91_440;
    pub const INSET_TOP: i64 = 45_720;
    pub const INSET_RIGHT: i64 = 91_440;
    pub const INSET_BOTTOM: i64 = 45_720;
    /// Fallback font size in points when nothing in the chain defines one
    pub const DEFAULT_FONT_SIZE: f32 = 18.0;
    /// Default line spacing as a fraction of the font's natural line height
    pub const DEFAULT_LINE_SPACING: f32 = 1.0;
    /// Default bullet characters per indent level, cycled
    pub const LEVEL_BULLETS: [&str; 3] = ["\u{2022}", "\u{25CB}", "\u{25AA}"];
}

/// Stroke defaults
pub mod stroke {
    /// Default outline width: 1pt in EMU
    pub const DEFAULT_WIDTH_EMU: i64 = 12_700;
    /// Strokes thinner than this many device pixels are not painted
    pub const MIN_VISIBLE_PX: f32 = 0.1;
    /// Painted strokes never go below this effective device width
    pub const MIN_EFFECTIVE_PX: f32 = 0.5;
}

/// Render defaults
pub mod render {
    pub const DEFAULT_DPI: f32 = 96.0;
}

/// Built-in Office theme used when a scheme color cannot be resolved
pub mod fallback_scheme {
    pub const DK1: &str = "000000";
    pub const LT1: &str = "FFFFFF";
    pub const DK2: &str = "44546A";
    pub const LT2: &str = "E7E6E6";
    pub const ACCENT1: &str = "4472C4";
    pub const ACCENT2: &str = "ED7D31";
    pub const ACCENT3: &str = "A5A5A5";
    pub const ACCENT4: &str = "FFC000";
    pub const ACCENT5: &str = "5B9BD5";
    pub const ACCENT6: &str = "70AD47";
    pub const HLINK: &str = "0563C1";
    pub const FOL_HLINK: &str = "954F72";
    pub const MAJOR_FONT: &str = "Calibri Light";
    pub const MINOR_FONT: &str = "Calibri";
}
