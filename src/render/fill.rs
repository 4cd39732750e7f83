//! Fill parsing and painting
//!
//! Fill kinds are tagged variants: none, solid, gradient, blip,
//! pattern, and group-inherit. Shaders work in the shape's local EMU
//! space; the canvas transform carries them to device pixels.

use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use tiny_skia::{
    FilterQuality, GradientStop as SkiaStop, LinearGradient, Paint, Pixmap, RadialGradient,
    SpreadMode,
};

use crate::elements::color::{ColorRef, Rgba};
use crate::oxml::XmlElement;
use crate::render::canvas::{Canvas, solid_paint};
use crate::render::picture::{BlipFillProps, BlipMode, crop_pixmap, tile_anchor};
use crate::render::RenderContext;
use crate::util::parse_percent;

/// A gradient color stop
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position in [0, 1]
    pub position: f64,
    pub color: ColorRef,
}

/// Gradient geometry
#[derive(Debug, Clone, PartialEq)]
pub enum GradientKind {
    /// Linear with an angle in degrees, clockwise from east
    Linear { angle_deg: f64 },
    /// Path gradient radiating from a focus rectangle
    Path { focus: Option<crate::render::picture::RelRect> },
}

/// A parsed gradient fill
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFill {
    pub stops: Vec<GradientStop>,
    pub kind: GradientKind,
}

/// A parsed pattern fill
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFill {
    pub preset: String,
    pub fg: ColorRef,
    pub bg: ColorRef,
}

/// The fill of a shape or background
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fill {
    #[default]
    None,
    Solid(ColorRef),
    Gradient(GradientFill),
    Blip(BlipFillProps),
    Pattern(PatternFill),
    /// `grpFill`: inherit the enclosing group's fill
    Group,
}

impl Fill {
    /// Parse a fill element (`solidFill`, `gradFill`, ...)
    pub fn from_element(el: &XmlElement) -> Fill {
        match el.tag() {
            "noFill" => Fill::None,
            "solidFill" => ColorRef::from_parent(el).map(Fill::Solid).unwrap_or_default(),
            "gradFill" => Fill::Gradient(parse_gradient(el)),
            "blipFill" => BlipFillProps::from_element(el)
                .map(Fill::Blip)
                .unwrap_or_default(),
            "pattFill" => Fill::Pattern(PatternFill {
                preset: el.attr("prst").unwrap_or("pct50").to_string(),
                fg: el
                    .child("fgClr")
                    .and_then(ColorRef::from_parent)
                    .unwrap_or_else(|| ColorRef::srgb(Rgba::BLACK)),
                bg: el
                    .child("bgClr")
                    .and_then(ColorRef::from_parent)
                    .unwrap_or_else(|| ColorRef::srgb(Rgba::WHITE)),
            }),
            "grpFill" => Fill::Group,
            other => {
                debug!("unknown fill element {other}");
                Fill::None
            }
        }
    }

    /// First fill child of a container, if any
    pub fn from_parent(parent: &XmlElement) -> Option<Fill> {
        parent
            .children()
            .iter()
            .find(|c| {
                matches!(
                    c.tag(),
                    "noFill" | "solidFill" | "gradFill" | "blipFill" | "pattFill" | "grpFill"
                )
            })
            .map(Fill::from_element)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Fill::None)
    }
}

fn parse_gradient(el: &XmlElement) -> GradientFill {
    let mut stops: Vec<GradientStop> = el
        .child("gsLst")
        .map(|lst| {
            lst.children_named("gs")
                .filter_map(|gs| {
                    Some(GradientStop {
                        position: gs.attr("pos").and_then(parse_percent)?,
                        color: ColorRef::from_parent(gs)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    stops.sort_by(|a, b| a.position.total_cmp(&b.position));

    let kind = if let Some(lin) = el.child("lin") {
        GradientKind::Linear {
            angle_deg: lin.attr_i64("ang").unwrap_or(0) as f64 / 60_000.0,
        }
    } else if let Some(path) = el.child("path") {
        GradientKind::Path {
            focus: path
                .child("fillToRect")
                .map(crate::render::picture::RelRect::from_element),
        }
    } else {
        GradientKind::Linear { angle_deg: 0.0 }
    };
    GradientFill { stops, kind }
}

/// Resolve the effective fill of a shape: an explicit fill element
/// wins; otherwise an indexed style reference selects a theme fill
/// with its color substituted for `phClr`.
pub fn effective_fill(
    explicit: Option<&XmlElement>,
    style_ref: Option<&(u32, ColorRef)>,
    ctx: &RenderContext,
) -> (Fill, Option<Rgba>) {
    if let Some(el) = explicit {
        return (Fill::from_element(el), None);
    }
    if let Some((idx, color)) = style_ref {
        let ph_clr = ctx.resolve_color(color);
        if let Some(style_el) = ctx.theme.fill_style(*idx) {
            return (Fill::from_element(style_el), Some(ph_clr));
        }
        // Index without a matching style entry paints the ref color
        return (Fill::Solid(ColorRef::srgb(ph_clr)), None);
    }
    (Fill::None, None)
}

/// Paint a fill into a path. `w`/`h` are the shape extent in EMU local
/// space (the gradient/pattern reference box).
pub fn paint_fill(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    fill: &Fill,
    path: &tiny_skia::Path,
    even_odd: bool,
    w: f64,
    h: f64,
    ph_clr: Option<Rgba>,
) {
    match fill {
        Fill::None | Fill::Group => {}
        Fill::Solid(color) => {
            let rgba = ctx.resolve_color_ph(color, ph_clr);
            if rgba.a > 0 {
                canvas.fill_path(path, &solid_paint(rgba), even_odd);
            }
        }
        Fill::Gradient(gradient) => {
            if let Some(paint) = gradient_paint(gradient, ctx, w, h, ph_clr) {
                canvas.fill_path(path, &paint, even_odd);
            }
        }
        Fill::Pattern(pattern) => {
            let tile = pattern_tile(pattern, ctx, ph_clr);
            // Pattern pixels repeat at device scale; undo the canvas
            // transform so the tile is not stretched by EMU scaling.
            if let Some(inverse) = canvas.transform().invert() {
                let shader = tiny_skia::Pattern::new(
                    tile.as_ref(),
                    SpreadMode::Repeat,
                    FilterQuality::Nearest,
                    1.0,
                    inverse,
                );
                let paint = Paint {
                    shader,
                    anti_alias: false,
                    ..Paint::default()
                };
                canvas.fill_path(path, &paint, even_odd);
            }
        }
        Fill::Blip(blip) => paint_blip(canvas, ctx, blip, path, even_odd, w, h),
    }
}

fn skia_stops(
    stops: &[GradientStop],
    ctx: &RenderContext,
    ph_clr: Option<Rgba>,
) -> Vec<SkiaStop> {
    stops
        .iter()
        .map(|stop| {
            let c = ctx.resolve_color_ph(&stop.color, ph_clr);
            SkiaStop::new(
                stop.position.clamp(0.0, 1.0) as f32,
                tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a),
            )
        })
        .collect()
}

fn gradient_paint<'a>(
    gradient: &GradientFill,
    ctx: &RenderContext,
    w: f64,
    h: f64,
    ph_clr: Option<Rgba>,
) -> Option<Paint<'a>> {
    if gradient.stops.is_empty() {
        return None;
    }
    if gradient.stops.len() == 1 {
        let c = ctx.resolve_color_ph(&gradient.stops[0].color, ph_clr);
        return Some(solid_paint(c));
    }
    let stops = skia_stops(&gradient.stops, ctx, ph_clr);
    let shader = match &gradient.kind {
        GradientKind::Linear { angle_deg } => {
            let theta = angle_deg.to_radians();
            let (sin, cos) = theta.sin_cos();
            // Project the box onto the gradient axis through the center
            let half = (w * cos.abs() + h * sin.abs()) / 2.0;
            let (cx, cy) = (w / 2.0, h / 2.0);
            LinearGradient::new(
                tiny_skia::Point::from_xy((cx - cos * half) as f32, (cy - sin * half) as f32),
                tiny_skia::Point::from_xy((cx + cos * half) as f32, (cy + sin * half) as f32),
                stops,
                SpreadMode::Pad,
                tiny_skia::Transform::identity(),
            )?
        }
        GradientKind::Path { focus } => {
            let (fx, fy) = match focus {
                Some(rect) => (
                    w * (rect.left + (1.0 - rect.left - rect.right) / 2.0),
                    h * (rect.top + (1.0 - rect.top - rect.bottom) / 2.0),
                ),
                None => (w / 2.0, h / 2.0),
            };
            let radius = ((w / 2.0).powi(2) + (h / 2.0).powi(2)).sqrt();
            RadialGradient::new(
                tiny_skia::Point::from_xy(fx as f32, fy as f32),
                tiny_skia::Point::from_xy(fx as f32, fy as f32),
                radius as f32,
                stops,
                SpreadMode::Pad,
                tiny_skia::Transform::identity(),
            )?
        }
    };
    Some(Paint {
        shader,
        anti_alias: true,
        ..Paint::default()
    })
}

lazy_static! {
    /// 8x8 1-bpp preset pattern rows, top to bottom, bit 7 = left pixel
    static ref PATTERN_BITS: HashMap<&'static str, [u8; 8]> = {
        let mut m = HashMap::new();
        m.insert("pct5", [0x80, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00]);
        m.insert("pct10", [0x80, 0x00, 0x08, 0x00, 0x80, 0x00, 0x08, 0x00]);
        m.insert("pct20", [0x88, 0x00, 0x22, 0x00, 0x88, 0x00, 0x22, 0x00]);
        m.insert("pct25", [0x88, 0x22, 0x88, 0x22, 0x88, 0x22, 0x88, 0x22]);
        m.insert("pct30", [0xAA, 0x22, 0xAA, 0x22, 0xAA, 0x22, 0xAA, 0x22]);
        m.insert("pct40", [0xAA, 0x44, 0xAA, 0x55, 0xAA, 0x44, 0xAA, 0x55]);
        m.insert("pct50", [0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55]);
        m.insert("pct60", [0xEE, 0x55, 0xEE, 0x55, 0xEE, 0x55, 0xEE, 0x55]);
        m.insert("pct70", [0xDD, 0x77, 0xDD, 0x77, 0xDD, 0x77, 0xDD, 0x77]);
        m.insert("pct75", [0x77, 0xDD, 0x77, 0xDD, 0x77, 0xDD, 0x77, 0xDD]);
        m.insert("pct80", [0xFF, 0x55, 0xFF, 0x55, 0xFF, 0x55, 0xFF, 0x55]);
        m.insert("pct90", [0xFF, 0xDD, 0xFF, 0xFF, 0xFF, 0x77, 0xFF, 0xFF]);
        m.insert("horz", [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00]);
        m.insert("vert", [0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88]);
        m.insert("cross", [0xFF, 0x88, 0x88, 0x88, 0xFF, 0x88, 0x88, 0x88]);
        m.insert("ltUpDiag", [0x11, 0x22, 0x44, 0x88, 0x11, 0x22, 0x44, 0x88]);
        m.insert("ltDnDiag", [0x88, 0x44, 0x22, 0x11, 0x88, 0x44, 0x22, 0x11]);
        m.insert("dkUpDiag", [0x33, 0x66, 0xCC, 0x99, 0x33, 0x66, 0xCC, 0x99]);
        m.insert("dkDnDiag", [0x99, 0xCC, 0x66, 0x33, 0x99, 0xCC, 0x66, 0x33]);
        m.insert(
            "diagCross",
            [0x99, 0x5A, 0x3C, 0x5A, 0x99, 0xA5, 0xC3, 0xA5],
        );
        m.insert("smCheck", [0xCC, 0xCC, 0x33, 0x33, 0xCC, 0xCC, 0x33, 0x33]);
        m.insert("lgCheck", [0xF0, 0xF0, 0xF0, 0xF0, 0x0F, 0x0F, 0x0F, 0x0F]);
        m.insert("dotGrid", [0xAA, 0x00, 0x00, 0x00, 0xAA, 0x00, 0x00, 0x00]);
        m
    };
}

/// Rasterize a pattern preset into an 8x8 tile of fg over bg
fn pattern_tile(pattern: &PatternFill, ctx: &RenderContext, ph_clr: Option<Rgba>) -> Pixmap {
    let fg = ctx.resolve_color_ph(&pattern.fg, ph_clr);
    let bg = ctx.resolve_color_ph(&pattern.bg, ph_clr);
    let bits = PATTERN_BITS.get(pattern.preset.as_str()).unwrap_or_else(|| {
        debug!("unknown pattern preset {}, using pct50", pattern.preset);
        &PATTERN_BITS["pct50"]
    });
    let mut tile = Pixmap::new(8, 8).expect("8x8 tile");
    for y in 0..8 {
        for x in 0..8 {
            let on = bits[y] & (0x80 >> x) != 0;
            let c = if on { fg } else { bg };
            let premul = |v: u8| ((v as u16 * c.a as u16) / 255) as u8;
            tile.pixels_mut()[y * 8 + x] = tiny_skia::PremultipliedColorU8::from_rgba(
                premul(c.r),
                premul(c.g),
                premul(c.b),
                c.a,
            )
            .unwrap_or(tiny_skia::PremultipliedColorU8::TRANSPARENT);
        }
    }
    tile
}

/// EMU per image pixel at the native 96 dpi placement
const EMU_PER_IMAGE_PX: f64 = 9_525.0;

fn paint_blip(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    blip: &BlipFillProps,
    path: &tiny_skia::Path,
    even_odd: bool,
    w: f64,
    h: f64,
) {
    let Some(rels) = ctx.package.relationships(&ctx.rels_part).ok() else {
        return;
    };
    let Some(rel) = rels.get(&blip.rel_id) else {
        debug!("dangling blip relationship {} in {}", blip.rel_id, ctx.rels_part);
        return;
    };
    if rel.external {
        debug!("external blip target skipped: {}", rel.target);
        return;
    }
    let part = ctx.package.resolve_target(&ctx.rels_part, &rel.target);
    let Some(decoded) = ctx.media.decode(ctx.package, &part) else {
        return;
    };
    let source = match &blip.src_rect {
        Some(rect) => match crop_pixmap(&decoded, rect) {
            Some(cropped) => cropped,
            None => return,
        },
        None => (*decoded).clone(),
    };
    let img_w = source.width() as f64;
    let img_h = source.height() as f64;
    if img_w == 0.0 || img_h == 0.0 {
        return;
    }

    match &blip.mode {
        BlipMode::Stretch(fill_rect) => {
            // Destination rectangle in EMU, inset/outset by the fillRect
            let (mut dx, mut dy, mut dw, mut dh) = (0.0, 0.0, w, h);
            if let Some(rect) = fill_rect {
                dx = w * rect.left;
                dy = h * rect.top;
                dw = w * (1.0 - rect.left - rect.right);
                dh = h * (1.0 - rect.top - rect.bottom);
            }
            if dw <= 0.0 || dh <= 0.0 {
                return;
            }
            let shader = tiny_skia::Pattern::new(
                source.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                1.0,
                tiny_skia::Transform::from_translate(dx as f32, dy as f32).pre_scale(
                    (dw / img_w) as f32,
                    (dh / img_h) as f32,
                ),
            );
            let paint = Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            };
            canvas.fill_path(path, &paint, even_odd);
        }
        BlipMode::Tile(tile) => {
            // Native tile size in EMU, scaled by the tile factors
            let tile_w = img_w * EMU_PER_IMAGE_PX * tile.scale_x.max(0.01);
            let tile_h = img_h * EMU_PER_IMAGE_PX * tile.scale_y.max(0.01);
            let (ax, ay) = tile_anchor(&tile.align);
            let ox = tile.offset_x as f64 + ax * (w - tile_w);
            let oy = tile.offset_y as f64 + ay * (h - tile_h);
            let spread = if tile.flip == "none" {
                SpreadMode::Repeat
            } else {
                // Mirror tiling approximates the x/y/xy flip modes
                SpreadMode::Reflect
            };
            let shader = tiny_skia::Pattern::new(
                source.as_ref(),
                spread,
                FilterQuality::Bilinear,
                1.0,
                tiny_skia::Transform::from_translate(ox as f32, oy as f32).pre_scale(
                    (tile_w / img_w) as f32,
                    (tile_h / img_h) as f32,
                ),
            );
            let paint = Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            };
            canvas.fill_path(path, &paint, even_odd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    fn parse_fill(xml: &str) -> Fill {
        Fill::from_element(&XmlParser::parse_str(xml).unwrap())
    }

    #[test]
    fn test_no_fill() {
        assert!(parse_fill(r#"<a:noFill xmlns:a="urn:a"/>"#).is_none());
    }

    #[test]
    fn test_solid_fill() {
        let fill = parse_fill(
            r#"<a:solidFill xmlns:a="urn:a"><a:srgbClr val="FF8800"/></a:solidFill>"#,
        );
        let Fill::Solid(color) = fill else {
            panic!("expected solid");
        };
        assert_eq!(
            color,
            ColorRef::srgb(Rgba::opaque(0xFF, 0x88, 0x00))
        );
    }

    #[test]
    fn test_gradient_stops_sorted() {
        let fill = parse_fill(
            r#"<a:gradFill xmlns:a="urn:a">
                <a:gsLst>
                    <a:gs pos="100000"><a:srgbClr val="0000FF"/></a:gs>
                    <a:gs pos="0"><a:srgbClr val="FF0000"/></a:gs>
                    <a:gs pos="50000"><a:srgbClr val="00FF00"/></a:gs>
                </a:gsLst>
                <a:lin ang="5400000" scaled="1"/>
            </a:gradFill>"#,
        );
        let Fill::Gradient(gradient) = fill else {
            panic!("expected gradient");
        };
        let positions: Vec<f64> = gradient.stops.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
        assert_eq!(gradient.kind, GradientKind::Linear { angle_deg: 90.0 });
    }

    #[test]
    fn test_path_gradient() {
        let fill = parse_fill(
            r#"<a:gradFill xmlns:a="urn:a">
                <a:gsLst><a:gs pos="0"><a:srgbClr val="FFFFFF"/></a:gs>
                <a:gs pos="100000"><a:srgbClr val="000000"/></a:gs></a:gsLst>
                <a:path path="circle"><a:fillToRect l="50000" t="50000" r="50000" b="50000"/></a:path>
            </a:gradFill>"#,
        );
        let Fill::Gradient(gradient) = fill else {
            panic!()
        };
        assert!(matches!(gradient.kind, GradientKind::Path { focus: Some(_) }));
    }

    #[test]
    fn test_pattern_fill() {
        let fill = parse_fill(
            r#"<a:pattFill xmlns:a="urn:a" prst="ltUpDiag">
                <a:fgClr><a:srgbClr val="000000"/></a:fgClr>
                <a:bgClr><a:srgbClr val="FFFFFF"/></a:bgClr>
            </a:pattFill>"#,
        );
        let Fill::Pattern(pattern) = fill else {
            panic!()
        };
        assert_eq!(pattern.preset, "ltUpDiag");
    }

    #[test]
    fn test_group_fill() {
        assert_eq!(parse_fill(r#"<a:grpFill xmlns:a="urn:a"/>"#), Fill::Group);
    }

    #[test]
    fn test_from_parent_picks_first_fill_child() {
        let el = XmlParser::parse_str(
            r#"<p:spPr xmlns:p="urn:p" xmlns:a="urn:a">
                <a:xfrm/>
                <a:prstGeom prst="rect"/>
                <a:solidFill><a:srgbClr val="112233"/></a:solidFill>
            </p:spPr>"#,
        )
        .unwrap();
        assert!(matches!(Fill::from_parent(&el), Some(Fill::Solid(_))));
    }

    #[test]
    fn test_pattern_bits_cover_known_presets() {
        for preset in ["pct50", "horz", "vert", "cross", "ltUpDiag", "lgCheck"] {
            assert!(PATTERN_BITS.contains_key(preset), "{preset} missing");
        }
    }
}
