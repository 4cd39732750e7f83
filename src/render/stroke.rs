//! Outline parsing and stroking
//!
//! Stroke widths and dash arrays are expressed in EMU (path space) so
//! the canvas transform scales them with the shape. Minimum-width
//! rules apply in device pixels.

use log::debug;
use tiny_skia::{LineCap, LineJoin, Stroke, StrokeDash};

use crate::constants::stroke as stroke_const;
use crate::elements::color::{ColorRef, Rgba};
use crate::oxml::XmlElement;
use crate::render::canvas::{Canvas, solid_paint};
use crate::render::fill::Fill;
use crate::render::RenderContext;

/// A parsed outline (`a:ln`)
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// Width in EMU
    pub width: i64,
    pub fill: Fill,
    /// Dash lengths as multiples of the stroke width; empty = solid
    pub dash: Vec<f32>,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Default for Outline {
    fn default() -> Self {
        Outline {
            width: stroke_const::DEFAULT_WIDTH_EMU,
            fill: Fill::None,
            dash: Vec::new(),
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }
}

/// Preset dash patterns as multiples of the stroke width
fn preset_dash(name: &str) -> Vec<f32> {
    match name {
        "solid" => Vec::new(),
        "dot" => vec![1.0, 3.0],
        "dash" => vec![4.0, 3.0],
        "lgDash" => vec![8.0, 3.0],
        "dashDot" => vec![4.0, 3.0, 1.0, 3.0],
        "lgDashDot" => vec![8.0, 3.0, 1.0, 3.0],
        "lgDashDotDot" => vec![8.0, 3.0, 1.0, 3.0, 1.0, 3.0],
        "sysDash" => vec![3.0, 1.0],
        "sysDot" => vec![1.0, 1.0],
        "sysDashDot" => vec![3.0, 1.0, 1.0, 1.0],
        "sysDashDotDot" => vec![3.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        other => {
            debug!("unknown dash preset {other}, painting solid");
            Vec::new()
        }
    }
}

impl Outline {
    /// Parse an `a:ln` element. Returns `None` when there is no
    /// outline element at all (the caller may then inherit one).
    pub fn from_element(ln: &XmlElement) -> Outline {
        let mut outline = Outline {
            width: ln.attr_i64("w").unwrap_or(stroke_const::DEFAULT_WIDTH_EMU),
            fill: Fill::from_parent(ln).unwrap_or(Fill::None),
            ..Outline::default()
        };
        if let Some(dash) = ln.child("prstDash").and_then(|d| d.attr("val")) {
            outline.dash = preset_dash(dash);
        } else if let Some(cust) = ln.child("custDash") {
            // ds elements carry dash/space lengths in 1000ths of a percent
            // of the line width
            outline.dash = cust
                .children_named("ds")
                .flat_map(|ds| {
                    let field = |name: &str| {
                        ds.attr(name)
                            .and_then(crate::util::parse_percent)
                            .unwrap_or(1.0) as f32
                    };
                    [field("d"), field("sp")]
                })
                .collect();
        }
        outline.cap = match ln.attr("cap") {
            Some("rnd") => LineCap::Round,
            Some("sq") => LineCap::Square,
            _ => LineCap::Butt,
        };
        outline.join = if ln.child("round").is_some() {
            LineJoin::Round
        } else if ln.child("bevel").is_some() {
            LineJoin::Bevel
        } else {
            LineJoin::Miter
        };
        outline
    }

    /// Whether anything would be painted
    pub fn is_visible(&self) -> bool {
        !self.fill.is_none()
    }
}

/// Resolve the effective outline: an explicit `a:ln` wins; otherwise
/// an indexed line style reference selects a theme line style with
/// its color substituted for `phClr`.
pub fn effective_outline(
    explicit: Option<&XmlElement>,
    style_ref: Option<&(u32, ColorRef)>,
    ctx: &RenderContext,
) -> (Option<Outline>, Option<Rgba>) {
    if let Some(ln) = explicit {
        let outline = Outline::from_element(ln);
        // An ln element with no fill child means "no stroke" only when
        // noFill is explicit; otherwise styles may still color it.
        if outline.is_visible() {
            return (Some(outline), None);
        }
        if ln.child("noFill").is_some() {
            return (None, None);
        }
        if let Some((idx, color)) = style_ref {
            let ph_clr = ctx.resolve_color(color);
            if let Some(style_el) = ctx.theme.line_style(*idx) {
                let mut styled = Outline::from_element(style_el);
                // Explicit attributes override the style entry
                styled.width = if ln.attr("w").is_some() {
                    outline.width
                } else {
                    styled.width
                };
                if !outline.dash.is_empty() {
                    styled.dash = outline.dash;
                }
                return (Some(styled), Some(ph_clr));
            }
            let mut fallback = outline;
            fallback.fill = Fill::Solid(ColorRef::srgb(ph_clr));
            return (Some(fallback), None);
        }
        return (None, None);
    }
    if let Some((idx, color)) = style_ref {
        let ph_clr = ctx.resolve_color(color);
        if let Some(style_el) = ctx.theme.line_style(*idx) {
            return (Some(Outline::from_element(style_el)), Some(ph_clr));
        }
    }
    (None, None)
}

/// Stroke a path. Elides hairlines under the visibility threshold and
/// floors the effective device width.
pub fn paint_stroke(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    outline: &Outline,
    path: &tiny_skia::Path,
    ph_clr: Option<Rgba>,
) {
    let color = match &outline.fill {
        Fill::None | Fill::Group => return,
        Fill::Solid(color) => ctx.resolve_color_ph(color, ph_clr),
        Fill::Gradient(gradient) => {
            // Gradient strokes degrade to their first stop color
            match gradient.stops.first() {
                Some(stop) => ctx.resolve_color_ph(&stop.color, ph_clr),
                None => return,
            }
        }
        Fill::Blip(_) | Fill::Pattern(_) => {
            debug!("image/pattern stroke degraded to black");
            Rgba::BLACK
        }
    };

    let device_scale = canvas.current_scale().max(f32::EPSILON);
    let mut width_px = outline.width as f32 * device_scale;
    if width_px < stroke_const::MIN_VISIBLE_PX {
        return;
    }
    if width_px < stroke_const::MIN_EFFECTIVE_PX {
        width_px = stroke_const::MIN_EFFECTIVE_PX;
    }
    let width_local = width_px / device_scale;

    let dash = if outline.dash.is_empty() {
        None
    } else {
        let array: Vec<f32> = outline.dash.iter().map(|m| m * width_local).collect();
        StrokeDash::new(array, 0.0)
    };

    let stroke = Stroke {
        width: width_local,
        line_cap: outline.cap,
        line_join: outline.join,
        dash,
        ..Stroke::default()
    };
    canvas.stroke_path(path, &solid_paint(color), &stroke);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    fn parse_ln(xml: &str) -> Outline {
        Outline::from_element(&XmlParser::parse_str(xml).unwrap())
    }

    #[test]
    fn test_default_width_is_one_point() {
        let outline = parse_ln(
            r#"<a:ln xmlns:a="urn:a"><a:solidFill><a:srgbClr val="000000"/></a:solidFill></a:ln>"#,
        );
        assert_eq!(outline.width, 12_700);
        assert!(outline.is_visible());
        assert!(outline.dash.is_empty());
    }

    #[test]
    fn test_caps_and_joins() {
        let outline = parse_ln(
            r#"<a:ln xmlns:a="urn:a" cap="rnd">
                <a:solidFill><a:srgbClr val="000000"/></a:solidFill>
                <a:bevel/>
            </a:ln>"#,
        );
        assert_eq!(outline.cap, LineCap::Round);
        assert_eq!(outline.join, LineJoin::Bevel);

        let square = parse_ln(r#"<a:ln xmlns:a="urn:a" cap="sq"><a:round/></a:ln>"#);
        assert_eq!(square.cap, LineCap::Square);
        assert_eq!(square.join, LineJoin::Round);
    }

    #[test]
    fn test_preset_dash_multiples() {
        let outline = parse_ln(
            r#"<a:ln xmlns:a="urn:a"><a:solidFill><a:srgbClr val="000000"/></a:solidFill>
               <a:prstDash val="dashDot"/></a:ln>"#,
        );
        assert_eq!(outline.dash, vec![4.0, 3.0, 1.0, 3.0]);
    }

    #[test]
    fn test_unknown_dash_is_solid() {
        assert!(preset_dash("wavyMystery").is_empty());
    }

    #[test]
    fn test_custom_dash() {
        let outline = parse_ln(
            r#"<a:ln xmlns:a="urn:a"><a:solidFill><a:srgbClr val="000000"/></a:solidFill>
               <a:custDash><a:ds d="300000" sp="100000"/></a:custDash></a:ln>"#,
        );
        assert_eq!(outline.dash, vec![3.0, 1.0]);
    }

    #[test]
    fn test_no_fill_outline_invisible() {
        let outline = parse_ln(r#"<a:ln xmlns:a="urn:a" w="25400"><a:noFill/></a:ln>"#);
        assert!(!outline.is_visible());
    }
}
