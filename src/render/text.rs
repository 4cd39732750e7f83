//! Text layout and painting
//!
//! Lays paragraphs out inside the body rectangle: property resolution
//! down the run -> paragraph -> list style -> placeholder -> master
//! chain, greedy word wrap, line metrics, alignment, and autofit.
//! Painting emits the bullet first, then each run's glyphs.
//!
//! Layout happens in device-pixel space; the caller's canvas
//! transform already maps the shape box to the device.

use log::trace;

use crate::constants::text as text_const;
use crate::elements::color::{ColorRef, Rgba};
use crate::oxml::text::{
    Align, Anchor, AutoFit, BodyProps, BulletKind, ListStyle, ParaItem, ParaProps, Paragraph,
    RunProps, Spacing, TextBody,
};
use crate::render::bullet::{BulletCounter, format_bullet};
use crate::render::canvas::{Canvas, solid_paint};
use crate::render::fonts::FontHandle;
use crate::render::RenderContext;

/// Default left indent step per list level, in EMU
const LEVEL_INDENT_EMU: i64 = 342_900;
/// Gap between a bullet and its text, in EMU
const BULLET_GAP_EMU: i64 = 91_440;

/// Inherited context a text body is laid out against
#[derive(Debug, Clone, Default)]
pub struct TextContext {
    /// Placeholder + master list style chain, lowest precedence merged in
    pub inherited_list: ListStyle,
    /// Placeholder body properties
    pub inherited_body: Option<BodyProps>,
    /// Font color from the shape's style `fontRef`
    pub style_font_color: Option<ColorRef>,
    /// Whether paragraphs default to bullets when the chain is silent
    /// (body-family placeholders do, plain text boxes do not)
    pub default_bullets: bool,
}

/// One measured word segment
struct Seg {
    text: String,
    width: f32,
    size_px: f32,
    color: Rgba,
    underline: bool,
    strike: bool,
    handle: FontHandle,
}

/// One laid-out line
struct Line {
    segs: Vec<Seg>,
    width: f32,
    ascent: f32,
    natural_height: f32,
}

impl Line {
    fn empty() -> Self {
        Line {
            segs: Vec::new(),
            width: 0.0,
            ascent: 0.0,
            natural_height: 0.0,
        }
    }

    fn absorb_metrics(&mut self, handle: &FontHandle, size_px: f32) {
        let metrics = handle.metrics(size_px);
        self.ascent = self.ascent.max(metrics.ascent);
        self.natural_height = self.natural_height.max(metrics.height());
    }
}

/// A laid-out paragraph ready to paint
struct ParaLayout {
    lines: Vec<Line>,
    align: Align,
    text_x: f32,
    avail_width: f32,
    space_before: f32,
    space_after: f32,
    line_height_factor: f32,
    fixed_line_height: Option<f32>,
    bullet: Option<Seg>,
    bullet_x: f32,
}

impl ParaLayout {
    fn line_height(&self, line: &Line) -> f32 {
        match self.fixed_line_height {
            Some(fixed) => fixed,
            None => line.natural_height * self.line_height_factor,
        }
    }

    fn height(&self) -> f32 {
        let lines: f32 = self.lines.iter().map(|l| self.line_height(l)).sum();
        self.space_before + lines + self.space_after
    }
}

/// Hard-coded final fallbacks for the resolution chain
fn hardcoded_run_defaults(ctx: &RenderContext, tc: &TextContext) -> RunProps {
    RunProps {
        size_pts: Some(text_const::DEFAULT_FONT_SIZE),
        bold: Some(false),
        italic: Some(false),
        underline: Some(false),
        strike: Some(false),
        color: tc
            .style_font_color
            .clone()
            .or_else(|| Some(ColorRef::scheme("tx1"))),
        typeface: Some(ctx.theme.fonts.minor_latin.clone()),
    }
}

/// Resolve the effective paragraph properties for one paragraph
fn effective_para_props(
    paragraph: &Paragraph,
    body: &TextBody,
    tc: &TextContext,
) -> ParaProps {
    let level = paragraph.props.level;
    let mut effective = paragraph.props.clone();
    if let Some(body_level) = body.list_style.level(level) {
        effective = effective.merge_over(body_level);
    }
    if let Some(inherited_level) = tc.inherited_list.level(level) {
        effective = effective.merge_over(inherited_level);
    }
    effective
}

/// Resolve one run's effective properties down the chain
fn effective_run_props(
    run: &RunProps,
    para: &ParaProps,
    ctx: &RenderContext,
    tc: &TextContext,
) -> RunProps {
    run.merge_over(&para.default_run)
        .merge_over(&hardcoded_run_defaults(ctx, tc))
}

fn resolve_seg(
    ctx: &RenderContext,
    props: &RunProps,
    text: String,
    font_scale: f64,
) -> Seg {
    let typeface = ctx
        .theme
        .fonts
        .resolve(props.typeface.as_deref().unwrap_or(""));
    let bold = props.bold.unwrap_or(false);
    let italic = props.italic.unwrap_or(false);
    let handle = ctx.fonts.resolve(&typeface, bold, italic);
    let size_pts = props.size_pts.unwrap_or(text_const::DEFAULT_FONT_SIZE) * font_scale as f32;
    let size_px = ctx.font_px(size_pts);
    let width = handle.measure(&text, size_px);
    let color = props
        .color
        .as_ref()
        .map(|c| ctx.resolve_color(c))
        .unwrap_or(Rgba::BLACK);
    Seg {
        text,
        width,
        size_px,
        color,
        underline: props.underline.unwrap_or(false),
        strike: props.strike.unwrap_or(false),
        handle,
    }
}

/// Substitute field runs with live values
fn field_text(ctx: &RenderContext, field_type: &str, cached: &str) -> String {
    match field_type {
        "slidenum" => ctx.slide_number.to_string(),
        _ => cached.to_string(),
    }
}

/// Split a run's text into word tokens, whitespace attached to the
/// preceding word so measurement includes the gap
fn word_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if ch == ' ' {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Paint a text body into the current shape-local pixel box
pub fn paint_text_body(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    body: &TextBody,
    tc: &TextContext,
    w_px: f32,
    h_px: f32,
) {
    if body.is_empty() {
        return;
    }

    // Body properties: the body's own values over the inherited ones
    let inherited = tc.inherited_body.clone().unwrap_or_default();
    let own = &body.body;
    let inset = |value: Option<i64>, inherited_value: Option<i64>, default: i64| {
        (value.or(inherited_value).unwrap_or(default) as f64 * ctx.scale) as f32
    };
    let left = inset(own.inset_left, inherited.inset_left, text_const::INSET_LEFT);
    let top = inset(own.inset_top, inherited.inset_top, text_const::INSET_TOP);
    let right = inset(own.inset_right, inherited.inset_right, text_const::INSET_RIGHT);
    let bottom = inset(own.inset_bottom, inherited.inset_bottom, text_const::INSET_BOTTOM);
    let anchor = own.anchor.or(inherited.anchor).unwrap_or_default();
    let wrap = own.wrap;

    let (font_scale, line_reduction) = match own.auto_fit {
        AutoFit::Normal {
            font_scale,
            line_reduction,
        } => (font_scale, line_reduction),
        _ => (1.0, 0.0),
    };

    let inner_x = left;
    let inner_w = (w_px - left - right).max(1.0);
    let inner_h = (h_px - top - bottom).max(1.0);

    // Layout pass
    let mut counter = BulletCounter::new();
    let mut layouts: Vec<ParaLayout> = Vec::new();
    for paragraph in &body.paragraphs {
        let para_props = effective_para_props(paragraph, body, tc);
        let layout = layout_paragraph(
            ctx,
            tc,
            paragraph,
            &para_props,
            &mut counter,
            inner_w,
            wrap,
            font_scale,
            line_reduction,
        );
        layouts.push(layout);
    }

    let total_height: f32 = layouts.iter().map(|p| p.height()).sum();
    let mut y = top
        + match anchor {
            Anchor::Top => 0.0,
            Anchor::Center => ((inner_h - total_height) / 2.0).max(0.0),
            Anchor::Bottom => (inner_h - total_height).max(0.0),
        };

    trace!(
        "text body {}x{} px, {} paragraphs, block height {total_height}",
        w_px,
        h_px,
        layouts.len()
    );

    // Paint pass
    for layout in &layouts {
        y += layout.space_before;
        for (line_index, line) in layout.lines.iter().enumerate() {
            let line_height = layout.line_height(line);
            let baseline = y + line.ascent + (line_height - line.natural_height).max(0.0) / 2.0;

            let is_last = line_index + 1 == layout.lines.len();
            let (start_x, gap_extra) = line_start(layout, line, is_last);

            // Bullet on the first line only
            if line_index == 0 {
                if let Some(bullet) = &layout.bullet {
                    paint_seg(canvas, bullet, inner_x + layout.bullet_x, baseline);
                }
            }

            let mut pen_x = inner_x + start_x;
            for seg in &line.segs {
                paint_seg(canvas, seg, pen_x, baseline);
                pen_x += seg.width + gap_extra;
            }
            y += line_height;
        }
        y += layout.space_after;
    }
}

/// Horizontal start offset and per-gap justification extra for a line
fn line_start(layout: &ParaLayout, line: &Line, is_last: bool) -> (f32, f32) {
    let free = (layout.avail_width - line.width).max(0.0);
    match layout.align {
        Align::Left => (layout.text_x, 0.0),
        Align::Center => (layout.text_x + free / 2.0, 0.0),
        Align::Right => (layout.text_x + free, 0.0),
        Align::Justify | Align::Distribute => {
            let stretch = layout.align == Align::Distribute || !is_last;
            if stretch && line.segs.len() > 1 {
                (layout.text_x, free / (line.segs.len() - 1) as f32)
            } else {
                (layout.text_x, 0.0)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn layout_paragraph(
    ctx: &RenderContext,
    tc: &TextContext,
    paragraph: &Paragraph,
    para_props: &ParaProps,
    counter: &mut BulletCounter,
    inner_w: f32,
    wrap: bool,
    font_scale: f64,
    line_reduction: f64,
) -> ParaLayout {
    let level = para_props.level;
    let margin_left_emu = para_props
        .margin_left
        .unwrap_or(level as i64 * LEVEL_INDENT_EMU);

    // Bullet resolution; plain text boxes get no default bullets
    let mut bullet_props = para_props.bullet.clone();
    if bullet_props.kind == BulletKind::Inherit && !tc.default_bullets {
        bullet_props.kind = BulletKind::None;
    }
    let has_bullet = bullet_props.kind != BulletKind::None && !paragraph.is_empty();
    let bullet_index = if matches!(bullet_props.kind, BulletKind::AutoNum { .. }) {
        counter.next_index(level)
    } else {
        0
    };

    let first_run_props = paragraph
        .items
        .iter()
        .find_map(|item| match item {
            ParaItem::Run(run) => Some(run.props.clone()),
            ParaItem::Field { run, .. } => Some(run.props.clone()),
            ParaItem::Break => None,
        })
        .unwrap_or_default();
    let first_effective = effective_run_props(&first_run_props, para_props, ctx, tc);

    let (bullet_seg, bullet_width) = if has_bullet {
        match format_bullet(&bullet_props, level, bullet_index) {
            Some(formatted) => {
                let mut props = first_effective.clone();
                if let Some(face) = &formatted.typeface {
                    props.typeface = Some(face.clone());
                }
                if let Some(color) = &formatted.color {
                    props.color = Some(color.clone());
                }
                if let Some(pts) = formatted.size_pts {
                    props.size_pts = Some(pts);
                } else if let Some(base) = props.size_pts {
                    props.size_pts = Some(base * formatted.size_factor as f32);
                }
                let seg = resolve_seg(ctx, &props, formatted.text, font_scale);
                let width = seg.width;
                (Some(seg), width)
            }
            None => (None, 0.0),
        }
    } else {
        (None, 0.0)
    };

    let margin_left_px = (margin_left_emu as f64 * ctx.scale) as f32;
    let indent_px = (para_props
        .indent
        .unwrap_or(if has_bullet { -LEVEL_INDENT_EMU } else { 0 }) as f64
        * ctx.scale) as f32;
    let gap_px = (BULLET_GAP_EMU as f64 * ctx.scale) as f32 / 2.0;

    let bullet_x = (margin_left_px + indent_px).max(0.0);
    let text_x = if has_bullet {
        margin_left_px.max(bullet_x + bullet_width + gap_px)
    } else {
        margin_left_px
    };
    let avail_width = (inner_w - text_x).max(1.0);

    // Wrap pass
    let mut lines: Vec<Line> = Vec::new();
    let mut current = Line::empty();
    let mut flush = |line: &mut Line, lines: &mut Vec<Line>| {
        lines.push(std::mem::replace(line, Line::empty()));
    };

    for item in &paragraph.items {
        let (text, props) = match item {
            ParaItem::Run(run) => (run.text.clone(), &run.props),
            ParaItem::Field { field_type, run } => {
                (field_text(ctx, field_type, &run.text), &run.props)
            }
            ParaItem::Break => {
                flush(&mut current, &mut lines);
                continue;
            }
        };
        let effective = effective_run_props(props, para_props, ctx, tc);
        for token in word_tokens(&text) {
            let seg = resolve_seg(ctx, &effective, token, font_scale);
            let trimmed = seg.text.trim_end().len();
            let visible_width = if trimmed == seg.text.len() {
                seg.width
            } else {
                seg.handle.measure(seg.text.trim_end(), seg.size_px)
            };
            if wrap && !current.segs.is_empty() && current.width + visible_width > avail_width {
                flush(&mut current, &mut lines);
            }
            current.absorb_metrics(&seg.handle, seg.size_px);
            current.width += seg.width;
            current.segs.push(seg);
        }
    }
    if !current.segs.is_empty() || lines.is_empty() {
        // Empty paragraphs still occupy one line of their default size
        if current.segs.is_empty() {
            let probe = resolve_seg(ctx, &first_effective, String::new(), font_scale);
            current.absorb_metrics(&probe.handle, probe.size_px);
        }
        flush(&mut current, &mut lines);
    }

    // Trailing spaces do not count toward alignment width
    for line in &mut lines {
        if let Some(last) = line.segs.last() {
            let trimmed = last.text.trim_end();
            if trimmed.len() != last.text.len() {
                line.width += last.handle.measure(trimmed, last.size_px) - last.width;
            }
        }
    }

    let spacing_px = |spacing: &Option<Spacing>| -> f32 {
        match spacing {
            Some(Spacing::Points(pts)) => ctx.font_px(*pts),
            Some(Spacing::Percent(pct)) => {
                let reference = lines
                    .first()
                    .map(|l| l.natural_height)
                    .unwrap_or_default();
                reference * *pct as f32
            }
            None => 0.0,
        }
    };

    let (line_height_factor, fixed_line_height) = match para_props.line_spacing {
        Some(Spacing::Percent(pct)) => (((pct) * (1.0 - line_reduction)) as f32, None),
        Some(Spacing::Points(pts)) => (1.0, Some(ctx.font_px(pts))),
        None => (
            (text_const::DEFAULT_LINE_SPACING as f64 * (1.0 - line_reduction)) as f32,
            None,
        ),
    };

    ParaLayout {
        space_before: spacing_px(&para_props.space_before),
        space_after: spacing_px(&para_props.space_after),
        align: para_props.align.unwrap_or_default(),
        text_x,
        avail_width,
        line_height_factor,
        fixed_line_height,
        bullet: bullet_seg,
        bullet_x,
        lines,
    }
}

/// Paint one segment at a pen position on a baseline
fn paint_seg(canvas: &mut Canvas, seg: &Seg, x: f32, baseline: f32) {
    if seg.color.a == 0 {
        return;
    }
    let paint = solid_paint(seg.color);
    if seg.handle.is_loaded() {
        let mut pen_x = x;
        for ch in seg.text.chars() {
            let (glyph, advance) = seg.handle.glyph_path(ch, seg.size_px);
            if let Some(glyph_path) = glyph {
                if let Some(skia_path) = glyph_path.to_skia() {
                    canvas.save();
                    canvas.concat(tiny_skia::Transform::from_translate(pen_x, baseline));
                    canvas.fill_path(&skia_path, &paint, false);
                    canvas.restore();
                }
            }
            pen_x += advance;
        }
    }

    let thickness = (seg.size_px * 0.05).max(0.75);
    if seg.underline {
        fill_rect(
            canvas,
            x,
            baseline + seg.size_px * 0.08,
            seg.width,
            thickness,
            &paint,
        );
    }
    if seg.strike {
        fill_rect(
            canvas,
            x,
            baseline - seg.size_px * 0.28,
            seg.width,
            thickness,
            &paint,
        );
    }
}

fn fill_rect(canvas: &mut Canvas, x: f32, y: f32, w: f32, h: f32, paint: &tiny_skia::Paint) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    if let Some(rect) = tiny_skia::Rect::from_xywh(x, y, w, h) {
        let mut pb = tiny_skia::PathBuilder::new();
        pb.push_rect(rect);
        if let Some(path) = pb.finish() {
            canvas.fill_path(&path, paint, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokens_keep_trailing_space() {
        assert_eq!(word_tokens("one two"), vec!["one ", "two"]);
        assert_eq!(word_tokens("single"), vec!["single"]);
        assert_eq!(word_tokens("a  b"), vec!["a ", " ", "b"]);
        assert!(word_tokens("").is_empty());
    }

    #[test]
    fn test_merge_chain_first_defined() {
        let run = RunProps {
            size_pts: Some(24.0),
            ..RunProps::default()
        };
        let para_default = RunProps {
            size_pts: Some(18.0),
            bold: Some(true),
            ..RunProps::default()
        };
        let level_default = RunProps {
            size_pts: Some(12.0),
            italic: Some(true),
            ..RunProps::default()
        };
        let merged = run.merge_over(&para_default).merge_over(&level_default);
        assert_eq!(merged.size_pts, Some(24.0));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.italic, Some(true));
    }
}
