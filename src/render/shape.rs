//! Shape dispatch
//!
//! Walks the shape tree in document order. Each shape is bracketed by
//! exactly one canvas save/restore pair; within a shape, fill paints
//! before stroke, stroke before text.

use log::{debug, warn};

use crate::elements::geometry::{custom_paths, preset_path, AdjustValues};
use crate::elements::path::Path;
use crate::elements::transform::{ChildSpace, Transform};
use crate::oxml::shapes::{
    ContentChoice, GeometryKind, Placeholder, ShapeNode, SpProps, StyleRefs,
};
use crate::oxml::text::TextBody;
use crate::render::canvas::Canvas;
use crate::render::fill::{effective_fill, paint_fill, Fill};
use crate::render::graphic_frame::paint_placeholder_rect;
use crate::render::placeholder::PlaceholderResolver;
use crate::render::stroke::{effective_outline, paint_stroke};
use crate::render::text::{paint_text_body, TextContext};
use crate::render::RenderContext;

/// Markup-compatibility namespaces this renderer understands; a
/// `Choice` requiring anything else falls through to `Fallback`.
const SUPPORTED_MC_NAMESPACES: [&str; 1] = ["a"];

/// Render a shape tree in document order
pub fn render_shape_tree(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    resolver: &PlaceholderResolver,
    nodes: &[ShapeNode],
    parent: &Transform,
    space: &ChildSpace,
) {
    for node in nodes {
        render_node(canvas, ctx, resolver, node, parent, space);
    }
}

fn render_node(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    resolver: &PlaceholderResolver,
    node: &ShapeNode,
    parent: &Transform,
    space: &ChildSpace,
) {
    match node {
        ShapeNode::Sp {
            nv,
            placeholder,
            props,
            style,
            text,
            use_bg_fill,
        } => {
            if let Err(err) = render_sp(
                canvas,
                ctx,
                resolver,
                placeholder.as_ref(),
                props,
                style,
                text.as_ref(),
                *use_bg_fill,
                parent,
                space,
            ) {
                warn!("shape {} ({}) degraded: {err}", nv.id, nv.name);
                degrade_shape(canvas, ctx, props, parent, space);
            }
        }
        ShapeNode::Cxn { nv, props, style } => {
            if let Err(err) = render_sp(
                canvas, ctx, resolver, None, props, style, None, false, parent, space,
            ) {
                warn!("connector {} ({}) degraded: {err}", nv.id, nv.name);
            }
        }
        ShapeNode::Pic {
            nv,
            props,
            blip_fill,
        } => {
            if let Err(err) =
                render_pic(canvas, ctx, props, blip_fill.as_ref(), parent, space)
            {
                warn!("picture {} ({}) degraded: {err}", nv.id, nv.name);
                degrade_shape(canvas, ctx, props, parent, space);
            }
        }
        ShapeNode::GrpSp { xfrm, children, .. } => {
            // Map the group into its parent first; the child space then
            // carries child coordinates into the mapped group extent.
            let (mapped, child_space) = match xfrm {
                Some(el) => {
                    let t = space.map(&Transform::from_xfrm(el));
                    (t, ChildSpace::from_xfrm(el, &t))
                }
                None => (Transform::IDENTITY, ChildSpace::IDENTITY),
            };
            let combined = Transform::combine(parent, &mapped);
            render_shape_tree(canvas, ctx, resolver, children, &combined, &child_space);
        }
        ShapeNode::GraphicFrame {
            nv,
            transform,
            kind,
        } => {
            let t = space.map(&transform.unwrap_or_default());
            let combined = Transform::combine(parent, &t);
            if combined.w == 0 || combined.h == 0 {
                return;
            }
            canvas.save();
            canvas.concat(combined.to_device(ctx.scale));
            let result =
                ctx.graphic_frames
                    .render(canvas, ctx, kind, combined.w as f64, combined.h as f64);
            if let Err(err) = result {
                warn!("graphic frame {} degraded: {err}", nv.id);
                paint_placeholder_rect(canvas, combined.w as f64, combined.h as f64);
            }
            canvas.restore();
        }
        ShapeNode::AlternateContent { choices, fallback } => {
            let shapes = choose_alternate(choices, fallback);
            render_shape_tree(canvas, ctx, resolver, shapes, parent, space);
        }
    }
}

/// Pick the first `Choice` whose requirements are all supported,
/// otherwise the `Fallback` branch.
fn choose_alternate<'a>(
    choices: &'a [ContentChoice],
    fallback: &'a [ShapeNode],
) -> &'a [ShapeNode] {
    for choice in choices {
        if choice
            .requires
            .iter()
            .all(|ns| SUPPORTED_MC_NAMESPACES.contains(&ns.as_str()))
        {
            return &choice.shapes;
        }
    }
    fallback
}

/// Expand the effective geometry into paths in the local EMU box
fn geometry_paths(geometry: &GeometryKind, w: f64, h: f64) -> Vec<Path> {
    match geometry {
        GeometryKind::Preset { name, adjust } => vec![preset_path(name, w, h, adjust)],
        GeometryKind::Custom(el) => custom_paths(el, w, h, &AdjustValues::new()),
        GeometryKind::Unspecified => vec![preset_path("rect", w, h, &AdjustValues::new())],
    }
}

#[allow(clippy::too_many_arguments)]
fn render_sp(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    resolver: &PlaceholderResolver,
    placeholder: Option<&Placeholder>,
    props: &SpProps,
    style: &StyleRefs,
    text: Option<&TextBody>,
    use_bg_fill: bool,
    parent: &Transform,
    space: &ChildSpace,
) -> crate::exc::Result<()> {
    // Placeholder inheritance
    let mut effective_props = props.clone();
    let mut effective_style = style.clone();
    let mut text_context = TextContext::default();
    if let Some(ph) = placeholder {
        if !ctx.hf.allows(ph.ph_type.as_deref()) {
            return Ok(());
        }
        let resolved = resolver.resolve(ph);
        effective_props = effective_props.merge_over(&resolved.props);
        effective_style = StyleRefs {
            fill: effective_style.fill.or(resolved.style.fill),
            line: effective_style.line.or(resolved.style.line),
            font_color: effective_style.font_color.or(resolved.style.font_color),
        };
        text_context.inherited_list = resolved.list_style;
        text_context.inherited_body = resolved.body;
        text_context.default_bullets = matches!(
            ph.ph_type.as_deref(),
            Some("body") | Some("subTitle") | None
        );

        // Empty placeholders paint nothing
        let has_content = text.map(|t| !t.is_empty()).unwrap_or(false);
        let has_own_visuals = props.fill.is_some()
            || !matches!(props.geometry, GeometryKind::Unspecified);
        if !has_content && !has_own_visuals {
            debug!("empty placeholder skipped");
            return Ok(());
        }
    }
    text_context.style_font_color = effective_style.font_color.clone();

    let local = space.map(&effective_props.transform.unwrap_or_default());
    let combined = Transform::combine(parent, &local);
    if combined.w == 0 || combined.h == 0 {
        return Ok(());
    }
    let (w, h) = (combined.w as f64, combined.h as f64);

    let paths = geometry_paths(&effective_props.geometry, w, h);

    // Fill, then stroke, then text
    canvas.save();
    canvas.concat(combined.to_device(ctx.scale));

    let (fill, fill_ph) = if use_bg_fill {
        // The slide background already painted below this shape shows
        // through; treated as no local fill.
        (Fill::None, None)
    } else {
        effective_fill(effective_props.fill.as_ref(), effective_style.fill.as_ref(), ctx)
    };
    for path in &paths {
        if !path.filled || fill.is_none() {
            continue;
        }
        if let Some(skia) = path.to_skia() {
            paint_fill(canvas, ctx, &fill, &skia, path.even_odd, w, h, fill_ph);
        }
    }

    let (outline, line_ph) = effective_outline(
        effective_props.outline.as_ref(),
        effective_style.line.as_ref(),
        ctx,
    );
    if let Some(outline) = &outline {
        for path in &paths {
            if !path.stroked {
                continue;
            }
            if let Some(skia) = path.to_skia() {
                paint_stroke(canvas, ctx, outline, &skia, line_ph);
            }
        }
    }
    canvas.restore();

    if let Some(body) = text {
        if !body.is_empty() {
            let (w_px, h_px) = combined.px_size(ctx.scale);
            canvas.save();
            canvas.concat(combined.to_device_px(ctx.scale));
            paint_text_body(canvas, ctx, body, &text_context, w_px, h_px);
            canvas.restore();
        }
    }
    Ok(())
}

fn render_pic(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    props: &SpProps,
    blip_fill: Option<&crate::oxml::XmlElement>,
    parent: &Transform,
    space: &ChildSpace,
) -> crate::exc::Result<()> {
    let local = space.map(&props.transform.unwrap_or_default());
    let combined = Transform::combine(parent, &local);
    if combined.w == 0 || combined.h == 0 {
        return Ok(());
    }
    let (w, h) = (combined.w as f64, combined.h as f64);

    canvas.save();
    canvas.concat(combined.to_device(ctx.scale));

    let geometry = match &props.geometry {
        GeometryKind::Unspecified => GeometryKind::Preset {
            name: "rect".to_string(),
            adjust: AdjustValues::new(),
        },
        other => other.clone(),
    };
    let paths = geometry_paths(&geometry, w, h);

    let fill = blip_fill
        .map(crate::render::fill::Fill::from_element)
        .unwrap_or_default();
    let mut painted = false;
    for path in &paths {
        if let Some(skia) = path.to_skia() {
            if !fill.is_none() {
                paint_fill(canvas, ctx, &fill, &skia, path.even_odd, w, h, None);
                painted = true;
            }
        }
    }
    if !painted {
        paint_placeholder_rect(canvas, w, h);
    }

    let (outline, line_ph) = effective_outline(props.outline.as_ref(), None, ctx);
    if let Some(outline) = &outline {
        for path in &paths {
            if let Some(skia) = path.to_skia() {
                paint_stroke(canvas, ctx, outline, &skia, line_ph);
            }
        }
    }
    canvas.restore();
    Ok(())
}

/// Best-effort placeholder for a failed shape
fn degrade_shape(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    props: &SpProps,
    parent: &Transform,
    space: &ChildSpace,
) {
    let local = space.map(&props.transform.unwrap_or_default());
    let combined = Transform::combine(parent, &local);
    if combined.w == 0 || combined.h == 0 {
        return;
    }
    canvas.save();
    canvas.concat(combined.to_device(ctx.scale));
    paint_placeholder_rect(canvas, combined.w as f64, combined.h as f64);
    canvas.restore();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(requires: &[&str]) -> ContentChoice {
        ContentChoice {
            requires: requires.iter().map(|s| s.to_string()).collect(),
            shapes: Vec::new(),
        }
    }

    #[test]
    fn test_alternate_content_picks_fallback_for_unknown_ns() {
        let choices = vec![choice(&["p14"]), choice(&["wps"])];
        let fallback = Vec::new();
        let chosen = choose_alternate(&choices, &fallback);
        assert_eq!(chosen.len(), 0);
        assert_eq!(chosen.as_ptr(), fallback.as_ptr());
    }

    #[test]
    fn test_alternate_content_accepts_supported_choice() {
        let choices = vec![choice(&["p14"]), choice(&["a"])];
        let fallback = Vec::new();
        let chosen = choose_alternate(&choices, &fallback);
        assert_eq!(chosen.as_ptr(), choices[1].shapes.as_ptr());
    }

    #[test]
    fn test_geometry_paths_default_to_rect() {
        let paths = geometry_paths(&GeometryKind::Unspecified, 100.0, 50.0);
        assert_eq!(paths.len(), 1);
        assert!(paths[0].filled);
    }
}
