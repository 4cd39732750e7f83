//! Slide rendering
//!
//! Resolves the slide's layout/master/theme chain, sizes the canvas
//! from the presentation's slide extent, paints the background, then
//! drives the shape dispatcher over the slide's shape tree.

use std::sync::Arc;

use log::debug;

use crate::elements::color::SchemeColors;
use crate::elements::transform::{ChildSpace, Transform};
use crate::exc::{PptxError, Result};
use crate::opc::{Package, RelationshipType};
use crate::oxml::shapes::parse_shape_tree;
use crate::oxml::theme::{ClrMap, Theme};
use crate::oxml::XmlElement;
use crate::render::canvas::Canvas;
use crate::render::fill::{paint_fill, Fill};
use crate::render::graphic_frame::GraphicFrameRenderer;
use crate::render::placeholder::{HfFlags, PlaceholderResolver};
use crate::render::shape::render_shape_tree;
use crate::render::{
    FontLibrary, MediaCache, OutputFormat, RenderContext, RenderOptions,
};

/// The resolved part chain of one slide
struct SlideChain {
    slide: Arc<XmlElement>,
    layout: Option<(String, Arc<XmlElement>)>,
    master: Option<(String, Arc<XmlElement>)>,
    theme: Theme,
}

fn resolve_chain(package: &Package, slide_part: &str) -> Result<SlideChain> {
    let slide = package.xml(slide_part)?;

    let layout = package
        .relationships(slide_part)?
        .first_of_type(RelationshipType::SlideLayout)
        .map(|rel| package.resolve_target(slide_part, &rel.target))
        .and_then(|part| package.xml(&part).ok().map(|xml| (part, xml)));

    let master = layout.as_ref().and_then(|(layout_part, _)| {
        package
            .relationships(layout_part)
            .ok()?
            .first_of_type(RelationshipType::SlideMaster)
            .map(|rel| package.resolve_target(layout_part, &rel.target))
            .and_then(|part| package.xml(&part).ok().map(|xml| (part, xml)))
    });

    let theme = master
        .as_ref()
        .and_then(|(master_part, _)| {
            package
                .relationships(master_part)
                .ok()?
                .first_of_type(RelationshipType::Theme)
                .map(|rel| package.resolve_target(master_part, &rel.target))
                .and_then(|part| package.xml(&part).ok())
        })
        .map(|xml| Theme::from_xml(&xml))
        .unwrap_or_else(|| {
            debug!("no theme part resolved for {slide_part}, using Office defaults");
            Theme::default()
        });

    Ok(SlideChain {
        slide,
        layout,
        master,
        theme,
    })
}

/// Effective scheme colors: master `clrMap`, then slide `clrMapOvr`
fn effective_colors(chain: &SlideChain) -> SchemeColors {
    let mut colors = chain.theme.colors.clone();
    if let Some((_, master)) = &chain.master {
        if let Some(map_el) = master.find_descendant("clrMap") {
            let map = ClrMap::from_element(map_el);
            if !map.is_empty() {
                colors = map.apply(&colors);
            }
        }
    }
    if let Some(ovr) = chain.slide.child("clrMapOvr") {
        if let Some(map_el) = ovr.child("overrideClrMapping") {
            let map = ClrMap::from_element(map_el);
            if !map.is_empty() {
                colors = map.apply(&colors);
            }
        }
    }
    colors
}

/// Find the background element walking slide -> layout -> master;
/// returns the element and the part whose rels resolve its images.
fn find_background<'a>(chain: &'a SlideChain, slide_part: &'a str) -> Option<(&'a XmlElement, &'a str)> {
    fn bg_of(root: &XmlElement) -> Option<&XmlElement> {
        root.child("cSld").and_then(|c| c.child("bg"))
    }
    if let Some(bg) = bg_of(&chain.slide) {
        return Some((bg, slide_part));
    }
    if let Some((part, layout)) = &chain.layout {
        if let Some(bg) = bg_of(layout) {
            return Some((bg, part.as_str()));
        }
    }
    if let Some((part, master)) = &chain.master {
        if let Some(bg) = bg_of(master) {
            return Some((bg, part.as_str()));
        }
    }
    None
}

fn paint_background(
    canvas: &mut Canvas,
    ctx: &RenderContext,
    chain: &SlideChain,
    slide_part: &str,
    slide_w: i64,
    slide_h: i64,
) {
    let Some((bg, bg_part)) = find_background(chain, slide_part) else {
        return;
    };
    let bg_ctx = ctx.with_rels_part(bg_part);

    let (fill, ph_clr) = if let Some(bg_pr) = bg.child("bgPr") {
        (Fill::from_parent(bg_pr).unwrap_or_default(), None)
    } else if let Some(bg_ref) = bg.child("bgRef") {
        let idx = bg_ref.attr_i64("idx").unwrap_or(0) as u32;
        let ph = crate::elements::color::ColorRef::from_parent(bg_ref)
            .map(|c| bg_ctx.resolve_color(&c));
        match ctx.theme.fill_style(idx) {
            Some(style_el) => (Fill::from_element(style_el), ph),
            None => (Fill::None, None),
        }
    } else {
        (Fill::None, None)
    };
    if fill.is_none() {
        return;
    }

    let full = Transform {
        x: 0,
        y: 0,
        w: slide_w,
        h: slide_h,
        ..Transform::IDENTITY
    };
    let mut path = crate::elements::path::Path::new();
    path.move_to(0.0, 0.0);
    path.line_to(slide_w as f64, 0.0);
    path.line_to(slide_w as f64, slide_h as f64);
    path.line_to(0.0, slide_h as f64);
    path.close();

    canvas.save();
    canvas.concat(full.to_device(ctx.scale));
    if let Some(skia) = path.to_skia() {
        paint_fill(
            canvas,
            &bg_ctx,
            &fill,
            &skia,
            false,
            slide_w as f64,
            slide_h as f64,
            ph_clr,
        );
    }
    canvas.restore();
}

/// Render one slide part to an encoded image.
///
/// Returns the encoded bytes plus the pixel dimensions. All paint
/// operations happen in document order; a failing shape degrades to a
/// placeholder inside the dispatcher rather than failing the slide.
#[allow(clippy::too_many_arguments)]
pub fn render_slide(
    package: &Package,
    slide_part: &str,
    slide_number: usize,
    slide_size: (i64, i64),
    options: &RenderOptions,
    fonts: &FontLibrary,
    media: &MediaCache,
    graphic_frames: &dyn GraphicFrameRenderer,
) -> Result<(Vec<u8>, u32, u32)> {
    if options.width == 0 {
        return Err(PptxError::InvalidValue("render width must be positive".into()));
    }
    let (slide_w, slide_h) = slide_size;
    if slide_w <= 0 || slide_h <= 0 {
        return Err(PptxError::InvalidValue(format!(
            "invalid slide size {slide_w}x{slide_h}"
        )));
    }

    let chain = resolve_chain(package, slide_part)?;

    let scale = options.width as f64 / slide_w as f64;
    let height = ((slide_h as f64 * scale).round() as u32).max(1);
    let mut canvas = Canvas::new(options.width, height)?;

    let colors = effective_colors(&chain);
    let hf = HfFlags::from_parts(
        chain.layout.as_ref().map(|(_, xml)| xml.as_ref()),
        chain.master.as_ref().map(|(_, xml)| xml.as_ref()),
    );
    let ctx = RenderContext {
        package,
        theme: &chain.theme,
        colors,
        fonts,
        media,
        graphic_frames,
        scale,
        dpi: options.dpi,
        slide_number,
        rels_part: slide_part.to_string(),
        hf,
    };

    paint_background(&mut canvas, &ctx, &chain, slide_part, slide_w, slide_h);

    let sp_tree = chain
        .slide
        .child("cSld")
        .and_then(|c| c.child("spTree"))
        .ok_or_else(|| PptxError::XmlParse {
            part: slide_part.to_string(),
            message: "slide has no spTree".to_string(),
        })?;
    let shapes = parse_shape_tree(sp_tree);

    let parse_layer = |root: Option<&(String, Arc<XmlElement>)>| {
        root.and_then(|(_, xml)| xml.child("cSld").and_then(|c| c.child("spTree")))
            .map(parse_shape_tree)
            .unwrap_or_default()
    };
    let resolver = PlaceholderResolver::new(
        parse_layer(chain.layout.as_ref()),
        parse_layer(chain.master.as_ref()),
        chain.master.as_ref().map(|(_, xml)| xml.as_ref()),
    );

    render_shape_tree(
        &mut canvas,
        &ctx,
        &resolver,
        &shapes,
        &Transform::IDENTITY,
        &ChildSpace::IDENTITY,
    );
    debug_assert_eq!(canvas.saved_depth(), 0, "unbalanced canvas save/restore");

    let bytes = match options.format {
        OutputFormat::Png => canvas.encode_png()?,
        OutputFormat::Jpeg => canvas.encode_jpeg(options.jpeg_quality)?,
    };
    Ok((bytes, canvas.width(), canvas.height()))
}
