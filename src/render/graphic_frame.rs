//! Graphic frame delegation
//!
//! Tables, charts, and diagrams are external collaborators behind
//! this seam. The default implementation paints a neutral placeholder
//! rectangle so decks keep their layout silhouette.

use log::debug;

use crate::elements::color::Rgba;
use crate::exc::Result;
use crate::oxml::shapes::GraphicKind;
use crate::render::canvas::{Canvas, solid_paint};
use crate::render::RenderContext;

/// Sub-renderer contract for `graphicFrame` content. Implementations
/// paint into the frame's local EMU box (the canvas transform is
/// already applied) and must return rather than abort the slide.
pub trait GraphicFrameRenderer: Sync {
    fn render(
        &self,
        canvas: &mut Canvas,
        ctx: &RenderContext,
        kind: &GraphicKind,
        w: f64,
        h: f64,
    ) -> Result<()>;
}

/// Default collaborator: a bordered placeholder rectangle
pub struct PlaceholderFrames;

impl GraphicFrameRenderer for PlaceholderFrames {
    fn render(
        &self,
        canvas: &mut Canvas,
        _ctx: &RenderContext,
        kind: &GraphicKind,
        w: f64,
        h: f64,
    ) -> Result<()> {
        match kind {
            GraphicKind::Table(_) => debug!("table frame painted as placeholder"),
            GraphicKind::Chart { rel_id } => {
                debug!("chart frame {rel_id} painted as placeholder")
            }
            GraphicKind::Other { uri } => debug!("graphic frame {uri} painted as placeholder"),
        }
        paint_placeholder_rect(canvas, w, h);
        Ok(())
    }
}

/// The shared degraded-shape visual: light gray with a hairline border
pub fn paint_placeholder_rect(canvas: &mut Canvas, w: f64, h: f64) {
    let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, w as f32, h as f32) else {
        return;
    };
    let mut pb = tiny_skia::PathBuilder::new();
    pb.push_rect(rect);
    let Some(path) = pb.finish() else { return };
    canvas.fill_path(&path, &solid_paint(Rgba::new(224, 224, 224, 160)), false);
    let device_scale = canvas.current_scale().max(f32::EPSILON);
    let stroke = tiny_skia::Stroke {
        width: 1.0 / device_scale,
        ..tiny_skia::Stroke::default()
    };
    canvas.stroke_path(&path, &solid_paint(Rgba::opaque(160, 160, 160)), &stroke);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_rect_paints_pixels() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        paint_placeholder_rect(&mut canvas, 10.0, 10.0);
        let pixel = canvas.pixmap().pixel(5, 5).unwrap();
        assert!(pixel.alpha() > 0);
    }
}
