//! Raster canvas
//!
//! Wraps a tiny-skia pixmap with a strictly LIFO transform stack.
//! Every save must be paired with a restore; shape dispatch brackets
//! each shape with exactly one pair.

use tiny_skia::{
    FillRule, Paint, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::exc::{PptxError, Result};

pub struct Canvas {
    pixmap: Pixmap,
    current: Transform,
    stack: Vec<Transform>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            PptxError::InvalidValue(format!("cannot allocate {width}x{height} canvas"))
        })?;
        Ok(Canvas {
            pixmap,
            current: Transform::identity(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Push the current transform
    pub fn save(&mut self) {
        self.stack.push(self.current);
    }

    /// Pop back to the previously saved transform
    pub fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.current = previous;
        }
    }

    /// Concatenate a transform onto the current state
    pub fn concat(&mut self, transform: Transform) {
        self.current = self.current.pre_concat(transform);
    }

    pub fn transform(&self) -> Transform {
        self.current
    }

    /// Depth of unmatched saves; zero once a slide finishes
    pub fn saved_depth(&self) -> usize {
        self.stack.len()
    }

    /// Fill the whole canvas with a color
    pub fn clear(&mut self, color: tiny_skia::Color) {
        self.pixmap.fill(color);
    }

    /// Fill a path expressed in the current local space
    pub fn fill_path(&mut self, path: &tiny_skia::Path, paint: &Paint, even_odd: bool) {
        let rule = if even_odd {
            FillRule::EvenOdd
        } else {
            FillRule::Winding
        };
        self.pixmap
            .fill_path(path, paint, rule, self.current, None);
    }

    /// Stroke a path expressed in the current local space; the stroke
    /// width is in local units and scales with the transform
    pub fn stroke_path(&mut self, path: &tiny_skia::Path, paint: &Paint, stroke: &Stroke) {
        self.pixmap
            .stroke_path(path, paint, stroke, self.current, None);
    }

    /// Draw a pixmap; `placement` maps image pixel space into the
    /// current local space
    pub fn draw_pixmap(&mut self, source: &Pixmap, placement: Transform) {
        let paint = PixmapPaint::default();
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            self.current.pre_concat(placement),
            None,
        );
    }

    /// Approximate scale factor of the current transform, for
    /// minimum-stroke-width decisions
    pub fn current_scale(&self) -> f32 {
        let t = self.current;
        ((t.sx * t.sx + t.ky * t.ky).sqrt() + (t.sy * t.sy + t.kx * t.kx).sqrt()) / 2.0
    }

    /// Encode as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| PptxError::InvalidValue(format!("PNG encode failed: {e}")))
    }

    /// Encode as JPEG, compositing over white since JPEG has no alpha
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let width = self.width();
        let height = self.height();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in self.pixmap.pixels() {
            // Premultiplied channels composite over white as c + (255 - a)
            let alpha_rest = 255 - pixel.alpha();
            rgb.push(pixel.red().saturating_add(alpha_rest));
            rgb.push(pixel.green().saturating_add(alpha_rest));
            rgb.push(pixel.blue().saturating_add(alpha_rest));
        }
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode(&rgb, width, height, image::ColorType::Rgb8)
            .map_err(|e| PptxError::InvalidValue(format!("JPEG encode failed: {e}")))?;
        Ok(out)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Build an opaque solid paint
pub fn solid_paint(color: crate::elements::Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Rgba;

    #[test]
    fn test_save_restore_is_lifo() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        let identity = canvas.transform();
        canvas.save();
        canvas.concat(Transform::from_translate(5.0, 5.0));
        assert_ne!(canvas.transform(), identity);
        canvas.restore();
        assert_eq!(canvas.transform(), identity);
        assert_eq!(canvas.saved_depth(), 0);
    }

    #[test]
    fn test_fill_writes_pixels() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        let mut pb = tiny_skia::PathBuilder::new();
        pb.push_rect(tiny_skia::Rect::from_xywh(0.0, 0.0, 4.0, 4.0).unwrap());
        let path = pb.finish().unwrap();
        canvas.fill_path(&path, &solid_paint(Rgba::opaque(255, 0, 0)), false);
        let pixel = canvas.pixmap().pixel(1, 1).unwrap();
        assert_eq!(pixel.red(), 255);
        assert_eq!(pixel.alpha(), 255);
    }

    #[test]
    fn test_zero_size_canvas_is_an_error() {
        assert!(Canvas::new(0, 10).is_err());
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let canvas = Canvas::new(7, 3).unwrap();
        let png = canvas.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 7);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn test_jpeg_encodes_rgb() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.clear(tiny_skia::Color::from_rgba8(0, 0, 255, 255));
        let jpeg = canvas.encode_jpeg(90).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 8);
    }
}
