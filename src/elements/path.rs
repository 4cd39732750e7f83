//! Device-independent path representation
//!
//! Path coordinates are in EMU, local to the shape's bounding box.
//! Arcs are flattened to cubic segments when the path is built, so the
//! painter only ever sees move/line/quad/cubic/close.

/// A point in shape-local EMU
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

impl Pt {
    pub fn new(x: f64, y: f64) -> Self {
        Pt { x, y }
    }
}

/// One path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Pt),
    LineTo(Pt),
    QuadTo(Pt, Pt),
    CubicTo(Pt, Pt, Pt),
    Close,
}

/// A sequence of sub-paths in shape-local EMU
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub commands: Vec<PathCmd>,
    /// Whether the fill renderer should paint this path
    pub filled: bool,
    /// Whether the stroke renderer should paint this path
    pub stroked: bool,
    /// Fill with the even-odd rule (ring shapes)
    pub even_odd: bool,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Path {
            commands: Vec::new(),
            filled: true,
            stroked: true,
            even_odd: false,
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCmd::MoveTo(Pt::new(x, y)));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCmd::LineTo(Pt::new(x, y)));
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.commands
            .push(PathCmd::QuadTo(Pt::new(cx, cy), Pt::new(x, y)));
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.commands.push(PathCmd::CubicTo(
            Pt::new(c1x, c1y),
            Pt::new(c2x, c2y),
            Pt::new(x, y),
        ));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCmd::Close);
    }

    /// Current end point, if any commands have been emitted
    pub fn current_point(&self) -> Option<Pt> {
        for cmd in self.commands.iter().rev() {
            match cmd {
                PathCmd::MoveTo(p) | PathCmd::LineTo(p) => return Some(*p),
                PathCmd::QuadTo(_, p) | PathCmd::CubicTo(_, _, p) => return Some(*p),
                PathCmd::Close => continue,
            }
        }
        None
    }

    /// Append an elliptical arc from the current point, flattened into
    /// cubic segments of at most 90 degrees. Angles are in degrees;
    /// positive sweep is clockwise in the y-down coordinate system.
    pub fn arc_to(&mut self, rx: f64, ry: f64, start_deg: f64, sweep_deg: f64) {
        let start = start_deg.to_radians();
        // The current point sits on the ellipse at the start angle.
        let current = self.current_point().unwrap_or_default();
        let cx = current.x - rx * start.cos();
        let cy = current.y - ry * start.sin();

        let segments = (sweep_deg.abs() / 90.0).ceil().max(1.0) as usize;
        let step = sweep_deg.to_radians() / segments as f64;
        // Cubic approximation constant for a step-sized arc
        let k = 4.0 / 3.0 * (step / 4.0).tan();

        let mut angle = start;
        for _ in 0..segments {
            let next = angle + step;
            let (sin0, cos0) = angle.sin_cos();
            let (sin1, cos1) = next.sin_cos();
            let c1 = Pt::new(
                cx + rx * (cos0 - k * sin0),
                cy + ry * (sin0 + k * cos0),
            );
            let c2 = Pt::new(
                cx + rx * (cos1 + k * sin1),
                cy + ry * (sin1 - k * cos1),
            );
            let end = Pt::new(cx + rx * cos1, cy + ry * sin1);
            self.commands.push(PathCmd::CubicTo(c1, c2, end));
            angle = next;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Convert to a tiny-skia path (still in EMU coordinates; the
    /// canvas transform maps to device pixels).
    pub fn to_skia(&self) -> Option<tiny_skia::Path> {
        let mut builder = tiny_skia::PathBuilder::new();
        for cmd in &self.commands {
            match *cmd {
                PathCmd::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
                PathCmd::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
                PathCmd::QuadTo(c, p) => {
                    builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
                }
                PathCmd::CubicTo(c1, c2, p) => builder.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                PathCmd::Close => builder.close(),
            }
        }
        builder.finish()
    }
}
