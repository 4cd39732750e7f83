//! Shape geometry expansion
//!
//! Preset shape kinds expand to a `Path` in the shape's local EMU box,
//! honoring adjustment values from `avLst`. Custom geometry parses its
//! `pathLst` directly, with `gdLst` guide formulas evaluated in order.

use std::collections::HashMap;

use log::debug;

use crate::elements::path::Path;
use crate::oxml::XmlElement;

/// Angle constants used by guide formulas, in 60000ths of a degree
const DEG_60000: f64 = 60_000.0;

/// Adjustment values keyed by guide name (`adj`, `adj1`, ...)
pub type AdjustValues = HashMap<String, f64>;

/// Parse `a:avLst` into adjustment values
pub fn parse_adjust_values(av_lst: Option<&XmlElement>) -> AdjustValues {
    let mut values = AdjustValues::new();
    if let Some(list) = av_lst {
        for gd in list.children_named("gd") {
            if let (Some(name), Some(fmla)) = (gd.attr("name"), gd.attr("fmla")) {
                if let Some(value) = fmla.strip_prefix("val ") {
                    if let Ok(v) = value.trim().parse::<f64>() {
                        values.insert(name.to_string(), v);
                    }
                }
            }
        }
    }
    values
}

/// Expand a preset geometry into a path in the local EMU box.
/// Unknown presets fall back to a plain rectangle.
pub fn preset_path(preset: &str, w: f64, h: f64, adjust: &AdjustValues) -> Path {
    let ss = w.min(h);
    let adj = |name: &str, default: f64| adjust.get(name).copied().unwrap_or(default);
    // Fractions of 100000, scaled against the short side
    let frac = |v: f64| v / 100_000.0;

    let mut path = Path::new();
    match preset {
        "rect" | "flowChartProcess" | "actionButtonBlank" => rect_path(&mut path, w, h),
        "roundRect" | "round1Rect" | "round2SameRect" | "flowChartAlternateProcess" => {
            let radius = (ss * frac(adj("adj", 16_667.0))).clamp(0.0, ss / 2.0);
            round_rect_path(&mut path, w, h, radius);
        }
        "snip1Rect" | "snip2SameRect" => {
            let cut = (ss * frac(adj("adj", 16_667.0))).clamp(0.0, ss / 2.0);
            path.move_to(0.0, 0.0);
            path.line_to(w - cut, 0.0);
            path.line_to(w, cut);
            path.line_to(w, h);
            path.line_to(0.0, h);
            path.close();
        }
        "ellipse" | "flowChartConnector" => {
            path.move_to(w, h / 2.0);
            path.arc_to(w / 2.0, h / 2.0, 0.0, 360.0);
            path.close();
        }
        "triangle" => {
            let apex = w * frac(adj("adj", 50_000.0));
            path.move_to(apex, 0.0);
            path.line_to(w, h);
            path.line_to(0.0, h);
            path.close();
        }
        "rtTriangle" => {
            path.move_to(0.0, 0.0);
            path.line_to(w, h);
            path.line_to(0.0, h);
            path.close();
        }
        "diamond" | "flowChartDecision" => {
            path.move_to(w / 2.0, 0.0);
            path.line_to(w, h / 2.0);
            path.line_to(w / 2.0, h);
            path.line_to(0.0, h / 2.0);
            path.close();
        }
        "parallelogram" => {
            let skew = (ss * frac(adj("adj", 25_000.0))).min(w);
            path.move_to(skew, 0.0);
            path.line_to(w, 0.0);
            path.line_to(w - skew, h);
            path.line_to(0.0, h);
            path.close();
        }
        "trapezoid" => {
            let inset = (ss * frac(adj("adj", 25_000.0))).min(w / 2.0);
            path.move_to(inset, 0.0);
            path.line_to(w - inset, 0.0);
            path.line_to(w, h);
            path.line_to(0.0, h);
            path.close();
        }
        "pentagon" => {
            polygon_path(&mut path, w, h, 5, -90.0);
        }
        "hexagon" => {
            let x1 = (ss * frac(adj("adj", 25_000.0))).min(w / 2.0);
            path.move_to(x1, 0.0);
            path.line_to(w - x1, 0.0);
            path.line_to(w, h / 2.0);
            path.line_to(w - x1, h);
            path.line_to(x1, h);
            path.line_to(0.0, h / 2.0);
            path.close();
        }
        "octagon" => {
            let x1 = ss * frac(adj("adj", 29_289.0));
            path.move_to(x1, 0.0);
            path.line_to(w - x1, 0.0);
            path.line_to(w, x1);
            path.line_to(w, h - x1);
            path.line_to(w - x1, h);
            path.line_to(x1, h);
            path.line_to(0.0, h - x1);
            path.line_to(0.0, x1);
            path.close();
        }
        "plus" | "mathPlus" => {
            let x1 = (ss * frac(adj("adj", 25_000.0))).min(w / 2.0).min(h / 2.0);
            path.move_to(x1, 0.0);
            path.line_to(w - x1, 0.0);
            path.line_to(w - x1, x1);
            path.line_to(w, x1);
            path.line_to(w, h - x1);
            path.line_to(w - x1, h - x1);
            path.line_to(w - x1, h);
            path.line_to(x1, h);
            path.line_to(x1, h - x1);
            path.line_to(0.0, h - x1);
            path.line_to(0.0, x1);
            path.line_to(x1, x1);
            path.close();
        }
        "chevron" => {
            let x1 = (ss * frac(adj("adj", 50_000.0))).min(w);
            path.move_to(0.0, 0.0);
            path.line_to(w - x1, 0.0);
            path.line_to(w, h / 2.0);
            path.line_to(w - x1, h);
            path.line_to(0.0, h);
            path.line_to(x1, h / 2.0);
            path.close();
        }
        "homePlate" => {
            let x1 = (ss * frac(adj("adj", 50_000.0))).min(w);
            path.move_to(0.0, 0.0);
            path.line_to(w - x1, 0.0);
            path.line_to(w, h / 2.0);
            path.line_to(w - x1, h);
            path.line_to(0.0, h);
            path.close();
        }
        "star4" => star_path(&mut path, w, h, 4, frac(adj("adj", 12_500.0)) * 2.0, -90.0),
        "star5" => star_path(&mut path, w, h, 5, frac(adj("adj", 19_098.0)) * 2.0, -90.0),
        "star6" => star_path(&mut path, w, h, 6, frac(adj("adj", 28_868.0)) * 2.0, -90.0),
        "rightArrow" => arrow_path(&mut path, w, h, ss, adjust, ArrowDir::Right),
        "leftArrow" => arrow_path(&mut path, w, h, ss, adjust, ArrowDir::Left),
        "upArrow" => arrow_path(&mut path, w, h, ss, adjust, ArrowDir::Up),
        "downArrow" => arrow_path(&mut path, w, h, ss, adjust, ArrowDir::Down),
        "leftRightArrow" => {
            let t = h * frac(adj("adj1", 50_000.0));
            let head = (ss * frac(adj("adj2", 50_000.0))).min(w / 2.0);
            let y0 = (h - t) / 2.0;
            let y1 = (h + t) / 2.0;
            path.move_to(0.0, h / 2.0);
            path.line_to(head, 0.0);
            path.line_to(head, y0);
            path.line_to(w - head, y0);
            path.line_to(w - head, 0.0);
            path.line_to(w, h / 2.0);
            path.line_to(w - head, h);
            path.line_to(w - head, y1);
            path.line_to(head, y1);
            path.line_to(head, h);
            path.close();
        }
        "pie" => {
            let start = adj("adj1", 0.0) / DEG_60000;
            let end = adj("adj2", 16_200_000.0) / DEG_60000;
            let sweep = (end - start).rem_euclid(360.0);
            let (rx, ry) = (w / 2.0, h / 2.0);
            let (sin, cos) = start.to_radians().sin_cos();
            path.move_to(rx, ry);
            path.line_to(rx + rx * cos, ry + ry * sin);
            path.arc_to(rx, ry, start, if sweep == 0.0 { 360.0 } else { sweep });
            path.close();
        }
        "arc" => {
            let start = adj("adj1", 16_200_000.0) / DEG_60000;
            let end = adj("adj2", 0.0) / DEG_60000;
            let sweep = (end - start).rem_euclid(360.0);
            let (rx, ry) = (w / 2.0, h / 2.0);
            let (sin, cos) = start.to_radians().sin_cos();
            path.move_to(rx + rx * cos, ry + ry * sin);
            path.arc_to(rx, ry, start, if sweep == 0.0 { 360.0 } else { sweep });
            path.filled = false;
        }
        "donut" => {
            let t = ss * frac(adj("adj", 25_000.0));
            let (rx, ry) = (w / 2.0, h / 2.0);
            path.move_to(w, ry);
            path.arc_to(rx, ry, 0.0, 360.0);
            path.close();
            path.move_to(w - t, ry);
            path.arc_to(rx - t, ry - t, 0.0, -360.0);
            path.close();
            path.even_odd = true;
        }
        "line" | "straightConnector1" | "bentConnector2" | "bentConnector3" | "curvedConnector2"
        | "curvedConnector3" => {
            path.move_to(0.0, 0.0);
            path.line_to(w, h);
            path.filled = false;
        }
        other => {
            debug!("unsupported preset geometry {other}, painting as rect");
            rect_path(&mut path, w, h);
        }
    }
    path
}

fn rect_path(path: &mut Path, w: f64, h: f64) {
    path.move_to(0.0, 0.0);
    path.line_to(w, 0.0);
    path.line_to(w, h);
    path.line_to(0.0, h);
    path.close();
}

fn round_rect_path(path: &mut Path, w: f64, h: f64, r: f64) {
    path.move_to(r, 0.0);
    path.line_to(w - r, 0.0);
    path.arc_to(r, r, 270.0, 90.0);
    path.line_to(w, h - r);
    path.arc_to(r, r, 0.0, 90.0);
    path.line_to(r, h);
    path.arc_to(r, r, 90.0, 90.0);
    path.line_to(0.0, r);
    path.arc_to(r, r, 180.0, 90.0);
    path.close();
}

fn polygon_path(path: &mut Path, w: f64, h: f64, sides: usize, start_deg: f64) {
    let (rx, ry) = (w / 2.0, h / 2.0);
    for i in 0..sides {
        let angle = (start_deg + 360.0 * i as f64 / sides as f64).to_radians();
        let x = rx + rx * angle.cos();
        let y = ry + ry * angle.sin();
        if i == 0 {
            path.move_to(x, y);
        } else {
            path.line_to(x, y);
        }
    }
    path.close();
}

fn star_path(path: &mut Path, w: f64, h: f64, points: usize, inner_ratio: f64, start_deg: f64) {
    let (rx, ry) = (w / 2.0, h / 2.0);
    let inner = inner_ratio.clamp(0.05, 0.95);
    for i in 0..points * 2 {
        let angle = (start_deg + 180.0 * i as f64 / points as f64).to_radians();
        let (px, py) = if i % 2 == 0 {
            (rx * angle.cos(), ry * angle.sin())
        } else {
            (rx * inner * angle.cos(), ry * inner * angle.sin())
        };
        if i == 0 {
            path.move_to(rx + px, ry + py);
        } else {
            path.line_to(rx + px, ry + py);
        }
    }
    path.close();
}

enum ArrowDir {
    Right,
    Left,
    Up,
    Down,
}

fn arrow_path(path: &mut Path, w: f64, h: f64, ss: f64, adjust: &AdjustValues, dir: ArrowDir) {
    let adj = |name: &str, default: f64| adjust.get(name).copied().unwrap_or(default) / 100_000.0;
    let (length, breadth) = match dir {
        ArrowDir::Right | ArrowDir::Left => (w, h),
        ArrowDir::Up | ArrowDir::Down => (h, w),
    };
    let t = breadth * adj("adj1", 50_000.0);
    let head = (ss * adj("adj2", 50_000.0)).min(length);
    let b0 = (breadth - t) / 2.0;
    let b1 = (breadth + t) / 2.0;
    // Canonical right arrow in (length, breadth), then remapped
    let pts = [
        (0.0, b0),
        (length - head, b0),
        (length - head, 0.0),
        (length, breadth / 2.0),
        (length - head, breadth),
        (length - head, b1),
        (0.0, b1),
    ];
    for (i, (u, v)) in pts.iter().enumerate() {
        let (x, y) = match dir {
            ArrowDir::Right => (*u, *v),
            ArrowDir::Left => (w - u, *v),
            ArrowDir::Down => (*v, *u),
            ArrowDir::Up => (*v, h - u),
        };
        if i == 0 {
            path.move_to(x, y);
        } else {
            path.line_to(x, y);
        }
    }
    path.close();
}

/// Evaluate custom geometry (`a:custGeom`) into a list of paths
pub fn custom_paths(cust_geom: &XmlElement, w: f64, h: f64, adjust: &AdjustValues) -> Vec<Path> {
    let mut guides = GuideContext::new(w, h);
    for (name, value) in adjust {
        guides.vars.insert(name.clone(), *value);
    }
    if let Some(av_lst) = cust_geom.child("avLst") {
        guides.eval_guide_list(av_lst);
    }
    if let Some(gd_lst) = cust_geom.child("gdLst") {
        guides.eval_guide_list(gd_lst);
    }

    let mut paths = Vec::new();
    let Some(path_lst) = cust_geom.child("pathLst") else {
        return paths;
    };
    for path_el in path_lst.children_named("path") {
        // A path may declare its own coordinate space; rescale to the shape box.
        let local_w = path_el.attr_f64("w").filter(|v| *v > 0.0).unwrap_or(w);
        let local_h = path_el.attr_f64("h").filter(|v| *v > 0.0).unwrap_or(h);
        let sx = if local_w > 0.0 { w / local_w } else { 1.0 };
        let sy = if local_h > 0.0 { h / local_h } else { 1.0 };

        let mut path = Path::new();
        path.filled = path_el.attr("fill") != Some("none");
        path.stroked = path_el.attr_bool("stroke").unwrap_or(true);

        for cmd in path_el.children() {
            let pt = |el: &XmlElement| -> (f64, f64) {
                (
                    guides.resolve(el.attr("x").unwrap_or("0")) * sx,
                    guides.resolve(el.attr("y").unwrap_or("0")) * sy,
                )
            };
            match cmd.tag() {
                "moveTo" => {
                    if let Some(p) = cmd.child("pt") {
                        let (x, y) = pt(p);
                        path.move_to(x, y);
                    }
                }
                "lnTo" => {
                    if let Some(p) = cmd.child("pt") {
                        let (x, y) = pt(p);
                        path.line_to(x, y);
                    }
                }
                "quadBezTo" => {
                    let pts: Vec<(f64, f64)> = cmd.children_named("pt").map(|p| pt(p)).collect();
                    if pts.len() == 2 {
                        path.quad_to(pts[0].0, pts[0].1, pts[1].0, pts[1].1);
                    }
                }
                "cubicBezTo" => {
                    let pts: Vec<(f64, f64)> = cmd.children_named("pt").map(|p| pt(p)).collect();
                    if pts.len() == 3 {
                        path.cubic_to(
                            pts[0].0, pts[0].1, pts[1].0, pts[1].1, pts[2].0, pts[2].1,
                        );
                    }
                }
                "arcTo" => {
                    let rx = guides.resolve(cmd.attr("wR").unwrap_or("0")) * sx;
                    let ry = guides.resolve(cmd.attr("hR").unwrap_or("0")) * sy;
                    let start = guides.resolve(cmd.attr("stAng").unwrap_or("0")) / DEG_60000;
                    let sweep = guides.resolve(cmd.attr("swAng").unwrap_or("0")) / DEG_60000;
                    path.arc_to(rx, ry, start, sweep);
                }
                "close" => path.close(),
                _ => {}
            }
        }
        if !path.is_empty() {
            paths.push(path);
        }
    }
    paths
}

/// Guide formula evaluation context
struct GuideContext {
    vars: HashMap<String, f64>,
}

impl GuideContext {
    fn new(w: f64, h: f64) -> Self {
        let ss = w.min(h);
        let mut vars = HashMap::new();
        let mut put = |name: &str, value: f64| {
            vars.insert(name.to_string(), value);
        };
        put("w", w);
        put("h", h);
        put("ss", ss);
        put("l", 0.0);
        put("t", 0.0);
        put("r", w);
        put("b", h);
        put("hc", w / 2.0);
        put("vc", h / 2.0);
        for d in [2, 3, 4, 5, 6, 8, 10, 12] {
            put(&format!("wd{d}"), w / d as f64);
            put(&format!("hd{d}"), h / d as f64);
        }
        for d in [2, 4, 6, 8, 16, 32] {
            put(&format!("ssd{d}"), ss / d as f64);
        }
        // Circle fractions in 60000ths-degree units
        put("cd2", 10_800_000.0);
        put("cd4", 5_400_000.0);
        put("cd8", 2_700_000.0);
        put("3cd4", 16_200_000.0);
        put("3cd8", 8_100_000.0);
        put("5cd8", 13_500_000.0);
        put("7cd8", 18_900_000.0);
        GuideContext { vars }
    }

    fn eval_guide_list(&mut self, list: &XmlElement) {
        for gd in list.children_named("gd") {
            if let (Some(name), Some(fmla)) = (gd.attr("name"), gd.attr("fmla")) {
                let value = self.eval_formula(fmla);
                self.vars.insert(name.to_string(), value);
            }
        }
    }

    fn resolve(&self, token: &str) -> f64 {
        if let Ok(value) = token.parse::<f64>() {
            return value;
        }
        self.vars.get(token).copied().unwrap_or(0.0)
    }

    fn eval_formula(&self, fmla: &str) -> f64 {
        let mut tokens = fmla.split_whitespace();
        let op = tokens.next().unwrap_or("");
        let args: Vec<f64> = tokens.map(|t| self.resolve(t)).collect();
        let arg = |i: usize| args.get(i).copied().unwrap_or(0.0);
        let to_rad = |v: f64| (v / DEG_60000).to_radians();
        match op {
            "val" => arg(0),
            "*/" => {
                if arg(2) != 0.0 {
                    arg(0) * arg(1) / arg(2)
                } else {
                    0.0
                }
            }
            "+-" => arg(0) + arg(1) - arg(2),
            "+/" => {
                if arg(2) != 0.0 {
                    (arg(0) + arg(1)) / arg(2)
                } else {
                    0.0
                }
            }
            "pin" => arg(1).clamp(arg(0).min(arg(2)), arg(0).max(arg(2))),
            "max" => arg(0).max(arg(1)),
            "min" => arg(0).min(arg(1)),
            "abs" => arg(0).abs(),
            "sqrt" => arg(0).max(0.0).sqrt(),
            "mod" => (arg(0).powi(2) + arg(1).powi(2) + arg(2).powi(2)).sqrt(),
            "sin" => arg(0) * to_rad(arg(1)).sin(),
            "cos" => arg(0) * to_rad(arg(1)).cos(),
            "tan" => arg(0) * to_rad(arg(1)).tan(),
            "at2" => arg(1).atan2(arg(0)).to_degrees() * DEG_60000,
            "cat2" => arg(0) * arg(2).atan2(arg(1)).cos(),
            "sat2" => arg(0) * arg(2).atan2(arg(1)).sin(),
            "?:" => {
                if arg(0) > 0.0 {
                    arg(1)
                } else {
                    arg(2)
                }
            }
            other => {
                debug!("unknown guide op {other}");
                0.0
            }
        }
    }
}
