//! Shape transforms
//!
//! `a:xfrm` carries position and extent in EMU, rotation in 60000ths
//! of a degree, and flip flags. Group shapes additionally carry a
//! child coordinate space (`chOff`/`chExt`) that child coordinates
//! must be mapped through before combining with the group transform.

use crate::oxml::XmlElement;
use crate::util::angle_to_degrees;

/// An axis-aligned rectangle in EMU
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmuRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// An axis-aligned rectangle in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PxRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Position, extent, rotation, and flips of a shape
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    pub rotation_deg: f64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
        rotation_deg: 0.0,
        flip_h: false,
        flip_v: false,
    };

    /// Parse an `a:xfrm` element. Both `off` and `ext` are expected;
    /// missing coordinates default to zero and negative extents clamp.
    pub fn from_xfrm(xfrm: &XmlElement) -> Self {
        let off = xfrm.child("off");
        let ext = xfrm.child("ext");
        Transform {
            x: off.and_then(|o| o.attr_i64("x")).unwrap_or(0),
            y: off.and_then(|o| o.attr_i64("y")).unwrap_or(0),
            w: ext.and_then(|e| e.attr_i64("cx")).unwrap_or(0).max(0),
            h: ext.and_then(|e| e.attr_i64("cy")).unwrap_or(0).max(0),
            rotation_deg: angle_to_degrees(xfrm.attr_i64("rot").unwrap_or(0)),
            flip_h: xfrm.attr_bool("flipH").unwrap_or(false),
            flip_v: xfrm.attr_bool("flipV").unwrap_or(false),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }

    /// Shape center in EMU
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Compose a parent (group) transform with a child transform
    /// already expressed in the parent's coordinate space.
    ///
    /// Parent flips remap the child offset inside the parent box, the
    /// parent rotation carries the child center around the parent
    /// center, rotations add, and flip flags combine by xor.
    pub fn combine(parent: &Transform, child: &Transform) -> Transform {
        if parent.is_identity() {
            return *child;
        }
        if child.is_identity() {
            return *parent;
        }

        let (mut cx, mut cy) = (child.x, child.y);
        if parent.flip_h {
            cx = parent.w - cx - child.w;
        }
        if parent.flip_v {
            cy = parent.h - cy - child.h;
        }

        let pcx = parent.w as f64 / 2.0;
        let pcy = parent.h as f64 / 2.0;
        let ccx = cx as f64 + child.w as f64 / 2.0;
        let ccy = cy as f64 + child.h as f64 / 2.0;
        let theta = parent.rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let dx = ccx - pcx;
        let dy = ccy - pcy;
        let rotated_cx = pcx + dx * cos - dy * sin;
        let rotated_cy = pcy + dx * sin + dy * cos;

        Transform {
            x: (parent.x as f64 + rotated_cx - child.w as f64 / 2.0).round() as i64,
            y: (parent.y as f64 + rotated_cy - child.h as f64 / 2.0).round() as i64,
            w: child.w,
            h: child.h,
            rotation_deg: (parent.rotation_deg + child.rotation_deg).rem_euclid(360.0),
            flip_h: parent.flip_h ^ child.flip_h,
            flip_v: parent.flip_v ^ child.flip_v,
        }
    }

    /// Axis-aligned bounding box of the rotated/flipped rectangle, EMU
    pub fn bounding_rect(&self) -> EmuRect {
        let (cx, cy) = self.center();
        let theta = self.rotation_deg.to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
        let bw = self.w as f64 * cos + self.h as f64 * sin;
        let bh = self.w as f64 * sin + self.h as f64 * cos;
        EmuRect {
            x: cx - bw / 2.0,
            y: cy - bh / 2.0,
            w: bw,
            h: bh,
        }
    }

    /// Mapping from shape-local EMU coordinates to device pixels:
    /// translate to the shape center, rotate, apply flip scales, then
    /// translate back by half the extent. The caller brackets the
    /// application with a canvas save/restore pair.
    pub fn to_device(&self, scale: f64) -> tiny_skia::Transform {
        let w_px = (self.w as f64 * scale) as f32;
        let h_px = (self.h as f64 * scale) as f32;
        let cx_px = ((self.x as f64 + self.w as f64 / 2.0) * scale) as f32;
        let cy_px = ((self.y as f64 + self.h as f64 / 2.0) * scale) as f32;

        tiny_skia::Transform::from_translate(cx_px, cy_px)
            .pre_concat(tiny_skia::Transform::from_rotate(self.rotation_deg as f32))
            .pre_concat(tiny_skia::Transform::from_scale(
                if self.flip_h { -1.0 } else { 1.0 },
                if self.flip_v { -1.0 } else { 1.0 },
            ))
            .pre_translate(-w_px / 2.0, -h_px / 2.0)
            .pre_scale(scale as f32, scale as f32)
    }

    /// Like `to_device`, but local coordinates stay in device pixels
    /// (used by text layout, which measures in pixels).
    pub fn to_device_px(&self, scale: f64) -> tiny_skia::Transform {
        let w_px = (self.w as f64 * scale) as f32;
        let h_px = (self.h as f64 * scale) as f32;
        let cx_px = ((self.x as f64 + self.w as f64 / 2.0) * scale) as f32;
        let cy_px = ((self.y as f64 + self.h as f64 / 2.0) * scale) as f32;

        tiny_skia::Transform::from_translate(cx_px, cy_px)
            .pre_concat(tiny_skia::Transform::from_rotate(self.rotation_deg as f32))
            .pre_concat(tiny_skia::Transform::from_scale(
                if self.flip_h { -1.0 } else { 1.0 },
                if self.flip_v { -1.0 } else { 1.0 },
            ))
            .pre_translate(-w_px / 2.0, -h_px / 2.0)
    }

    /// Extent in device pixels
    pub fn px_size(&self, scale: f64) -> (f32, f32) {
        (
            (self.w as f64 * scale) as f32,
            (self.h as f64 * scale) as f32,
        )
    }
}

/// The child coordinate space of a group (`chOff`/`chExt`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildSpace {
    pub off_x: i64,
    pub off_y: i64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ChildSpace {
    /// Identity mapping for groups without an explicit child space
    pub const IDENTITY: ChildSpace = ChildSpace {
        off_x: 0,
        off_y: 0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// Build from a group's `a:xfrm`. The scale maps child extents to
    /// the group extent; a degenerate child extent maps 1:1.
    pub fn from_xfrm(xfrm: &XmlElement, group: &Transform) -> Self {
        let ch_off = xfrm.child("chOff");
        let ch_ext = xfrm.child("chExt");
        let (off_x, off_y) = match ch_off {
            Some(off) => (
                off.attr_i64("x").unwrap_or(0),
                off.attr_i64("y").unwrap_or(0),
            ),
            None => (0, 0),
        };
        let ch_cx = ch_ext.and_then(|e| e.attr_i64("cx")).unwrap_or(0);
        let ch_cy = ch_ext.and_then(|e| e.attr_i64("cy")).unwrap_or(0);
        ChildSpace {
            off_x,
            off_y,
            scale_x: if ch_cx > 0 {
                group.w as f64 / ch_cx as f64
            } else {
                1.0
            },
            scale_y: if ch_cy > 0 {
                group.h as f64 / ch_cy as f64
            } else {
                1.0
            },
        }
    }

    /// Map a child transform from child space into group-local space
    pub fn map(&self, child: &Transform) -> Transform {
        Transform {
            x: (((child.x - self.off_x) as f64) * self.scale_x).round() as i64,
            y: (((child.y - self.off_y) as f64) * self.scale_y).round() as i64,
            w: ((child.w as f64) * self.scale_x).round() as i64,
            h: ((child.h as f64) * self.scale_y).round() as i64,
            ..*child
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    fn xfrm(body: &str) -> XmlElement {
        XmlParser::parse_str(&format!(r#"<a:xfrm xmlns:a="urn:a" {body}</a:xfrm>"#)).unwrap()
    }

    #[test]
    fn test_parse_xfrm() {
        let el = xfrm(r#"rot="5400000" flipH="1"><a:off x="100" y="200"/><a:ext cx="300" cy="400"/>"#);
        let t = Transform::from_xfrm(&el);
        assert_eq!((t.x, t.y, t.w, t.h), (100, 200, 300, 400));
        assert_eq!(t.rotation_deg, 90.0);
        assert!(t.flip_h);
        assert!(!t.flip_v);
    }

    #[test]
    fn test_combine_identity_laws() {
        let t = Transform {
            x: 10,
            y: 20,
            w: 30,
            h: 40,
            rotation_deg: 45.0,
            flip_h: true,
            flip_v: false,
        };
        assert_eq!(Transform::combine(&Transform::IDENTITY, &t), t);
        assert_eq!(Transform::combine(&t, &Transform::IDENTITY), t);
    }

    #[test]
    fn test_combine_rotated_parent() {
        let parent = Transform {
            x: 1_000_000,
            y: 1_000_000,
            w: 2_000_000,
            h: 2_000_000,
            rotation_deg: 90.0,
            ..Transform::IDENTITY
        };
        let child = Transform {
            x: 500_000,
            y: 0,
            w: 500_000,
            h: 500_000,
            ..Transform::IDENTITY
        };
        let combined = Transform::combine(&parent, &child);
        assert_eq!(combined.rotation_deg, 90.0);
        assert_eq!(combined.x, 2_500_000);
        assert_eq!(combined.y, 1_500_000);
        assert_eq!((combined.w, combined.h), (500_000, 500_000));
    }

    #[test]
    fn test_combine_parent_flip_remaps_offset() {
        let parent = Transform {
            x: 0,
            y: 0,
            w: 1_000,
            h: 1_000,
            flip_h: true,
            ..Transform::IDENTITY
        };
        let child = Transform {
            x: 100,
            y: 0,
            w: 200,
            h: 200,
            ..Transform::IDENTITY
        };
        let combined = Transform::combine(&parent, &child);
        assert_eq!(combined.x, 1_000 - 100 - 200);
        assert!(combined.flip_h);
    }

    #[test]
    fn test_flips_combine_by_xor() {
        let parent = Transform {
            w: 100,
            h: 100,
            flip_h: true,
            ..Transform::IDENTITY
        };
        let child = Transform {
            x: 1,
            w: 10,
            h: 10,
            flip_h: true,
            ..Transform::IDENTITY
        };
        assert!(!Transform::combine(&parent, &child).flip_h);
    }

    #[test]
    fn test_bounding_rect_unrotated() {
        let t = Transform {
            x: 10,
            y: 20,
            w: 100,
            h: 50,
            ..Transform::IDENTITY
        };
        let bb = t.bounding_rect();
        assert_eq!((bb.x, bb.y, bb.w, bb.h), (10.0, 20.0, 100.0, 50.0));
    }

    #[test]
    fn test_bounding_rect_rotated_90_swaps_extent() {
        let t = Transform {
            x: 0,
            y: 0,
            w: 100,
            h: 50,
            rotation_deg: 90.0,
            ..Transform::IDENTITY
        };
        let bb = t.bounding_rect();
        assert!((bb.w - 50.0).abs() < 1e-6);
        assert!((bb.h - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_child_space_mapping() {
        let group = Transform {
            x: 0,
            y: 0,
            w: 2_000,
            h: 2_000,
            ..Transform::IDENTITY
        };
        let el = xfrm(
            r#"><a:off x="0" y="0"/><a:ext cx="2000" cy="2000"/><a:chOff x="1000" y="1000"/><a:chExt cx="1000" cy="1000"/>"#,
        );
        let space = ChildSpace::from_xfrm(&el, &group);
        let child = Transform {
            x: 1_500,
            y: 1_000,
            w: 500,
            h: 500,
            ..Transform::IDENTITY
        };
        let mapped = space.map(&child);
        assert_eq!((mapped.x, mapped.y), (1_000, 0));
        assert_eq!((mapped.w, mapped.h), (1_000, 1_000));
    }
}
