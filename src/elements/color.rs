//! Color types and resolution
//!
//! A color reference in source XML is a base color (scheme, sRGB,
//! system, preset, HSL, or percent-RGB) wrapped in an ordered list of
//! modifiers. Resolution is a pure function of the base, the modifier
//! list, and the scheme table; it never fails.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;

use crate::constants::fallback_scheme;
use crate::oxml::XmlElement;
use crate::util::parse_percent;

/// An RGBA color with 8-bit channels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// Parse from hex: "RRGGBB" or "RRGGBBAA", leading '#' allowed
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if hex.len() == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()?
        } else {
            255
        };
        Some(Rgba { r, g, b, a })
    }

    /// Hex string without alpha, uppercase, no '#'
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Hex string with alpha appended
    pub fn to_hex_with_alpha(&self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// CSS `rgba()` string
    pub fn css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f64 / 255.0
        )
    }

    /// WCAG relative luminance in [0, 1]
    pub fn relative_luminance(&self) -> f64 {
        fn linearize(channel: u8) -> f64 {
            let c = channel as f64 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linearize(self.r) + 0.7152 * linearize(self.g) + 0.0722 * linearize(self.b)
    }

    /// Dark/light classifier at luminance 0.5
    pub fn is_dark(&self) -> bool {
        self.relative_luminance() <= 0.5
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Rgba { a, ..self }
    }
}

/// The eight-plus-two scheme color slots of a theme
#[derive(Clone, Debug)]
pub struct SchemeColors {
    slots: HashMap<String, Rgba>,
}

impl SchemeColors {
    pub fn new(slots: HashMap<String, Rgba>) -> Self {
        SchemeColors { slots }
    }

    /// The built-in Office scheme, used when no theme part resolves
    pub fn office_fallback() -> Self {
        let pairs = [
            ("dk1", fallback_scheme::DK1),
            ("lt1", fallback_scheme::LT1),
            ("dk2", fallback_scheme::DK2),
            ("lt2", fallback_scheme::LT2),
            ("accent1", fallback_scheme::ACCENT1),
            ("accent2", fallback_scheme::ACCENT2),
            ("accent3", fallback_scheme::ACCENT3),
            ("accent4", fallback_scheme::ACCENT4),
            ("accent5", fallback_scheme::ACCENT5),
            ("accent6", fallback_scheme::ACCENT6),
            ("hlink", fallback_scheme::HLINK),
            ("folHlink", fallback_scheme::FOL_HLINK),
        ];
        SchemeColors {
            slots: pairs
                .iter()
                .map(|(name, hex)| (name.to_string(), Rgba::from_hex(hex).unwrap()))
                .collect(),
        }
    }

    /// Resolve a slot name, applying the `tx`/`bg` aliases. An explicit
    /// entry for the alias itself (installed by a color map override)
    /// wins over aliasing. Unknown slots fall back to the built-in
    /// Office table, then black.
    pub fn get(&self, name: &str) -> Rgba {
        if let Some(color) = self.slots.get(name) {
            return *color;
        }
        let slot = match name {
            "tx1" => "dk1",
            "bg1" => "lt1",
            "tx2" => "dk2",
            "bg2" => "lt2",
            other => other,
        };
        if let Some(color) = self.slots.get(slot) {
            return *color;
        }
        debug!("scheme color {name} not in theme, using Office fallback");
        Self::office_fallback()
            .slots
            .get(slot)
            .copied()
            .unwrap_or(Rgba::BLACK)
    }

    pub fn insert(&mut self, name: &str, color: Rgba) {
        self.slots.insert(name.to_string(), color);
    }
}

impl Default for SchemeColors {
    fn default() -> Self {
        Self::office_fallback()
    }
}

/// A single color modifier, applied in document order
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorModifier {
    Tint(f64),
    Shade(f64),
    LumMod(f64),
    LumOff(f64),
    SatMod(f64),
    HueMod(f64),
    Alpha(f64),
    AlphaMod(f64),
    Gamma,
    InvGamma,
}

impl ColorModifier {
    fn from_element(el: &XmlElement) -> Option<Self> {
        let value = || el.attr("val").and_then(parse_percent).unwrap_or(0.0);
        match el.tag() {
            "tint" => Some(ColorModifier::Tint(value())),
            "shade" => Some(ColorModifier::Shade(value())),
            "lumMod" => Some(ColorModifier::LumMod(value())),
            "lumOff" => Some(ColorModifier::LumOff(value())),
            "satMod" => Some(ColorModifier::SatMod(value())),
            "hueMod" => Some(ColorModifier::HueMod(value())),
            "alpha" => Some(ColorModifier::Alpha(value())),
            "alphaMod" => Some(ColorModifier::AlphaMod(value())),
            "gamma" => Some(ColorModifier::Gamma),
            "invGamma" => Some(ColorModifier::InvGamma),
            _ => None,
        }
    }

    fn apply(&self, color: Rgba) -> Rgba {
        match *self {
            ColorModifier::Tint(v) => lerp_rgb(color, Rgba::WHITE, v),
            ColorModifier::Shade(v) => lerp_rgb(color, Rgba::BLACK, v),
            ColorModifier::LumMod(v) => with_hsl(color, |_, _, l| ((l * v) as f64, None, None)),
            ColorModifier::LumOff(v) => with_hsl(color, |_, _, l| ((l + v) as f64, None, None)),
            ColorModifier::SatMod(v) => {
                with_hsl(color, |_, s, l| (l, Some((s * v).clamp(0.0, 1.0)), None))
            }
            ColorModifier::HueMod(v) => {
                with_hsl(color, |h, _, l| (l, None, Some((h * v).rem_euclid(360.0))))
            }
            ColorModifier::Alpha(v) => color.with_alpha(to_channel(v)),
            ColorModifier::AlphaMod(v) => {
                color.with_alpha(((color.a as f64 * v).round().clamp(0.0, 255.0)) as u8)
            }
            ColorModifier::Gamma => map_channels(color, srgb_gamma),
            ColorModifier::InvGamma => map_channels(color, srgb_inv_gamma),
        }
    }
}

fn to_channel(fraction: f64) -> u8 {
    (fraction * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lerp_rgb(from: Rgba, to: Rgba, t: f64) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((a as f64 + (b as f64 - a as f64) * t).round()) as u8;
    Rgba {
        r: mix(from.r, to.r),
        g: mix(from.g, to.g),
        b: mix(from.b, to.b),
        a: from.a,
    }
}

fn map_channels(color: Rgba, f: fn(f64) -> f64) -> Rgba {
    let map = |c: u8| to_channel(f(c as f64 / 255.0));
    Rgba {
        r: map(color.r),
        g: map(color.g),
        b: map(color.b),
        a: color.a,
    }
}

/// sRGB transfer, linear to gamma-corrected (gamma 2.4 segment)
fn srgb_gamma(linear: f64) -> f64 {
    if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB transfer, gamma-corrected to linear
fn srgb_inv_gamma(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// Apply an HSL-space edit; the closure returns (l, s?, h?) updates
fn with_hsl(color: Rgba, edit: impl Fn(f64, f64, f64) -> (f64, Option<f64>, Option<f64>)) -> Rgba {
    let (h, s, l) = rgb_to_hsl(color);
    let (new_l, new_s, new_h) = edit(h, s, l);
    let result = hsl_to_rgb(
        new_h.unwrap_or(h),
        new_s.unwrap_or(s),
        new_l.clamp(0.0, 1.0),
    );
    result.with_alpha(color.a)
}

pub(crate) fn rgb_to_hsl(color: Rgba) -> (f64, f64, f64) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if (max - r).abs() < f64::EPSILON {
        ((g - b) / d).rem_euclid(6.0)
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } * 60.0;
    (h, s, l)
}

pub(crate) fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgba {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgba::opaque(
        to_channel(r1 + m),
        to_channel(g1 + m),
        to_channel(b1 + m),
    )
}

/// A color reference as it appears in source XML
#[derive(Clone, Debug, PartialEq)]
pub enum ColorBase {
    /// `schemeClr val="accent1"`; `phClr` is the style-matrix placeholder
    Scheme(String),
    Srgb(Rgba),
    /// `sysClr` with the `lastClr` hint when present
    System { name: String, hint: Option<Rgba> },
    Preset(String),
    /// `hslClr`: hue in degrees, sat/lum as fractions
    Hsl { hue: f64, sat: f64, lum: f64 },
    /// `scrgbClr`: channel percentages
    ScRgb { r: f64, g: f64, b: f64 },
}

/// A base color plus its ordered modifier list
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRef {
    pub base: ColorBase,
    pub modifiers: Vec<ColorModifier>,
}

impl ColorRef {
    pub fn srgb(color: Rgba) -> Self {
        ColorRef {
            base: ColorBase::Srgb(color),
            modifiers: Vec::new(),
        }
    }

    pub fn scheme(name: &str) -> Self {
        ColorRef {
            base: ColorBase::Scheme(name.to_string()),
            modifiers: Vec::new(),
        }
    }

    /// Parse the color child of a container element (`solidFill`,
    /// `gs`, outline fills, ...). Returns `None` when no color child
    /// is present.
    pub fn from_parent(parent: &XmlElement) -> Option<Self> {
        parent.children().iter().find_map(Self::from_element)
    }

    /// Parse a color element itself (`srgbClr`, `schemeClr`, ...)
    pub fn from_element(el: &XmlElement) -> Option<Self> {
        let base = match el.tag() {
            "srgbClr" => ColorBase::Srgb(Rgba::from_hex(el.attr("val")?)?),
            "schemeClr" => ColorBase::Scheme(el.attr("val")?.to_string()),
            "sysClr" => ColorBase::System {
                name: el.attr("val")?.to_string(),
                hint: el.attr("lastClr").and_then(Rgba::from_hex),
            },
            "prstClr" => ColorBase::Preset(el.attr("val")?.to_string()),
            "hslClr" => ColorBase::Hsl {
                hue: el.attr_i64("hue").unwrap_or(0) as f64 / 60_000.0,
                sat: el.attr("sat").and_then(parse_percent).unwrap_or(0.0),
                lum: el.attr("lum").and_then(parse_percent).unwrap_or(0.0),
            },
            "scrgbClr" => ColorBase::ScRgb {
                r: el.attr("r").and_then(parse_percent).unwrap_or(0.0),
                g: el.attr("g").and_then(parse_percent).unwrap_or(0.0),
                b: el.attr("b").and_then(parse_percent).unwrap_or(0.0),
            },
            _ => return None,
        };
        let modifiers = el
            .children()
            .iter()
            .filter_map(ColorModifier::from_element)
            .collect();
        Some(ColorRef { base, modifiers })
    }

    /// Resolve to a concrete color. `ph_clr` substitutes the style
    /// matrix placeholder color when the base is `schemeClr val="phClr"`.
    pub fn resolve(&self, scheme: &SchemeColors, ph_clr: Option<Rgba>) -> Rgba {
        let base = match &self.base {
            ColorBase::Scheme(name) if name == "phClr" => ph_clr.unwrap_or(Rgba::BLACK),
            ColorBase::Scheme(name) => scheme.get(name),
            ColorBase::Srgb(color) => *color,
            ColorBase::System { name, hint } => hint.unwrap_or_else(|| match name.as_str() {
                "window" => Rgba::WHITE,
                "windowText" => Rgba::BLACK,
                _ => Rgba::BLACK,
            }),
            ColorBase::Preset(name) => preset_color(name),
            ColorBase::Hsl { hue, sat, lum } => hsl_to_rgb(*hue, *sat, *lum),
            ColorBase::ScRgb { r, g, b } => Rgba::opaque(
                to_channel(srgb_gamma(*r)),
                to_channel(srgb_gamma(*g)),
                to_channel(srgb_gamma(*b)),
            ),
        };
        self.modifiers.iter().fold(base, |c, m| m.apply(c))
    }
}

lazy_static! {
    /// Preset color names (drawingml `prstClr`), the commonly seen subset
    static ref PRESET_COLORS: HashMap<&'static str, Rgba> = {
        let mut m = HashMap::new();
        let entries: &[(&str, u32)] = &[
            ("aliceBlue", 0xF0F8FF), ("aqua", 0x00FFFF), ("beige", 0xF5F5DC),
            ("black", 0x000000), ("blue", 0x0000FF), ("brown", 0xA52A2A),
            ("coral", 0xFF7F50), ("crimson", 0xDC143C), ("cyan", 0x00FFFF),
            ("darkBlue", 0x00008B), ("darkGray", 0xA9A9A9), ("darkGreen", 0x006400),
            ("darkOrange", 0xFF8C00), ("darkRed", 0x8B0000), ("darkViolet", 0x9400D3),
            ("dkBlue", 0x00008B), ("dkGray", 0xA9A9A9), ("dkGreen", 0x006400),
            ("dkRed", 0x8B0000), ("fuchsia", 0xFF00FF), ("gold", 0xFFD700),
            ("gray", 0x808080), ("green", 0x008000), ("indigo", 0x4B0082),
            ("ivory", 0xFFFFF0), ("khaki", 0xF0E68C), ("lavender", 0xE6E6FA),
            ("lime", 0x00FF00), ("ltBlue", 0xADD8E6), ("ltGray", 0xD3D3D3),
            ("ltGreen", 0x90EE90), ("ltYellow", 0xFFFFE0), ("lightBlue", 0xADD8E6),
            ("lightGray", 0xD3D3D3), ("lightGreen", 0x90EE90), ("lightYellow", 0xFFFFE0),
            ("magenta", 0xFF00FF), ("maroon", 0x800000), ("navy", 0x000080),
            ("olive", 0x808000), ("orange", 0xFFA500), ("orchid", 0xDA70D6),
            ("pink", 0xFFC0CB), ("plum", 0xDDA0DD), ("purple", 0x800080),
            ("red", 0xFF0000), ("salmon", 0xFA8072), ("silver", 0xC0C0C0),
            ("skyBlue", 0x87CEEB), ("tan", 0xD2B48C), ("teal", 0x008080),
            ("tomato", 0xFF6347), ("turquoise", 0x40E0D0), ("violet", 0xEE82EE),
            ("wheat", 0xF5DEB3), ("white", 0xFFFFFF), ("yellow", 0xFFFF00),
        ];
        for (name, value) in entries {
            m.insert(
                *name,
                Rgba::opaque(
                    ((value >> 16) & 0xFF) as u8,
                    ((value >> 8) & 0xFF) as u8,
                    (value & 0xFF) as u8,
                ),
            );
        }
        m
    };
}

fn preset_color(name: &str) -> Rgba {
    PRESET_COLORS.get(name).copied().unwrap_or_else(|| {
        debug!("unknown preset color {name}, using black");
        Rgba::BLACK
    })
}
