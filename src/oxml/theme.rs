//! Theme part parsing
//!
//! Materializes the slide's effective theme: the scheme color table,
//! the font scheme, and the format scheme style lists that indexed
//! style references (`bgRef`, `fillRef`, `lnRef`) point into.

use std::collections::HashMap;

use crate::constants::fallback_scheme;
use crate::elements::color::{ColorRef, Rgba, SchemeColors};
use crate::oxml::XmlElement;

/// Major/minor fonts plus per-script overrides
#[derive(Debug, Clone)]
pub struct FontScheme {
    pub major_latin: String,
    pub minor_latin: String,
    pub major_scripts: HashMap<String, String>,
    pub minor_scripts: HashMap<String, String>,
}

impl Default for FontScheme {
    fn default() -> Self {
        FontScheme {
            major_latin: fallback_scheme::MAJOR_FONT.to_string(),
            minor_latin: fallback_scheme::MINOR_FONT.to_string(),
            major_scripts: HashMap::new(),
            minor_scripts: HashMap::new(),
        }
    }
}

impl FontScheme {
    /// Resolve a theme font token (`+mj-lt`, `+mn-lt`) or pass the
    /// typeface through unchanged.
    pub fn resolve(&self, typeface: &str) -> String {
        match typeface {
            "+mj-lt" | "+mj-ea" | "+mj-cs" => self.major_latin.clone(),
            "+mn-lt" | "+mn-ea" | "+mn-cs" => self.minor_latin.clone(),
            other => other.to_string(),
        }
    }

    fn parse_font_collection(el: &XmlElement) -> (String, HashMap<String, String>) {
        let latin = el
            .child("latin")
            .and_then(|l| l.attr("typeface"))
            .unwrap_or("")
            .to_string();
        let scripts = el
            .children_named("font")
            .filter_map(|f| {
                Some((f.attr("script")?.to_string(), f.attr("typeface")?.to_string()))
            })
            .collect();
        (latin, scripts)
    }
}

/// Fill/line/effect style lists from `a:fmtScheme`, kept as raw
/// elements; indexed style references resolve into them with `phClr`
/// substituted at paint time.
#[derive(Debug, Clone, Default)]
pub struct FormatScheme {
    pub fill_styles: Vec<XmlElement>,
    pub line_styles: Vec<XmlElement>,
    pub effect_styles: Vec<XmlElement>,
    pub bg_fill_styles: Vec<XmlElement>,
}

/// A resolved theme
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: SchemeColors,
    pub fonts: FontScheme,
    pub formats: FormatScheme,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            name: "Office Theme".to_string(),
            colors: SchemeColors::office_fallback(),
            fonts: FontScheme::default(),
            formats: FormatScheme::default(),
        }
    }
}

impl Theme {
    /// Parse an `a:theme` part. Missing sections keep their defaults,
    /// so a sparse theme still resolves every lookup.
    pub fn from_xml(root: &XmlElement) -> Self {
        let mut theme = Theme {
            name: root.attr("name").unwrap_or("Office Theme").to_string(),
            ..Theme::default()
        };
        let Some(elements) = root.child("themeElements") else {
            return theme;
        };

        if let Some(clr_scheme) = elements.child("clrScheme") {
            let mut slots = HashMap::new();
            for slot in clr_scheme.children() {
                if let Some(color_ref) = ColorRef::from_parent(slot) {
                    // Scheme slots hold concrete colors only, so an empty
                    // table is a safe resolution context here.
                    let resolved =
                        color_ref.resolve(&SchemeColors::new(HashMap::new()), None);
                    slots.insert(slot.tag().to_string(), resolved);
                }
            }
            theme.colors = SchemeColors::new(slots);
        }

        if let Some(font_scheme) = elements.child("fontScheme") {
            if let Some(major) = font_scheme.child("majorFont") {
                let (latin, scripts) = FontScheme::parse_font_collection(major);
                if !latin.is_empty() {
                    theme.fonts.major_latin = latin;
                }
                theme.fonts.major_scripts = scripts;
            }
            if let Some(minor) = font_scheme.child("minorFont") {
                let (latin, scripts) = FontScheme::parse_font_collection(minor);
                if !latin.is_empty() {
                    theme.fonts.minor_latin = latin;
                }
                theme.fonts.minor_scripts = scripts;
            }
        }

        if let Some(fmt_scheme) = elements.child("fmtScheme") {
            let collect = |tag: &str| -> Vec<XmlElement> {
                fmt_scheme
                    .child(tag)
                    .map(|lst| lst.children().to_vec())
                    .unwrap_or_default()
            };
            theme.formats = FormatScheme {
                fill_styles: collect("fillStyleLst"),
                line_styles: collect("lnStyleLst"),
                effect_styles: collect("effectStyleLst"),
                bg_fill_styles: collect("bgFillStyleLst"),
            };
        }

        theme
    }

    /// Fill style for a 1-based `fillRef`/`bgRef` index. Indices at or
    /// above 1001 select from the background fill list.
    pub fn fill_style(&self, idx: u32) -> Option<&XmlElement> {
        if idx == 0 || idx == 1000 {
            return None;
        }
        let (list, index) = if idx > 1000 {
            (&self.formats.bg_fill_styles, (idx - 1001) as usize)
        } else {
            (&self.formats.fill_styles, (idx - 1) as usize)
        };
        list.get(index.min(list.len().saturating_sub(1)))
    }

    /// Line style for a 1-based `lnRef` index
    pub fn line_style(&self, idx: u32) -> Option<&XmlElement> {
        if idx == 0 {
            return None;
        }
        let list = &self.formats.line_styles;
        list.get(((idx - 1) as usize).min(list.len().saturating_sub(1)))
    }
}

/// A color map (`p:clrMap` on the master, `p:clrMapOvr` on the slide)
/// remapping logical slots onto scheme slots.
#[derive(Debug, Clone, Default)]
pub struct ClrMap {
    map: HashMap<String, String>,
}

impl ClrMap {
    /// Parse `p:clrMap`, whose attributes map logical names to slots
    pub fn from_element(el: &XmlElement) -> Self {
        let mut map = HashMap::new();
        for name in [
            "bg1", "tx1", "bg2", "tx2", "accent1", "accent2", "accent3", "accent4", "accent5",
            "accent6", "hlink", "folHlink",
        ] {
            if let Some(target) = el.attr(name) {
                map.insert(name.to_string(), target.to_string());
            }
        }
        ClrMap { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Materialize the remapping into a scheme table: every remapped
    /// logical slot gets an explicit entry pointing at its target's
    /// color, so later lookups hit the override before aliasing.
    pub fn apply(&self, colors: &SchemeColors) -> SchemeColors {
        let mut out = colors.clone();
        for (logical, slot) in &self.map {
            out.insert(logical, colors.get(slot));
        }
        out
    }
}

/// Resolve a color against a theme (no placeholder color in scope)
pub fn resolve_color(theme: &Theme, color: &ColorRef) -> Rgba {
    color.resolve(&theme.colors, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    const THEME_XML: &str = r#"<?xml version="1.0"?>
    <a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Test Theme">
      <a:themeElements>
        <a:clrScheme name="Test">
          <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
          <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
          <a:dk2><a:srgbClr val="1F497D"/></a:dk2>
          <a:lt2><a:srgbClr val="EEECE1"/></a:lt2>
          <a:accent1><a:srgbClr val="4F81BD"/></a:accent1>
          <a:accent2><a:srgbClr val="C0504D"/></a:accent2>
          <a:accent3><a:srgbClr val="9BBB59"/></a:accent3>
          <a:accent4><a:srgbClr val="8064A2"/></a:accent4>
          <a:accent5><a:srgbClr val="4BACC6"/></a:accent5>
          <a:accent6><a:srgbClr val="F79646"/></a:accent6>
          <a:hlink><a:srgbClr val="0000FF"/></a:hlink>
          <a:folHlink><a:srgbClr val="800080"/></a:folHlink>
        </a:clrScheme>
        <a:fontScheme name="Test">
          <a:majorFont><a:latin typeface="Cambria"/><a:font script="Jpan" typeface="MS Gothic"/></a:majorFont>
          <a:minorFont><a:latin typeface="Calibri"/></a:minorFont>
        </a:fontScheme>
        <a:fmtScheme name="Test">
          <a:fillStyleLst>
            <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
            <a:solidFill><a:schemeClr val="phClr"><a:tint val="50000"/></a:schemeClr></a:solidFill>
          </a:fillStyleLst>
          <a:lnStyleLst>
            <a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
          </a:lnStyleLst>
          <a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>
          <a:bgFillStyleLst>
            <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
          </a:bgFillStyleLst>
        </a:fmtScheme>
      </a:themeElements>
    </a:theme>"#;

    fn parse_theme() -> Theme {
        Theme::from_xml(&XmlParser::parse_str(THEME_XML).unwrap())
    }

    #[test]
    fn test_scheme_colors_parsed() {
        let theme = parse_theme();
        assert_eq!(theme.colors.get("accent1"), Rgba::from_hex("4F81BD").unwrap());
        assert_eq!(theme.colors.get("dk1"), Rgba::BLACK);
        assert_eq!(theme.colors.get("lt1"), Rgba::WHITE);
        // Aliases route through the scheme
        assert_eq!(theme.colors.get("tx1"), Rgba::BLACK);
        assert_eq!(theme.colors.get("bg2"), Rgba::from_hex("EEECE1").unwrap());
    }

    #[test]
    fn test_font_scheme() {
        let theme = parse_theme();
        assert_eq!(theme.fonts.major_latin, "Cambria");
        assert_eq!(theme.fonts.minor_latin, "Calibri");
        assert_eq!(theme.fonts.resolve("+mj-lt"), "Cambria");
        assert_eq!(theme.fonts.resolve("+mn-lt"), "Calibri");
        assert_eq!(theme.fonts.resolve("Arial"), "Arial");
        assert_eq!(
            theme.fonts.major_scripts.get("Jpan").map(|s| s.as_str()),
            Some("MS Gothic")
        );
    }

    #[test]
    fn test_format_scheme_indexing() {
        let theme = parse_theme();
        assert_eq!(theme.formats.fill_styles.len(), 2);
        assert!(theme.fill_style(1).is_some());
        assert!(theme.fill_style(0).is_none());
        assert!(theme.fill_style(1000).is_none());
        // 1001 selects the background list
        assert!(theme.fill_style(1001).is_some());
        assert!(theme.line_style(1).is_some());
    }

    #[test]
    fn test_default_theme_resolves_everything() {
        let theme = Theme::default();
        assert_eq!(theme.colors.get("accent1"), Rgba::from_hex("4472C4").unwrap());
        assert_eq!(theme.fonts.resolve("+mn-lt"), "Calibri");
    }

    #[test]
    fn test_clr_map_remapping() {
        let theme = parse_theme();
        let el = XmlParser::parse_str(
            r#"<p:clrMap xmlns:p="urn:p" bg1="dk1" tx1="lt1" bg2="dk2" tx2="lt2"/>"#,
        )
        .unwrap();
        let map = ClrMap::from_element(&el);
        let remapped = map.apply(&theme.colors);
        // Inverted scheme: background 1 is now the dark color
        assert_eq!(remapped.get("bg1"), Rgba::BLACK);
        assert_eq!(remapped.get("tx1"), Rgba::WHITE);
    }
}
