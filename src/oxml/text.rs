//! Text body parsing
//!
//! A `txBody` is body properties, a nine-level list style, and an
//! ordered list of paragraphs; each paragraph is paragraph properties
//! plus an ordered list of runs, line breaks, and field runs.

use crate::elements::color::ColorRef;
use crate::oxml::XmlElement;
use crate::util::centipoints_to_points;

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

impl Align {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Align::Left),
            "ctr" => Some(Align::Center),
            "r" => Some(Align::Right),
            "just" => Some(Align::Justify),
            "dist" => Some(Align::Distribute),
            _ => None,
        }
    }
}

/// Vertical anchoring of the text block within the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Top,
    Center,
    Bottom,
}

impl Anchor {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "t" => Some(Anchor::Top),
            "ctr" => Some(Anchor::Center),
            "b" => Some(Anchor::Bottom),
            // Justified/distributed anchoring paints like top
            "just" | "dist" => Some(Anchor::Top),
            _ => None,
        }
    }
}

/// Line/paragraph spacing: a percentage of line height or fixed points
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    Percent(f64),
    Points(f32),
}

impl Spacing {
    fn from_element(el: &XmlElement) -> Option<Self> {
        if let Some(pct) = el.child("spcPct") {
            return pct
                .attr("val")
                .and_then(crate::util::parse_percent)
                .map(Spacing::Percent);
        }
        if let Some(pts) = el.child("spcPts") {
            return pts
                .attr_i64("val")
                .map(|v| Spacing::Points(centipoints_to_points(v)));
        }
        None
    }
}

/// Auto-fit behavior of a text body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AutoFit {
    #[default]
    None,
    /// `normAutofit`: shrink text by the given factors
    Normal { font_scale: f64, line_reduction: f64 },
    /// `spAutoFit`: the shape grows to fit; measure-only at render time
    Shape,
}

/// Body properties (`a:bodyPr`)
#[derive(Debug, Clone, Default)]
pub struct BodyProps {
    pub inset_left: Option<i64>,
    pub inset_top: Option<i64>,
    pub inset_right: Option<i64>,
    pub inset_bottom: Option<i64>,
    pub anchor: Option<Anchor>,
    /// `wrap="none"` disables word wrapping
    pub wrap: bool,
    pub auto_fit: AutoFit,
}

impl BodyProps {
    pub fn from_element(el: &XmlElement) -> Self {
        let auto_fit = if let Some(norm) = el.child("normAutofit") {
            AutoFit::Normal {
                font_scale: norm
                    .attr("fontScale")
                    .and_then(crate::util::parse_percent)
                    .unwrap_or(1.0),
                line_reduction: norm
                    .attr("lnSpcReduction")
                    .and_then(crate::util::parse_percent)
                    .unwrap_or(0.0),
            }
        } else if el.child("spAutoFit").is_some() {
            AutoFit::Shape
        } else {
            AutoFit::None
        };
        BodyProps {
            inset_left: el.attr_i64("lIns"),
            inset_top: el.attr_i64("tIns"),
            inset_right: el.attr_i64("rIns"),
            inset_bottom: el.attr_i64("bIns"),
            anchor: el.attr("anchor").and_then(Anchor::from_attr),
            wrap: el.attr("wrap") != Some("none"),
            auto_fit,
        }
    }
}

/// Run properties (`a:rPr` and `defRPr`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub size_pts: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub color: Option<ColorRef>,
    pub typeface: Option<String>,
}

impl RunProps {
    pub fn from_element(el: &XmlElement) -> Self {
        RunProps {
            size_pts: el.attr_i64("sz").map(centipoints_to_points),
            bold: el.attr_bool("b"),
            italic: el.attr_bool("i"),
            underline: el.attr("u").map(|u| u != "none"),
            strike: el.attr("strike").map(|s| s != "noStrike"),
            color: el.child("solidFill").and_then(ColorRef::from_parent),
            typeface: el
                .child("latin")
                .and_then(|l| l.attr("typeface"))
                .map(|t| t.to_string()),
        }
    }

    /// Layer `self` over `base`: defined fields of `self` win
    pub fn merge_over(&self, base: &RunProps) -> RunProps {
        RunProps {
            size_pts: self.size_pts.or(base.size_pts),
            bold: self.bold.or(base.bold),
            italic: self.italic.or(base.italic),
            underline: self.underline.or(base.underline),
            strike: self.strike.or(base.strike),
            color: self.color.clone().or_else(|| base.color.clone()),
            typeface: self.typeface.clone().or_else(|| base.typeface.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RunProps::default()
    }
}

/// Bullet kind from `pPr`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BulletKind {
    /// No explicit bullet element; inherit from the list style
    #[default]
    Inherit,
    None,
    Char(String),
    AutoNum { num_type: String, start_at: i64 },
    /// Picture bullet; painted as a plain bullet character
    Blip,
}

/// Bullet properties from `pPr`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulletProps {
    pub kind: BulletKind,
    pub color: Option<ColorRef>,
    pub typeface: Option<String>,
    /// Bullet size as a fraction of the text size
    pub size_pct: Option<f64>,
    pub size_pts: Option<f32>,
}

impl BulletProps {
    fn from_ppr(ppr: &XmlElement) -> Self {
        let kind = if ppr.child("buNone").is_some() {
            BulletKind::None
        } else if let Some(auto) = ppr.child("buAutoNum") {
            BulletKind::AutoNum {
                num_type: auto.attr("type").unwrap_or("arabicPeriod").to_string(),
                start_at: auto.attr_i64("startAt").unwrap_or(1),
            }
        } else if let Some(ch) = ppr.child("buChar") {
            BulletKind::Char(ch.attr("char").unwrap_or("\u{2022}").to_string())
        } else if ppr.child("buBlip").is_some() {
            BulletKind::Blip
        } else {
            BulletKind::Inherit
        };
        BulletProps {
            kind,
            color: ppr.child("buClr").and_then(ColorRef::from_parent),
            typeface: ppr
                .child("buFont")
                .and_then(|f| f.attr("typeface"))
                .map(|t| t.to_string()),
            size_pct: ppr
                .child("buSzPct")
                .and_then(|s| s.attr("val"))
                .and_then(crate::util::parse_percent),
            size_pts: ppr
                .child("buSzPts")
                .and_then(|s| s.attr_i64("val"))
                .map(centipoints_to_points),
        }
    }

    /// Layer `self` over `base`
    pub fn merge_over(&self, base: &BulletProps) -> BulletProps {
        BulletProps {
            kind: if self.kind == BulletKind::Inherit {
                base.kind.clone()
            } else {
                self.kind.clone()
            },
            color: self.color.clone().or_else(|| base.color.clone()),
            typeface: self.typeface.clone().or_else(|| base.typeface.clone()),
            size_pct: self.size_pct.or(base.size_pct),
            size_pts: self.size_pts.or(base.size_pts),
        }
    }
}

/// Paragraph properties (`a:pPr` and `lvlNpPr`)
#[derive(Debug, Clone, Default)]
pub struct ParaProps {
    pub level: usize,
    pub align: Option<Align>,
    /// First-line indent in EMU (may be negative for hanging bullets)
    pub indent: Option<i64>,
    /// Left margin in EMU
    pub margin_left: Option<i64>,
    pub line_spacing: Option<Spacing>,
    pub space_before: Option<Spacing>,
    pub space_after: Option<Spacing>,
    pub bullet: BulletProps,
    pub default_run: RunProps,
}

impl ParaProps {
    pub fn from_element(el: &XmlElement) -> Self {
        ParaProps {
            level: el.attr_i64("lvl").unwrap_or(0).clamp(0, 8) as usize,
            align: el.attr("algn").and_then(Align::from_attr),
            indent: el.attr_i64("indent"),
            margin_left: el.attr_i64("marL"),
            line_spacing: el.child("lnSpc").and_then(Spacing::from_element),
            space_before: el.child("spcBef").and_then(Spacing::from_element),
            space_after: el.child("spcAft").and_then(Spacing::from_element),
            bullet: BulletProps::from_ppr(el),
            default_run: el
                .child("defRPr")
                .map(RunProps::from_element)
                .unwrap_or_default(),
        }
    }

    /// Layer `self` over `base`, field-wise
    pub fn merge_over(&self, base: &ParaProps) -> ParaProps {
        ParaProps {
            level: self.level,
            align: self.align.or(base.align),
            indent: self.indent.or(base.indent),
            margin_left: self.margin_left.or(base.margin_left),
            line_spacing: self.line_spacing.or(base.line_spacing),
            space_before: self.space_before.or(base.space_before),
            space_after: self.space_after.or(base.space_after),
            bullet: self.bullet.merge_over(&base.bullet),
            default_run: self.default_run.merge_over(&base.default_run),
        }
    }
}

/// Nine levels of paragraph defaults (`a:lstStyle`, master `bodyStyle`)
#[derive(Debug, Clone, Default)]
pub struct ListStyle {
    levels: [Option<ParaProps>; 9],
}

impl ListStyle {
    pub fn from_element(el: &XmlElement) -> Self {
        let mut style = ListStyle::default();
        for (index, slot) in style.levels.iter_mut().enumerate() {
            let tag = format!("lvl{}pPr", index + 1);
            if let Some(props) = el.child(&tag) {
                *slot = Some(ParaProps::from_element(props));
            }
        }
        style
    }

    pub fn level(&self, level: usize) -> Option<&ParaProps> {
        self.levels.get(level.min(8)).and_then(|l| l.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|l| l.is_none())
    }

    /// Layer `self` over `base`, level by level
    pub fn merge_over(&self, base: &ListStyle) -> ListStyle {
        let mut merged = ListStyle::default();
        for (index, slot) in merged.levels.iter_mut().enumerate() {
            *slot = match (&self.levels[index], &base.levels[index]) {
                (Some(a), Some(b)) => Some(a.merge_over(b)),
                (Some(a), None) => Some(a.clone()),
                (None, Some(b)) => Some(b.clone()),
                (None, None) => None,
            };
        }
        merged
    }
}

/// A literal text run
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub props: RunProps,
    pub text: String,
}

/// One item of a paragraph, in document order
#[derive(Debug, Clone)]
pub enum ParaItem {
    Run(Run),
    /// Explicit line break (`a:br`)
    Break,
    /// Field run (`a:fld`): slide number, date. Carries the cached
    /// literal text plus the field type for render-time substitution.
    Field { field_type: String, run: Run },
}

/// A paragraph: properties plus ordered items
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub props: ParaProps,
    pub items: Vec<ParaItem>,
}

impl Paragraph {
    fn from_element(el: &XmlElement) -> Self {
        let props = el
            .child("pPr")
            .map(ParaProps::from_element)
            .unwrap_or_default();
        let items = el
            .children()
            .iter()
            .filter_map(|child| match child.tag() {
                "r" => Some(ParaItem::Run(Run {
                    props: child
                        .child("rPr")
                        .map(RunProps::from_element)
                        .unwrap_or_default(),
                    text: child.child("t").map(|t| t.text().to_string()).unwrap_or_default(),
                })),
                "br" => Some(ParaItem::Break),
                "fld" => Some(ParaItem::Field {
                    field_type: child.attr("type").unwrap_or("").to_string(),
                    run: Run {
                        props: child
                            .child("rPr")
                            .map(RunProps::from_element)
                            .unwrap_or_default(),
                        text: child.child("t").map(|t| t.text().to_string()).unwrap_or_default(),
                    },
                }),
                _ => None,
            })
            .collect();
        Paragraph { props, items }
    }

    /// Concatenated literal text
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                ParaItem::Run(run) => run.text.as_str(),
                ParaItem::Break => "\n",
                ParaItem::Field { run, .. } => run.text.as_str(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|item| match item {
            ParaItem::Run(run) => run.text.is_empty(),
            ParaItem::Break => true,
            ParaItem::Field { run, .. } => run.text.is_empty(),
        })
    }
}

/// A parsed text body
#[derive(Debug, Clone, Default)]
pub struct TextBody {
    pub body: BodyProps,
    pub list_style: ListStyle,
    pub paragraphs: Vec<Paragraph>,
}

impl TextBody {
    pub fn from_element(el: &XmlElement) -> Self {
        TextBody {
            body: el
                .child("bodyPr")
                .map(BodyProps::from_element)
                .unwrap_or_default(),
            list_style: el
                .child("lstStyle")
                .map(ListStyle::from_element)
                .unwrap_or_default(),
            paragraphs: el.children_named("p").map(Paragraph::from_element).collect(),
        }
    }

    /// All literal text, one string per paragraph
    pub fn all_text(&self) -> Vec<String> {
        self.paragraphs.iter().map(|p| p.text()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    fn parse_body(inner: &str) -> TextBody {
        let xml = format!(r#"<p:txBody xmlns:p="urn:p" xmlns:a="urn:a">{inner}</p:txBody>"#);
        TextBody::from_element(&XmlParser::parse_str(&xml).unwrap())
    }

    #[test]
    fn test_runs_and_breaks_in_order() {
        let body = parse_body(
            r#"<a:bodyPr/><a:p>
                <a:r><a:rPr b="1"/><a:t>Bold </a:t></a:r>
                <a:br/>
                <a:r><a:rPr i="1"/><a:t>Italic</a:t></a:r>
            </a:p>"#,
        );
        let para = &body.paragraphs[0];
        assert_eq!(para.items.len(), 3);
        assert!(matches!(para.items[1], ParaItem::Break));
        assert_eq!(para.text(), "Bold \nItalic");
    }

    #[test]
    fn test_run_props_parsed() {
        let body = parse_body(
            r#"<a:p><a:r>
                <a:rPr sz="2400" b="1" u="sng" strike="sngStrike">
                    <a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>
                    <a:latin typeface="Arial"/>
                </a:rPr>
                <a:t>Styled</a:t>
            </a:r></a:p>"#,
        );
        let ParaItem::Run(run) = &body.paragraphs[0].items[0] else {
            panic!("expected run");
        };
        assert_eq!(run.props.size_pts, Some(24.0));
        assert_eq!(run.props.bold, Some(true));
        assert_eq!(run.props.underline, Some(true));
        assert_eq!(run.props.strike, Some(true));
        assert_eq!(run.props.typeface.as_deref(), Some("Arial"));
        assert!(run.props.color.is_some());
    }

    #[test]
    fn test_body_props() {
        let body = parse_body(
            r#"<a:bodyPr lIns="10" tIns="20" rIns="30" bIns="40" anchor="ctr" wrap="none">
                <a:normAutofit fontScale="62500" lnSpcReduction="20000"/>
            </a:bodyPr><a:p/>"#,
        );
        assert_eq!(body.body.inset_left, Some(10));
        assert_eq!(body.body.inset_bottom, Some(40));
        assert_eq!(body.body.anchor, Some(Anchor::Center));
        assert!(!body.body.wrap);
        assert_eq!(
            body.body.auto_fit,
            AutoFit::Normal {
                font_scale: 0.625,
                line_reduction: 0.2
            }
        );
    }

    #[test]
    fn test_bullet_parsing() {
        let body = parse_body(
            r#"<a:p><a:pPr lvl="1">
                <a:buClr><a:srgbClr val="00FF00"/></a:buClr>
                <a:buSzPct val="75000"/>
                <a:buFont typeface="Wingdings"/>
                <a:buChar char="v"/>
            </a:pPr><a:r><a:t>item</a:t></a:r></a:p>"#,
        );
        let props = &body.paragraphs[0].props;
        assert_eq!(props.level, 1);
        assert_eq!(props.bullet.kind, BulletKind::Char("v".to_string()));
        assert_eq!(props.bullet.size_pct, Some(0.75));
        assert_eq!(props.bullet.typeface.as_deref(), Some("Wingdings"));
    }

    #[test]
    fn test_autonum_bullet() {
        let body = parse_body(
            r#"<a:p><a:pPr><a:buAutoNum type="romanLcParenBoth" startAt="3"/></a:pPr><a:r><a:t>x</a:t></a:r></a:p>"#,
        );
        assert_eq!(
            body.paragraphs[0].props.bullet.kind,
            BulletKind::AutoNum {
                num_type: "romanLcParenBoth".to_string(),
                start_at: 3
            }
        );
    }

    #[test]
    fn test_list_style_levels() {
        let body = parse_body(
            r#"<a:lstStyle>
                <a:lvl1pPr algn="ctr"><a:defRPr sz="4400"/></a:lvl1pPr>
                <a:lvl2pPr><a:defRPr sz="3200"/></a:lvl2pPr>
            </a:lstStyle><a:p/>"#,
        );
        assert_eq!(body.list_style.level(0).unwrap().align, Some(Align::Center));
        assert_eq!(
            body.list_style.level(1).unwrap().default_run.size_pts,
            Some(32.0)
        );
        assert!(body.list_style.level(4).is_none());
    }

    #[test]
    fn test_merge_first_defined_wins() {
        let strong = RunProps {
            size_pts: Some(24.0),
            ..RunProps::default()
        };
        let weak = RunProps {
            size_pts: Some(18.0),
            bold: Some(true),
            ..RunProps::default()
        };
        let merged = strong.merge_over(&weak);
        assert_eq!(merged.size_pts, Some(24.0));
        assert_eq!(merged.bold, Some(true));
    }

    #[test]
    fn test_field_run() {
        let body = parse_body(
            r#"<a:p><a:fld id="{X}" type="slidenum"><a:rPr/><a:t>2</a:t></a:fld></a:p>"#,
        );
        let ParaItem::Field { field_type, run } = &body.paragraphs[0].items[0] else {
            panic!("expected field");
        };
        assert_eq!(field_type, "slidenum");
        assert_eq!(run.text, "2");
    }

    #[test]
    fn test_spacing_variants() {
        let body = parse_body(
            r#"<a:p><a:pPr>
                <a:lnSpc><a:spcPct val="150000"/></a:lnSpc>
                <a:spcBef><a:spcPts val="600"/></a:spcBef>
            </a:pPr><a:r><a:t>x</a:t></a:r></a:p>"#,
        );
        let props = &body.paragraphs[0].props;
        assert_eq!(props.line_spacing, Some(Spacing::Percent(1.5)));
        assert_eq!(props.space_before, Some(Spacing::Points(6.0)));
    }

    #[test]
    fn test_empty_paragraph_detection() {
        let body = parse_body(r#"<a:p/><a:p><a:r><a:t>text</a:t></a:r></a:p>"#);
        assert!(body.paragraphs[0].is_empty());
        assert!(!body.paragraphs[1].is_empty());
        assert!(!body.is_empty());
    }
}
