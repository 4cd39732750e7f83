//! Shape tree parsing
//!
//! Walks `p:spTree` into a tagged union of shape nodes, preserving
//! document order. Later siblings paint over earlier ones.

use crate::elements::geometry::{AdjustValues, parse_adjust_values};
use crate::elements::color::ColorRef;
use crate::elements::transform::Transform;
use crate::oxml::text::TextBody;
use crate::oxml::XmlElement;

/// Non-visual properties common to all shape kinds
#[derive(Debug, Clone, Default)]
pub struct NonVisual {
    pub id: u32,
    pub name: String,
}

impl NonVisual {
    fn from_nv_pr(nv: Option<&XmlElement>) -> Self {
        let c_nv_pr = nv.and_then(|n| n.child("cNvPr"));
        NonVisual {
            id: c_nv_pr
                .and_then(|c| c.attr_i64("id"))
                .unwrap_or(0) as u32,
            name: c_nv_pr
                .and_then(|c| c.attr("name"))
                .unwrap_or("")
                .to_string(),
        }
    }
}

/// A placeholder reference (`p:ph`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

impl Placeholder {
    fn from_nv_pr(nv: Option<&XmlElement>) -> Option<Self> {
        let ph = nv?.find_descendant("ph")?;
        Some(Placeholder {
            ph_type: ph.attr("type").map(|t| t.to_string()),
            idx: ph.attr_i64("idx").map(|i| i as u32),
        })
    }

    /// Whether two placeholder references select the same slot: equal
    /// `(type, idx)`, or equal type when either idx is absent. Title
    /// variants are equivalent, and an absent type is compatible with
    /// any type when both indices agree.
    pub fn matches(&self, other: &Placeholder) -> bool {
        fn norm(t: &Option<String>) -> Option<&str> {
            match t.as_deref() {
                Some("ctrTitle") => Some("title"),
                other => other,
            }
        }
        let types_equal = match (norm(&self.ph_type), norm(&other.ph_type)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let types_compatible = match (norm(&self.ph_type), norm(&other.ph_type)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        match (self.idx, other.idx) {
            (Some(a), Some(b)) => a == b && types_compatible,
            _ => types_equal,
        }
    }
}

/// Shape geometry source
#[derive(Debug, Clone, Default)]
pub enum GeometryKind {
    /// No explicit geometry; placeholders inherit, otherwise rect
    #[default]
    Unspecified,
    Preset {
        name: String,
        adjust: AdjustValues,
    },
    Custom(XmlElement),
}

/// Indexed style references from `p:style`
#[derive(Debug, Clone, Default)]
pub struct StyleRefs {
    pub fill: Option<(u32, ColorRef)>,
    pub line: Option<(u32, ColorRef)>,
    pub font_color: Option<ColorRef>,
}

impl StyleRefs {
    fn from_style(style: Option<&XmlElement>) -> Self {
        let parse_ref = |tag: &str| -> Option<(u32, ColorRef)> {
            let r = style?.child(tag)?;
            let idx = r.attr_i64("idx").unwrap_or(0) as u32;
            let color = ColorRef::from_parent(r)?;
            Some((idx, color))
        };
        StyleRefs {
            fill: parse_ref("fillRef"),
            line: parse_ref("lnRef"),
            font_color: style
                .and_then(|s| s.child("fontRef"))
                .and_then(ColorRef::from_parent),
        }
    }
}

/// Visual shape properties parsed from `p:spPr`
#[derive(Debug, Clone, Default)]
pub struct SpProps {
    pub transform: Option<Transform>,
    pub geometry: GeometryKind,
    /// The fill element itself (`solidFill`, `gradFill`, ...), if any
    pub fill: Option<XmlElement>,
    /// The outline element (`a:ln`), if any
    pub outline: Option<XmlElement>,
}

const FILL_TAGS: [&str; 6] = [
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
];

impl SpProps {
    pub fn from_sp_pr(sp_pr: Option<&XmlElement>) -> Self {
        let Some(sp_pr) = sp_pr else {
            return SpProps::default();
        };
        let geometry = if let Some(preset) = sp_pr.child("prstGeom") {
            GeometryKind::Preset {
                name: preset.attr("prst").unwrap_or("rect").to_string(),
                adjust: parse_adjust_values(preset.child("avLst")),
            }
        } else if let Some(custom) = sp_pr.child("custGeom") {
            GeometryKind::Custom(custom.clone())
        } else {
            GeometryKind::Unspecified
        };
        SpProps {
            transform: sp_pr.child("xfrm").map(Transform::from_xfrm),
            geometry,
            fill: sp_pr
                .children()
                .iter()
                .find(|c| FILL_TAGS.contains(&c.tag()))
                .cloned(),
            outline: sp_pr.child("ln").cloned(),
        }
    }

    /// Layer `self` over `base`, field-wise (placeholder inheritance)
    pub fn merge_over(&self, base: &SpProps) -> SpProps {
        SpProps {
            transform: self.transform.or(base.transform),
            geometry: match &self.geometry {
                GeometryKind::Unspecified => base.geometry.clone(),
                other => other.clone(),
            },
            fill: self.fill.clone().or_else(|| base.fill.clone()),
            outline: self.outline.clone().or_else(|| base.outline.clone()),
        }
    }
}

/// Content of a graphic frame
#[derive(Debug, Clone)]
pub enum GraphicKind {
    Table(XmlElement),
    Chart { rel_id: String },
    Other { uri: String },
}

/// One alternate-content branch
#[derive(Debug, Clone)]
pub struct ContentChoice {
    /// Namespace prefixes listed in `Requires`
    pub requires: Vec<String>,
    pub shapes: Vec<ShapeNode>,
}

/// A node of the slide shape tree
#[derive(Debug, Clone)]
pub enum ShapeNode {
    Sp {
        nv: NonVisual,
        placeholder: Option<Placeholder>,
        props: SpProps,
        style: StyleRefs,
        text: Option<TextBody>,
        /// `useBgFill`: the shape paints the slide background fill
        use_bg_fill: bool,
    },
    Pic {
        nv: NonVisual,
        props: SpProps,
        /// The `p:blipFill` element, parsed downstream by the picture renderer
        blip_fill: Option<XmlElement>,
    },
    GrpSp {
        nv: NonVisual,
        /// The group `a:xfrm`, kept raw for child-space extraction
        xfrm: Option<XmlElement>,
        children: Vec<ShapeNode>,
    },
    GraphicFrame {
        nv: NonVisual,
        transform: Option<Transform>,
        kind: GraphicKind,
    },
    Cxn {
        nv: NonVisual,
        props: SpProps,
        style: StyleRefs,
    },
    AlternateContent {
        choices: Vec<ContentChoice>,
        fallback: Vec<ShapeNode>,
    },
}

impl ShapeNode {
    /// Shape id where the node has one (alternate content does not)
    pub fn id(&self) -> Option<u32> {
        match self {
            ShapeNode::Sp { nv, .. }
            | ShapeNode::Pic { nv, .. }
            | ShapeNode::GrpSp { nv, .. }
            | ShapeNode::GraphicFrame { nv, .. }
            | ShapeNode::Cxn { nv, .. } => Some(nv.id),
            ShapeNode::AlternateContent { .. } => None,
        }
    }
}

/// Parse the children of a `p:spTree` (or nested `p:grpSp`) into
/// shape nodes, in document order.
pub fn parse_shape_tree(tree: &XmlElement) -> Vec<ShapeNode> {
    tree.children()
        .iter()
        .filter_map(parse_shape_node)
        .collect()
}

fn parse_shape_node(el: &XmlElement) -> Option<ShapeNode> {
    match el.tag() {
        "sp" => {
            let nv = el.child("nvSpPr");
            Some(ShapeNode::Sp {
                nv: NonVisual::from_nv_pr(nv),
                placeholder: Placeholder::from_nv_pr(nv),
                props: SpProps::from_sp_pr(el.child("spPr")),
                style: StyleRefs::from_style(el.child("style")),
                text: el.child("txBody").map(TextBody::from_element),
                use_bg_fill: el.attr_bool("useBgFill").unwrap_or(false),
            })
        }
        "pic" => Some(ShapeNode::Pic {
            nv: NonVisual::from_nv_pr(el.child("nvPicPr")),
            props: SpProps::from_sp_pr(el.child("spPr")),
            blip_fill: el.child("blipFill").cloned(),
        }),
        "grpSp" => Some(ShapeNode::GrpSp {
            nv: NonVisual::from_nv_pr(el.child("nvGrpSpPr")),
            xfrm: el.child("grpSpPr").and_then(|p| p.child("xfrm")).cloned(),
            children: parse_shape_tree(el),
        }),
        "graphicFrame" => {
            let graphic_data = el
                .child("graphic")
                .and_then(|g| g.child("graphicData"));
            let kind = match graphic_data {
                Some(data) => {
                    if let Some(tbl) = data.child("tbl") {
                        GraphicKind::Table(tbl.clone())
                    } else if let Some(chart) = data.child("chart") {
                        GraphicKind::Chart {
                            rel_id: chart.attr("r:id").unwrap_or("").to_string(),
                        }
                    } else {
                        GraphicKind::Other {
                            uri: data.attr("uri").unwrap_or("").to_string(),
                        }
                    }
                }
                None => GraphicKind::Other { uri: String::new() },
            };
            Some(ShapeNode::GraphicFrame {
                nv: NonVisual::from_nv_pr(el.child("nvGraphicFramePr")),
                transform: el.child("xfrm").map(Transform::from_xfrm),
                kind,
            })
        }
        "cxnSp" => Some(ShapeNode::Cxn {
            nv: NonVisual::from_nv_pr(el.child("nvCxnSpPr")),
            props: SpProps::from_sp_pr(el.child("spPr")),
            style: StyleRefs::from_style(el.child("style")),
        }),
        "AlternateContent" => {
            let choices = el
                .children_named("Choice")
                .map(|choice| ContentChoice {
                    requires: choice
                        .attr("Requires")
                        .map(|r| r.split_whitespace().map(|s| s.to_string()).collect())
                        .unwrap_or_default(),
                    shapes: parse_shape_tree(choice),
                })
                .collect();
            let fallback = el
                .child("Fallback")
                .map(parse_shape_tree)
                .unwrap_or_default();
            Some(ShapeNode::AlternateContent { choices, fallback })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::XmlParser;

    fn parse_tree(inner: &str) -> Vec<ShapeNode> {
        let xml = format!(
            r#"<p:spTree xmlns:p="urn:p" xmlns:a="urn:a" xmlns:r="urn:r" xmlns:mc="urn:mc">
                <p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr>
                <p:grpSpPr/>
                {inner}
            </p:spTree>"#
        );
        parse_shape_tree(&XmlParser::parse_str(&xml).unwrap())
    }

    const SIMPLE_SP: &str = r#"<p:sp>
        <p:nvSpPr><p:cNvPr id="4" name="Rect 3"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
        <p:spPr>
            <a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm>
            <a:prstGeom prst="roundRect"><a:avLst><a:gd name="adj" fmla="val 25000"/></a:avLst></a:prstGeom>
            <a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>
            <a:ln w="25400"><a:solidFill><a:srgbClr val="000000"/></a:solidFill></a:ln>
        </p:spPr>
        <p:txBody><a:bodyPr/><a:p><a:r><a:t>hello</a:t></a:r></a:p></p:txBody>
    </p:sp>"#;

    #[test]
    fn test_parse_sp() {
        let nodes = parse_tree(SIMPLE_SP);
        assert_eq!(nodes.len(), 1);
        let ShapeNode::Sp {
            nv, props, text, ..
        } = &nodes[0]
        else {
            panic!("expected sp");
        };
        assert_eq!(nv.id, 4);
        assert_eq!(nv.name, "Rect 3");
        let t = props.transform.unwrap();
        assert_eq!((t.x, t.y, t.w, t.h), (100, 200, 300, 400));
        let GeometryKind::Preset { name, adjust } = &props.geometry else {
            panic!("expected preset");
        };
        assert_eq!(name, "roundRect");
        assert_eq!(adjust.get("adj"), Some(&25_000.0));
        assert_eq!(props.fill.as_ref().unwrap().tag(), "solidFill");
        assert!(props.outline.is_some());
        assert_eq!(text.as_ref().unwrap().all_text(), vec!["hello"]);
    }

    #[test]
    fn test_placeholder_ref() {
        let nodes = parse_tree(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/>
               <p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
        );
        let ShapeNode::Sp { placeholder, .. } = &nodes[0] else {
            panic!()
        };
        let ph = placeholder.as_ref().unwrap();
        assert_eq!(ph.ph_type.as_deref(), Some("title"));
        assert_eq!(ph.idx, None);
    }

    #[test]
    fn test_placeholder_matching() {
        let title = Placeholder {
            ph_type: Some("title".to_string()),
            idx: None,
        };
        let ctr_title = Placeholder {
            ph_type: Some("ctrTitle".to_string()),
            idx: None,
        };
        assert!(title.matches(&ctr_title));

        let body_1 = Placeholder {
            ph_type: Some("body".to_string()),
            idx: Some(1),
        };
        let idx_only = Placeholder {
            ph_type: None,
            idx: Some(1),
        };
        assert!(body_1.matches(&idx_only));
        assert!(!body_1.matches(&Placeholder {
            ph_type: Some("body".to_string()),
            idx: Some(2)
        }));
    }

    #[test]
    fn test_group_nesting_preserves_order() {
        let nodes = parse_tree(&format!(
            r#"<p:grpSp>
                <p:nvGrpSpPr><p:cNvPr id="10" name="Group"/></p:nvGrpSpPr>
                <p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/>
                    <a:chOff x="0" y="0"/><a:chExt cx="50" cy="50"/></a:xfrm></p:grpSpPr>
                {SIMPLE_SP}
                <p:pic><p:nvPicPr><p:cNvPr id="7" name="Picture"/></p:nvPicPr>
                    <p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic>
            </p:grpSp>"#
        ));
        let ShapeNode::GrpSp { xfrm, children, .. } = &nodes[0] else {
            panic!("expected group");
        };
        assert!(xfrm.is_some());
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], ShapeNode::Sp { .. }));
        assert!(matches!(children[1], ShapeNode::Pic { .. }));
    }

    #[test]
    fn test_graphic_frame_table() {
        let nodes = parse_tree(
            r#"<p:graphicFrame>
                <p:nvGraphicFramePr><p:cNvPr id="5" name="Table 4"/></p:nvGraphicFramePr>
                <p:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></p:xfrm>
                <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">
                    <a:tbl/>
                </a:graphicData></a:graphic>
            </p:graphicFrame>"#,
        );
        let ShapeNode::GraphicFrame { kind, .. } = &nodes[0] else {
            panic!()
        };
        assert!(matches!(kind, GraphicKind::Table(_)));
    }

    #[test]
    fn test_alternate_content() {
        let nodes = parse_tree(&format!(
            r#"<mc:AlternateContent>
                <mc:Choice Requires="p14">{SIMPLE_SP}</mc:Choice>
                <mc:Fallback>{SIMPLE_SP}</mc:Fallback>
            </mc:AlternateContent>"#
        ));
        let ShapeNode::AlternateContent { choices, fallback } = &nodes[0] else {
            panic!()
        };
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].requires, vec!["p14"]);
        assert_eq!(choices[0].shapes.len(), 1);
        assert_eq!(fallback.len(), 1);
    }

    #[test]
    fn test_cxn_parsed_like_sp() {
        let nodes = parse_tree(
            r#"<p:cxnSp>
                <p:nvCxnSpPr><p:cNvPr id="9" name="Connector 8"/></p:nvCxnSpPr>
                <p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="500" cy="0"/></a:xfrm>
                    <a:prstGeom prst="line"/></p:spPr>
            </p:cxnSp>"#,
        );
        let ShapeNode::Cxn { props, .. } = &nodes[0] else {
            panic!()
        };
        assert!(matches!(props.geometry, GeometryKind::Preset { .. }));
    }
}
