//! Placeholder inheritance
//!
//! A placeholder shape inherits shape properties, text defaults, and
//! list styles by walking slide -> layout -> master. Resolution is
//! first-defined over that ordered chain, not class inheritance:
//! merge order from lowest to highest precedence is master ->
//! layout -> slide, field-wise.

use crate::oxml::shapes::{Placeholder, ShapeNode, SpProps, StyleRefs};
use crate::oxml::text::{BodyProps, ListStyle};
use crate::oxml::XmlElement;

/// Header/footer visibility flags (`p:hf`); absent attributes mean
/// the element is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HfFlags {
    pub date: bool,
    pub footer: bool,
    pub slide_number: bool,
}

impl Default for HfFlags {
    fn default() -> Self {
        HfFlags {
            date: true,
            footer: true,
            slide_number: true,
        }
    }
}

impl HfFlags {
    /// Parse from the slide layout or master root, layout winning
    pub fn from_parts(layout_root: Option<&XmlElement>, master_root: Option<&XmlElement>) -> Self {
        let hf = layout_root
            .and_then(|r| r.child("hf"))
            .or_else(|| master_root.and_then(|r| r.child("hf")));
        match hf {
            Some(el) => HfFlags {
                date: el.attr_bool("dt").unwrap_or(true),
                footer: el.attr_bool("ftr").unwrap_or(true),
                slide_number: el.attr_bool("sldNum").unwrap_or(true),
            },
            None => HfFlags::default(),
        }
    }

    /// Whether a placeholder of the given type should be painted
    pub fn allows(&self, ph_type: Option<&str>) -> bool {
        match ph_type {
            Some("dt") => self.date,
            Some("ftr") => self.footer,
            Some("sldNum") => self.slide_number,
            _ => true,
        }
    }
}

/// The pieces a placeholder inherits from one chain layer
#[derive(Debug, Clone, Default)]
struct LayerMatch {
    props: SpProps,
    style: StyleRefs,
    body: Option<BodyProps>,
    list_style: ListStyle,
}

/// The merged result for a placeholder shape
#[derive(Debug, Clone, Default)]
pub struct ResolvedPlaceholder {
    /// Shape properties merged field-wise across the chain
    pub props: SpProps,
    /// Style references from the nearest layer that has them
    pub style: StyleRefs,
    /// Body properties from the nearest layer that has them
    pub body: Option<BodyProps>,
    /// List styles merged level-wise, nearest layer first
    pub list_style: ListStyle,
}

/// Resolver over the layout and master shape trees plus the master's
/// text style defaults.
pub struct PlaceholderResolver {
    layout_shapes: Vec<ShapeNode>,
    master_shapes: Vec<ShapeNode>,
    title_style: ListStyle,
    body_style: ListStyle,
    other_style: ListStyle,
}

impl PlaceholderResolver {
    /// An empty resolver for slides without a layout chain
    pub fn empty() -> Self {
        PlaceholderResolver {
            layout_shapes: Vec::new(),
            master_shapes: Vec::new(),
            title_style: ListStyle::default(),
            body_style: ListStyle::default(),
            other_style: ListStyle::default(),
        }
    }

    pub fn new(
        layout_shapes: Vec<ShapeNode>,
        master_shapes: Vec<ShapeNode>,
        master_root: Option<&XmlElement>,
    ) -> Self {
        let tx_styles = master_root.and_then(|root| root.child("txStyles"));
        let style_of = |tag: &str| {
            tx_styles
                .and_then(|s| s.child(tag))
                .map(ListStyle::from_element)
                .unwrap_or_default()
        };
        PlaceholderResolver {
            layout_shapes,
            master_shapes,
            title_style: style_of("titleStyle"),
            body_style: style_of("bodyStyle"),
            other_style: style_of("otherStyle"),
        }
    }

    /// Master text defaults for a placeholder family
    fn master_text_style(&self, ph_type: Option<&str>) -> &ListStyle {
        match ph_type {
            Some("title") | Some("ctrTitle") => &self.title_style,
            Some("body") | Some("subTitle") => &self.body_style,
            None => &self.other_style,
            Some(_) => &self.other_style,
        }
    }

    fn find_in(shapes: &[ShapeNode], ph: &Placeholder) -> Option<LayerMatch> {
        for node in shapes {
            if let ShapeNode::Sp {
                placeholder: Some(candidate),
                props,
                style,
                text,
                ..
            } = node
            {
                if ph.matches(candidate) {
                    return Some(LayerMatch {
                        props: props.clone(),
                        style: style.clone(),
                        body: text.as_ref().map(|t| t.body.clone()),
                        list_style: text
                            .as_ref()
                            .map(|t| t.list_style.clone())
                            .unwrap_or_default(),
                    });
                }
            }
        }
        None
    }

    /// Resolve the inherited pieces for a slide shape with a
    /// placeholder reference. The slide's own properties are layered
    /// on top by the caller via `merge_over`.
    pub fn resolve(&self, ph: &Placeholder) -> ResolvedPlaceholder {
        let layout = Self::find_in(&self.layout_shapes, ph);
        let master = Self::find_in(&self.master_shapes, ph);
        let master_text = self.master_text_style(ph.ph_type.as_deref()).clone();

        // master -> layout, lowest precedence first
        let mut resolved = ResolvedPlaceholder {
            list_style: master_text,
            ..ResolvedPlaceholder::default()
        };
        if let Some(m) = master {
            resolved.props = m.props.merge_over(&resolved.props);
            resolved.style = merge_style(m.style, resolved.style);
            resolved.body = m.body.or(resolved.body);
            resolved.list_style = m.list_style.merge_over(&resolved.list_style);
        }
        if let Some(l) = layout {
            resolved.props = l.props.merge_over(&resolved.props);
            resolved.style = merge_style(l.style, resolved.style);
            resolved.body = l.body.or(resolved.body);
            resolved.list_style = l.list_style.merge_over(&resolved.list_style);
        }
        resolved
    }
}

fn merge_style(over: StyleRefs, base: StyleRefs) -> StyleRefs {
    StyleRefs {
        fill: over.fill.or(base.fill),
        line: over.line.or(base.line),
        font_color: over.font_color.or(base.font_color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::shapes::parse_shape_tree;
    use crate::oxml::{GeometryKind, XmlParser};

    fn shapes(inner: &str) -> Vec<ShapeNode> {
        let xml = format!(
            r#"<p:spTree xmlns:p="urn:p" xmlns:a="urn:a">{inner}</p:spTree>"#
        );
        parse_shape_tree(&XmlParser::parse_str(&xml).unwrap())
    }

    fn title_ph(extra_sp_pr: &str, body: &str) -> String {
        format!(
            r#"<p:sp>
                <p:nvSpPr><p:cNvPr id="2" name="Title"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
                <p:spPr>{extra_sp_pr}</p:spPr>
                <p:txBody><a:bodyPr anchor="ctr"/>{body}<a:p/></p:txBody>
            </p:sp>"#
        )
    }

    #[test]
    fn test_layout_beats_master() {
        let layout = shapes(&title_ph(
            r#"<a:xfrm><a:off x="10" y="10"/><a:ext cx="100" cy="100"/></a:xfrm>"#,
            r#"<a:lstStyle><a:lvl1pPr><a:defRPr sz="4000"/></a:lvl1pPr></a:lstStyle>"#,
        ));
        let master = shapes(&title_ph(
            r#"<a:xfrm><a:off x="99" y="99"/><a:ext cx="999" cy="999"/></a:xfrm>
               <a:prstGeom prst="roundRect"/>"#,
            r#"<a:lstStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400" b="1"/></a:lvl1pPr></a:lstStyle>"#,
        ));
        let resolver = PlaceholderResolver::new(layout, master, None);
        let resolved = resolver.resolve(&Placeholder {
            ph_type: Some("title".to_string()),
            idx: None,
        });

        // Transform from the layout, geometry only on the master
        assert_eq!(resolved.props.transform.unwrap().x, 10);
        assert!(matches!(resolved.props.geometry, GeometryKind::Preset { .. }));
        // Layout's size wins, master's bold and alignment survive
        let lvl = resolved.list_style.level(0).unwrap();
        assert_eq!(lvl.default_run.size_pts, Some(40.0));
        assert_eq!(lvl.default_run.bold, Some(true));
        assert!(lvl.align.is_some());
        // Body properties from the nearest layer that has them
        assert!(resolved.body.is_some());
    }

    #[test]
    fn test_master_text_styles_apply_by_family() {
        let master_root = XmlParser::parse_str(
            r#"<p:sldMaster xmlns:p="urn:p" xmlns:a="urn:a">
                <p:txStyles>
                    <p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle>
                    <p:bodyStyle><a:lvl1pPr><a:defRPr sz="2800"/></a:lvl1pPr></p:bodyStyle>
                    <p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle>
                </p:txStyles>
            </p:sldMaster>"#,
        )
        .unwrap();
        let resolver = PlaceholderResolver::new(Vec::new(), Vec::new(), Some(&master_root));

        let title = resolver.resolve(&Placeholder {
            ph_type: Some("title".to_string()),
            idx: None,
        });
        assert_eq!(
            title.list_style.level(0).unwrap().default_run.size_pts,
            Some(44.0)
        );

        let body = resolver.resolve(&Placeholder {
            ph_type: Some("body".to_string()),
            idx: Some(1),
        });
        assert_eq!(
            body.list_style.level(0).unwrap().default_run.size_pts,
            Some(28.0)
        );
    }

    #[test]
    fn test_no_match_yields_master_defaults_only() {
        let resolver = PlaceholderResolver::empty();
        let resolved = resolver.resolve(&Placeholder {
            ph_type: Some("body".to_string()),
            idx: Some(7),
        });
        assert!(resolved.props.transform.is_none());
        assert!(resolved.body.is_none());
    }

    #[test]
    fn test_hf_flags() {
        let layout = XmlParser::parse_str(
            r#"<p:sldLayout xmlns:p="urn:p"><p:hf ftr="0" sldNum="0"/></p:sldLayout>"#,
        )
        .unwrap();
        let flags = HfFlags::from_parts(Some(&layout), None);
        assert!(flags.date);
        assert!(!flags.footer);
        assert!(!flags.slide_number);
        assert!(flags.allows(Some("dt")));
        assert!(!flags.allows(Some("ftr")));
        assert!(!flags.allows(Some("sldNum")));
        assert!(flags.allows(Some("title")));
        assert!(flags.allows(None));
    }

    #[test]
    fn test_hf_defaults_to_visible() {
        let flags = HfFlags::from_parts(None, None);
        assert!(flags.allows(Some("sldNum")));
    }
}
