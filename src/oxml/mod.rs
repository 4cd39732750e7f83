//! Office XML parsing

pub mod ns;
pub mod shapes;
pub mod text;
pub mod theme;
pub mod xmlchemy;

pub use shapes::{
    ContentChoice, GeometryKind, GraphicKind, NonVisual, Placeholder, ShapeNode, SpProps,
    StyleRefs, parse_shape_tree,
};
pub use text::{
    Align, Anchor, AutoFit, BodyProps, BulletKind, BulletProps, ListStyle, ParaItem, ParaProps,
    Paragraph, Run, RunProps, Spacing, TextBody,
};
pub use theme::{ClrMap, FontScheme, FormatScheme, Theme};
pub use xmlchemy::{XmlAttr, XmlElement, XmlParser};
