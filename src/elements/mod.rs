//! Element types shared across parsing and rendering

pub mod color;
pub mod geometry;
pub mod path;
pub mod transform;

pub use color::{ColorBase, ColorModifier, ColorRef, Rgba, SchemeColors};
pub use path::{Path, PathCmd, Pt};
pub use transform::{ChildSpace, EmuRect, PxRect, Transform};
