//! PowerPoint (.pptx) rendering library
//!
//! Renders PowerPoint 2007+ presentations to raster images, one
//! bitmap per slide, for server-side thumbnailing, preview
//! generation, and visual-fidelity testing.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pptx_raster::{Presentation, RenderOptions};
//!
//! let pres = Presentation::open("deck.pptx").unwrap();
//! let report = pres.render(&RenderOptions::new(1920));
//! for slide in &report.slides {
//!     if slide.success {
//!         std::fs::write(format!("slide-{}.png", slide.slide_number), &slide.image_data).unwrap();
//!     }
//! }
//! ```
//!
//! # Module Organization
//!
//! - **opc** - Open Packaging Convention (ZIP) part store and relationships
//! - **oxml** - Office XML parsing: ordered trees, theme, text, shape tree
//! - **elements** - Color, transform, path, and geometry types
//! - **render** - The rendering pipeline: fills, strokes, text, dispatch
//! - **api** - The `Presentation` facade
//! - **exc** - Error types

pub mod api;
pub mod constants;
pub mod elements;
pub mod exc;
pub mod opc;
pub mod oxml;
pub mod render;
pub mod util;

// Re-exports for convenience
pub use api::{Presentation, PresentationInfo};
pub use elements::{ColorRef, Rgba, Transform};
pub use exc::{PptxError, Result};
pub use oxml::{Theme, XmlElement, XmlParser};
pub use render::{
    OutputFormat, RenderOptions, RenderReport, SlideRender,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
