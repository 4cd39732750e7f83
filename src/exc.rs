//! Error types for the pptx renderer

use thiserror::Error;

/// Base error type for the renderer
#[derive(Error, Debug)]
pub enum PptxError {
    /// The container is not a readable package (bad ZIP, missing
    /// `[Content_Types].xml`, truncated archive).
    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("XML parse error in {part}: {message}")]
    XmlParse { part: String, message: String },

    #[error("Relationship error: {0}")]
    Relationship(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Media decode error in {part}: {message}")]
    MediaDecode { part: String, message: String },

    #[error("Render error on slide {slide}: {source}")]
    Render {
        slide: usize,
        #[source]
        source: Box<PptxError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl PptxError {
    /// Wrap any error as a per-slide render failure.
    pub fn on_slide(self, slide: usize) -> Self {
        PptxError::Render {
            slide,
            source: Box::new(self),
        }
    }
}

impl From<zip::result::ZipError> for PptxError {
    fn from(err: zip::result::ZipError) -> Self {
        PptxError::Archive(format!("ZIP read failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PptxError>;
