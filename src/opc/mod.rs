//! Open Packaging Convention (ZIP container) handling

pub mod package;
pub mod packuri;
pub mod relationships;

pub use package::{ContentTypes, Package};
pub use packuri::PackUri;
pub use relationships::{Relationship, RelationshipType, Relationships};
