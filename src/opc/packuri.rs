//! Package URI handling
//!
//! Part paths inside the archive are stored without a leading slash
//! (`ppt/slides/slide1.xml`). Relationship targets resolve relative to
//! the source part's directory.

/// Represents a part path within a package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackUri {
    uri: String,
}

impl PackUri {
    /// Create a new PackUri, stripping any leading slash
    pub fn new(uri: &str) -> Self {
        PackUri {
            uri: uri.trim_start_matches('/').to_string(),
        }
    }

    /// Get the path as a string
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Directory part, without a trailing slash; empty for root parts
    pub fn base_dir(&self) -> &str {
        self.uri.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Filename part
    pub fn filename(&self) -> &str {
        self.uri
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.uri)
    }

    /// The `.rels` part holding this part's outgoing relationships:
    /// `dir/name.ext` -> `dir/_rels/name.ext.rels`
    pub fn rels_path(&self) -> PackUri {
        let dir = self.base_dir();
        if dir.is_empty() {
            PackUri {
                uri: format!("_rels/{}.rels", self.filename()),
            }
        } else {
            PackUri {
                uri: format!("{}/_rels/{}.rels", dir, self.filename()),
            }
        }
    }

    /// Resolve a relationship target against this part.
    ///
    /// Absolute targets (leading `/`) resolve from the package root;
    /// relative targets resolve from this part's directory with `..`
    /// and `.` segments collapsed.
    pub fn resolve(&self, target: &str) -> PackUri {
        if let Some(absolute) = target.strip_prefix('/') {
            return PackUri::new(absolute);
        }
        let mut segments: Vec<&str> = self
            .base_dir()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        for segment in target.split('/') {
            match segment {
                ".." => {
                    segments.pop();
                }
                "." | "" => {}
                s => segments.push(s),
            }
        }
        PackUri {
            uri: segments.join("/"),
        }
    }
}

impl std::fmt::Display for PackUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl From<&str> for PackUri {
    fn from(uri: &str) -> Self {
        PackUri::new(uri)
    }
}

impl From<String> for PackUri {
    fn from(uri: String) -> Self {
        PackUri::new(&uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_creation_strips_leading_slash() {
        let uri = PackUri::new("/ppt/slides/slide1.xml");
        assert_eq!(uri.as_str(), "ppt/slides/slide1.xml");
    }

    #[test]
    fn test_packuri_filename_and_base_dir() {
        let uri = PackUri::new("ppt/slides/slide1.xml");
        assert_eq!(uri.filename(), "slide1.xml");
        assert_eq!(uri.base_dir(), "ppt/slides");
    }

    #[test]
    fn test_rels_path() {
        let uri = PackUri::new("ppt/slides/slide1.xml");
        assert_eq!(uri.rels_path().as_str(), "ppt/slides/_rels/slide1.xml.rels");

        let pres = PackUri::new("ppt/presentation.xml");
        assert_eq!(pres.rels_path().as_str(), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_resolve_relative_with_parent_dir() {
        let uri = PackUri::new("ppt/slides/slide1.xml");
        let resolved = uri.resolve("../media/image3.png");
        assert_eq!(resolved.as_str(), "ppt/media/image3.png");
    }

    #[test]
    fn test_resolve_sibling() {
        let uri = PackUri::new("ppt/_rels/presentation.xml.rels");
        assert_eq!(
            PackUri::new("ppt/presentation.xml")
                .resolve("slides/slide2.xml")
                .as_str(),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(uri.base_dir(), "ppt/_rels");
    }

    #[test]
    fn test_resolve_absolute() {
        let uri = PackUri::new("ppt/slides/slide1.xml");
        assert_eq!(
            uri.resolve("/ppt/media/image1.png").as_str(),
            "ppt/media/image1.png"
        );
    }
}
