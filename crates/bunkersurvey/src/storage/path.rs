//! Document paths and per-user collections.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

const SEGMENT_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

fn segment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(SEGMENT_PATTERN).expect("segment pattern is valid"))
}

fn check_segment(path: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::invalid_path(path, "empty segment"));
    }
    if segment == "." || segment == ".." {
        return Err(Error::invalid_path(path, "relative segment"));
    }
    if !segment_regex().is_match(segment) {
        return Err(Error::invalid_path(
            path,
            format!("segment {segment:?} contains characters outside [A-Za-z0-9_.-]"),
        ));
    }
    Ok(())
}

/// A validated slash-separated document path, e.g. `surveys/u1/abc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// Parse and validate a path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for empty paths, empty or relative
    /// segments, and segments with characters outside `[A-Za-z0-9_.-]`.
    pub fn parse(path: &str) -> Result<Self> {
        for segment in path.split('/') {
            check_segment(path, segment)?;
        }
        Ok(Self(path.to_string()))
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `segment` is not a valid segment.
    pub fn child(&self, segment: &str) -> Result<Self> {
        let joined = format!("{}/{}", self.0, segment);
        check_segment(&joined, segment)?;
        Ok(Self(joined))
    }

    /// The path without its last segment, empty for a top-level path.
    #[must_use]
    pub fn parent(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// The last segment.
    #[must_use]
    pub fn key(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, key)| key)
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DocPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Top-level collections of the application store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User profiles, one document per user.
    Users,
    /// Vessel configurations saved by a user.
    VesselConfigs,
    /// Bunker surveys.
    Surveys,
    /// Full on/off-hire condition reports.
    FullReports,
    /// Photograph reports.
    PhotoReports,
}

impl Collection {
    /// Collection name as used in paths.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::VesselConfigs => "vesselConfigs",
            Self::Surveys => "surveys",
            Self::FullReports => "fullReports",
            Self::PhotoReports => "photoReports",
        }
    }

    /// The collection root, e.g. `surveys`.
    #[must_use]
    pub fn root(self) -> DocPath {
        DocPath(self.name().to_string())
    }

    /// The node holding one user's documents, e.g. `surveys/{uid}`.
    ///
    /// For [`Collection::Users`] this is the profile document itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `user_id` is not a valid segment.
    pub fn user_node(self, user_id: &str) -> Result<DocPath> {
        self.root().child(user_id)
    }

    /// One entity of one user, e.g. `surveys/{uid}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if either id is not a valid segment.
    pub fn document(self, user_id: &str, id: &str) -> Result<DocPath> {
        self.user_node(user_id)?.child(id)
    }
}
