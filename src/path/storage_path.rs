//! Module `storage_path`
//!
//! Defines `StoragePath`, the immutable value every storage operation is
//! addressed with. A path is `/<user>/[public/]<module>/...`; a trailing `/`
//! marks a folder, anything else is a document.

use std::fmt;
use std::str::FromStr;

use crate::error::PathError;
use crate::path::validation::validate_segment;

/// Literal second segment that marks the public half of a user's namespace.
pub const PUBLIC_SEGMENT: &str = "public";

/// Whether a path names a document or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKind {
    Document,
    Folder,
}

/// A validated storage path.
///
/// Values are produced by [`StoragePath::parse`], which only accepts paths at or
/// below a module root, or by ancestor enumeration and [`StoragePath::user_root`],
/// which also produce the synthetic root folders (`/`, `/<user>/`,
/// `/<user>/public/`). Only the synthetic roots have no module name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoragePath {
    raw: String,
    user_id: String,
    is_public: bool,
    /// Segments below the user (or public) root; the first one is the module.
    segments: Vec<String>,
    kind: PathKind,
}

impl StoragePath {
    /// Parses and validates a path string.
    ///
    /// Rejects anything that does not name a module root or something below
    /// it: `/`, `/admin`, `/admin/`, `/admin/public/`, `///`, relative paths,
    /// empty segments and documents placed directly in a user root.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| PathError::MissingLeadingSlash(raw.to_string()))?;

        let (body, kind) = match body.strip_suffix('/') {
            Some(stripped) => (stripped, PathKind::Folder),
            None => (body, PathKind::Document),
        };

        if body.is_empty() {
            return Err(PathError::NoUserId(raw.to_string()));
        }

        let tokens: Vec<&str> = body.split('/').collect();
        for token in &tokens {
            validate_segment(raw, token)?;
        }

        let user_id = tokens[0];
        let mut rest = &tokens[1..];
        let is_public = rest.first() == Some(&PUBLIC_SEGMENT);
        if is_public {
            rest = &rest[1..];
        }

        if rest.is_empty() {
            return Err(PathError::NoModule(raw.to_string()));
        }
        if kind == PathKind::Document && rest.len() == 1 {
            return Err(PathError::DocumentOutsideModule(raw.to_string()));
        }

        Ok(Self::from_parts(
            user_id,
            is_public,
            rest.iter().map(|s| s.to_string()).collect(),
            kind,
        ))
    }

    /// The root folder of a user's private (`/<user>/`) or public
    /// (`/<user>/public/`) namespace. Listing it yields the user's modules.
    pub fn user_root(user_id: &str, is_public: bool) -> Result<Self, PathError> {
        let raw = format!("/{}/", user_id);
        validate_segment(&raw, user_id)?;
        if user_id.contains('/') {
            return Err(PathError::InvalidSegment {
                path: raw,
                segment: user_id.to_string(),
            });
        }
        Ok(Self::from_parts(user_id, is_public, Vec::new(), PathKind::Folder))
    }

    /// The storage root `/`, first entry of every ancestor chain.
    pub fn storage_root() -> Self {
        Self::from_parts("", false, Vec::new(), PathKind::Folder)
    }

    fn from_parts(user_id: &str, is_public: bool, segments: Vec<String>, kind: PathKind) -> Self {
        let raw = compose(user_id, is_public, &segments, kind);
        Self {
            raw,
            user_id: user_id.to_string(),
            is_public,
            segments,
            kind,
        }
    }

    fn folder_at_depth(&self, depth: usize) -> Self {
        Self::from_parts(
            &self.user_id,
            self.is_public,
            self.segments[..depth].to_vec(),
            PathKind::Folder,
        )
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Empty only for the storage root.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// `None` only for the synthetic root folders.
    pub fn module_name(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == PathKind::Folder
    }

    pub fn is_document(&self) -> bool {
        self.kind == PathKind::Document
    }

    pub fn is_module_root(&self) -> bool {
        self.is_folder() && self.segments.len() == 1
    }

    /// The last segment as it appears in a folder listing (`foo.txt`, `bar/`).
    pub fn name(&self) -> String {
        match self.segments.last() {
            Some(last) if self.is_folder() => format!("{}/", last),
            Some(last) => last.clone(),
            None if self.user_id.is_empty() => String::new(),
            None if self.is_public => format!("{}/", PUBLIC_SEGMENT),
            None => format!("{}/", self.user_id),
        }
    }

    /// The folder containing this path; a folder contains itself.
    pub fn folder_path(&self) -> StoragePath {
        match self.kind {
            PathKind::Folder => self.clone(),
            PathKind::Document => self.folder_at_depth(self.segments.len().saturating_sub(1)),
        }
    }

    /// One level up. `None` at a module root and at the synthetic roots.
    pub fn parent_folder_path(&self) -> Option<StoragePath> {
        match self.kind {
            PathKind::Document => Some(self.folder_path()),
            PathKind::Folder if self.segments.len() > 1 => {
                Some(self.folder_at_depth(self.segments.len() - 1))
            }
            PathKind::Folder => None,
        }
    }

    /// Folders from the storage root `/` down to the containing folder,
    /// inclusive.
    pub fn folder_tree_from_root(&self) -> Vec<StoragePath> {
        let mut tree = vec![Self::storage_root()];
        if self.user_id.is_empty() {
            return tree;
        }

        tree.push(Self::from_parts(&self.user_id, false, Vec::new(), PathKind::Folder));
        if self.is_public {
            tree.push(Self::from_parts(&self.user_id, true, Vec::new(), PathKind::Folder));
        }
        tree.extend(self.folder_tree_from_module_root());
        tree
    }

    /// Same as [`folder_tree_from_root`](Self::folder_tree_from_root) without
    /// the storage, user and public roots.
    pub fn folder_tree_from_module_root(&self) -> Vec<StoragePath> {
        let depth = match self.kind {
            PathKind::Folder => self.segments.len(),
            PathKind::Document => self.segments.len().saturating_sub(1),
        };
        (1..=depth).map(|d| self.folder_at_depth(d)).collect()
    }

    /// Path of the listing entry `name` inside this folder. `name` is a single
    /// segment, with a trailing `/` for folders.
    pub fn child(&self, name: &str) -> Result<StoragePath, PathError> {
        let joined = format!("{}{}", self.raw, name);
        if !self.is_folder() {
            return Err(PathError::InvalidChildName(joined));
        }

        let (segment, kind) = match name.strip_suffix('/') {
            Some(stripped) => (stripped, PathKind::Folder),
            None => (name, PathKind::Document),
        };
        if segment.contains('/') {
            return Err(PathError::InvalidChildName(joined));
        }
        validate_segment(&joined, segment)?;

        if self.user_id.is_empty() {
            // Children of the storage root are user roots.
            return match kind {
                PathKind::Folder => Ok(Self::from_parts(segment, false, Vec::new(), kind)),
                PathKind::Document => Err(PathError::DocumentOutsideModule(joined)),
            };
        }

        if self.segments.is_empty() {
            if kind == PathKind::Document {
                return Err(PathError::DocumentOutsideModule(joined));
            }
            if !self.is_public && segment == PUBLIC_SEGMENT {
                return Ok(Self::from_parts(&self.user_id, true, Vec::new(), kind));
            }
        }

        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self::from_parts(&self.user_id, self.is_public, segments, kind))
    }
}

fn compose(user_id: &str, is_public: bool, segments: &[String], kind: PathKind) -> String {
    let mut raw = String::from("/");
    if user_id.is_empty() {
        return raw;
    }

    raw.push_str(user_id);
    raw.push('/');
    if is_public {
        raw.push_str(PUBLIC_SEGMENT);
        raw.push('/');
    }
    raw.push_str(&segments.join("/"));
    if !segments.is_empty() && kind == PathKind::Folder {
        raw.push('/');
    }
    raw
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for StoragePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
