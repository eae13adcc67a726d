//! Where artifacts go, and which notes are never read as input.
//!
//! All paths here are logical, forward-slash separated and relative to the
//! vault root. Nothing in this module touches the filesystem.

use crate::config::Configuration;
use tracing::debug;

/// Why a note is not distilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The note lives under the output root, so it is itself an artifact.
    OutputArtifact,
    /// The note lives under one of the excluded folders.
    Excluded(String),
    /// The note has no content once trimmed.
    EmptySource,
    /// The note content already starts with the tag marker.
    AlreadyGenerated,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OutputArtifact => write!(f, "note is inside the flashcard folder"),
            SkipReason::Excluded(folder) => write!(f, "note is inside excluded folder `{folder}`"),
            SkipReason::EmptySource => write!(f, "note is empty"),
            SkipReason::AlreadyGenerated => write!(f, "note is already a flashcard file"),
        }
    }
}

pub fn normalize_root(root: &str) -> &str {
    root.trim().trim_end_matches('/')
}

/// Segment-aware prefix test: `Flashcards2/x` is not under `Flashcards`.
pub fn is_same_or_nested(path: &str, root: &str) -> bool {
    let root = normalize_root(root);
    if root.is_empty() {
        return false;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn skip_reason(path: &str, config: &Configuration) -> Option<SkipReason> {
    if is_same_or_nested(path, &config.output_root) {
        debug!(path, root = %config.output_root, "Path is under the output root");
        return Some(SkipReason::OutputArtifact);
    }
    let excluded = config
        .excluded_paths
        .iter()
        .find(|folder| is_same_or_nested(path, folder))?;
    debug!(path, folder = %excluded, "Path is under an excluded folder");
    Some(SkipReason::Excluded(normalize_root(excluded).to_string()))
}

pub fn should_skip(path: &str, config: &Configuration) -> bool {
    skip_reason(path, config).is_some()
}

pub fn destination_path(source_path: &str, config: &Configuration) -> String {
    format!("{}/{}", normalize_root(&config.output_root), source_path)
}

/// Every ancestor folder of `path`, shallowest first.
pub fn parent_folders(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .map(|depth| segments[..depth].join("/"))
        .collect()
}

/// Removes the extension of the final segment only; dots in folder names are kept.
pub fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

/// `#label`, the tag without a path segment.
pub fn bare_tag(tag_label: &str) -> String {
    format!("#{tag_label}")
}

/// `#label/`, the prefix that marks content as a generated artifact.
pub fn tag_marker(config: &Configuration) -> String {
    format!("{}/", bare_tag(&config.tag_label))
}

pub fn tag_line(source_path: &str, config: &Configuration) -> String {
    format!("{}{}", tag_marker(config), strip_extension(source_path))
}
