#![allow(unused)]

//! # store: the content store notes are read from and artifacts written to
//!
//! [`ContentStore`] is the only way the pipeline touches notes. Paths are
//! logical: forward-slash separated, relative to the vault root, UTF-8 text.
//! [`FsContentStore`] backs it with a directory on disk.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("`{0}` already exists")]
    AlreadyExists(String),
    #[error("`{0}` not found")]
    NotFound(String),
    #[error("invalid path `{0}`")]
    InvalidPath(String),
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn from_io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(path.to_string()),
            std::io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Io {
                path: path.to_string(),
                source,
            },
        }
    }
}

/// A recognized text note is a markdown file.
pub fn is_text_note(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Trait for the document store hosting notes and artifacts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Full text content of the item at `path`.
    async fn read(&self, path: &str) -> Result<String, StoreError>;

    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Create one folder. Reports [`StoreError::AlreadyExists`] if it is already there.
    async fn create_folder(&self, path: &str) -> Result<(), StoreError>;

    /// Create a new file. Fails if one already exists at `path`.
    async fn create(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Replace the full content of an existing file.
    async fn overwrite(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// The item currently focused by the user, if any.
    fn active_item(&self) -> Option<String>;
}

/// Content store backed by a vault directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
    active: Option<String>,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            active: None,
        }
    }

    pub fn with_active(mut self, path: impl Into<String>) -> Self {
        self.active = Some(path.into());
        self
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let logical = Path::new(path);
        let valid = !path.is_empty()
            && logical
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            error!(path, "Rejected path outside the vault");
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(logical))
    }

    /// Writes `content` to a sibling temp file and moves it onto `target`.
    ///
    /// With `replace == false` an existing target is left alone and reported
    /// as [`StoreError::AlreadyExists`]. The temp file is removed on any error.
    fn write_atomic(
        &self,
        path: &str,
        target: &Path,
        content: &str,
        replace: bool,
    ) -> Result<(), StoreError> {
        let dir = target
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::from_io(path, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.flush())
            .map_err(|e| StoreError::from_io(path, e))?;
        let persisted = if replace {
            tmp.persist(target)
        } else {
            tmp.persist_noclobber(target)
        };
        persisted.map_err(|e| StoreError::from_io(path, e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn read(&self, path: &str) -> Result<String, StoreError> {
        let full = self.resolve(path)?;
        let content = tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        debug!(path, size = content.len(), "Read note");
        Ok(content)
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir(&full)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        info!(path, "Created folder");
        Ok(())
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        self.write_atomic(path, &full, content, false)?;
        info!(path, size = content.len(), "Created file");
        Ok(())
    }

    async fn overwrite(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        if !tokio::fs::try_exists(&full)
            .await
            .map_err(|e| StoreError::from_io(path, e))?
        {
            return Err(StoreError::NotFound(path.to_string()));
        }
        self.write_atomic(path, &full, content, true)?;
        info!(path, size = content.len(), "Overwrote file");
        Ok(())
    }

    fn active_item(&self) -> Option<String> {
        self.active.clone()
    }
}
