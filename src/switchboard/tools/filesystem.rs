//! Directory listing confined to a root directory.
//!
//! The filesystem agent lists directories through a [`DirectoryLister`]. Two implementations:
//!
//! - [`LocalDirectoryLister`] reads the local disk under a fixed root. Absolute paths are
//!   rejected and every path is canonicalized (resolving `..` and symlinks) before it is
//!   compared against the canonical root, so nothing outside the root can be listed.
//! - [`HttpDirectoryLister`] calls the application's `/api/fs/list` endpoint, which applies the
//!   same restriction server-side.
//!
//! ```ignore
//! use switchboard::tools::filesystem::{DirectoryLister, LocalDirectoryLister};
//!
//! let lister = LocalDirectoryLister::new("/srv/workspace");
//! for entry in lister.list("src").await? {
//!     println!("{} (dir: {})", entry.name, entry.is_directory);
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::switchboard::agent::{AgentError, DirectoryEntry};
use crate::switchboard::tools::http_client::HttpClient;

pub const FS_LIST_PATH: &str = "/api/fs/list";

/// Errors that can occur while listing a directory
#[derive(Debug, Clone, PartialEq)]
pub enum FileSystemError {
    /// Path escapes the allowed root directory
    PathTraversal(String),
    NotFound(String),
    NotADirectory(String),
    /// IO error with context
    IOError(String),
    InvalidPath(String),
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemError::PathTraversal(msg) => {
                write!(f, "Path traversal attempt blocked: {}", msg)
            }
            FileSystemError::NotFound(msg) => write!(f, "Directory not found: {}", msg),
            FileSystemError::NotADirectory(msg) => write!(f, "Not a directory: {}", msg),
            FileSystemError::IOError(msg) => write!(f, "IO error: {}", msg),
            FileSystemError::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
        }
    }
}

impl Error for FileSystemError {}

impl From<FileSystemError> for AgentError {
    fn from(err: FileSystemError) -> Self {
        match err {
            FileSystemError::PathTraversal(_) | FileSystemError::InvalidPath(_) => {
                AgentError::InvalidInput(err.to_string())
            }
            FileSystemError::NotFound(_) | FileSystemError::NotADirectory(_) => {
                AgentError::NotFound(err.to_string())
            }
            FileSystemError::IOError(_) => AgentError::Service(err.to_string()),
        }
    }
}

#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Entries of the directory at `path`, relative to the lister's root.
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, AgentError>;
}

/// Lists directories on the local disk under `root`.
#[derive(Debug, Clone)]
pub struct LocalDirectoryLister {
    root: PathBuf,
}

impl LocalDirectoryLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for `path` inside the root, or why it is not allowed.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FileSystemError> {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return Err(FileSystemError::InvalidPath(
                "Absolute paths are not allowed".to_string(),
            ));
        }

        let root_canonical = self
            .root
            .canonicalize()
            .map_err(|e| FileSystemError::IOError(format!("Cannot canonicalize root: {}", e)))?;
        let target = root_canonical.join(requested);
        if !target.exists() {
            return Err(FileSystemError::NotFound(path.to_string()));
        }
        let canonical = target
            .canonicalize()
            .map_err(|e| FileSystemError::IOError(format!("Cannot canonicalize path: {}", e)))?;

        if !canonical.starts_with(&root_canonical) {
            return Err(FileSystemError::PathTraversal(format!(
                "'{}' resolves outside the root directory",
                path
            )));
        }
        if !canonical.is_dir() {
            return Err(FileSystemError::NotADirectory(path.to_string()));
        }
        Ok(canonical)
    }

    /// Read the directory at `path`, sorted by name.
    pub async fn read_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, FileSystemError> {
        let dir = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| FileSystemError::IOError(e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FileSystemError::IOError(e.to_string()))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FileSystemError::IOError(e.to_string()))?;
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_file: file_type.is_file(),
                is_directory: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[async_trait]
impl DirectoryLister for LocalDirectoryLister {
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, AgentError> {
        Ok(self.read_directory(path).await?)
    }
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    entries: Option<Vec<DirectoryEntry>>,
    #[serde(default)]
    error: Option<String>,
}

/// Lists directories through the application's listing endpoint.
#[derive(Debug, Clone)]
pub struct HttpDirectoryLister {
    client: HttpClient,
}

impl HttpDirectoryLister {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: HttpClient::new(base_url),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl DirectoryLister for HttpDirectoryLister {
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, AgentError> {
        let response = self
            .client
            .post(FS_LIST_PATH, serde_json::json!({ "dir": path }))
            .await
            .map_err(|e| AgentError::Service(e.to_string()))?;
        let parsed: Option<ListResponse> = serde_json::from_str(&response.body).ok();

        if !response.is_success() {
            let message = parsed
                .and_then(|p| p.error)
                .unwrap_or_else(|| format!("FS list failed: {}", response.status));
            return Err(AgentError::Service(message));
        }
        parsed
            .and_then(|p| p.entries)
            .ok_or_else(|| AgentError::Service("FS list returned no entries".to_string()))
    }
}
