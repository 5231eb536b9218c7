//! Output writers

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Component, Path, PathBuf};

use crate::types::{DocError, Result};

/// Sink for rendered files, addressed by output-relative path
#[async_trait]
pub trait OutputWriter: Send + Sync {
    async fn write(&self, path: &str, content: &str) -> Result<()>;
}

/// Writes below an output directory
pub struct FileWriter {
    root: PathBuf,
}

impl FileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || path.is_empty() {
            return Err(DocError::render(path, "path escapes the output directory"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl OutputWriter for FileWriter {
    async fn write(&self, path: &str, content: &str) -> Result<()> {
        let target = self.target(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        Ok(())
    }
}

/// Keeps rendered files in memory
#[derive(Default)]
pub struct MemoryWriter {
    files: DashMap<String, String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    /// Written paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl OutputWriter for MemoryWriter {
    async fn write(&self, path: &str, content: &str) -> Result<()> {
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }
}
