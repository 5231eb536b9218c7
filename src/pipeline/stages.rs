//! Stage capabilities
//!
//! One trait per core extension point. Implementations are registered by
//! plugins and resolved through the run context.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{Documentable, PageNode, SourceSet};
use crate::types::Result;

/// Turns one analyzed source set into a module documentable
pub trait SourceToDocumentableTranslator: Send + Sync {
    fn translate(&self, source_set: &SourceSet) -> Result<Documentable>;
}

/// Rewrites one source set's module before merging
pub trait DocumentableTransformer: Send + Sync {
    fn transform(&self, module: Documentable) -> Result<Documentable>;
}

/// Folds the per-source-set modules into one
pub trait DocumentableMerger: Send + Sync {
    fn merge(&self, modules: Vec<Documentable>) -> Result<Documentable>;
}

pub trait DocumentableToPageTranslator: Send + Sync {
    fn translate(&self, module: &Documentable) -> Result<PageNode>;
}

/// Rewrites the page tree in place
pub trait PageTransformer: Send + Sync {
    fn transform(&self, root: &mut PageNode) -> Result<()>;
}

/// Writes the page tree out in one output format
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, root: PageNode) -> Result<Vec<RenderedFile>>;
}

/// One file produced by a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

impl RenderedFile {
    pub fn new(path: impl Into<String>, content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        Self {
            path: path.into(),
            bytes: content.len(),
            sha256: digest.iter().map(|b| format!("{:02x}", b)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_file_digest() {
        let file = RenderedFile::new("index.md", "abc");
        assert_eq!(file.bytes, 3);
        assert_eq!(
            file.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
