//! Page merging
//!
//! Sibling pages sharing a name (overloads, or declarations that diverge
//! between source sets) are folded through the resolved merge strategies in
//! order until at most one page is left.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{ContentNode, PageKind, PageNode};
use crate::pipeline::PageTransformer;
use crate::types::Result;

/// One way of collapsing same-named sibling pages
pub trait PageMergerStrategy: Send + Sync {
    /// Return the pages unchanged when the strategy does not apply
    fn try_merge(&self, pages: Vec<PageNode>, path: &[String]) -> Vec<PageNode>;
}

/// Folds overloads of one member into a single page
pub struct SameMethodNameMerger;

impl PageMergerStrategy for SameMethodNameMerger {
    fn try_merge(&self, pages: Vec<PageNode>, path: &[String]) -> Vec<PageNode> {
        if pages.iter().any(|p| p.kind != PageKind::Member) {
            return pages;
        }

        let mut pages = pages.into_iter();
        let Some(mut merged) = pages.next() else {
            return Vec::new();
        };
        for page in pages {
            merged.dris.extend(page.dris);
            merged.source_sets.extend(page.source_sets);
            merged
                .content
                .extend(page.content.into_iter().filter(|c| !is_title(c)));
            merged.children.extend(page.children);
        }
        debug!(
            "Merged {} overloads of {}/{}",
            merged.dris.len(),
            path.join("/"),
            merged.name
        );

        vec![merged]
    }
}

/// Keeps the first page and drops the rest
pub struct FallbackMerger;

impl PageMergerStrategy for FallbackMerger {
    fn try_merge(&self, mut pages: Vec<PageNode>, path: &[String]) -> Vec<PageNode> {
        if pages.len() > 1 {
            warn!(
                "Page {}/{} was merged with the fallback strategy, {} page(s) dropped",
                path.join("/"),
                pages[0].name,
                pages.len() - 1
            );
            pages.truncate(1);
        }
        pages
    }
}

fn is_title(content: &ContentNode) -> bool {
    matches!(content, ContentNode::Header { level: 1, .. })
}

// =============================================================================
// Transformer
// =============================================================================

/// Page transformer applying the merge strategies in resolved order
pub struct PageMerger {
    strategies: Vec<Arc<dyn PageMergerStrategy>>,
}

impl PageMerger {
    pub fn new(strategies: Vec<Arc<dyn PageMergerStrategy>>) -> Self {
        Self { strategies }
    }

    fn merge_children(&self, page: &mut PageNode, path: &mut Vec<String>) {
        let children = std::mem::take(&mut page.children);

        let mut groups: Vec<Vec<PageNode>> = Vec::new();
        for child in children {
            match groups.iter_mut().find(|g| g[0].name == child.name) {
                Some(group) => group.push(child),
                None => groups.push(vec![child]),
            }
        }

        path.push(page.name.clone());
        for mut group in groups {
            for strategy in &self.strategies {
                if group.len() <= 1 {
                    break;
                }
                group = strategy.try_merge(group, path);
            }
            page.children.extend(group);
        }
        for child in &mut page.children {
            self.merge_children(child, path);
        }
        path.pop();
    }
}

impl PageTransformer for PageMerger {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        self.merge_children(root, &mut Vec::new());
        Ok(())
    }
}
