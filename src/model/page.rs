//! Page model
//!
//! Renderer-neutral page tree produced from a merged documentable tree and
//! rewritten in place by page transformers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::documentable::Dri;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Renderer-specific root wrapping the module page
    Root,
    Module,
    Package,
    Classlike,
    Member,
    Navigation,
    Search,
    /// Static file copied verbatim; its name is its output path
    Resource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub name: String,
    pub kind: PageKind,
    /// Documentables shown on this page; several after a merge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dris: Vec<Dri>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub source_sets: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageNode>,
    /// Output paths of styles and scripts the page links to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_resources: Vec<String>,
}

impl PageNode {
    pub fn new(name: impl Into<String>, kind: PageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dris: Vec::new(),
            source_sets: BTreeSet::new(),
            content: Vec::new(),
            children: Vec::new(),
            embedded_resources: Vec::new(),
        }
    }

    pub fn with_dri(mut self, dri: Dri) -> Self {
        self.dris.push(dri);
        self
    }

    pub fn with_content(mut self, content: Vec<ContentNode>) -> Self {
        self.content = content;
        self
    }

    pub fn with_children(mut self, children: Vec<PageNode>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first visit of this page and every descendant
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a PageNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut PageNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(PageNode::count).sum::<usize>()
    }

    pub fn find(&self, name: &str) -> Option<&PageNode> {
        let mut found = None;
        self.walk(&mut |page| {
            if found.is_none() && page.name == name {
                found = Some(page);
            }
        });
        found
    }
}

/// Renderable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentNode {
    Header { level: u8, text: String },
    Text { text: String },
    Code { code: String },
    /// Link to a documentable; unresolvable targets render as plain text
    Link { label: String, target: Dri },
    /// Link to an output path
    Resource { label: String, path: String },
    Paragraph { children: Vec<ContentNode> },
    List { items: Vec<Vec<ContentNode>> },
    Signature { text: String, source_sets: Vec<String> },
    /// Pre-rendered text written out unchanged
    Raw { body: String },
}

impl ContentNode {
    pub fn header(level: u8, text: impl Into<String>) -> Self {
        Self::Header {
            level,
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PageNode {
        PageNode::new("root", PageKind::Module).with_children(vec![
            PageNode::new("p", PageKind::Package).with_children(vec![
                PageNode::new("Greeter", PageKind::Classlike)
                    .with_children(vec![PageNode::new("greet", PageKind::Member)]),
            ]),
        ])
    }

    #[test]
    fn test_walk_and_find() {
        let root = tree();
        assert_eq!(root.count(), 4);
        assert_eq!(root.find("greet").map(|p| p.kind), Some(PageKind::Member));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn test_walk_mut() {
        let mut root = tree();
        root.walk_mut(&mut |page| page.embedded_resources.push("style.css".to_string()));

        let mut all = true;
        root.walk(&mut |page| all &= page.embedded_resources == ["style.css"]);
        assert!(all);
    }
}
