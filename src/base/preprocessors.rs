//! HTML preprocessors
//!
//! Page transformers the HTML renderer applies, in resolved order, to its own
//! copy of the page tree before rendering.

use serde::Serialize;

use crate::constants::resources;
use crate::model::{ContentNode, PageKind, PageNode};
use crate::pipeline::PageTransformer;
use crate::types::{DocError, Result};

/// Wraps the module page in a renderer root
pub struct RootCreator;

impl PageTransformer for RootCreator {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        if root.kind == PageKind::Root {
            return Ok(());
        }
        let module = std::mem::replace(root, PageNode::new("", PageKind::Root));

        root.name = module.name.clone();
        root.source_sets = module.source_sets.clone();
        root.content = vec![ContentNode::header(1, module.name.as_str())];
        if let Some(dri) = module.dris.first() {
            root.content.push(ContentNode::List {
                items: vec![vec![ContentNode::Link {
                    label: module.name.clone(),
                    target: dri.clone(),
                }]],
            });
        }
        root.children = vec![module];
        Ok(())
    }
}

/// Adds a navigation page listing every documented page as a nested list
pub struct NavigationPageInstaller;

impl NavigationPageInstaller {
    fn entries(page: &PageNode) -> Vec<Vec<ContentNode>> {
        page.children
            .iter()
            .filter_map(|child| {
                let dri = child.dris.first()?;
                let mut item = vec![ContentNode::Link {
                    label: child.name.clone(),
                    target: dri.clone(),
                }];
                let nested = Self::entries(child);
                if !nested.is_empty() {
                    item.push(ContentNode::List { items: nested });
                }
                Some(item)
            })
            .collect()
    }
}

impl PageTransformer for NavigationPageInstaller {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        let navigation = PageNode::new("navigation", PageKind::Navigation).with_content(vec![
            ContentNode::header(1, "Navigation"),
            ContentNode::List {
                items: Self::entries(root),
            },
        ]);
        root.children.push(navigation);
        Ok(())
    }
}

#[derive(Serialize)]
struct SearchEntry<'a> {
    name: &'a str,
    dri: String,
}

/// Adds a search page carrying a JSON index of documented names
pub struct SearchPageInstaller;

impl PageTransformer for SearchPageInstaller {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        let mut entries = Vec::new();
        root.walk(&mut |page| {
            for dri in &page.dris {
                entries.push(SearchEntry {
                    name: &page.name,
                    dri: dri.to_string(),
                });
            }
        });
        let index = serde_json::to_string_pretty(&entries)
            .map_err(|e| DocError::render("search", e.to_string()))?;

        let search = PageNode::new("search", PageKind::Search).with_content(vec![
            ContentNode::header(1, "Search"),
            ContentNode::Code { code: index },
        ]);
        root.children.push(search);
        Ok(())
    }
}

/// Adds the stylesheet and script as resource pages
pub struct ResourceInstaller;

impl PageTransformer for ResourceInstaller {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        for (path, body) in [
            (resources::STYLE_PATH, resources::STYLE),
            (resources::SCRIPT_PATH, resources::SCRIPT),
        ] {
            root.children.push(
                PageNode::new(path, PageKind::Resource).with_content(vec![ContentNode::Raw {
                    body: body.to_string(),
                }]),
            );
        }
        Ok(())
    }
}

/// Links every rendered page to the installed resources
pub struct StyleAndScriptsAppender;

impl PageTransformer for StyleAndScriptsAppender {
    fn transform(&self, root: &mut PageNode) -> Result<()> {
        root.walk_mut(&mut |page| {
            if page.kind != PageKind::Resource {
                for resource in [resources::STYLE_PATH, resources::SCRIPT_PATH] {
                    if !page.embedded_resources.iter().any(|r| r == resource) {
                        page.embedded_resources.push(resource.to_string());
                    }
                }
            }
        });
        Ok(())
    }
}
