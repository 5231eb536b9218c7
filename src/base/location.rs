//! Output locations
//!
//! Maps every page of a tree to an output path and every documented `Dri`
//! to the page showing it.
//!
//! ## Layout
//!
//! - the tree root is `index.<ext>`
//! - a page with children is `<ancestors>/<name>/index.<ext>`
//! - a leaf page is `<ancestors>/<name>.<ext>`
//! - a resource page is written at its name, unchanged
//!
//! Sibling segments that collide after sanitizing get a `-2`, `-3` ...
//! suffix, and a leaf named `index` becomes `index-`.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use crate::model::{Dri, PageKind, PageNode};

/// Characters kept in path segments; everything else becomes `-`
static UNSAFE_SEGMENT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").unwrap());

pub trait LocationProvider: Send + Sync {
    /// Output path of every page, in depth-first order
    fn page_paths(&self) -> &[String];

    /// Output path of the page documenting `dri`
    fn resolve(&self, dri: &Dri) -> Option<&str>;

    /// Link from the page at `from` to the output path `to`
    fn relative(&self, from: &str, to: &str) -> String {
        let depth = from.matches('/').count();
        format!("{}{}", "../".repeat(depth), to)
    }
}

pub trait LocationProviderFactory: Send + Sync {
    fn create(&self, root: &PageNode, extension: &str) -> Arc<dyn LocationProvider>;
}

pub struct DefaultLocationProviderFactory;

impl LocationProviderFactory for DefaultLocationProviderFactory {
    fn create(&self, root: &PageNode, extension: &str) -> Arc<dyn LocationProvider> {
        Arc::new(DefaultLocationProvider::new(root, extension))
    }
}

pub struct DefaultLocationProvider {
    paths: Vec<String>,
    dris: HashMap<Dri, String>,
}

impl DefaultLocationProvider {
    pub fn new(root: &PageNode, extension: &str) -> Self {
        let mut provider = Self {
            paths: Vec::new(),
            dris: HashMap::new(),
        };
        provider.record(root, format!("index.{}", extension));
        provider.visit_children(root, &mut Vec::new(), extension);
        provider
    }

    fn record(&mut self, page: &PageNode, path: String) {
        for dri in &page.dris {
            self.dris.entry(dri.clone()).or_insert_with(|| path.clone());
        }
        self.paths.push(path);
    }

    fn visit_children(&mut self, page: &PageNode, segments: &mut Vec<String>, extension: &str) {
        let mut taken = HashSet::new();

        for child in &page.children {
            if child.kind == PageKind::Resource {
                self.record(child, child.name.clone());
                continue;
            }

            let segment = unique_segment(child, &mut taken);
            let prefix = segments
                .iter()
                .chain(std::iter::once(&segment))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("/");
            let path = if child.children.is_empty() {
                format!("{}.{}", prefix, extension)
            } else {
                format!("{}/index.{}", prefix, extension)
            };
            self.record(child, path);

            segments.push(segment);
            self.visit_children(child, segments, extension);
            segments.pop();
        }
    }
}

impl LocationProvider for DefaultLocationProvider {
    fn page_paths(&self) -> &[String] {
        &self.paths
    }

    fn resolve(&self, dri: &Dri) -> Option<&str> {
        self.dris.get(dri).map(String::as_str)
    }
}

/// Segment distinct from every sibling's; a leaf never takes the parent's `index` file
fn unique_segment(page: &PageNode, taken: &mut HashSet<String>) -> String {
    let mut base = sanitize(&page.name);
    if page.children.is_empty() && base == "index" {
        base.push('-');
    }

    let mut segment = base.clone();
    let mut suffix = 2;
    while !taken.insert(segment.clone()) {
        segment = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    segment
}

fn sanitize(name: &str) -> String {
    let sanitized = UNSAFE_SEGMENT_CHARS.replace_all(name, "-");
    match sanitized.as_ref() {
        "" | "." | ".." => "_".to_string(),
        other => other.to_string(),
    }
}
