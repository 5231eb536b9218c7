//! HTML and Markdown renderers
//!
//! Both lay pages out through the resolved location provider and hand the
//! results to the resolved output writer. The HTML renderer first runs the
//! HTML preprocessors on its page tree.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::location::{LocationProvider, LocationProviderFactory};
use super::writer::OutputWriter;
use crate::constants::pipeline::WRITE_CONCURRENCY;
use crate::model::{ContentNode, PageKind, PageNode};
use crate::pipeline::{PageTransformer, RenderedFile, Renderer};
use crate::types::{DocError, Result};

/// Lay out every page and write the rendered text
async fn write_pages(
    root: &PageNode,
    locations: &dyn LocationProvider,
    writer: &Arc<dyn OutputWriter>,
    render_page: impl Fn(&PageNode, &str) -> String,
) -> Result<Vec<RenderedFile>> {
    let mut pages = Vec::new();
    root.walk(&mut |page| pages.push(page));

    let mut taken = HashSet::new();
    if let Some(path) = locations.page_paths().iter().find(|path| !taken.insert(path.as_str())) {
        return Err(DocError::render(path.as_str(), "output path already used by another page"));
    }

    let outputs: Vec<(String, String)> = pages
        .into_iter()
        .zip(locations.page_paths())
        .map(|(page, path)| (path.clone(), render_page(page, path.as_str())))
        .collect();

    stream::iter(outputs)
        .map(|(path, content)| {
            let writer = Arc::clone(writer);
            async move {
                writer.write(&path, &content).await?;
                debug!("Wrote {} ({} bytes)", path, content.len());
                Ok::<_, DocError>(RenderedFile::new(path, &content))
            }
        })
        .buffered(WRITE_CONCURRENCY)
        .try_collect()
        .await
}

fn link_target(locations: &dyn LocationProvider, from: &str, content: &ContentNode) -> Option<String> {
    match content {
        ContentNode::Link { target, .. } => locations
            .resolve(target)
            .map(|to| locations.relative(from, to)),
        ContentNode::Resource { path, .. } => Some(locations.relative(from, path)),
        _ => None,
    }
}

// =============================================================================
// HTML
// =============================================================================

pub struct HtmlRenderer {
    preprocessors: Vec<Arc<dyn PageTransformer>>,
    locations: Arc<dyn LocationProviderFactory>,
    writer: Arc<dyn OutputWriter>,
    footer: Option<String>,
}

impl HtmlRenderer {
    pub fn new(
        preprocessors: Vec<Arc<dyn PageTransformer>>,
        locations: Arc<dyn LocationProviderFactory>,
        writer: Arc<dyn OutputWriter>,
        footer: Option<String>,
    ) -> Self {
        Self {
            preprocessors,
            locations,
            writer,
            footer,
        }
    }

    fn render_page(&self, locations: &dyn LocationProvider, page: &PageNode, path: &str) -> String {
        if page.kind == PageKind::Resource {
            return raw_body(page);
        }

        let mut head = format!(
            "<meta charset=\"utf-8\">\n<title>{}</title>\n",
            escape(&page.name)
        );
        for resource in &page.embedded_resources {
            let href = locations.relative(path, resource);
            if resource.ends_with(".css") {
                head.push_str(&format!(
                    "<link rel=\"stylesheet\" href=\"{}\">\n",
                    escape(&href)
                ));
            } else {
                head.push_str(&format!("<script src=\"{}\"></script>\n", escape(&href)));
            }
        }

        let mut body = String::new();
        for node in &page.content {
            self.render_node(locations, path, node, &mut body);
        }
        if let Some(footer) = &self.footer {
            body.push_str(&format!("<footer>{}</footer>\n", escape(footer)));
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n{}</head>\n<body>\n{}</body>\n</html>\n",
            head, body
        )
    }

    fn render_node(
        &self,
        locations: &dyn LocationProvider,
        path: &str,
        node: &ContentNode,
        out: &mut String,
    ) {
        match node {
            ContentNode::Header { level, text } => {
                let level = (*level).clamp(1, 6);
                out.push_str(&format!("<h{level}>{}</h{level}>\n", escape(text)));
            }
            ContentNode::Text { text } => out.push_str(&escape(text)),
            ContentNode::Code { code } => {
                if code.contains('\n') {
                    out.push_str(&format!("<pre><code>{}</code></pre>\n", escape(code)));
                } else {
                    out.push_str(&format!("<code>{}</code>", escape(code)));
                }
            }
            ContentNode::Link { label, .. } | ContentNode::Resource { label, .. } => {
                match link_target(locations, path, node) {
                    Some(href) => out.push_str(&format!(
                        "<a href=\"{}\">{}</a>",
                        escape(&href),
                        escape(label)
                    )),
                    None => out.push_str(&escape(label)),
                }
            }
            ContentNode::Paragraph { children } => {
                out.push_str("<p>");
                for child in children {
                    self.render_node(locations, path, child, out);
                }
                out.push_str("</p>\n");
            }
            ContentNode::List { items } => {
                out.push_str("<ul>\n");
                for item in items {
                    out.push_str("<li>");
                    for child in item {
                        self.render_node(locations, path, child, out);
                    }
                    out.push_str("</li>\n");
                }
                out.push_str("</ul>\n");
            }
            ContentNode::Signature { text, source_sets } => {
                out.push_str(&format!(
                    "<pre class=\"signature\">{}</pre>\n<div class=\"source-sets\">{}</div>\n",
                    escape(text),
                    escape(&source_sets.join(", "))
                ));
            }
            ContentNode::Raw { body } => out.push_str(body),
        }
    }
}

#[async_trait]
impl Renderer for HtmlRenderer {
    async fn render(&self, mut root: PageNode) -> Result<Vec<RenderedFile>> {
        for preprocessor in &self.preprocessors {
            preprocessor.transform(&mut root)?;
        }
        let locations = self.locations.create(&root, "html");
        write_pages(&root, locations.as_ref(), &self.writer, |page, path| {
            self.render_page(locations.as_ref(), page, path)
        })
        .await
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn raw_body(page: &PageNode) -> String {
    page.content
        .iter()
        .filter_map(|c| match c {
            ContentNode::Raw { body } => Some(body.as_str()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Markdown
// =============================================================================

pub struct MarkdownRenderer {
    locations: Arc<dyn LocationProviderFactory>,
    writer: Arc<dyn OutputWriter>,
}

impl MarkdownRenderer {
    pub fn new(locations: Arc<dyn LocationProviderFactory>, writer: Arc<dyn OutputWriter>) -> Self {
        Self { locations, writer }
    }

    fn render_page(locations: &dyn LocationProvider, page: &PageNode, path: &str) -> String {
        if page.kind == PageKind::Resource {
            return raw_body(page);
        }
        let blocks: Vec<String> = page
            .content
            .iter()
            .map(|node| Self::block(locations, path, node))
            .collect();
        let mut text = blocks.join("\n\n");
        text.push('\n');
        text
    }

    fn block(locations: &dyn LocationProvider, path: &str, node: &ContentNode) -> String {
        match node {
            ContentNode::Header { level, text } => {
                format!("{} {}", "#".repeat((*level).clamp(1, 6) as usize), text)
            }
            ContentNode::Code { code } if code.contains('\n') => format!("```\n{}\n```", code),
            ContentNode::List { items } => Self::list(locations, path, items, 0),
            ContentNode::Signature { text, source_sets } => {
                format!("```\n{}\n```\n_{}_", text, source_sets.join(", "))
            }
            other => Self::inline(locations, path, other),
        }
    }

    fn list(
        locations: &dyn LocationProvider,
        path: &str,
        items: &[Vec<ContentNode>],
        depth: usize,
    ) -> String {
        let indent = "  ".repeat(depth);
        let mut lines = Vec::new();
        for item in items {
            let mut line = format!("{}- ", indent);
            let mut nested = Vec::new();
            for node in item {
                match node {
                    ContentNode::List { items } => {
                        nested.push(Self::list(locations, path, items, depth + 1))
                    }
                    other => line.push_str(&Self::inline(locations, path, other)),
                }
            }
            lines.push(line);
            lines.extend(nested);
        }
        lines.join("\n")
    }

    fn inline(locations: &dyn LocationProvider, path: &str, node: &ContentNode) -> String {
        match node {
            ContentNode::Header { text, .. } | ContentNode::Text { text } => text.clone(),
            ContentNode::Code { code } => format!("`{}`", code),
            ContentNode::Link { label, .. } | ContentNode::Resource { label, .. } => {
                match link_target(locations, path, node) {
                    Some(href) => format!("[{}]({})", label, href),
                    None => label.clone(),
                }
            }
            ContentNode::Paragraph { children } => children
                .iter()
                .map(|c| Self::inline(locations, path, c))
                .collect(),
            ContentNode::List { items } => Self::list(locations, path, items, 0),
            ContentNode::Signature { text, .. } => format!("`{}`", text),
            ContentNode::Raw { body } => body.clone(),
        }
    }
}

#[async_trait]
impl Renderer for MarkdownRenderer {
    async fn render(&self, root: PageNode) -> Result<Vec<RenderedFile>> {
        let locations = self.locations.create(&root, "md");
        write_pages(&root, locations.as_ref(), &self.writer, |page, path| {
            Self::render_page(locations.as_ref(), page, path)
        })
        .await
    }
}
