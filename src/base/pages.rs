//! Documentable → page translation

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{
    Annotations, ContentNode, DocTag, Documentable, DocumentableKind, PageKind, PageNode,
};
use crate::pipeline::DocumentableToPageTranslator;
use crate::types::Result;

/// Turns parsed documentation into page content
pub trait CommentsToContentConverter: Send + Sync {
    fn convert(&self, tag: &DocTag) -> Vec<ContentNode>;
}

pub struct DocTagToContentConverter;

impl DocTagToContentConverter {
    fn convert_all(&self, tags: &[DocTag]) -> Vec<ContentNode> {
        tags.iter().flat_map(|t| self.convert(t)).collect()
    }
}

impl CommentsToContentConverter for DocTagToContentConverter {
    fn convert(&self, tag: &DocTag) -> Vec<ContentNode> {
        match tag {
            DocTag::Paragraph { children } => vec![ContentNode::Paragraph {
                children: self.convert_all(children),
            }],
            DocTag::Text { body } => vec![ContentNode::text(body.as_str())],
            DocTag::CodeInline { body } => vec![ContentNode::Code { code: body.clone() }],
            DocTag::Link { label, target } => vec![ContentNode::Link {
                label: label.clone(),
                target: target.clone(),
            }],
            DocTag::Param { name, children } => {
                let mut line = vec![
                    ContentNode::text("Parameter "),
                    ContentNode::Code { code: name.clone() },
                    ContentNode::text(": "),
                ];
                line.extend(self.convert_all(children));
                vec![ContentNode::Paragraph { children: line }]
            }
            DocTag::Return { children } => {
                let mut line = vec![ContentNode::text("Returns: ")];
                line.extend(self.convert_all(children));
                vec![ContentNode::Paragraph { children: line }]
            }
            DocTag::See { target, children } => {
                let label = target
                    .callable
                    .as_deref()
                    .or(target.classlike.as_deref())
                    .unwrap_or(&target.package)
                    .to_string();
                let mut line = vec![
                    ContentNode::text("See also: "),
                    ContentNode::Link {
                        label,
                        target: target.clone(),
                    },
                ];
                if !children.is_empty() {
                    line.push(ContentNode::text(" "));
                    line.extend(self.convert_all(children));
                }
                vec![ContentNode::Paragraph { children: line }]
            }
        }
    }
}

// =============================================================================
// Page Translator
// =============================================================================

pub struct DefaultPageTranslator {
    comments: Arc<dyn CommentsToContentConverter>,
}

impl DefaultPageTranslator {
    pub fn new(comments: Arc<dyn CommentsToContentConverter>) -> Self {
        Self { comments }
    }

    fn module_page(&self, module: &Documentable) -> PageNode {
        let mut content = vec![ContentNode::header(1, module.name.as_str())];
        content.extend(self.documentation(module));
        let packages: Vec<&Documentable> = module.children.iter().collect();
        content.extend(link_section("Packages", &packages));

        page(module, PageKind::Module, content).with_children(
            module
                .children
                .iter()
                .map(|package| self.package_page(package))
                .collect(),
        )
    }

    fn package_page(&self, package: &Documentable) -> PageNode {
        let mut content = vec![ContentNode::header(1, format!("Package {}", package.name))];
        content.extend(self.documentation(package));
        content.extend(self.member_sections(&package.children));

        page(package, PageKind::Package, content).with_children(self.child_pages(package))
    }

    fn classlike_page(&self, classlike: &Documentable) -> PageNode {
        let mut content = vec![ContentNode::header(1, classlike.name.as_str())];
        content.extend(declaration(classlike));
        content.extend(self.documentation(classlike));
        content.extend(self.member_sections(&classlike.children));

        page(classlike, PageKind::Classlike, content).with_children(self.child_pages(classlike))
    }

    fn member_page(&self, member: &Documentable) -> PageNode {
        let mut content = vec![ContentNode::header(1, member.name.as_str())];
        content.extend(declaration(member));
        content.extend(self.documentation(member));

        page(member, PageKind::Member, content)
    }

    fn child_pages(&self, parent: &Documentable) -> Vec<PageNode> {
        parent
            .children
            .iter()
            .filter_map(|child| {
                if child.kind.is_classlike() {
                    Some(self.classlike_page(child))
                } else if child.kind.is_member() {
                    Some(self.member_page(child))
                } else {
                    None
                }
            })
            .collect()
    }

    fn member_sections(&self, children: &[Documentable]) -> Vec<ContentNode> {
        let sections: [(&str, fn(&DocumentableKind) -> bool); 3] = [
            ("Types", DocumentableKind::is_classlike),
            ("Functions", |k| *k == DocumentableKind::Function),
            ("Properties", |k| *k == DocumentableKind::Property),
        ];

        let mut content = Vec::new();
        for (title, selects) in sections {
            let selected: Vec<&Documentable> =
                children.iter().filter(|c| selects(&c.kind)).collect();
            content.extend(link_section(title, &selected));
        }
        content
    }

    /// Documentation grouped by identical content across source sets
    fn documentation(&self, documentable: &Documentable) -> Vec<ContentNode> {
        let groups = group_by_content(&documentable.documentation);
        let tagged = groups.len() > 1;

        let mut content = Vec::new();
        for (source_sets, tags) in groups {
            if tagged {
                content.push(ContentNode::text(format!("[{}]", source_sets.join(", "))));
            }
            content.extend(tags.iter().flat_map(|tag| self.comments.convert(tag)));
        }
        content
    }
}

impl DocumentableToPageTranslator for DefaultPageTranslator {
    fn translate(&self, module: &Documentable) -> Result<PageNode> {
        Ok(self.module_page(module))
    }
}

fn page(documentable: &Documentable, kind: PageKind, content: Vec<ContentNode>) -> PageNode {
    let mut page = PageNode::new(documentable.name.as_str(), kind)
        .with_dri(documentable.dri.clone())
        .with_content(content);
    page.source_sets = documentable.source_sets.clone();
    page
}

/// Annotations followed by one signature block per distinct signature
fn declaration(documentable: &Documentable) -> Vec<ContentNode> {
    let mut content = Vec::new();

    if let Some(annotations) = documentable.extras.get::<Annotations>() {
        for annotation in &annotations.0 {
            let name = annotation.dri.classlike.as_deref().unwrap_or_default();
            let params: Vec<String> = annotation
                .params
                .iter()
                .map(|(key, value)| format!("{} = \"{}\"", key, value))
                .collect();
            let text = if params.is_empty() {
                format!("@{}", name)
            } else {
                format!("@{}({})", name, params.join(", "))
            };
            content.push(ContentNode::Code { code: text });
        }
    }

    for (source_sets, text) in group_by_content(&documentable.signatures) {
        content.push(ContentNode::Signature { text, source_sets });
    }
    content
}

fn link_section(title: &str, documentables: &[&Documentable]) -> Vec<ContentNode> {
    if documentables.is_empty() {
        return Vec::new();
    }
    vec![
        ContentNode::header(2, title),
        ContentNode::List {
            items: documentables
                .iter()
                .map(|d| {
                    vec![ContentNode::Link {
                        label: d.name.clone(),
                        target: d.dri.clone(),
                    }]
                })
                .collect(),
        },
    ]
}

/// Group per-source-set values by identical content, keeping source set order
pub(crate) fn group_by_content<V: PartialEq + Clone>(
    per_source_set: &BTreeMap<String, V>,
) -> Vec<(Vec<String>, V)> {
    let mut groups: Vec<(Vec<String>, V)> = Vec::new();
    for (source_set, value) in per_source_set {
        match groups.iter_mut().find(|(_, v)| v == value) {
            Some((sets, _)) => sets.push(source_set.clone()),
            None => groups.push((vec![source_set.clone()], value.clone())),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::translator::DefaultSourceTranslator;
    use crate::base::merger::DefaultDocumentableMerger;
    use crate::model::{AnnotationRef, Dri, ResolvedSymbol, SourceSet, SymbolKind};
    use crate::pipeline::{DocumentableMerger, SourceToDocumentableTranslator};

    fn translator() -> DefaultPageTranslator {
        DefaultPageTranslator::new(Arc::new(DocTagToContentConverter))
    }

    fn source_set(name: &str, doc: &str) -> SourceSet {
        SourceSet::new(name)
            .with_symbol(
                ResolvedSymbol::new("p", "Greeter", SymbolKind::Class)
                    .with_doc(doc)
                    .with_annotation(AnnotationRef {
                        name: "kotlin.Deprecated".to_string(),
                        params: BTreeMap::from([("message".to_string(), "old".to_string())]),
                    }),
            )
            .with_symbol(
                ResolvedSymbol::new("p", "greet", SymbolKind::Function).with_parent("Greeter"),
            )
            .with_symbol(ResolvedSymbol::new("p", "VERSION", SymbolKind::Property))
    }

    fn module(docs: &[(&str, &str)]) -> Documentable {
        let modules = docs
            .iter()
            .map(|(name, doc)| {
                DefaultSourceTranslator::new("demo")
                    .translate(&source_set(name, doc))
                    .unwrap()
            })
            .collect();
        DefaultDocumentableMerger.merge(modules).unwrap()
    }

    #[test]
    fn test_page_tree_shape() {
        let root = translator().translate(&module(&[("jvm", "Hi.")])).unwrap();

        assert_eq!(root.kind, PageKind::Module);
        let package = &root.children[0];
        assert_eq!(package.kind, PageKind::Package);
        let kinds: Vec<(&str, PageKind)> = package
            .children
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        assert_eq!(
            kinds,
            [("Greeter", PageKind::Classlike), ("VERSION", PageKind::Member)]
        );
        assert_eq!(package.children[0].children[0].kind, PageKind::Member);
        assert_eq!(
            package.children[0].dris,
            vec![Dri::package("p").with_classlike("Greeter")]
        );
    }

    #[test]
    fn test_classlike_content() {
        let root = translator()
            .translate(&module(&[("jvm", "Hi."), ("js", "Hi.")]))
            .unwrap();
        let greeter = root.find("Greeter").unwrap();

        assert!(greeter.content.contains(&ContentNode::Code {
            code: "@Deprecated(message = \"old\")".to_string()
        }));
        assert!(greeter.content.contains(&ContentNode::Signature {
            text: "class Greeter".to_string(),
            source_sets: vec!["js".to_string(), "jvm".to_string()],
        }));
        // identical docs are shown once, untagged
        assert!(!greeter.content.contains(&ContentNode::text("[js]")));
        assert!(greeter.content.contains(&ContentNode::header(2, "Functions")));
    }

    #[test]
    fn test_diverging_docs_are_tagged() {
        let root = translator()
            .translate(&module(&[("jvm", "On JVM."), ("js", "On JS.")]))
            .unwrap();
        let greeter = root.find("Greeter").unwrap();
        assert!(greeter.content.contains(&ContentNode::text("[js]")));
        assert!(greeter.content.contains(&ContentNode::text("[jvm]")));
    }

    #[test]
    fn test_doc_tag_conversion() {
        let converter = DocTagToContentConverter;
        let converted = converter.convert(&DocTag::Param {
            name: "who".to_string(),
            children: vec![DocTag::Text {
                body: "the name".to_string(),
            }],
        });
        assert_eq!(
            converted,
            vec![ContentNode::Paragraph {
                children: vec![
                    ContentNode::text("Parameter "),
                    ContentNode::Code {
                        code: "who".to_string()
                    },
                    ContentNode::text(": "),
                    ContentNode::text("the name"),
                ]
            }]
        );
    }

    #[test]
    fn test_group_by_content() {
        let per_set = BTreeMap::from([
            ("common".to_string(), "a"),
            ("js".to_string(), "b"),
            ("jvm".to_string(), "a"),
        ]);
        assert_eq!(
            group_by_content(&per_set),
            vec![
                (vec!["common".to_string(), "jvm".to_string()], "a"),
                (vec!["js".to_string()], "b"),
            ]
        );
    }
}
