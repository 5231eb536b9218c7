//! Default source translator
//!
//! Groups a source set's resolved symbols into module → package → classlike
//! → member and parses documentation comments into `DocTag`s.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::model::{
    AdditionalModifiers, Annotation, Annotations, DocTag, Documentable, DocumentableKind, Dri,
    ResolvedSymbol, SourceSet, SymbolKind,
};
use crate::pipeline::SourceToDocumentableTranslator;
use crate::types::Result;

/// Package name used for symbols outside any package
pub const ROOT_PACKAGE: &str = "[root]";

/// Inline code span or `[Target]` link
static INLINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`|\[([A-Za-z_][A-Za-z0-9_.]*)\]").unwrap());

/// Block tag at line start: `@param name`, `@return`, `@see Target`
static BLOCK_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(param|return|see)\b\s*(\S*)\s*(.*)$").unwrap());

pub struct DefaultSourceTranslator {
    module_name: String,
}

impl DefaultSourceTranslator {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }
}

impl SourceToDocumentableTranslator for DefaultSourceTranslator {
    fn translate(&self, source_set: &SourceSet) -> Result<Documentable> {
        let mut module = Documentable::new(
            Dri::package(""),
            self.module_name.as_str(),
            DocumentableKind::Module,
        );
        module.source_sets.insert(source_set.name.clone());

        for symbol in &source_set.symbols {
            let package_name = package_of(symbol);
            let package = child_or_insert(&mut module, Dri::package(package_name), || {
                let mut package = Documentable::new(
                    Dri::package(package_name),
                    package_name,
                    DocumentableKind::Package,
                );
                package.source_sets.insert(source_set.name.clone());
                package
            });

            let documentable = symbol_to_documentable(symbol, &source_set.name);

            if let Some(parent) = &symbol.parent {
                let parent_dri = Dri::package(package_name).with_classlike(parent.as_str());
                let classlike = child_or_insert(package, parent_dri.clone(), || {
                    let mut placeholder =
                        Documentable::new(parent_dri, parent.as_str(), DocumentableKind::Class);
                    placeholder.source_sets.insert(source_set.name.clone());
                    placeholder
                });
                classlike.children.push(documentable);
            } else if let Some(existing) = package.child_mut(&documentable.dri) {
                // Members seen before their classlike created a placeholder
                let children = std::mem::take(&mut existing.children);
                *existing = documentable;
                existing.children = children;
            } else {
                package.children.push(documentable);
            }
        }

        Ok(module)
    }
}

fn package_of(symbol: &ResolvedSymbol) -> &str {
    if symbol.package.is_empty() {
        ROOT_PACKAGE
    } else {
        &symbol.package
    }
}

fn child_or_insert(
    parent: &mut Documentable,
    dri: Dri,
    create: impl FnOnce() -> Documentable,
) -> &mut Documentable {
    let index = match parent.children.iter().position(|c| c.dri == dri) {
        Some(index) => index,
        None => {
            parent.children.push(create());
            parent.children.len() - 1
        }
    };
    &mut parent.children[index]
}

fn symbol_to_documentable(symbol: &ResolvedSymbol, source_set: &str) -> Documentable {
    let package = package_of(symbol);
    let (dri, kind) = match symbol.kind {
        SymbolKind::Function => {
            let params: Vec<&str> = symbol
                .parameters
                .iter()
                .map(|p| p.type_name.as_str())
                .collect();
            let callable = format!("{}({})", symbol.name, params.join(","));
            (member_dri(symbol, package, callable), DocumentableKind::Function)
        }
        SymbolKind::Property => (
            member_dri(symbol, package, symbol.name.clone()),
            DocumentableKind::Property,
        ),
        SymbolKind::Class => (classlike_dri(symbol, package), DocumentableKind::Class),
        SymbolKind::Interface => (classlike_dri(symbol, package), DocumentableKind::Interface),
        SymbolKind::Object => (classlike_dri(symbol, package), DocumentableKind::Object),
        SymbolKind::Enum => (classlike_dri(symbol, package), DocumentableKind::Enum),
    };

    let mut documentable = Documentable::new(dri, symbol.name.as_str(), kind);
    documentable.visibility = symbol.visibility;
    documentable.source_sets.insert(source_set.to_string());
    documentable
        .signatures
        .insert(source_set.to_string(), signature(symbol, kind));

    if let Some(doc) = symbol.doc.as_deref().filter(|d| !d.trim().is_empty()) {
        documentable
            .documentation
            .insert(source_set.to_string(), parse_doc(doc, package));
    }

    if !symbol.modifiers.is_empty() {
        documentable.extras.insert(AdditionalModifiers(
            symbol.modifiers.iter().copied().collect::<BTreeSet<_>>(),
        ));
    }

    if !symbol.annotations.is_empty() {
        documentable.extras.insert(Annotations(
            symbol
                .annotations
                .iter()
                .map(|a| Annotation {
                    dri: Dri::from_qualified_name(&a.name),
                    params: a.params.clone(),
                })
                .collect(),
        ));
    }

    documentable
}

fn member_dri(symbol: &ResolvedSymbol, package: &str, callable: String) -> Dri {
    let dri = Dri::package(package);
    match &symbol.parent {
        Some(parent) => dri.with_classlike(parent.as_str()),
        None => dri,
    }
    .with_callable(callable)
}

fn classlike_dri(symbol: &ResolvedSymbol, package: &str) -> Dri {
    Dri::package(package).with_classlike(symbol.name.as_str())
}

/// Declaration line as written in source, e.g. `private open fun greet(who: String): Unit`
fn signature(symbol: &ResolvedSymbol, kind: DocumentableKind) -> String {
    let mut parts: Vec<String> = Vec::new();
    if symbol.visibility != crate::model::Visibility::Public {
        parts.push(symbol.visibility.keyword().to_string());
    }
    let modifiers: BTreeSet<_> = symbol.modifiers.iter().collect();
    parts.extend(modifiers.iter().map(|m| m.keyword().to_string()));
    parts.push(kind.keyword().to_string());

    let mut declaration = symbol.name.clone();
    if kind == DocumentableKind::Function {
        let params: Vec<String> = symbol
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_name))
            .collect();
        declaration.push_str(&format!("({})", params.join(", ")));
    }
    if let Some(return_type) = &symbol.return_type {
        declaration.push_str(&format!(": {}", return_type));
    }
    parts.push(declaration);

    parts.join(" ")
}

// =============================================================================
// Documentation comments
// =============================================================================

/// Parse a raw documentation comment
///
/// Blank lines separate description paragraphs. A line starting with
/// `@param`, `@return` or `@see` opens a block tag that runs until the next
/// block tag. Unqualified link targets resolve against `package`.
pub fn parse_doc(text: &str, package: &str) -> Vec<DocTag> {
    let mut tags = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut block: Option<(String, String, Vec<String>)> = None;

    for line in text.lines().map(str::trim) {
        if let Some(captures) = BLOCK_TAG_PATTERN.captures(line) {
            flush_paragraph(&mut tags, &mut paragraph, package);
            flush_block(&mut tags, block.take(), package);
            let name = captures[1].to_string();
            let argument = captures[2].to_string();
            let rest = captures[3].to_string();
            // `@return` has no argument: the first word belongs to the body
            block = Some(if name == "return" {
                (name, String::new(), vec![format!("{} {}", argument, rest)])
            } else {
                (name, argument, vec![rest])
            });
        } else if let Some((_, _, body)) = block.as_mut() {
            body.push(line.to_string());
        } else if line.is_empty() {
            flush_paragraph(&mut tags, &mut paragraph, package);
        } else {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut tags, &mut paragraph, package);
    flush_block(&mut tags, block, package);

    tags
}

fn flush_paragraph(tags: &mut Vec<DocTag>, paragraph: &mut Vec<&str>, package: &str) {
    if paragraph.is_empty() {
        return;
    }
    tags.push(DocTag::Paragraph {
        children: parse_inline(&paragraph.join(" "), package),
    });
    paragraph.clear();
}

fn flush_block(tags: &mut Vec<DocTag>, block: Option<(String, String, Vec<String>)>, package: &str) {
    let Some((name, argument, body)) = block else {
        return;
    };
    let body = body
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let children = parse_inline(&body, package);

    tags.push(match name.as_str() {
        "param" => DocTag::Param {
            name: argument,
            children,
        },
        "see" => DocTag::See {
            target: link_target(&argument, package),
            children,
        },
        _ => DocTag::Return { children },
    });
}

fn parse_inline(text: &str, package: &str) -> Vec<DocTag> {
    let mut tags = Vec::new();
    let mut last = 0;

    for captures in INLINE_PATTERN.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > last {
            tags.push(DocTag::Text {
                body: text[last..whole.start()].to_string(),
            });
        }
        if let Some(code) = captures.get(1) {
            tags.push(DocTag::CodeInline {
                body: code.as_str().to_string(),
            });
        } else if let Some(target) = captures.get(2) {
            tags.push(DocTag::Link {
                label: target.as_str().to_string(),
                target: link_target(target.as_str(), package),
            });
        }
        last = whole.end();
    }
    if last < text.len() {
        tags.push(DocTag::Text {
            body: text[last..].to_string(),
        });
    }

    tags
}

fn link_target(target: &str, package: &str) -> Dri {
    if target.contains('.') {
        Dri::from_qualified_name(target)
    } else {
        Dri::package(package).with_classlike(target)
    }
}
