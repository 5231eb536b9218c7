//! Documentable object model
//!
//! The language-neutral tree pipeline stages transform: module → packages →
//! classlikes → members. Every node is addressed by a `Dri` and records the
//! source sets it was seen in, so trees of several source sets can be merged.
//!
//! ## Extras
//!
//! Optional typed properties hang off a node in an `Extras` container, keyed
//! by property type (`AdditionalModifiers`, `Annotations`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::source::Visibility;

// =============================================================================
// Addressing
// =============================================================================

/// Documentation resource identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dri {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classlike: Option<String>,
    /// Callable name with parameter types, e.g. `greet(kotlin.String)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callable: Option<String>,
}

impl Dri {
    pub fn package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            classlike: None,
            callable: None,
        }
    }

    pub fn with_classlike(mut self, classlike: impl Into<String>) -> Self {
        self.classlike = Some(classlike.into());
        self
    }

    pub fn with_callable(mut self, callable: impl Into<String>) -> Self {
        self.callable = Some(callable.into());
        self
    }

    /// Split `a.b.Name` into package `a.b` and classlike `Name`
    pub fn from_qualified_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((package, classlike)) => Self::package(package).with_classlike(classlike),
            None => Self::package("").with_classlike(name),
        }
    }
}

impl fmt::Display for Dri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.package,
            self.classlike.as_deref().unwrap_or(""),
            self.callable.as_deref().unwrap_or("")
        )
    }
}

// =============================================================================
// Documentable
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentableKind {
    Module,
    Package,
    Class,
    Interface,
    Object,
    Enum,
    Function,
    Property,
}

impl DocumentableKind {
    pub fn is_classlike(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Object | Self::Enum
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Function | Self::Property)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Object => "object",
            Self::Enum => "enum class",
            Self::Function => "fun",
            Self::Property => "val",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentable {
    pub dri: Dri,
    pub name: String,
    pub kind: DocumentableKind,
    pub visibility: Visibility,
    /// Parsed documentation per source set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documentation: BTreeMap<String, Vec<DocTag>>,
    /// Rendered signature per source set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signatures: BTreeMap<String, String>,
    pub source_sets: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Documentable>,
    #[serde(default)]
    pub extras: Extras,
}

impl Documentable {
    pub fn new(dri: Dri, name: impl Into<String>, kind: DocumentableKind) -> Self {
        Self {
            dri,
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            documentation: BTreeMap::new(),
            signatures: BTreeMap::new(),
            source_sets: BTreeSet::new(),
            children: Vec::new(),
            extras: Extras::default(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Documentable> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn child_mut(&mut self, dri: &Dri) -> Option<&mut Documentable> {
        self.children.iter_mut().find(|c| &c.dri == dri)
    }

    /// Depth-first visit of this node and every descendant
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Documentable)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Keep only descendants for which `keep` holds, recursively
    pub fn retain_descendants(&mut self, keep: &dyn Fn(&Documentable) -> bool) {
        self.children.retain(|c| keep(c));
        for child in &mut self.children {
            child.retain_descendants(keep);
        }
    }
}

// =============================================================================
// Documentation Tags
// =============================================================================

/// Parsed documentation comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum DocTag {
    Paragraph { children: Vec<DocTag> },
    Text { body: String },
    CodeInline { body: String },
    Link { label: String, target: Dri },
    Param { name: String, children: Vec<DocTag> },
    Return { children: Vec<DocTag> },
    See { target: Dri, children: Vec<DocTag> },
}

// =============================================================================
// Extras
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExtraModifier {
    Abstract,
    Open,
    Sealed,
    Data,
    Inline,
    Suspend,
    Override,
    Const,
    Operator,
    Infix,
    External,
    Lateinit,
}

impl ExtraModifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Open => "open",
            Self::Sealed => "sealed",
            Self::Data => "data",
            Self::Inline => "inline",
            Self::Suspend => "suspend",
            Self::Override => "override",
            Self::Const => "const",
            Self::Operator => "operator",
            Self::Infix => "infix",
            Self::External => "external",
            Self::Lateinit => "lateinit",
        }
    }
}

/// Modifiers beyond visibility and kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalModifiers(pub BTreeSet<ExtraModifier>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub dri: Dri,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations(pub Vec<Annotation>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtraKey {
    AdditionalModifiers,
    Annotations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Extra {
    AdditionalModifiers(AdditionalModifiers),
    Annotations(Annotations),
}

/// A typed property stored in `Extras`
pub trait ExtraProperty: Sized {
    const KEY: ExtraKey;

    fn into_extra(self) -> Extra;

    fn from_extra(extra: &Extra) -> Option<&Self>;

    /// Combine two values seen for the same node in different source sets
    fn merge(self, other: Self) -> Self;
}

impl ExtraProperty for AdditionalModifiers {
    const KEY: ExtraKey = ExtraKey::AdditionalModifiers;

    fn into_extra(self) -> Extra {
        Extra::AdditionalModifiers(self)
    }

    fn from_extra(extra: &Extra) -> Option<&Self> {
        match extra {
            Extra::AdditionalModifiers(value) => Some(value),
            _ => None,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl ExtraProperty for Annotations {
    const KEY: ExtraKey = ExtraKey::Annotations;

    fn into_extra(self) -> Extra {
        Extra::Annotations(self)
    }

    fn from_extra(extra: &Extra) -> Option<&Self> {
        match extra {
            Extra::Annotations(value) => Some(value),
            _ => None,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for annotation in other.0 {
            if !self.0.contains(&annotation) {
                self.0.push(annotation);
            }
        }
        self
    }
}

/// Property container, at most one value per key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras(BTreeMap<ExtraKey, Extra>);

impl Extras {
    pub fn get<P: ExtraProperty>(&self) -> Option<&P> {
        self.0.get(&P::KEY).and_then(P::from_extra)
    }

    pub fn insert<P: ExtraProperty>(&mut self, property: P) {
        self.0.insert(P::KEY, property.into_extra());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`, combining values present in both
    pub fn merge(&mut self, other: Extras) {
        for (key, extra) in other.0 {
            let combined = match (self.0.remove(&key), extra) {
                (Some(Extra::AdditionalModifiers(a)), Extra::AdditionalModifiers(b)) => {
                    a.merge(b).into_extra()
                }
                (Some(Extra::Annotations(a)), Extra::Annotations(b)) => a.merge(b).into_extra(),
                (_, extra) => extra,
            };
            self.0.insert(key, combined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dri_display_and_qualified_name() {
        let dri = Dri::package("com.example")
            .with_classlike("Greeter")
            .with_callable("greet(kotlin.String)");
        assert_eq!(dri.to_string(), "com.example/Greeter/greet(kotlin.String)");

        let annotation = Dri::from_qualified_name("kotlin.Deprecated");
        assert_eq!(annotation.package, "kotlin");
        assert_eq!(annotation.classlike.as_deref(), Some("Deprecated"));
    }

    #[test]
    fn test_extras_are_typed() {
        let mut extras = Extras::default();
        assert!(extras.get::<AdditionalModifiers>().is_none());

        extras.insert(AdditionalModifiers(BTreeSet::from([ExtraModifier::Data])));
        assert!(extras.get::<Annotations>().is_none());
        assert_eq!(
            extras.get::<AdditionalModifiers>(),
            Some(&AdditionalModifiers(BTreeSet::from([ExtraModifier::Data])))
        );
    }

    #[test]
    fn test_extras_merge_unions_values() {
        let deprecated = Annotation {
            dri: Dri::from_qualified_name("kotlin.Deprecated"),
            params: BTreeMap::new(),
        };

        let mut jvm = Extras::default();
        jvm.insert(AdditionalModifiers(BTreeSet::from([ExtraModifier::Open])));
        jvm.insert(Annotations(vec![deprecated.clone()]));

        let mut js = Extras::default();
        js.insert(AdditionalModifiers(BTreeSet::from([ExtraModifier::External])));
        js.insert(Annotations(vec![deprecated.clone()]));

        jvm.merge(js);
        assert_eq!(
            jvm.get::<AdditionalModifiers>().unwrap().0,
            BTreeSet::from([ExtraModifier::Open, ExtraModifier::External])
        );
        assert_eq!(jvm.get::<Annotations>().unwrap().0, vec![deprecated]);
    }

    #[test]
    fn test_retain_descendants() {
        let mut module = Documentable::new(Dri::package(""), "root", DocumentableKind::Module);
        let mut package = Documentable::new(Dri::package("p"), "p", DocumentableKind::Package);
        package.children.push(Documentable::new(
            Dri::package("p").with_classlike("Keep"),
            "Keep",
            DocumentableKind::Class,
        ));
        package.children.push(Documentable::new(
            Dri::package("p").with_classlike("Drop"),
            "Drop",
            DocumentableKind::Class,
        ));
        module.children.push(package);

        module.retain_descendants(&|d| d.name != "Drop");

        let mut names = Vec::new();
        module.walk(&mut |d| names.push(d.name.as_str()));
        assert_eq!(names, ["root", "p", "Keep"]);
    }
}
