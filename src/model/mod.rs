//! Data contracts exchanged between pipeline stages

mod documentable;
mod page;
mod source;

pub use documentable::{
    AdditionalModifiers, Annotation, Annotations, DocTag, Documentable, DocumentableKind, Dri,
    Extra, ExtraKey, ExtraModifier, ExtraProperty, Extras,
};
pub use page::{ContentNode, PageKind, PageNode};
pub use source::{AnnotationRef, Parameter, ResolvedSymbol, SourceSet, SymbolKind, Visibility};
