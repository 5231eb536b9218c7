//! Source set merging
//!
//! Nodes with the same `Dri` in different source sets collapse into one node
//! carrying the union of source sets, per-source-set documentation and
//! signatures, and merged extras.

use crate::model::Documentable;
use crate::pipeline::DocumentableMerger;
use crate::types::{DocError, Result};

pub struct DefaultDocumentableMerger;

impl DocumentableMerger for DefaultDocumentableMerger {
    fn merge(&self, modules: Vec<Documentable>) -> Result<Documentable> {
        let mut modules = modules.into_iter();
        let mut merged = modules
            .next()
            .ok_or_else(|| DocError::pipeline("merge", "no modules to merge"))?;

        for module in modules {
            if module.name != merged.name {
                return Err(DocError::pipeline(
                    "merge",
                    format!(
                        "cannot merge module '{}' into '{}'",
                        module.name, merged.name
                    ),
                ));
            }
            merge_into(&mut merged, module);
        }

        Ok(merged)
    }
}

fn merge_into(target: &mut Documentable, other: Documentable) {
    target.source_sets.extend(other.source_sets);
    target.documentation.extend(other.documentation);
    target.signatures.extend(other.signatures);
    target.extras.merge(other.extras);

    for child in other.children {
        let same = target
            .children
            .iter()
            .position(|c| c.dri == child.dri && c.kind == child.kind);
        match same {
            Some(index) => merge_into(&mut target.children[index], child),
            None => target.children.push(child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AdditionalModifiers, DocTag, DocumentableKind, Dri, ExtraModifier,
    };
    use std::collections::BTreeSet;

    fn module(source_set: &str, extra_member: &str, modifier: ExtraModifier) -> Documentable {
        let class_dri = Dri::package("p").with_classlike("Greeter");
        let mut class = Documentable::new(class_dri.clone(), "Greeter", DocumentableKind::Class);
        class.source_sets.insert(source_set.to_string());
        class
            .signatures
            .insert(source_set.to_string(), "class Greeter".to_string());
        class.documentation.insert(
            source_set.to_string(),
            vec![DocTag::Text {
                body: source_set.to_string(),
            }],
        );
        class
            .extras
            .insert(AdditionalModifiers(BTreeSet::from([modifier])));
        for member in ["greet", extra_member] {
            let mut function = Documentable::new(
                class_dri.clone().with_callable(format!("{}()", member)),
                member,
                DocumentableKind::Function,
            );
            function.source_sets.insert(source_set.to_string());
            class.children.push(function);
        }

        let mut package = Documentable::new(Dri::package("p"), "p", DocumentableKind::Package);
        package.source_sets.insert(source_set.to_string());
        package.children.push(class);

        let mut module = Documentable::new(Dri::package(""), "m", DocumentableKind::Module);
        module.source_sets.insert(source_set.to_string());
        module.children.push(package);
        module
    }

    #[test]
    fn test_merge_unions_source_sets() {
        let merged = DefaultDocumentableMerger
            .merge(vec![
                module("jvm", "onJvm", ExtraModifier::Open),
                module("js", "onJs", ExtraModifier::External),
            ])
            .unwrap();

        assert_eq!(merged.children.len(), 1);
        let class = merged.children[0].child("Greeter").unwrap();
        assert_eq!(
            class.source_sets,
            BTreeSet::from(["js".to_string(), "jvm".to_string()])
        );
        assert_eq!(class.documentation.len(), 2);
        assert_eq!(class.signatures.len(), 2);
        assert_eq!(
            class.extras.get::<AdditionalModifiers>().unwrap().0,
            BTreeSet::from([ExtraModifier::Open, ExtraModifier::External])
        );

        let members: Vec<&str> = class.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(members, ["greet", "onJvm", "onJs"]);
        assert_eq!(class.child("greet").unwrap().source_sets.len(), 2);
        assert_eq!(class.child("onJs").unwrap().source_sets.len(), 1);
    }

    #[test]
    fn test_merge_requires_modules() {
        assert!(DefaultDocumentableMerger.merge(Vec::new()).is_err());

        let mut other = module("js", "x", ExtraModifier::Open);
        other.name = "other".to_string();
        let err = DefaultDocumentableMerger
            .merge(vec![module("jvm", "y", ExtraModifier::Open), other])
            .unwrap_err();
        assert!(err.to_string().contains("cannot merge module"));
    }
}
