//! Documentable transformers

use tracing::debug;

use crate::model::{Documentable, DocumentableKind};
use crate::pipeline::DocumentableTransformer;
use crate::types::Result;

/// Drops private and internal declarations together with their members
pub struct PrivateMemberFilter;

impl DocumentableTransformer for PrivateMemberFilter {
    fn transform(&self, mut module: Documentable) -> Result<Documentable> {
        let before = count(&module);
        module.retain_descendants(&|d| {
            d.kind == DocumentableKind::Package || d.visibility.is_exposed()
        });
        debug!(
            "Private member filter removed {} documentable(s) from {}",
            before - count(&module),
            module.name
        );
        Ok(module)
    }
}

/// Drops packages left without declarations
pub struct EmptyPackagesFilter;

impl DocumentableTransformer for EmptyPackagesFilter {
    fn transform(&self, mut module: Documentable) -> Result<Documentable> {
        module
            .children
            .retain(|c| c.kind != DocumentableKind::Package || !c.children.is_empty());
        Ok(module)
    }
}

fn count(documentable: &Documentable) -> usize {
    let mut total = 0;
    documentable.walk(&mut |_| total += 1);
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dri, Visibility};

    fn module() -> Documentable {
        let mut hidden = Documentable::new(
            Dri::package("p").with_classlike("Hidden"),
            "Hidden",
            DocumentableKind::Class,
        );
        hidden.visibility = Visibility::Internal;
        hidden.children.push(Documentable::new(
            Dri::package("p").with_classlike("Hidden").with_callable("run()"),
            "run",
            DocumentableKind::Function,
        ));

        let mut shown = Documentable::new(
            Dri::package("p").with_classlike("Shown"),
            "Shown",
            DocumentableKind::Class,
        );
        let mut secret = Documentable::new(
            Dri::package("p").with_classlike("Shown").with_callable("secret"),
            "secret",
            DocumentableKind::Property,
        );
        secret.visibility = Visibility::Private;
        shown.children.push(secret);

        let mut package = Documentable::new(Dri::package("p"), "p", DocumentableKind::Package);
        package.children = vec![hidden, shown];

        let mut only_hidden = Documentable::new(Dri::package("q"), "q", DocumentableKind::Package);
        let mut internal = Documentable::new(
            Dri::package("q").with_classlike("Impl"),
            "Impl",
            DocumentableKind::Object,
        );
        internal.visibility = Visibility::Private;
        only_hidden.children.push(internal);

        let mut module = Documentable::new(Dri::package(""), "m", DocumentableKind::Module);
        module.children = vec![package, only_hidden];
        module
    }

    #[test]
    fn test_private_member_filter() {
        let filtered = PrivateMemberFilter.transform(module()).unwrap();

        let mut names = Vec::new();
        filtered.walk(&mut |d| names.push(d.name.clone()));
        assert_eq!(names, ["m", "p", "Shown", "q"]);
    }

    #[test]
    fn test_empty_packages_filter_after_private_filter() {
        let filtered = PrivateMemberFilter.transform(module()).unwrap();
        let filtered = EmptyPackagesFilter.transform(filtered).unwrap();

        let packages: Vec<&str> = filtered.children.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(packages, ["p"]);
    }
}
