//! Reference resolution across domains.
//!
//! [`resolve`] is the only place that turns a dotted reference into a type
//! handle. It is used by the fix-up pass, by [`validate_references`], and by
//! any downstream emitter.

use crate::error::{PdlError, Result};
use crate::ident::camel_identifier;
use crate::model::{Protocol, Type, TypeId};
use std::collections::HashSet;

/// Decides which types live in the shared namespace instead of their own domain.
pub trait SharedTypes {
    /// Qualifier used for shared types, e.g. `cdp`.
    fn namespace(&self) -> &str;

    fn is_shared(&self, domain: &str, name: &str) -> bool;
}

/// Case-insensitive set of `domain.type` pairs that would create import cycles
/// between domains and are therefore hoisted into the shared namespace.
#[derive(Debug, Clone, Default)]
pub struct CircularDeps {
    namespace: String,
    entries: HashSet<String>,
}

impl CircularDeps {
    pub fn new<I, S>(namespace: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CircularDeps {
            namespace: namespace.into(),
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, domain: &str, name: &str) -> bool {
        self.entries
            .contains(&format!("{}.{}", domain, name).to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SharedTypes for CircularDeps {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn is_shared(&self, domain: &str, name: &str) -> bool {
        self.contains(domain, name)
    }
}

/// Shared-type policy backed by an arbitrary predicate.
pub struct SharedPredicate<F> {
    pub namespace: String,
    pub predicate: F,
}

impl<F: Fn(&str, &str) -> bool> SharedTypes for SharedPredicate<F> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn is_shared(&self, domain: &str, name: &str) -> bool {
        (self.predicate)(domain, name)
    }
}

/// Result of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Domain the reference points into.
    pub domain: String,
    pub id: TypeId,
    /// Name qualified for use from the requesting domain, e.g. `cdp.NodeID`,
    /// `runtime.RemoteObjectID` or `FrameID`.
    pub display_name: String,
}

/// Resolve `reference` (`Domain.Name`, or `Name` relative to `current`).
///
/// Only the first domain with the target name is searched.
pub fn resolve(
    protocol: &Protocol,
    reference: &str,
    current: &str,
    shared: &dyn SharedTypes,
) -> Result<Resolved> {
    let (domain, name) = reference.split_once('.').unwrap_or((current, reference));

    let id = protocol
        .domains
        .iter()
        .find(|d| d.name == domain)
        .and_then(|d| d.types.iter().copied().find(|&id| protocol[id].name == name))
        .ok_or_else(|| PdlError::UnresolvedReference {
            reference: reference.to_string(),
            domain: current.to_string(),
        })?;

    let mut display_name = String::new();
    if shared.is_shared(domain, name) {
        if current != shared.namespace() {
            display_name.push_str(shared.namespace());
            display_name.push('.');
        }
    } else if domain != current {
        display_name.push_str(&domain.to_lowercase());
        display_name.push('.');
    }
    display_name.push_str(&camel_identifier(name));

    Ok(Resolved {
        domain: domain.to_string(),
        id,
        display_name,
    })
}

/// Resolve every reference reachable from every domain, skipping types
/// flagged `no_resolve`. Fails on the first reference that does not resolve.
pub fn validate_references(protocol: &Protocol, shared: &dyn SharedTypes) -> Result<()> {
    for d in &protocol.domains {
        let mut pending: Vec<TypeId> = d
            .types
            .iter()
            .chain(d.commands.iter())
            .chain(d.events.iter())
            .copied()
            .collect();
        while let Some(id) = pending.pop() {
            let ty: &Type = &protocol[id];
            if ty.no_resolve {
                continue;
            }
            if let Some(reference) = ty.reference() {
                resolve(protocol, reference, &d.name, shared)?;
            }
            pending.extend(ty.items);
            pending.extend(ty.members());
        }
        tracing::debug!(domain = %d.name, "references resolved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const SRC: &str = "\
domain DOM
  type NodeId extends integer
  type Rect extends object
    properties
      number x

domain Page
  type FrameId extends string
  type Frame extends object
    properties
      FrameId id
      DOM.NodeId owner
      DOM.Rect bounds
";

    #[test]
    fn local_reference_has_no_prefix() {
        let p = parse(SRC).unwrap();
        let shared = CircularDeps::new("cdp", ["dom.nodeid"]);
        let r = resolve(&p, "FrameId", "Page", &shared).unwrap();
        assert_eq!(r.domain, "Page");
        assert_eq!(p[r.id].name, "FrameId");
        assert_eq!(r.display_name, "FrameID");
    }

    #[test]
    fn shared_reference_uses_shared_namespace() {
        let p = parse(SRC).unwrap();
        let shared = CircularDeps::new("cdp", ["DOM.NodeId"]);
        let r = resolve(&p, "DOM.NodeId", "Page", &shared).unwrap();
        assert_eq!(r.display_name, "cdp.NodeID");
        let r = resolve(&p, "DOM.NodeId", "cdp", &shared).unwrap();
        assert_eq!(r.display_name, "NodeID");
    }

    #[test]
    fn cross_domain_reference_uses_lowercase_domain() {
        let p = parse(SRC).unwrap();
        let shared = CircularDeps::new("cdp", ["dom.nodeid"]);
        let r = resolve(&p, "DOM.Rect", "Page", &shared).unwrap();
        assert_eq!(r.domain, "DOM");
        assert_eq!(r.display_name, "dom.Rect");
    }

    #[test]
    fn predicate_policy() {
        let p = parse(SRC).unwrap();
        let shared = SharedPredicate {
            namespace: "common".to_string(),
            predicate: |d: &str, _n: &str| d == "DOM",
        };
        let r = resolve(&p, "DOM.Rect", "Page", &shared).unwrap();
        assert_eq!(r.display_name, "common.Rect");
    }

    #[test]
    fn unresolved_reference_is_fatal() {
        let p = parse(SRC).unwrap();
        let shared = CircularDeps::default();
        match resolve(&p, "NoSuchDomain.Nothing", "Page", &shared) {
            Err(PdlError::UnresolvedReference { reference, domain }) => {
                assert_eq!(reference, "NoSuchDomain.Nothing");
                assert_eq!(domain, "Page");
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
        assert!(resolve(&p, "Missing", "DOM", &shared).is_err());
    }

    #[test]
    fn validate_walks_members() {
        let p = parse(SRC).unwrap();
        validate_references(&p, &CircularDeps::default()).unwrap();

        let broken = format!("{}      DOM.Gone gone\n", SRC);
        let p = parse(&broken).unwrap();
        assert!(matches!(
            validate_references(&p, &CircularDeps::default()),
            Err(PdlError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn circular_deps_are_case_insensitive() {
        let deps = CircularDeps::new("cdp", ["Page.FrameId"]);
        assert!(deps.contains("page", "frameid"));
        assert!(deps.contains("PAGE", "FRAMEID"));
        assert!(!deps.contains("Page", "Frame"));
        assert_eq!(deps.len(), 1);
    }
}
