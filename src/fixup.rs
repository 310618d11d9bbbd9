//! Normalization pass run once over a parsed [`Protocol`].
//!
//! For every domain, in order:
//!
//! 1. append the configured added types;
//! 2. apply type-level tables (timestamps, maps, extra properties, renames);
//! 3. rewrite members of types, commands and events: promote inline enums to
//!    named types, substitute configured references, and drop a redundant
//!    domain prefix from references;
//! 4. strip the domain name from type names that start with it (`CSSStyle`
//!    in `CSS` becomes `Style`).
//!
//! Finally every reference is resolved; any failure aborts the pass.

use crate::config::FixupConfig;
use crate::error::{PdlError, Result};
use crate::ident::camel_identifier;
use crate::model::{Protocol, Type, TypeId, TypeKind};
use crate::resolve::validate_references;
use std::collections::HashMap;

/// Apply every fix-up to `protocol` in place, then validate all references.
pub fn fix_domains(protocol: &mut Protocol, config: &FixupConfig) -> Result<()> {
    let renames = config
        .type_renames
        .iter()
        .filter_map(|(key, new)| {
            let (domain, name) = key.split_once('.')?;
            Some(((domain.to_string(), name.to_string()), new.clone()))
        })
        .collect();
    let mut fixer = Fixer {
        protocol: &mut *protocol,
        config,
        renames,
    };
    for index in 0..fixer.protocol.domains.len() {
        fixer.fix_domain(index)?;
    }
    validate_references(protocol, &config.circular_deps())
}

/// Drop a leading `domain` from a bare reference, or the reference's own
/// domain from the name part of a qualified one. Never produces an empty name.
pub fn strip_stutter(reference: &str, domain: &str) -> String {
    match reference.split_once('.') {
        Some((target, name)) => match name.strip_prefix(target) {
            Some(stripped) if !stripped.is_empty() => format!("{}.{}", target, stripped),
            _ => reference.to_string(),
        },
        None => match reference.strip_prefix(domain) {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => reference.to_string(),
        },
    }
}

struct Fixer<'a> {
    protocol: &'a mut Protocol,
    config: &'a FixupConfig,
    /// (domain, old name) to new name.
    renames: HashMap<(String, String), String>,
}

impl Fixer<'_> {
    fn fix_domain(&mut self, index: usize) -> Result<()> {
        let domain = self.protocol.domains[index].name.clone();
        tracing::debug!(%domain, "fixing up domain");

        for added in self.config.added_types.iter().filter(|t| t.domain == domain) {
            let id = self.protocol.alloc(Type {
                kind: Some(added.kind),
                description: added.description.clone(),
                enum_values: (!added.enum_values.is_empty()).then(|| added.enum_values.clone()),
                enum_bit_mask: added.bit_mask,
                ..Type::named(added.name.clone())
            });
            self.protocol.domains[index].types.push(id);
        }

        let types = self.protocol.domains[index].types.clone();
        for &id in &types {
            self.fix_type(&domain, id);
        }

        let d = &self.protocol.domains[index];
        let containers: Vec<TypeId> = types
            .iter()
            .chain(d.commands.iter())
            .chain(d.events.iter())
            .copied()
            .collect();
        for id in containers {
            let owner = self.protocol[id].name.clone();
            let members: Vec<TypeId> = self.protocol[id].members().collect();
            for member in members {
                let field = self.protocol[member].name.clone();
                self.convert_member(index, &domain, &owner, &field, member, false)?;
            }
        }
        for &id in &types {
            self.rewrite_reference(&domain, id);
            if let Some(items) = self.protocol[id].items {
                self.rewrite_reference(&domain, items);
            }
        }

        let types = self.protocol.domains[index].types.clone();
        for id in types {
            let ty = &mut self.protocol[id];
            if ty.no_expose || ty.no_resolve {
                continue;
            }
            match ty.name.strip_prefix(domain.as_str()) {
                Some(stripped) if !stripped.is_empty() => {
                    tracing::debug!(%domain, from = %ty.name, to = %stripped, "removed stutter");
                    ty.name = stripped.to_string();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn fix_type(&mut self, domain: &str, id: TypeId) {
        let key = format!("{}.{}", domain, self.protocol[id].name);

        if let Some(&timestamp) = self.config.timestamps.get(&key) {
            let ty = &mut self.protocol[id];
            ty.kind = Some(TypeKind::Timestamp);
            ty.timestamp = Some(timestamp);
            ty.reference = None;
        }
        if self.config.map_types.contains(&key) {
            let ty = &mut self.protocol[id];
            ty.kind = Some(TypeKind::Map);
            ty.reference = None;
        }
        if let Some(extra) = self.config.extra_properties.get(&key) {
            for prop in extra {
                let pid = self.protocol.alloc(Type {
                    description: prop.description.clone(),
                    no_expose: true,
                    no_resolve: true,
                    ..Type::named(prop.name.clone()).with_reference(prop.reference.clone())
                });
                self.protocol[id]
                    .properties
                    .get_or_insert_with(Vec::new)
                    .push(pid);
            }
        }
        if let Some(new) = self.config.type_renames.get(&key) {
            tracing::debug!(from = %key, to = %new, "renamed type");
            self.protocol[id].name = new.clone();
        }
    }

    /// Rewrite one member. `field` names the member even when `id` is the
    /// items type of an array member (`nested`).
    fn convert_member(
        &mut self,
        index: usize,
        domain: &str,
        owner: &str,
        field: &str,
        id: TypeId,
        nested: bool,
    ) -> Result<()> {
        let config = self.config;
        let ty = &self.protocol[id];
        if ty.no_expose || ty.no_resolve {
            return Ok(());
        }
        if let Some(items) = ty.items {
            return self.convert_member(index, domain, owner, field, items, true);
        }
        let has_enum = ty.has_enum();

        let key = format!("{}.{}.{}", domain, owner, field);
        let replacement = match config.member_refs.get(&key) {
            Some(reference) if !nested => Some(reference.clone()),
            _ if has_enum => Some(self.promote_enum(index, domain, &key, owner, field, id)?),
            _ if !nested => config.field_refs.get(field).cloned(),
            _ => None,
        };
        if let Some(reference) = replacement {
            let ty = &mut self.protocol[id];
            ty.kind = None;
            ty.enum_values = None;
            ty.reference = Some(reference);
        }
        self.rewrite_reference(domain, id);
        Ok(())
    }

    /// Move the literals of `member` into a named string type of `domain`,
    /// creating it or unioning into an existing one. Returns the type name.
    fn promote_enum(
        &mut self,
        index: usize,
        domain: &str,
        key: &str,
        owner: &str,
        field: &str,
        member: TypeId,
    ) -> Result<String> {
        let name = self
            .config
            .enum_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| camel_identifier(&format!("{}.{}", owner, field)));
        let source = &self.protocol[member];
        let values = source.enum_values.clone().unwrap_or_default();
        let description = source.description.clone();
        let optional = source.optional;

        let existing = self.protocol.domains[index]
            .types
            .iter()
            .copied()
            .find(|&t| self.protocol[t].name == name);
        let target = match existing {
            Some(t) => {
                let ty = &self.protocol[t];
                if ty.kind != Some(TypeKind::String) || ty.reference.is_some() || ty.properties.is_some() {
                    let shape = ty
                        .kind
                        .map(|k| k.to_string())
                        .or_else(|| ty.reference.clone())
                        .unwrap_or_default();
                    return Err(PdlError::EnumCollision {
                        domain: domain.to_string(),
                        name,
                        reason: format!("{} promotes string literals onto existing {} type", key, shape),
                    });
                }
                t
            }
            None => {
                let t = self.protocol.alloc(Type {
                    kind: Some(TypeKind::String),
                    description,
                    optional,
                    ..Type::named(name.clone())
                });
                self.protocol.domains[index].types.push(t);
                t
            }
        };

        let current = self.protocol[target].enum_values.take().unwrap_or_default();
        let mut merged: Vec<String> = Vec::with_capacity(current.len() + values.len());
        for value in current.into_iter().chain(values) {
            if !merged.contains(&value) {
                merged.push(value);
            }
        }
        tracing::debug!(%domain, from = %key, to = %name, literals = merged.len(), "promoted enum");
        self.protocol[target].enum_values = Some(merged);
        Ok(name)
    }

    /// Apply type renames and stutter removal to the reference held by `id`.
    fn rewrite_reference(&mut self, domain: &str, id: TypeId) {
        let ty = &self.protocol[id];
        if ty.no_expose || ty.no_resolve {
            return;
        }
        let Some(reference) = ty.reference() else {
            return;
        };
        let (target, name) = reference.split_once('.').unwrap_or((domain, reference));
        let renamed = match self.renames.get(&(target.to_string(), name.to_string())) {
            Some(new) if reference.contains('.') => format!("{}.{}", target, new),
            Some(new) => new.clone(),
            None => reference.to_string(),
        };
        let rewritten = strip_stutter(&renamed, domain);
        if rewritten != reference {
            tracing::debug!(%domain, from = %reference, to = %rewritten, "rewrote reference");
            self.protocol[id].reference = Some(rewritten);
        }
    }
}
