//! Curated fix-up tables.
//!
//! The fix-up pass is generic; everything specific to a particular protocol
//! (renames, enum names, timestamp fields, shared types) comes from a
//! [`FixupConfig`] loaded from JSON. [`FixupConfig::builtin`] returns the
//! tables shipped in `config/builtin.json`.

use crate::error::Result;
use crate::model::{TimestampKind, TypeKind};
use crate::resolve::CircularDeps;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN: &str = include_str!("../config/builtin.json");

/// Tables driving [`crate::fixup::fix_domains`].
///
/// Qualified keys use `Domain.Type` or `Domain.Owner.member`, where `Owner`
/// is a type, command or event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixupConfig {
    /// Namespace shared types are hoisted into.
    pub shared_namespace: String,
    /// `domain.type` pairs, case-insensitive.
    pub circular_dependencies: Vec<String>,
    /// `Domain.Owner.field` to promoted enum type name.
    pub enum_names: BTreeMap<String, String>,
    /// `Domain.Type` to new type name; references follow the rename.
    pub type_renames: BTreeMap<String, String>,
    /// `Domain.Type` to timestamp flavor.
    pub timestamps: BTreeMap<String, TimestampKind>,
    /// `Domain.Type` entries turned into string to any maps.
    pub map_types: Vec<String>,
    /// Types appended to a domain before any other fix-up.
    pub added_types: Vec<AddedType>,
    /// Member name to reference, applied in every domain.
    pub field_refs: BTreeMap<String, String>,
    /// `Domain.Owner.member` to reference.
    pub member_refs: BTreeMap<String, String>,
    /// `Domain.Type` to hidden properties appended to it.
    pub extra_properties: BTreeMap<String, Vec<ExtraProperty>>,
}

impl Default for FixupConfig {
    fn default() -> Self {
        FixupConfig {
            shared_namespace: "cdp".to_string(),
            circular_dependencies: Vec::new(),
            enum_names: BTreeMap::new(),
            type_renames: BTreeMap::new(),
            timestamps: BTreeMap::new(),
            map_types: Vec::new(),
            added_types: Vec::new(),
            field_refs: BTreeMap::new(),
            member_refs: BTreeMap::new(),
            extra_properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddedType {
    pub domain: String,
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub bit_mask: bool,
}

/// Property that is neither exposed nor resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraProperty {
    pub name: String,
    pub reference: String,
    #[serde(default)]
    pub description: String,
}

impl FixupConfig {
    /// Tables for the Chrome DevTools protocol.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn circular_deps(&self) -> CircularDeps {
        CircularDeps::new(self.shared_namespace.clone(), &self.circular_dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdlError;
    use std::io::Write;

    #[test]
    fn builtin_tables_load() {
        let config = FixupConfig::builtin().expect("builtin");
        assert_eq!(config.shared_namespace, "cdp");
        assert!(config.circular_deps().contains("DOM", "NodeId"));
        assert_eq!(
            config.enum_names.get("Runtime.RemoteObject.type").map(String::as_str),
            Some("Type")
        );
        assert_eq!(
            config.timestamps.get("Runtime.Timestamp"),
            Some(&TimestampKind::Millisecond)
        );
        let modifier = config
            .added_types
            .iter()
            .find(|t| t.name == "Modifier")
            .expect("Modifier");
        assert!(modifier.bit_mask);
        assert_eq!(modifier.kind, TypeKind::Integer);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = FixupConfig::from_json(r#"{ "map_types": ["Network.Headers"] }"#).unwrap();
        assert_eq!(config.shared_namespace, "cdp");
        assert_eq!(config.map_types, ["Network.Headers"]);
        assert!(config.enum_names.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FixupConfig::from_json(r#"{ "renames": {} }"#).unwrap_err();
        assert!(matches!(err, PdlError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "shared_namespace": "common", "timestamps": {{ "Net.Time": "monotonic" }} }}"#
        )
        .unwrap();
        let config = FixupConfig::from_file(file.path()).unwrap();
        assert_eq!(config.shared_namespace, "common");
        assert_eq!(config.timestamps.get("Net.Time"), Some(&TimestampKind::Monotonic));
    }
}
