//! In-memory model of a protocol definition.
//!
//! All [`Type`] records (standalone types, commands, events and every nested
//! property, parameter, return and array item) live in one arena owned by
//! [`Protocol`] and are addressed by [`TypeId`]. Domains and container types
//! hold ordered lists of ids, so handles stay valid while lists grow and while
//! the fix-up pass rewrites the model in place.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Stable handle of a [`Type`] inside its [`Protocol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }

    fn shifted(self, offset: usize) -> Self {
        TypeId(self.0 + offset)
    }
}

/// Primitive shape of a type. References carry no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Any,
    Array,
    Binary,
    Boolean,
    Integer,
    Number,
    Object,
    String,
    /// Produced by the fix-up pass for time values; see [`TimestampKind`].
    Timestamp,
    /// String to any mapping, produced by the fix-up pass.
    Map,
}

impl TypeKind {
    /// Kinds that may appear literally in PDL source.
    pub fn primitive(token: &str) -> Option<Self> {
        match token {
            "any" => Some(TypeKind::Any),
            "array" => Some(TypeKind::Array),
            "binary" => Some(TypeKind::Binary),
            "boolean" => Some(TypeKind::Boolean),
            "integer" => Some(TypeKind::Integer),
            "number" => Some(TypeKind::Number),
            "object" => Some(TypeKind::Object),
            "string" => Some(TypeKind::String),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::Array => "array",
            TypeKind::Binary => "binary",
            TypeKind::Boolean => "boolean",
            TypeKind::Integer => "integer",
            TypeKind::Number => "number",
            TypeKind::Object => "object",
            TypeKind::String => "string",
            TypeKind::Timestamp => "timestamp",
            TypeKind::Map => "map",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Epoch and unit of a [`TypeKind::Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampKind {
    /// Milliseconds since the Unix epoch.
    Millisecond,
    /// Seconds since the Unix epoch.
    Second,
    /// Seconds since an arbitrary monotonic origin.
    Monotonic,
}

/// Marks a type, command or event as superseded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirect {
    pub domain: String,
    /// Target name taken from a `Use 'X' instead` comment; may be empty.
    pub name: String,
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.domain)
        } else {
            write!(f, "{}.{}", self.domain, self.name)
        }
    }
}

/// Universal structural unit: standalone type, command, event, or member.
///
/// `None` for a list means the section was never declared; `Some(vec![])`
/// means it was declared empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Type {
    pub kind: Option<TypeKind>,
    pub name: String,
    pub description: String,
    pub experimental: bool,
    pub deprecated: bool,
    pub optional: bool,
    /// Dotted (`Domain.Name`) or bare reference to another type.
    pub reference: Option<String>,
    pub items: Option<TypeId>,
    pub properties: Option<Vec<TypeId>>,
    pub parameters: Option<Vec<TypeId>>,
    pub returns: Option<Vec<TypeId>>,
    pub redirect: Option<Redirect>,
    pub enum_values: Option<Vec<String>>,
    pub timestamp: Option<TimestampKind>,
    /// Integer enum whose values combine as bit flags.
    pub enum_bit_mask: bool,
    /// Hidden from generated output.
    pub no_expose: bool,
    /// Never resolved against the domain list.
    pub no_resolve: bool,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type {
            name: name.into(),
            ..Type::default()
        }
    }

    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.kind = None;
        self.reference = Some(reference.into());
        self
    }

    /// Non-empty reference, if any.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }

    pub fn has_enum(&self) -> bool {
        self.enum_values.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Iterate over properties, parameters and returns in that order.
    pub fn members(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.properties
            .iter()
            .chain(self.parameters.iter())
            .chain(self.returns.iter())
            .flatten()
            .copied()
    }

    fn shift(&mut self, offset: usize) {
        self.items = self.items.map(|id| id.shifted(offset));
        for list in [&mut self.properties, &mut self.parameters, &mut self.returns]
            .into_iter()
            .flatten()
        {
            for id in list.iter_mut() {
                *id = id.shifted(offset);
            }
        }
    }
}

/// Top-level namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    pub name: String,
    pub description: String,
    pub experimental: bool,
    pub deprecated: bool,
    pub dependencies: Vec<String>,
    pub types: Vec<TypeId>,
    pub commands: Vec<TypeId>,
    pub events: Vec<TypeId>,
}

impl Domain {
    pub fn named(name: impl Into<String>) -> Self {
        Domain {
            name: name.into(),
            ..Domain::default()
        }
    }

    fn shift(&mut self, offset: usize) {
        for list in [&mut self.types, &mut self.commands, &mut self.events] {
            for id in list.iter_mut() {
                *id = id.shifted(offset);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

/// A parsed protocol definition: copyright, version, domains and the type arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protocol {
    pub copyright: String,
    pub version: Option<Version>,
    pub domains: Vec<Domain>,
    types: Vec<Type>,
}

impl Index<TypeId> for Protocol {
    type Output = Type;

    fn index(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }
}

impl IndexMut<TypeId> for Protocol {
    fn index_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0]
    }
}

impl Protocol {
    /// Move `ty` into the arena and return its handle.
    pub fn alloc(&mut self, ty: Type) -> TypeId {
        self.types.push(ty);
        TypeId(self.types.len() - 1)
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.0)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn domain_mut(&mut self, name: &str) -> Option<&mut Domain> {
        self.domains.iter_mut().find(|d| d.name == name)
    }

    /// First type named `name` in the first domain named `domain`.
    pub fn find_type(&self, domain: &str, name: &str) -> Option<TypeId> {
        self.domain(domain)?
            .types
            .iter()
            .copied()
            .find(|&id| self[id].name == name)
    }

    /// First command or event named `name` in domain `domain`.
    pub fn find_item(&self, domain: &str, name: &str) -> Option<TypeId> {
        let d = self.domain(domain)?;
        d.commands
            .iter()
            .chain(d.events.iter())
            .copied()
            .find(|&id| self[id].name == name)
    }

    /// Member `name` of container `owner` (properties, parameters, then returns).
    pub fn find_member(&self, owner: TypeId, name: &str) -> Option<TypeId> {
        self[owner].members().find(|&id| self[id].name == name)
    }

    /// Combine several protocols into one.
    ///
    /// Copyright comes from the first source with a non-empty one, the version
    /// is the highest seen (major first, then minor), and domains are appended
    /// in source order without de-duplication.
    pub fn merge(sources: impl IntoIterator<Item = Protocol>) -> Protocol {
        let mut merged = Protocol::default();
        for source in sources {
            if merged.copyright.is_empty() {
                merged.copyright = source.copyright;
            }
            merged.version = match (merged.version, source.version) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            let offset = merged.types.len();
            merged.types.extend(source.types.into_iter().map(|mut ty| {
                ty.shift(offset);
                ty
            }));
            merged.domains.extend(source.domains.into_iter().map(|mut d| {
                d.shift(offset);
                d
            }));
        }
        merged
    }

    /// Drop deprecated domains and, recursively, every deprecated or
    /// redirected type, command, event and member.
    pub fn prune(&mut self) {
        self.domains.retain(|d| {
            if d.deprecated {
                tracing::info!(domain = %d.name, "skipping deprecated domain");
            }
            !d.deprecated
        });
        let mut domains = std::mem::take(&mut self.domains);
        for d in &mut domains {
            for (what, list) in [
                ("type", &mut d.types),
                ("command", &mut d.commands),
                ("event", &mut d.events),
            ] {
                let kept = self.prune_list(what, &d.name, list);
                *list = kept;
            }
        }
        self.domains = domains;
    }

    fn prune_list(&mut self, what: &str, path: &str, list: &[TypeId]) -> Vec<TypeId> {
        let mut kept = Vec::with_capacity(list.len());
        for &id in list {
            let full = format!("{}.{}", path, self[id].name);
            if self[id].deprecated {
                tracing::info!(%what, name = %full, "skipping deprecated");
                continue;
            }
            if let Some(redirect) = &self[id].redirect {
                tracing::info!(%what, name = %full, %redirect, "skipping redirected");
                continue;
            }
            if let Some(props) = self[id].properties.clone() {
                let props = self.prune_list("property", &full, &props);
                self[id].properties = Some(props);
            }
            if let Some(params) = self[id].parameters.clone() {
                let params = self.prune_list("parameter", &full, &params);
                self[id].parameters = Some(params);
            }
            if let Some(rets) = self[id].returns.clone() {
                let rets = self.prune_list("return", &full, &rets);
                self[id].returns = Some(rets);
            }
            kept.push(id);
        }
        kept
    }
}
