//! Serialize a [`Protocol`] back into PDL text.
//!
//! Output order: copyright, version, then domains sorted by name; inside each
//! domain types, commands and events are sorted by name. Sorting is stable,
//! so duplicates keep their model order.

use crate::error::{PdlError, Result};
use crate::model::{Domain, Protocol, Type, TypeId, TypeKind};
use std::path::Path;

/// Render `protocol` as PDL. The result ends with exactly one newline.
///
/// Fails with [`PdlError::UnwritableLiteral`] when an enum literal cannot be
/// expressed as a single PDL token (empty, embedded whitespace, or a leading
/// `#`).
pub fn to_pdl(protocol: &Protocol) -> Result<String> {
    let mut w = Writer {
        protocol,
        out: String::new(),
    };
    w.protocol_text()?;
    let mut out = w.out;
    out.truncate(out.trim_end().len());
    out.push('\n');
    Ok(out)
}

/// Render `protocol` and write it to `path`.
pub fn write_file(protocol: &Protocol, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, to_pdl(protocol)?)?;
    Ok(())
}

struct Writer<'a> {
    protocol: &'a Protocol,
    out: String,
}

impl Writer<'_> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn protocol_text(&mut self) -> Result<()> {
        let p = self.protocol;
        let mut domains: Vec<&Domain> = p.domains.iter().collect();
        domains.sort_by(|a, b| a.name.cmp(&b.name));

        if !p.copyright.is_empty() {
            self.description(&p.copyright, "");
            self.out.push('\n');
        } else if p.version.is_none() && domains.first().is_some_and(|d| !d.description.is_empty()) {
            // A leading comment block would be read back as the copyright.
            self.out.push('\n');
        }
        if let Some(version) = p.version {
            self.line("version");
            self.line(&format!("  major {}", version.major));
            self.line(&format!("  minor {}", version.minor));
            self.out.push('\n');
        }

        for d in domains {
            self.domain(d)?;
        }
        Ok(())
    }

    fn domain(&mut self, d: &Domain) -> Result<()> {
        self.description(&d.description, "");
        self.line(&format!(
            "{}domain {}",
            modifiers(d.experimental, d.deprecated, false),
            d.name
        ));
        for dep in &d.dependencies {
            self.line(&format!("  depends on {}", dep));
        }
        self.out.push('\n');

        for id in self.sorted(&d.types) {
            self.type_decl(id)?;
        }
        for id in self.sorted(&d.commands) {
            self.item("command", id)?;
        }
        for id in self.sorted(&d.events) {
            self.item("event", id)?;
        }
        Ok(())
    }

    fn sorted(&self, ids: &[TypeId]) -> Vec<TypeId> {
        let mut ids = ids.to_vec();
        ids.sort_by(|&a, &b| self.protocol[a].name.cmp(&self.protocol[b].name));
        ids
    }

    fn type_decl(&mut self, id: TypeId) -> Result<()> {
        let p = self.protocol;
        let ty = &p[id];
        self.description(&ty.description, "  ");
        let extends = match ty.items {
            Some(items) => format!("array of {}", shape(&p[items])),
            None => shape(ty),
        };
        self.line(&format!(
            "  {}type {} extends {}",
            modifiers(ty.experimental, ty.deprecated, false),
            ty.name,
            extends
        ));
        self.redirect(ty);
        if let Some(values) = &ty.enum_values {
            self.line("    enum");
            self.literals(&ty.name, values, "      ")?;
        }
        self.members("properties", ty.properties.as_deref())?;
        self.out.push('\n');
        Ok(())
    }

    fn item(&mut self, keyword: &str, id: TypeId) -> Result<()> {
        let p = self.protocol;
        let ty = &p[id];
        self.description(&ty.description, "  ");
        self.line(&format!(
            "  {}{} {}",
            modifiers(ty.experimental, ty.deprecated, false),
            keyword,
            ty.name
        ));
        self.redirect(ty);
        self.members("parameters", ty.parameters.as_deref())?;
        self.members("returns", ty.returns.as_deref())?;
        self.out.push('\n');
        Ok(())
    }

    fn members(&mut self, section: &str, members: Option<&[TypeId]>) -> Result<()> {
        let Some(members) = members else {
            return Ok(());
        };
        let p = self.protocol;
        self.line(&format!("    {}", section));
        for &id in members {
            let member = &p[id];
            let (base, literals) = match member.items.map(|items| &p[items]) {
                Some(items) if items.enum_values.is_some() => ("array of enum".to_string(), &items.enum_values),
                Some(items) => (format!("array of {}", shape(items)), &None),
                None if member.enum_values.is_some() => ("enum".to_string(), &member.enum_values),
                None => (shape(member), &None),
            };
            self.description(&member.description, "      ");
            self.line(&format!(
                "      {}{} {}",
                modifiers(member.experimental, member.deprecated, member.optional),
                base,
                member.name
            ));
            if let Some(values) = literals {
                self.literals(&member.name, values, "        ")?;
            }
        }
        Ok(())
    }

    fn literals(&mut self, owner: &str, values: &[String], indent: &str) -> Result<()> {
        for value in values {
            if !is_token(value) {
                return Err(PdlError::UnwritableLiteral {
                    owner: owner.to_string(),
                    literal: value.clone(),
                });
            }
            self.line(&format!("{}{}", indent, value));
        }
        Ok(())
    }

    fn redirect(&mut self, ty: &Type) {
        let Some(redirect) = &ty.redirect else {
            return;
        };
        if !redirect.name.is_empty() {
            self.line(&format!("    # Use '{}' instead", redirect));
        }
        self.line(&format!("    redirect {}", redirect.domain));
    }

    fn description(&mut self, text: &str, indent: &str) {
        if text.is_empty() {
            return;
        }
        for line in text.split('\n') {
            if line.is_empty() {
                self.line(&format!("{}#", indent));
            } else {
                self.line(&format!("{}# {}", indent, line));
            }
        }
    }
}

/// A literal survives a round trip only as one bare token.
fn is_token(literal: &str) -> bool {
    !literal.is_empty() && !literal.starts_with('#') && !literal.contains(char::is_whitespace)
}

/// Reference if present, otherwise the primitive kind.
fn shape(ty: &Type) -> String {
    match (ty.reference(), ty.kind) {
        (Some(reference), _) => reference.to_string(),
        (None, Some(kind)) => kind.to_string(),
        (None, None) => TypeKind::Any.to_string(),
    }
}

fn modifiers(experimental: bool, deprecated: bool, optional: bool) -> String {
    let mut s = String::new();
    for (set, word) in [
        (experimental, "experimental "),
        (deprecated, "deprecated "),
        (optional, "optional "),
    ] {
        if set {
            s.push_str(word);
        }
    }
    s
}
