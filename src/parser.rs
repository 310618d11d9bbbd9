//! Build a [`Protocol`] from PDL source, one classified line at a time.
//!
//! The builder is a single forward pass with no lookahead. All state lives in
//! [`ParserContext`]; list pointers of the classic design are replaced by
//! [`InsertionTarget`] handles into the type arena.

use crate::error::{PdlError, Result};
use crate::lexer::{classify, ItemKind, Line, Modifiers, Section};
use crate::model::*;

/// List that new members are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionTarget {
    Properties(TypeId),
    Parameters(TypeId),
    Returns(TypeId),
}

impl InsertionTarget {
    fn new(section: Section, owner: TypeId) -> Self {
        match section {
            Section::Parameters => InsertionTarget::Parameters(owner),
            Section::Returns => InsertionTarget::Returns(owner),
            Section::Properties => InsertionTarget::Properties(owner),
        }
    }

    fn list<'p>(&self, protocol: &'p mut Protocol) -> &'p mut Option<Vec<TypeId>> {
        match *self {
            InsertionTarget::Properties(id) => &mut protocol[id].properties,
            InsertionTarget::Parameters(id) => &mut protocol[id].parameters,
            InsertionTarget::Returns(id) => &mut protocol[id].returns,
        }
    }
}

/// State carried between lines.
#[derive(Debug, Clone, Default)]
pub struct ParserContext {
    /// Index into `Protocol::domains` of the most recent `domain` header.
    pub domain: Option<usize>,
    /// Most recent type, command or event declaration.
    pub item: Option<TypeId>,
    pub sub_items: Option<InsertionTarget>,
    /// Type whose enum list receives literals.
    pub enum_literals: Option<TypeId>,
    pub description: String,
    copyright_captured: bool,
    clear_description: bool,
}

/// Incremental PDL parser. Feed lines in order, then call [`Parser::finish`].
#[derive(Debug, Default)]
pub struct Parser {
    protocol: Protocol,
    context: ParserContext,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    pub fn context(&self) -> &ParserContext {
        &self.context
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn finish(self) -> Protocol {
        self.protocol
    }

    /// Consume one physical line. `index` is its 0-based position in the source.
    pub fn feed(&mut self, index: usize, raw: &str) -> Result<()> {
        if self.context.clear_description {
            self.context.description.clear();
            self.context.clear_description = false;
        }

        let line = classify(index, raw)?;
        if let Line::Comment(text) = line {
            if !self.context.description.is_empty() {
                self.context.description.push('\n');
            }
            self.context.description.push_str(text);
            return Ok(());
        }

        if !self.context.copyright_captured {
            // The first block of comments belongs to the file, not to a declaration.
            self.context.copyright_captured = true;
            self.protocol.copyright = std::mem::take(&mut self.context.description);
        }
        self.context.clear_description = true;

        let missing = |what: &'static str| PdlError::MissingContext {
            line: index,
            what,
            text: raw.to_string(),
        };
        let description = self.context.description.trim().to_string();

        match line {
            Line::Blank | Line::Comment(_) => {}
            Line::Domain { name, modifiers } => {
                self.protocol.domains.push(Domain {
                    name: name.to_string(),
                    description,
                    experimental: modifiers.experimental,
                    deprecated: modifiers.deprecated,
                    ..Domain::default()
                });
                self.context.domain = Some(self.protocol.domains.len() - 1);
            }
            Line::DependsOn(name) => {
                let domain = self.current_domain().ok_or_else(|| missing("depends on outside of a domain"))?;
                domain.dependencies.push(name.to_string());
            }
            Line::Type {
                name,
                base,
                modifiers,
            } => {
                let domain = self.context.domain.ok_or_else(|| missing("type outside of a domain"))?;
                let mut ty = declared(name, description, modifiers);
                assign_type(&mut self.protocol, &mut ty, base, modifiers.array);
                let id = self.protocol.alloc(ty);
                self.protocol.domains[domain].types.push(id);
                self.context.item = Some(id);
            }
            Line::Item {
                kind,
                name,
                modifiers,
            } => {
                let domain = self.context.domain.ok_or_else(|| missing("command or event outside of a domain"))?;
                let id = self.protocol.alloc(declared(name, description, modifiers));
                let d = &mut self.protocol.domains[domain];
                match kind {
                    ItemKind::Command => d.commands.push(id),
                    ItemKind::Event => d.events.push(id),
                }
                self.context.item = Some(id);
            }
            Line::Member {
                name,
                base,
                modifiers,
            } => {
                let target = self.context.sub_items.ok_or_else(|| missing("member outside of a parameters, returns or properties block"))?;
                let mut member = declared(name, description, modifiers);
                member.optional = modifiers.optional;
                assign_type(&mut self.protocol, &mut member, base, modifiers.array);
                let items = member.items;
                let id = self.protocol.alloc(member);
                if base == "enum" {
                    // Literals of `array of enum` belong to the items type.
                    let literals = items.unwrap_or(id);
                    self.protocol[literals].enum_values = Some(Vec::new());
                    self.context.enum_literals = Some(literals);
                }
                target.list(&mut self.protocol).get_or_insert_with(Vec::new).push(id);
            }
            Line::Section(section) => {
                let item = self.context.item.ok_or_else(|| missing("section marker before any declaration"))?;
                let target = InsertionTarget::new(section, item);
                *target.list(&mut self.protocol) = Some(Vec::new());
                self.context.sub_items = Some(target);
            }
            Line::Enum => {
                let item = self.context.item.ok_or_else(|| missing("enum marker before any declaration"))?;
                self.protocol[item].enum_values = Some(Vec::new());
                self.context.enum_literals = Some(item);
            }
            Line::Version => self.protocol.version = Some(Version::default()),
            Line::Major(major) => {
                self.protocol.version.as_mut().ok_or_else(|| missing("major outside of a version block"))?.major = major;
            }
            Line::Minor(minor) => {
                self.protocol.version.as_mut().ok_or_else(|| missing("minor outside of a version block"))?.minor = minor;
            }
            Line::Redirect(domain) => {
                let item = self.context.item.ok_or_else(|| missing("redirect before any declaration"))?;
                let name = redirect_name(&self.context.description).unwrap_or_default();
                self.protocol[item].redirect = Some(Redirect {
                    domain: domain.to_string(),
                    name,
                });
            }
            Line::EnumLiteral(literal) => {
                let owner = self.context.enum_literals.ok_or_else(|| missing("enum literal outside of an enum block"))?;
                self.protocol[owner]
                    .enum_values
                    .get_or_insert_with(Vec::new)
                    .push(literal.to_string());
            }
        }
        Ok(())
    }

    fn current_domain(&mut self) -> Option<&mut Domain> {
        let index = self.context.domain?;
        self.protocol.domains.get_mut(index)
    }
}

fn declared(name: &str, description: String, modifiers: Modifiers) -> Type {
    Type {
        name: name.to_string(),
        description,
        experimental: modifiers.experimental,
        deprecated: modifiers.deprecated,
        ..Type::default()
    }
}

/// Give `ty` the shape named by `base`.
///
/// Arrays get an items type built from `base`; `enum` is a string; the eight
/// primitive names map to their kind; anything else is kept as a reference.
pub fn assign_type(protocol: &mut Protocol, ty: &mut Type, base: &str, is_array: bool) {
    if is_array {
        let mut items = Type::default();
        assign_type(protocol, &mut items, base, false);
        ty.kind = Some(TypeKind::Array);
        ty.items = Some(protocol.alloc(items));
        return;
    }
    let base = if base == "enum" { "string" } else { base };
    match TypeKind::primitive(base) {
        Some(kind) => ty.kind = Some(kind),
        None => ty.reference = Some(base.to_string()),
    }
}

/// Target name of a `Use 'Domain.name' instead` description.
fn redirect_name(description: &str) -> Option<String> {
    let quoted = description.strip_prefix("Use '")?.strip_suffix("' instead")?;
    if quoted.is_empty() || quoted.contains('\'') {
        return None;
    }
    let name = quoted.rsplit('.').next().unwrap_or(quoted);
    Some(name.to_string())
}

/// Parse PDL source into a [`Protocol`].
pub fn parse(source: &str) -> Result<Protocol> {
    let mut parser = Parser::new();
    for (index, line) in source.split('\n').enumerate() {
        parser.feed(index, line.strip_suffix('\r').unwrap_or(line))?;
    }
    Ok(parser.finish())
}

/// Read and parse a PDL file.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Protocol> {
    let source = std::fs::read_to_string(path)?;
    parse(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_follows_declarations() {
        let mut p = Parser::new();
        p.feed(0, "domain Page").unwrap();
        assert_eq!(p.context().domain, Some(0));
        assert_eq!(p.context().item, None);

        p.feed(1, "  type Frame extends object").unwrap();
        let frame = p.context().item.expect("item");
        p.feed(2, "    properties").unwrap();
        assert_eq!(p.context().sub_items, Some(InsertionTarget::Properties(frame)));

        p.feed(3, "      enum kind").unwrap();
        let kind = p.context().enum_literals.expect("enum target");
        p.feed(4, "        root").unwrap();
        p.feed(5, "        child").unwrap();

        p.feed(6, "  command navigate").unwrap();
        let navigate = p.context().item.expect("item");
        assert_ne!(navigate, frame);
        p.feed(7, "    returns").unwrap();
        assert_eq!(p.context().sub_items, Some(InsertionTarget::Returns(navigate)));

        let protocol = p.finish();
        assert_eq!(
            protocol[kind].enum_values.as_deref(),
            Some(&["root".to_string(), "child".to_string()][..])
        );
        assert_eq!(protocol[kind].kind, Some(TypeKind::String));
        assert_eq!(protocol[navigate].returns, Some(vec![]));
    }

    #[test]
    fn array_of_enum_literals_go_to_items() {
        let src = "domain A\n  type T extends object\n    properties\n      array of enum modes\n        fast\n        slow\n";
        let p = parse(src).unwrap();
        let t = p.domains[0].types[0];
        let modes = p.find_member(t, "modes").unwrap();
        assert_eq!(p[modes].kind, Some(TypeKind::Array));
        assert_eq!(p[modes].enum_values, None);
        let items = p[modes].items.unwrap();
        assert_eq!(p[items].kind, Some(TypeKind::String));
        assert_eq!(p[items].enum_values, Some(vec!["fast".to_string(), "slow".to_string()]));
    }

    #[test]
    fn description_attaches_to_next_declaration_only() {
        let src = "# Copyright\n\n# The DOM.\ndomain DOM\n  type NodeId extends integer\n";
        let p = parse(src).unwrap();
        assert_eq!(p.copyright, "Copyright");
        assert_eq!(p.domains[0].description, "The DOM.");
        let id = p.domains[0].types[0];
        assert_eq!(p[id].description, "");
    }

    #[test]
    fn copyright_is_not_attached_to_first_declaration() {
        let p = parse("# Header\ndomain A\n").unwrap();
        assert_eq!(p.copyright, "Header");
        assert_eq!(p.domains[0].description, "");
    }

    #[test]
    fn redirect_takes_name_from_comment() {
        let src = "domain A\n  command old\n    # Use 'Target.attach' instead\n    redirect Target\n  command other\n    redirect B\n";
        let p = parse(src).unwrap();
        let old = p.domains[0].commands[0];
        let other = p.domains[0].commands[1];
        assert_eq!(
            p[old].redirect,
            Some(Redirect {
                domain: "Target".into(),
                name: "attach".into()
            })
        );
        assert_eq!(p[other].redirect.as_ref().map(|r| r.name.as_str()), Some(""));
    }

    #[test]
    fn structural_errors_are_reported() {
        for (src, line) in [
            ("  depends on X", 0),
            ("  type X extends string", 0),
            ("domain A\n    properties", 1),
            ("domain A\n  type X extends object\n      string y", 2),
            ("domain A\n  type X extends string\n      red", 2),
            ("  major 1", 0),
            ("domain A\n    redirect B", 1),
        ] {
            match parse(src) {
                Err(PdlError::MissingContext { line: l, .. }) => assert_eq!(l, line, "{:?}", src),
                other => panic!("expected structural error for {:?}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn redirect_name_phrasing() {
        assert_eq!(redirect_name("Use 'A.b.c' instead").as_deref(), Some("c"));
        assert_eq!(redirect_name("Use 'plain' instead").as_deref(), Some("plain"));
        assert_eq!(redirect_name("Please use 'A.b' instead"), None);
        assert_eq!(redirect_name("Use 'A.b' instead, soon"), None);
    }
}
