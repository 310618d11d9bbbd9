//! Classify single PDL lines using the PEST grammar in `grammar.pest`.
//!
//! Classification is stateless: a line is inspected on its own and turned into
//! a [`Line`] borrowing its captured fields from the input. Comment and blank
//! lines are recognized before the grammar is consulted.

use crate::error::{PdlError, Result};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct LineParser;

/// Optional keywords preceding a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub experimental: bool,
    pub deprecated: bool,
    pub optional: bool,
    pub array: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Command,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Parameters,
    Returns,
    Properties,
}

impl Section {
    pub fn keyword(self) -> &'static str {
        match self {
            Section::Parameters => "parameters",
            Section::Returns => "returns",
            Section::Properties => "properties",
        }
    }
}

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    /// Text after `#`, trimmed.
    Comment(&'a str),
    Domain {
        name: &'a str,
        modifiers: Modifiers,
    },
    DependsOn(&'a str),
    Type {
        name: &'a str,
        base: &'a str,
        modifiers: Modifiers,
    },
    Item {
        kind: ItemKind,
        name: &'a str,
        modifiers: Modifiers,
    },
    Member {
        name: &'a str,
        base: &'a str,
        modifiers: Modifiers,
    },
    Section(Section),
    Enum,
    Version,
    Major(u32),
    Minor(u32),
    Redirect(&'a str),
    EnumLiteral(&'a str),
}

/// Classify one physical line. `index` is the 0-based line number used in errors.
pub fn classify(index: usize, line: &str) -> Result<Line<'_>> {
    let trimmed = line.trim();
    if let Some(comment) = trimmed.strip_prefix('#') {
        return Ok(Line::Comment(comment.trim()));
    }
    if trimmed.is_empty() {
        return Ok(Line::Blank);
    }

    let unknown = || PdlError::UnknownLine {
        line: index,
        text: line.to_string(),
    };
    let shape = LineParser::parse(Rule::line, line)
        .map_err(|_| unknown())?
        .next()
        .and_then(|pair| pair.into_inner().next())
        .ok_or_else(unknown)?;

    let rule = shape.as_rule();
    let mut modifiers = Modifiers::default();
    let mut name = "";
    let mut base = "";
    let mut number = None;
    let mut item_kind = ItemKind::Command;
    let mut section = Section::Properties;
    for inner in shape.into_inner() {
        match inner.as_rule() {
            Rule::experimental => modifiers.experimental = true,
            Rule::deprecated => modifiers.deprecated = true,
            Rule::optional => modifiers.optional = true,
            Rule::array_of => modifiers.array = true,
            Rule::rest | Rule::type_name | Rule::member_name | Rule::target | Rule::literal => {
                name = inner.as_str()
            }
            Rule::base => base = inner.as_str(),
            Rule::number => number = Some(inner.as_str()),
            Rule::item_kind => {
                if inner.as_str() == "event" {
                    item_kind = ItemKind::Event;
                }
            }
            Rule::section_kind => {
                section = match inner.as_str() {
                    "parameters" => Section::Parameters,
                    "returns" => Section::Returns,
                    _ => Section::Properties,
                }
            }
            _ => {}
        }
    }

    let parse_number = || -> Result<u32> {
        number
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| PdlError::InvalidNumber {
                line: index,
                text: line.to_string(),
            })
    };

    Ok(match rule {
        Rule::domain_line => Line::Domain { name, modifiers },
        Rule::depends_line => Line::DependsOn(name),
        Rule::type_line => Line::Type {
            name,
            base,
            modifiers,
        },
        Rule::command_line => Line::Item {
            kind: item_kind,
            name,
            modifiers,
        },
        Rule::member_line => Line::Member {
            name,
            base,
            modifiers,
        },
        Rule::section_line => Line::Section(section),
        Rule::enum_line => Line::Enum,
        Rule::version_line => Line::Version,
        Rule::major_line => Line::Major(parse_number()?),
        Rule::minor_line => Line::Minor(parse_number()?),
        Rule::redirect_line => Line::Redirect(name),
        Rule::enum_literal_line => Line::EnumLiteral(name),
        _ => return Err(unknown()),
    })
}
