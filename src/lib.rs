//! # pdlgen: Protocol Definition Language parser and normalizer
//!
//! Reads the line-oriented PDL used to describe the Chrome DevTools protocol,
//! builds a domain model, resolves dotted references across domains, applies
//! a table-driven fix-up pass, and writes the model back out as PDL.
//!
//! ## Pipeline
//!
//! - **Lexer** ([`lexer`]): classifies one physical line with a PEST grammar
//! - **Parser** ([`parser`]): single forward pass building a [`Protocol`]
//! - **Model** ([`model`]): domains plus an arena of [`Type`] records
//! - **Resolver** ([`resolve`]): the single entry point for dotted references
//! - **Fix-up** ([`fixup`]): enum promotion, stutter removal, known shapes
//! - **Writer** ([`writer`]): round-trip serialization
//!
//! ## Example PDL
//!
//! ```text
//! version
//!   major 1
//!   minor 3
//!
//! domain DOM
//!   type NodeId extends integer
//!
//!   command getDocument
//!     returns
//!       NodeId root
//! ```
//!
//! ## Usage
//!
//! ```
//! use pdlgen::{fix_domains, parse, to_pdl, FixupConfig};
//!
//! let mut protocol = parse("domain CSS\n  type CSSStyle extends object\n").unwrap();
//! fix_domains(&mut protocol, &FixupConfig::default()).unwrap();
//! assert!(to_pdl(&protocol).unwrap().contains("type Style extends object"));
//! ```

pub mod config;
pub mod error;
pub mod fixup;
pub mod ident;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod writer;

pub use config::{AddedType, ExtraProperty, FixupConfig};
pub use error::{PdlError, Result};
pub use fixup::fix_domains;
pub use model::{Domain, Protocol, Redirect, TimestampKind, Type, TypeId, TypeKind, Version};
pub use parser::{parse, parse_file, InsertionTarget, Parser, ParserContext};
pub use resolve::{resolve, validate_references, CircularDeps, Resolved, SharedPredicate, SharedTypes};
pub use writer::{to_pdl, write_file};
