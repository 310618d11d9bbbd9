//! Errors raised while parsing, resolving and fixing up protocol definitions.

/// Every failure is fatal: the parser and the fix-up pass never return a
/// partially built model.
#[derive(Debug, thiserror::Error)]
pub enum PdlError {
    #[error("line {line} unknown token {text:?}")]
    UnknownLine { line: usize, text: String },
    #[error("line {line}: {what} {text:?}")]
    MissingContext {
        line: usize,
        what: &'static str,
        text: String,
    },
    #[error("line {line}: invalid number in {text:?}")]
    InvalidNumber { line: usize, text: String },
    #[error("could not resolve type {reference} in domain {domain}")]
    UnresolvedReference { reference: String, domain: String },
    #[error("enum {domain}.{name}: {reason}")]
    EnumCollision {
        domain: String,
        name: String,
        reason: String,
    },
    #[error("enum literal {literal:?} of {owner} is not a single PDL token")]
    UnwritableLiteral { owner: String, literal: String },
    #[error("Config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdlError>;
