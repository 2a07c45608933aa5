//! Configuration errors and the crate-wide error umbrella.
//!
//! Every error renders as a single diagnostic line of the form
//! `ln <line> col <column>: <message>`. Configuration errors point into the
//! resource file that was being loaded.

use thiserror::Error;

use crate::interpreter::RuntimeError;
use crate::lexer::LexError;
use crate::parser::ParseError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("ln {line} col 1: Token {name} has no definition line")]
    MissingDefinition { name: String, line: usize },
    #[error("ln {line} col 1: Duplicate token definition {name}")]
    DuplicateToken { name: String, line: usize },
    #[error("ln {line} col 1: Invalid regex for token {name}: {message}")]
    InvalidRegex {
        name: String,
        message: String,
        line: usize,
    },
    #[error("ln {line} col {column}: Unknown symbol in grammar: {symbol}")]
    UnknownSymbol {
        symbol: String,
        line: usize,
        column: usize,
    },
    #[error("ln {line} col 1: Duplicate grammar entry for {name}")]
    DuplicateNonterminal { name: String, line: usize },
    #[error("ln {line} col 1: Nonterminal {name} has no rules")]
    EmptyNonterminal { name: String, line: usize },
    #[error("ln 1 col 1: Grammar defines no nonterminals")]
    EmptyGrammar,
    #[error("ln {line} col 1: Assembler rule for {parent} is missing its {missing}")]
    IncompleteAssemblerRule {
        parent: String,
        missing: &'static str,
        line: usize,
    },
    #[error("ln 0 col 0: Unable to read {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Any failure the toolchain can report, from loading tables to running code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
