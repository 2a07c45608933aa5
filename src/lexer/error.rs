use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("ln {line} col {column}: Unknown token {word}")]
    UnknownToken {
        word: String,
        line: usize,
        column: usize,
    },
    #[error("ln {line} col {column}: Ambiguous token {word} matches {candidates}")]
    AmbiguousToken {
        word: String,
        candidates: String,
        line: usize,
        column: usize,
    },
}

pub type LexResult<T> = Result<T, LexError>;
