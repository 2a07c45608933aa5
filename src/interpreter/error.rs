use thiserror::Error;

use crate::ast::ParseNode;
use crate::cipher::CipherError;

/// Typed errors produced while evaluating a parse tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("Undefined variable {name}")]
    UndefinedVariable { name: String },
    #[error("Invalid type for {operation}: expected {expected}, got {found}")]
    InvalidType {
        operation: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Function {name} expected {expected} arguments, got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("List index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("{name} is not callable, it holds a {found}")]
    NotCallable { name: String, found: &'static str },
    #[error("Function {name} did not return a value")]
    MissingValue { name: String },
    #[error(transparent)]
    Decode(#[from] CipherError),
    #[error("Failed to {action}: {message}")]
    Io { action: String, message: String },
    #[error("Unsupported node {name}")]
    UnsupportedNode { name: String },
    #[error("Malformed {name} node")]
    MalformedNode { name: String },
}

/// An [`InterpreterError`] tied to the source position of the node that
/// raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ln {line} col {column}: {error}")]
pub struct RuntimeError {
    pub line: usize,
    pub column: usize,
    pub error: InterpreterError,
}

impl RuntimeError {
    pub fn at(node: &ParseNode, error: InterpreterError) -> Self {
        let span = node.span();
        Self {
            line: span.line,
            column: span.column,
            error,
        }
    }
}

pub type RunResult<T> = Result<T, RuntimeError>;

/// Attaches a node position to a bare interpreter error.
pub(super) trait AtNode<T> {
    fn at(self, node: &ParseNode) -> RunResult<T>;
}

impl<T, E: Into<InterpreterError>> AtNode<T> for Result<T, E> {
    fn at(self, node: &ParseNode) -> RunResult<T> {
        self.map_err(|error| RuntimeError::at(node, error.into()))
    }
}
