use std::fmt;
use std::rc::Rc;

use crate::ast::ParseNode;

use super::InterpreterError;

pub type ListRef = Rc<Vec<Value>>;

/// A runtime value.
///
/// Lists are copied on write: a clone shares storage until one side
/// mutates, so every binding and every stored element keeps its own list.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Str(String),
    List(ListRef),
    /// The parameter chain of a declared function.
    Closure(Rc<ParseNode>),
}

impl Value {
    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(values))
    }

    /// One single-character string per character of `text`.
    pub fn char_list(text: &str) -> Self {
        Value::list(text.chars().map(|c| Value::Str(c.to_string())).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Closure(_) => "function",
        }
    }

    pub fn as_integer(&self, operation: &str) -> Result<i64, InterpreterError> {
        match self {
            Value::Integer(value) => Ok(*value),
            other => Err(other.invalid_type(operation, "integer")),
        }
    }

    pub fn as_list(&self, operation: &str) -> Result<&ListRef, InterpreterError> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(other.invalid_type(operation, "list")),
        }
    }

    /// Mutable access to a list, detaching it from any other holder first.
    pub fn as_list_mut(&mut self, operation: &str) -> Result<&mut Vec<Value>, InterpreterError> {
        match self {
            Value::List(list) => Ok(Rc::make_mut(list)),
            other => Err(other.invalid_type(operation, "list")),
        }
    }

    /// Text of a string, or of a list of strings joined together.
    pub fn as_text(&self, operation: &str) -> Result<String, InterpreterError> {
        match self {
            Value::Str(text) => Ok(text.clone()),
            Value::List(list) => list
                .iter()
                .map(|item| match item {
                    Value::Str(text) => Ok(text.clone()),
                    other => Err(other.invalid_type(operation, "string")),
                })
                .collect(),
            other => Err(other.invalid_type(operation, "string")),
        }
    }

    fn invalid_type(&self, operation: &str, expected: &'static str) -> InterpreterError {
        InterpreterError::InvalidType {
            operation: operation.to_string(),
            expected,
            found: self.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => left == right,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::List(left), Value::List(right)) => {
                Rc::ptr_eq(left, right) || left == right
            }
            (Value::Closure(left), Value::Closure(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Str(text) => f.write_str(text),
            Value::List(list) => {
                f.write_str("[")?;
                for (index, item) in list.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Closure(_) => f.write_str("<func>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_values() {
        let list = Value::list(vec![
            Value::Integer(1),
            Value::Str("a".to_string()),
            Value::list(vec![]),
        ]);
        assert_eq!(list.to_string(), "[1, a, []]");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
    }

    #[test]
    fn clones_copy_lists_on_write() {
        let original = Value::list(vec![Value::Integer(1)]);
        let mut alias = original.clone();
        alias
            .as_list_mut("push")
            .expect("list")
            .push(Value::Integer(2));
        assert_eq!(original.to_string(), "[1]");
        assert_eq!(alias.to_string(), "[1, 2]");
    }

    #[test]
    fn a_list_pushed_into_itself_is_a_snapshot() {
        let mut list = Value::list(vec![Value::Integer(1)]);
        let snapshot = list.clone();
        list.as_list_mut("push").expect("list").push(snapshot);
        assert_eq!(list.to_string(), "[1, [1]]");
        assert_ne!(list, Value::list(vec![Value::Integer(1)]));
    }

    #[test]
    fn joins_character_lists_into_text() {
        assert_eq!(Value::char_list("abc").as_text("read").as_deref(), Ok("abc"));
        let err = Value::list(vec![Value::Integer(1)])
            .as_text("read")
            .expect_err("expected failure");
        assert_eq!(
            err,
            InterpreterError::InvalidType {
                operation: "read".to_string(),
                expected: "string",
                found: "integer"
            }
        );
    }
}
