use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ast::ParseNode;
use crate::cipher;
use crate::token::Token;

use super::error::{AtNode, InterpreterError, RunResult, RuntimeError};
use super::host::Host;
use super::value::{ListRef, Value};

pub type Scope = FxHashMap<String, Value>;

/// Control-flow marker for statement execution.
pub(super) enum ExecResult {
    Continue,
    Return(Option<Value>),
}

fn child(node: &ParseNode, index: usize) -> RunResult<&ParseNode> {
    node.child(index).ok_or_else(|| malformed(node))
}

fn malformed(node: &ParseNode) -> RuntimeError {
    RuntimeError::at(
        node,
        InterpreterError::MalformedNode {
            name: node.name.clone(),
        },
    )
}

fn io_error(action: String) -> impl FnOnce(std::io::Error) -> InterpreterError {
    move |error| InterpreterError::Io {
        action,
        message: error.to_string(),
    }
}

/// The list bound to `variable`, detached from other holders so writes stay
/// with this binding.
fn list_mut<'s>(
    variable: &ParseNode,
    scope: &'s mut Scope,
    operation: &str,
) -> RunResult<&'s mut Vec<Value>> {
    let value = scope
        .get_mut(&variable.value)
        .ok_or_else(|| InterpreterError::UndefinedVariable {
            name: variable.value.clone(),
        })
        .at(variable)?;
    value.as_list_mut(operation).at(variable)
}

fn checked_index(index: i64, len: usize) -> Result<usize, InterpreterError> {
    usize::try_from(index)
        .ok()
        .filter(|&position| position < len)
        .ok_or(InterpreterError::IndexOutOfRange { index, len })
}

/// Splits a `FUNCPARAM` chain into parameter names and the `FUNCBODY`.
fn signature(params: &ParseNode) -> RunResult<(Vec<&str>, &ParseNode)> {
    let mut names = Vec::new();
    let mut link = params;
    loop {
        match link.children.as_slice() {
            [param, rest] if param.name == "var" && rest.name == link.name => {
                names.push(param.value.as_str());
                link = rest;
            }
            [marker, body] if marker.terminal => return Ok((names, body)),
            _ => return Err(malformed(link)),
        }
    }
}

/// Tree-walking executor over the named nodes of the bundled grammar.
pub(super) struct InterpreterRuntime<'a> {
    pub(super) host: &'a mut dyn Host,
    pub(super) temporaries: &'a mut usize,
}

impl InterpreterRuntime<'_> {
    /// Runs a chain of `EXPRESSION` nodes until it ends or one returns.
    pub(super) fn exec_block(
        &mut self,
        block: &ParseNode,
        scope: &mut Scope,
    ) -> RunResult<ExecResult> {
        for expression in block.chain() {
            if let ExecResult::Return(value) = self.exec_statement(expression, scope)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn exec_statement(&mut self, expression: &ParseNode, scope: &mut Scope) -> RunResult<ExecResult> {
        let statement = child(expression, 0)?;
        match statement.name.as_str() {
            "ASSIGN" => self.exec_assign(statement, scope)?,
            "PRINT" => self.exec_print(statement, scope, "")?,
            "PRINTLN" => self.exec_print(statement, scope, "\n")?,
            "IF" => {
                let condition = self
                    .eval_operand(child(statement, 1)?, scope)?
                    .as_integer("if")
                    .at(statement)?;
                if condition != 0 {
                    return self.exec_block(child(statement, 2)?, scope);
                }
            }
            "LOOP" => return self.exec_loop(statement, scope),
            "FUNC" => {
                let name = child(statement, 1)?;
                let params = child(statement, 2)?;
                scope.insert(name.value.clone(), Value::Closure(Rc::new(params.clone())));
            }
            "FUNCRETURN" => {
                let value = match statement.child(1) {
                    Some(operand) => Some(self.eval_operand(operand, scope)?),
                    None => None,
                };
                return Ok(ExecResult::Return(value));
            }
            "FUNCCALL" => {
                self.call(statement, scope)?;
            }
            "LISTAPPEND" => {
                let value = self.eval_operand(child(statement, 2)?, scope)?;
                list_mut(child(statement, 0)?, scope, "push")?.push(value);
            }
            "LISTPOP" => {
                self.eval_list_pop(statement, scope)?;
            }
            other => {
                return Err(InterpreterError::UnsupportedNode {
                    name: other.to_string(),
                })
                .at(statement);
            }
        }
        Ok(ExecResult::Continue)
    }

    fn exec_assign(&mut self, statement: &ParseNode, scope: &mut Scope) -> RunResult<()> {
        let value = self.eval_operand(child(statement, 2)?, scope)?;
        let target = child(statement, 0)?;
        match target.name.as_str() {
            "var" => {
                scope.insert(target.value.clone(), value);
            }
            "LISTACCESS" => {
                let index_node = child(target, 2)?;
                let index = self
                    .eval_operand(index_node, scope)?
                    .as_integer("index")
                    .at(index_node)?;
                let items = list_mut(child(target, 0)?, scope, "assignment")?;
                let position = checked_index(index, items.len()).at(index_node)?;
                items[position] = value;
            }
            _ => return Err(malformed(statement)),
        }
        Ok(())
    }

    fn exec_print(&mut self, statement: &ParseNode, scope: &mut Scope, terminator: &str) -> RunResult<()> {
        let value = self.eval_operand(child(statement, 1)?, scope)?;
        self.host
            .write(&format!("{value}{terminator}"))
            .map_err(io_error("write output".to_string()))
            .at(statement)
    }

    fn exec_loop(&mut self, statement: &ParseNode, scope: &mut Scope) -> RunResult<ExecResult> {
        let variable = child(statement, 1)?;
        let start = self
            .eval_operand(child(statement, 2)?, scope)?
            .as_integer("loop start")
            .at(statement)?;
        let stop = self
            .eval_operand(child(statement, 3)?, scope)?
            .as_integer("loop stop")
            .at(statement)?;
        let body = child(statement, 4)?;

        for counter in start..stop {
            scope.insert(variable.value.clone(), Value::Integer(counter));
            if let ExecResult::Return(value) = self.exec_block(body, scope)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    /// Calls the function named by a `FUNCCALL` node. Arguments are evaluated
    /// in the caller's scope and the body runs in a snapshot of it.
    fn call(&mut self, node: &ParseNode, scope: &mut Scope) -> RunResult<Option<Value>> {
        let callee = child(node, 1)?;
        let name = callee.value.as_str();
        let params = match scope.get(name) {
            Some(Value::Closure(params)) => Rc::clone(params),
            Some(other) => {
                return Err(InterpreterError::NotCallable {
                    name: name.to_string(),
                    found: other.type_name(),
                })
                .at(callee);
            }
            None => {
                return Err(InterpreterError::UndefinedVariable {
                    name: name.to_string(),
                })
                .at(callee);
            }
        };

        let (names, body) = signature(&params)?;
        let arguments = child(node, 2)?.chain().collect::<Vec<_>>();
        if arguments.len() != names.len() {
            return Err(InterpreterError::ArgumentCount {
                name: name.to_string(),
                expected: names.len(),
                found: arguments.len(),
            })
            .at(node);
        }

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.eval_operand(argument, scope)?);
        }

        trace!(function = name, arguments = values.len(), "call");
        let mut locals = scope.clone();
        for (param, value) in names.into_iter().zip(values) {
            locals.insert(param.to_string(), value);
        }

        match self.exec_block(body, &mut locals)? {
            ExecResult::Return(value) => Ok(value),
            ExecResult::Continue => Ok(None),
        }
    }

    /// Evaluates a node in operand position, which holds a `MATH` or a
    /// `VALUE`.
    pub(super) fn eval_operand(&mut self, node: &ParseNode, scope: &mut Scope) -> RunResult<Value> {
        match node.name.as_str() {
            "MATH" => self.eval_math(node, scope),
            "VALUE" => self.eval_value(node, scope),
            _ => Err(malformed(node)),
        }
    }

    fn eval_math(&mut self, node: &ParseNode, scope: &mut Scope) -> RunResult<Value> {
        let (value, operation) = match node.children.as_slice() {
            [value] => return self.eval_value(value, scope),
            [value, operation] => (value, operation),
            _ => return Err(malformed(node)),
        };
        let [operator, right] = operation.children.as_slice() else {
            return Err(malformed(operation));
        };

        let op = operator.name.as_str();
        let left = self.eval_value(value, scope)?.as_integer(op).at(operator)?;
        match op {
            "plus" | "minus" => {
                let right = self.eval_math(right, scope)?.as_integer(op).at(operator)?;
                Ok(Value::Integer(if op == "plus" {
                    left.wrapping_add(right)
                } else {
                    left.wrapping_sub(right)
                }))
            }
            "multiply" | "divide" => {
                // Only the value right next to the operator binds tighter.
                let adjacent = child(right, 0)?;
                let factor = self.eval_value(adjacent, scope)?.as_integer(op).at(operator)?;
                let result = if op == "multiply" {
                    left.wrapping_mul(factor)
                } else if factor == 0 {
                    return Err(InterpreterError::DivisionByZero).at(operator);
                } else {
                    left.wrapping_div(factor)
                };

                let temporary = self.bind_temporary(Value::Integer(result), scope);
                let mut folded = right.clone();
                folded.children[0] = ParseNode::nonterminal(
                    "VALUE",
                    vec![ParseNode::terminal(Token::new(
                        "var",
                        temporary,
                        adjacent.span(),
                    ))],
                );
                self.eval_math(&folded, scope)
            }
            _ => Err(malformed(operation)),
        }
    }

    fn bind_temporary(&mut self, value: Value, scope: &mut Scope) -> String {
        let name = format!("tmp{}", *self.temporaries);
        *self.temporaries += 1;
        trace!(name = %name, value = %value, "bind temporary");
        scope.insert(name.clone(), value);
        name
    }

    fn eval_value(&mut self, node: &ParseNode, scope: &mut Scope) -> RunResult<Value> {
        let inner = child(node, 0)?;
        match inner.name.as_str() {
            "var" => scope
                .get(&inner.value)
                .cloned()
                .ok_or_else(|| InterpreterError::UndefinedVariable {
                    name: inner.value.clone(),
                })
                .at(inner),
            "binary" => cipher::decode_numeral(&inner.value)
                .map(Value::Integer)
                .at(inner),
            "char" => {
                let encoded = inner.value.strip_prefix('\'').unwrap_or(&inner.value);
                let bytes = cipher::decode(encoded).at(inner)?;
                Ok(Value::Str(bytes.into_iter().map(char::from).collect()))
            }
            "LIST" => {
                let mut items = Vec::new();
                for element in child(inner, 1)?.chain() {
                    items.push(self.eval_operand(element, scope)?);
                }
                Ok(Value::list(items))
            }
            "LISTACCESS" => {
                let list = self.lookup_list(child(inner, 0)?, scope, "index")?;
                let index_node = child(inner, 2)?;
                let index = self
                    .eval_operand(index_node, scope)?
                    .as_integer("index")
                    .at(index_node)?;
                let position = checked_index(index, list.len()).at(index_node)?;
                Ok(list[position].clone())
            }
            "LISTLEN" => {
                let operand = child(inner, 1)?;
                let len = match self.eval_operand(operand, scope)? {
                    Value::List(list) => list.len(),
                    Value::Str(text) => text.chars().count(),
                    other => {
                        return Err(InterpreterError::InvalidType {
                            operation: "len".to_string(),
                            expected: "list or string",
                            found: other.type_name(),
                        })
                        .at(operand);
                    }
                };
                Ok(Value::Integer(i64::try_from(len).unwrap_or(i64::MAX)))
            }
            "LISTPOP" => self.eval_list_pop(inner, scope),
            "FUNCCALL" => self.call(inner, scope)?.ok_or_else(|| {
                RuntimeError::at(
                    inner,
                    InterpreterError::MissingValue {
                        name: child(inner, 1)
                            .map(|callee| callee.value.clone())
                            .unwrap_or_default(),
                    },
                )
            }),
            "readinput" => {
                let line = self
                    .host
                    .read_line()
                    .map_err(io_error("read input".to_string()))
                    .at(inner)?;
                Ok(Value::char_list(line.trim()))
            }
            "readfile" => {
                let operand = child(node, 1)?;
                let path = self
                    .eval_operand(operand, scope)?
                    .as_text("read")
                    .at(operand)?;
                let bytes = self
                    .host
                    .read_file(&path)
                    .map_err(io_error(format!("read file {path}")))
                    .at(inner)?;
                Ok(Value::char_list(&String::from_utf8_lossy(&bytes)))
            }
            "chartoint" => {
                let operand = child(node, 1)?;
                let value = self.eval_operand(operand, scope)?;
                let first = match &value {
                    Value::Str(text) => text.chars().next(),
                    Value::List(list) => match list.first() {
                        Some(Value::Str(text)) => text.chars().next(),
                        _ => None,
                    },
                    _ => None,
                };
                first
                    .map(|c| Value::Integer(i64::from(u32::from(c))))
                    .ok_or_else(|| InterpreterError::InvalidType {
                        operation: "ord".to_string(),
                        expected: "non-empty string",
                        found: value.type_name(),
                    })
                    .at(operand)
            }
            other => Err(InterpreterError::UnsupportedNode {
                name: other.to_string(),
            })
            .at(inner),
        }
    }

    fn eval_list_pop(&mut self, node: &ParseNode, scope: &mut Scope) -> RunResult<Value> {
        let index_node = child(node, 2)?;
        let index = self
            .eval_operand(index_node, scope)?
            .as_integer("index")
            .at(index_node)?;
        let items = list_mut(child(node, 0)?, scope, "take")?;
        let position = checked_index(index, items.len()).at(index_node)?;
        Ok(items.remove(position))
    }

    fn lookup_list(&self, variable: &ParseNode, scope: &Scope, operation: &str) -> RunResult<ListRef> {
        let value = scope
            .get(&variable.value)
            .ok_or_else(|| InterpreterError::UndefinedVariable {
                name: variable.value.clone(),
            })
            .at(variable)?;
        value.as_list(operation).cloned().at(variable)
    }
}
