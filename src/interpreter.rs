use tracing::debug;

use crate::ast::ParseNode;

mod error;
mod host;
mod runtime;
mod value;

pub use error::{InterpreterError, RunResult, RuntimeError};
pub use host::{BufferedHost, Host, StdHost};
pub use runtime::Scope;
pub use value::{ListRef, Value};

use runtime::{ExecResult, InterpreterRuntime};

/// Tree-walking evaluator for parse trees of the bundled grammar.
///
/// Each instance numbers the temporaries created by `*` and `/` on its own,
/// so separate interpreters never see each other's names.
#[derive(Debug, Default)]
pub struct Interpreter {
    temporaries: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a `PROGRAM` tree and returns its top-level scope.
    pub fn run(&mut self, program: &ParseNode, host: &mut dyn Host) -> RunResult<Scope> {
        // Execution pipeline:
        // run -> exec_block (PROGRAM chain) -> exec_statement
        // -> eval_operand -> eval_math / eval_value -> call -> exec_block.
        if program.name != "PROGRAM" {
            return Err(RuntimeError::at(
                program,
                InterpreterError::UnsupportedNode {
                    name: program.name.clone(),
                },
            ));
        }

        let mut scope = Scope::default();
        let mut runtime = InterpreterRuntime {
            host,
            temporaries: &mut self.temporaries,
        };
        if let ExecResult::Return(value) = runtime.exec_block(program, &mut scope)? {
            debug!(returned = value.is_some(), "program returned at top level");
        }
        Ok(scope)
    }
}

pub fn run(program: &ParseNode, host: &mut dyn Host) -> RunResult<()> {
    Interpreter::new().run(program, host).map(|_| ())
}
