pub mod assembler;
pub mod ast;
pub mod cipher;
pub mod config;
pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

use tracing::debug;

use crate::ast::ParseNode;
use crate::config::Resources;
use crate::error::TableError;
use crate::grammar::Grammar;
use crate::interpreter::{Host, Interpreter};
use crate::lexer::LexError;
use crate::token::{Token, TokenTable};

pub use crate::error::{Error, Result};

/// A loaded language: its token table and grammar.
#[derive(Debug, Clone)]
pub struct Toolchain {
    tokens: TokenTable,
    grammar: Grammar,
}

impl Toolchain {
    /// The language bundled with the crate.
    pub fn builtin() -> Result<Self, TableError> {
        Self::from_sources(config::TOKENS, config::GRAMMAR)
    }

    pub fn load(resources: &Resources) -> Result<Self, TableError> {
        Self::from_sources(&resources.tokens.read()?, &resources.grammar.read()?)
    }

    pub fn from_sources(tokens: &str, grammar: &str) -> Result<Self, TableError> {
        let tokens = TokenTable::load(tokens)?;
        let grammar = Grammar::load(grammar, &tokens)?;
        Ok(Self { tokens, grammar })
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        lexer::tokenize(&self.tokens, source)
    }

    pub fn parse(&self, source: &str) -> Result<ParseNode> {
        let tokens = self.tokenize(source)?;
        Ok(parser::parse(&tokens, &self.grammar)?)
    }

    /// Tokenizes, parses and runs `source` against `host`.
    pub fn run(&self, source: &str, host: &mut dyn Host) -> Result<()> {
        let program = self.parse(source)?;
        let scope = Interpreter::new().run(&program, host)?;
        debug!(variables = scope.len(), "program finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::BufferedHost;
    use indoc::indoc;

    #[test]
    fn bundled_language_loads() {
        let toolchain = Toolchain::builtin().expect("bundled tables should load");
        assert_eq!(toolchain.grammar().start(), "PROGRAM");
        assert!(toolchain.tokens().contains("readinput"));
    }

    #[test]
    fn numerals_grow_past_their_shorter_prefixes() {
        let toolchain = Toolchain::builtin().expect("bundled tables should load");
        let tokens = toolchain.tokenize("X=pipo+pi").expect("tokenize failed");
        let names = tokens
            .iter()
            .map(|token| (token.name(), token.value.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                ("var", "X"),
                ("assign", "="),
                ("binary", "pipo"),
                ("plus", "+"),
                ("binary", "pi")
            ]
        );
    }

    #[test]
    fn runs_a_program_end_to_end() {
        let toolchain = Toolchain::builtin().expect("bundled tables should load");
        let mut host = BufferedHost::new();
        toolchain
            .run(
                indoc! {"
                    X = pipopi
                    loop X po pipi
                        print X
                    end
                "},
                &mut host,
            )
            .expect("run failed");
        assert_eq!(host.output(), "0\n1\n2\n");
    }

    #[test]
    fn reports_each_stage_through_one_error_type() {
        let toolchain = Toolchain::builtin().expect("bundled tables should load");
        let mut host = BufferedHost::new();

        let lex = toolchain.run("print x", &mut host).expect_err("lex error");
        assert!(matches!(lex, Error::Lex(_)));
        assert_eq!(lex.to_string(), "ln 1 col 7: Unknown token x");

        let parse = toolchain.run("print", &mut host).expect_err("parse error");
        assert!(matches!(parse, Error::Parse(_)));

        let runtime = toolchain.run("print Y", &mut host).expect_err("runtime error");
        assert_eq!(runtime.to_string(), "ln 1 col 7: Undefined variable Y");
    }
}
