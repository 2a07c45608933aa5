use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::ast::ParseNode;
use crate::grammar::{Grammar, GrammarSymbol};
use crate::token::Token;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("ln {line} col {column}: Unexpected token {value} ({name})")]
    UnexpectedToken {
        value: String,
        name: String,
        line: usize,
        column: usize,
    },
    #[error("ln {line} col {column}: Unexpected end of input")]
    UnexpectedEnd { line: usize, column: usize },
}

/// A matched node and the index of the first token after it.
type Match = Option<(ParseNode, usize)>;

/// Bookkeeping for a nonterminal that is currently being matched at a
/// position. Re-entering the same pair returns `seed` instead of recursing.
#[derive(Default)]
struct Frame {
    seed: Match,
    recursed: bool,
}

/// Backtracking top-down parser over a runtime grammar.
///
/// Alternatives are tried in declaration order and the first one whose whole
/// sequence matches wins. Left-recursive rules are handled by growing a seed:
/// the first pass fails the recursive call, then the rules are re-run with
/// the previous result standing in for it until the match stops getting
/// longer.
pub struct Parser<'a> {
    tokens: &'a [Token],
    grammar: &'a Grammar,
    furthest: usize,
    active: FxHashMap<(&'a str, usize), Frame>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], grammar: &'a Grammar) -> Self {
        Self {
            tokens,
            grammar,
            furthest: 0,
            active: FxHashMap::default(),
        }
    }

    pub fn parse(mut self) -> Result<ParseNode, ParseError> {
        let grammar = self.grammar;
        match self.match_nonterminal(grammar.start(), 0) {
            Some((node, _)) => {
                debug!(tokens = self.tokens.len(), root = %node.name, "parsed program");
                Ok(node)
            }
            None => Err(self.error()),
        }
    }

    fn match_rules(&mut self, name: &'a str, position: usize, required_end: Option<usize>) -> Match {
        let grammar = self.grammar;
        let rules = grammar.rules(name)?;
        for rule in rules {
            if let Some((children, end)) = self.match_sequence(rule, position)
                && required_end.is_none_or(|required| required == end)
            {
                return Some((ParseNode::nonterminal(name, children), end));
            }
        }
        None
    }

    fn match_sequence(
        &mut self,
        rule: &'a [GrammarSymbol],
        mut position: usize,
    ) -> Option<(Vec<ParseNode>, usize)> {
        let mut children = Vec::with_capacity(rule.len());
        for symbol in rule {
            let (node, end) = self.match_symbol(symbol, position)?;
            children.push(node);
            position = end;
        }
        Some((children, position))
    }

    fn match_symbol(&mut self, symbol: &'a GrammarSymbol, position: usize) -> Match {
        if symbol.terminal {
            self.match_terminal(&symbol.name, position)
        } else {
            self.match_nonterminal(&symbol.name, position)
        }
    }

    fn match_terminal(&mut self, name: &str, position: usize) -> Match {
        self.furthest = self.furthest.max(position);
        let token = self.tokens.get(position)?;
        (token.name == name).then(|| (ParseNode::terminal(token.clone()), position + 1))
    }

    fn match_nonterminal(&mut self, name: &'a str, position: usize) -> Match {
        let key = (name, position);
        if let Some(frame) = self.active.get_mut(&key) {
            frame.recursed = true;
            return frame.seed.clone();
        }

        // Every occurrence of the start symbol has to reach the end of input.
        let required_end = (name == self.grammar.start()).then_some(self.tokens.len());

        self.active.insert(key, Frame::default());
        let mut result = self.match_rules(name, position, required_end);
        if self.active.get(&key).is_some_and(|frame| frame.recursed) {
            result = match required_end {
                None => self.grow(name, position, result),
                Some(_) if result.is_some() => result,
                Some(end) => {
                    let first = self.match_rules(name, position, None);
                    self.grow(name, position, first)
                        .filter(|(_, grown)| *grown == end)
                }
            };
        }
        self.active.remove(&key);
        result
    }

    fn grow(&mut self, name: &'a str, position: usize, mut best: Match) -> Match {
        loop {
            let best_end = best.as_ref()?.1;
            if let Some(frame) = self.active.get_mut(&(name, position)) {
                frame.seed = best.clone();
            }
            match self.match_rules(name, position, None) {
                Some(candidate) if candidate.1 > best_end => best = Some(candidate),
                _ => return best,
            }
        }
    }

    fn error(&self) -> ParseError {
        if let Some(token) = self.tokens.get(self.furthest) {
            return ParseError::UnexpectedToken {
                value: token.value.clone(),
                name: token.name.clone(),
                line: token.span.line,
                column: token.span.column,
            };
        }
        let (line, column) = self
            .tokens
            .last()
            .map_or((1, 1), |token| (token.span.line, token.span.column));
        ParseError::UnexpectedEnd { line, column }
    }
}

pub fn parse(tokens: &[Token], grammar: &Grammar) -> Result<ParseNode, ParseError> {
    Parser::new(tokens, grammar).parse()
}
