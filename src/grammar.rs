use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::TableError;
use crate::token::TokenTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSymbol {
    pub name: String,
    pub terminal: bool,
}

impl GrammarSymbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminal: true,
        }
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminal: false,
        }
    }
}

/// One alternative of a nonterminal: a non-empty symbol sequence.
pub type Rule = Vec<GrammarSymbol>;

/// Nonterminal productions with their alternatives in declaration order.
///
/// The first nonterminal declared is the start symbol. Every symbol in every
/// rule is either a token name or a nonterminal of the same grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    productions: FxHashMap<String, Vec<Rule>>,
    order: Vec<String>,
}

struct RawBlock<'a> {
    name: &'a str,
    line: usize,
    rules: Vec<RawRule<'a>>,
}

struct RawRule<'a> {
    line: usize,
    symbols: Vec<(usize, &'a str)>,
}

impl Grammar {
    /// Builds a grammar from already resolved productions. The first entry
    /// becomes the start symbol.
    pub fn new(productions: Vec<(String, Vec<Rule>)>) -> Result<Self, TableError> {
        if productions.is_empty() {
            return Err(TableError::EmptyGrammar);
        }
        let order = productions.iter().map(|(name, _)| name.clone()).collect();
        Ok(Self {
            productions: productions.into_iter().collect(),
            order,
        })
    }

    /// Reads blank-line separated blocks: a nonterminal name followed by one
    /// rule per line.
    pub fn load(text: &str, tokens: &TokenTable) -> Result<Self, TableError> {
        let blocks = read_blocks(text);
        if blocks.is_empty() {
            return Err(TableError::EmptyGrammar);
        }

        let mut seen = FxHashMap::default();
        for block in &blocks {
            if seen.insert(block.name, block.line).is_some() {
                return Err(TableError::DuplicateNonterminal {
                    name: block.name.to_string(),
                    line: block.line,
                });
            }
            if block.rules.is_empty() {
                return Err(TableError::EmptyNonterminal {
                    name: block.name.to_string(),
                    line: block.line,
                });
            }
        }

        let mut productions = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let mut rules = Vec::with_capacity(block.rules.len());
            for rule in &block.rules {
                let symbols = rule
                    .symbols
                    .iter()
                    .map(|&(column, symbol)| {
                        if tokens.contains(symbol) {
                            Ok(GrammarSymbol::terminal(symbol))
                        } else if seen.contains_key(symbol) {
                            Ok(GrammarSymbol::nonterminal(symbol))
                        } else {
                            Err(TableError::UnknownSymbol {
                                symbol: symbol.to_string(),
                                line: rule.line,
                                column,
                            })
                        }
                    })
                    .collect::<Result<Rule, _>>()?;
                rules.push(symbols);
            }
            productions.push((block.name.to_string(), rules));
        }

        let grammar = Self::new(productions)?;
        debug!(
            nonterminals = grammar.order.len(),
            start = grammar.start(),
            "loaded grammar"
        );
        Ok(grammar)
    }

    pub fn start(&self) -> &str {
        // `new` rejects empty grammars.
        self.order.first().map(String::as_str).unwrap_or_default()
    }

    pub fn rules(&self, name: &str) -> Option<&[Rule]> {
        self.productions.get(name).map(Vec::as_slice)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

fn read_blocks(text: &str) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock<'_>> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        if raw_line.trim().is_empty() {
            blocks.extend(current.take());
            continue;
        }

        match current.as_mut() {
            None => {
                current = Some(RawBlock {
                    name: raw_line.trim(),
                    line: line_number,
                    rules: Vec::new(),
                });
            }
            Some(block) => block.rules.push(RawRule {
                line: line_number,
                symbols: words_with_columns(raw_line),
            }),
        }
    }
    blocks.extend(current);
    blocks
}

/// Splits on whitespace, pairing each word with its 1-based column.
fn words_with_columns(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start: Option<(usize, usize)> = None;
    let mut column = 0;

    for (index, ch) in line.char_indices() {
        column += 1;
        match (ch.is_whitespace(), start) {
            (true, Some((begin, begin_column))) => {
                words.push((begin_column, &line[begin..index]));
                start = None;
            }
            (false, None) => start = Some((index, column)),
            _ => {}
        }
    }
    if let Some((begin, begin_column)) = start {
        words.push((begin_column, &line[begin..]));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenDefinition;
    use indoc::indoc;

    fn tokens() -> TokenTable {
        TokenTable::new(vec![
            TokenDefinition::regex("NUMBER", "[0-9]+").expect("regex"),
            TokenDefinition::literal("plus", "+"),
        ])
    }

    #[test]
    fn loads_blocks_in_declaration_order() {
        let grammar = Grammar::load(
            indoc! {"
                Sum
                Term plus Sum
                Term

                Term
                NUMBER
            "},
            &tokens(),
        )
        .expect("grammar should load");

        assert_eq!(grammar.start(), "Sum");
        assert_eq!(grammar.nonterminals().collect::<Vec<_>>(), vec!["Sum", "Term"]);

        let sum = grammar.rules("Sum").expect("Sum rules");
        assert_eq!(sum.len(), 2);
        assert_eq!(
            sum[0],
            vec![
                GrammarSymbol::nonterminal("Term"),
                GrammarSymbol::terminal("plus"),
                GrammarSymbol::nonterminal("Sum"),
            ]
        );
        assert_eq!(
            grammar.rules("Term").expect("Term rules")[0],
            vec![GrammarSymbol::terminal("NUMBER")]
        );
    }

    #[test]
    fn tolerates_extra_blank_lines_and_indentation() {
        let grammar = Grammar::load("\n\nStart\n   NUMBER   plus  NUMBER\n\n\n", &tokens())
            .expect("grammar should load");
        assert_eq!(grammar.nonterminals().count(), 1);
        assert_eq!(grammar.rules("Start").expect("rules")[0].len(), 3);
    }

    #[test]
    fn errors_on_unknown_symbol_with_its_column() {
        let err = Grammar::load("Start\nNUMBER  minus NUMBER\n", &tokens())
            .expect_err("expected failure");
        assert_eq!(
            err,
            TableError::UnknownSymbol {
                symbol: "minus".to_string(),
                line: 2,
                column: 9
            }
        );
    }

    #[test]
    fn errors_on_duplicate_nonterminal() {
        let err = Grammar::load("Start\nNUMBER\n\nStart\nplus\n", &tokens())
            .expect_err("expected failure");
        assert_eq!(
            err,
            TableError::DuplicateNonterminal {
                name: "Start".to_string(),
                line: 4
            }
        );
    }

    #[test]
    fn errors_on_block_without_rules() {
        let err =
            Grammar::load("Start\nEmpty\n\nEmpty\n", &tokens()).expect_err("expected failure");
        assert_eq!(
            err,
            TableError::EmptyNonterminal {
                name: "Empty".to_string(),
                line: 4
            }
        );
    }

    #[test]
    fn errors_on_empty_grammar() {
        let err = Grammar::load("\n\n", &tokens()).expect_err("expected failure");
        assert_eq!(err, TableError::EmptyGrammar);
    }
}
