use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::TableError;

/// Prefix marking a definition line as a regular expression.
pub const REGEX_PREFIX: &str = "regex:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(name: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone)]
pub enum TokenPattern {
    Literal(String),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct TokenDefinition {
    pub name: String,
    pub pattern: TokenPattern,
}

impl TokenDefinition {
    pub fn literal(name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: TokenPattern::Literal(literal.into()),
        }
    }

    /// Compiles `pattern` so that it has to match a whole word.
    pub fn regex(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            name: name.into(),
            pattern: TokenPattern::Regex(regex),
        })
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.pattern, TokenPattern::Regex(_))
    }

    pub fn matches(&self, word: &str) -> bool {
        match &self.pattern {
            TokenPattern::Literal(literal) => literal == word,
            TokenPattern::Regex(regex) => regex.is_match(word),
        }
    }
}

/// Outcome of checking a candidate word against every definition.
#[derive(Debug)]
pub enum Classification<'a> {
    None,
    Single(&'a TokenDefinition),
    Ambiguous(Vec<&'a str>),
}

impl Classification<'_> {
    pub fn is_single(&self) -> bool {
        matches!(self, Classification::Single(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    definitions: Vec<TokenDefinition>,
}

impl TokenTable {
    pub fn new(definitions: Vec<TokenDefinition>) -> Self {
        Self { definitions }
    }

    /// Reads `name` / `definition` line pairs. Blank lines are ignored.
    pub fn load(text: &str) -> Result<Self, TableError> {
        let mut definitions: Vec<TokenDefinition> = Vec::new();
        let mut names = FxHashSet::default();
        let mut pending: Option<(&str, usize)> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let line_number = index + 1;

            let Some((name, name_line)) = pending.take() else {
                pending = Some((line, line_number));
                continue;
            };

            if !names.insert(name) {
                return Err(TableError::DuplicateToken {
                    name: name.to_string(),
                    line: name_line,
                });
            }

            let definition = match line.strip_prefix(REGEX_PREFIX) {
                Some(pattern) => TokenDefinition::regex(name, pattern).map_err(|error| {
                    TableError::InvalidRegex {
                        name: name.to_string(),
                        message: error.to_string(),
                        line: line_number,
                    }
                })?,
                None => TokenDefinition::literal(name, line),
            };
            definitions.push(definition);
        }

        if let Some((name, line)) = pending {
            return Err(TableError::MissingDefinition {
                name: name.to_string(),
                line,
            });
        }

        debug!(definitions = definitions.len(), "loaded token table");
        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[TokenDefinition] {
        &self.definitions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.iter().any(|definition| definition.name == name)
    }

    pub fn classify(&self, word: &str) -> Classification<'_> {
        let mut found: Option<&TokenDefinition> = None;
        let mut extra = Vec::new();
        for definition in &self.definitions {
            if !definition.matches(word) {
                continue;
            }
            if found.is_none() {
                found = Some(definition);
            } else {
                extra.push(definition.name.as_str());
            }
        }

        match found {
            None => Classification::None,
            Some(definition) if extra.is_empty() => Classification::Single(definition),
            Some(definition) => {
                let mut names = vec![definition.name.as_str()];
                names.extend(extra);
                Classification::Ambiguous(names)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn loads_literal_and_regex_definitions() {
        let table = TokenTable::load(indoc! {"
            integer
            regex:[0-9]+

            plus
            +
        "})
        .expect("load failed");

        let definitions = table.definitions();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name, "integer");
        assert!(definitions[0].is_regex());
        assert_eq!(definitions[1].name, "plus");
        assert!(!definitions[1].is_regex());
    }

    #[test]
    fn regex_definitions_match_whole_words_only() {
        let definition = TokenDefinition::regex("integer", "[0-9]+").expect("regex");
        assert!(definition.matches("12"));
        assert!(!definition.matches("12+"));
        assert!(!definition.matches("a1"));
    }

    #[test]
    fn classifies_single_and_ambiguous_words() {
        let table = TokenTable::new(vec![
            TokenDefinition::regex("word", "[a-z]+").expect("regex"),
            TokenDefinition::literal("if", "if"),
        ]);

        assert!(table.classify("loop").is_single());
        assert!(matches!(table.classify("42"), Classification::None));
        match table.classify("if") {
            Classification::Ambiguous(names) => assert_eq!(names, vec!["word", "if"]),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn errors_on_name_without_definition() {
        let err = TokenTable::load("plus\n+\nminus\n").expect_err("expected failure");
        assert_eq!(
            err,
            TableError::MissingDefinition {
                name: "minus".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn errors_on_duplicate_names() {
        let err = TokenTable::load("plus\n+\n\nplus\nadd\n").expect_err("expected failure");
        assert_eq!(
            err,
            TableError::DuplicateToken {
                name: "plus".to_string(),
                line: 4
            }
        );
    }

    #[test]
    fn errors_on_invalid_regex() {
        let err = TokenTable::load("broken\nregex:[0-9\n").expect_err("expected failure");
        assert!(err.to_string().starts_with("ln 2 col 1: Invalid regex for token broken"));
    }
}
