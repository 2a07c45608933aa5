use std::{iter::Peekable, str::CharIndices};

use tracing::{debug, trace};

use crate::token::{Classification, Span, Token, TokenTable};

mod error;

pub use error::{LexError, LexResult};

/// Starts a comment that runs to the end of the line.
pub const COMMENT_MARKER: char = '#';

pub struct Lexer<'a> {
    table: &'a TokenTable,
    chars: Peekable<CharIndices<'a>>,
    word: String,
    word_span: Span,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(table: &'a TokenTable, input: &'a str) -> Self {
        Self {
            table,
            chars: input.char_indices().peekable(),
            word: String::new(),
            word_span: Span::default(),
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> LexResult<Option<Token>> {
        while let Some(&(index, ch)) = self.chars.peek() {
            if ch == COMMENT_MARKER {
                let token = self.flush()?;
                self.skip_comment();
                if token.is_some() {
                    return Ok(token);
                }
                continue;
            }

            if ch.is_whitespace() {
                let token = self.flush()?;
                self.advance_char();
                if token.is_some() {
                    return Ok(token);
                }
                continue;
            }

            // Split when the pending word is a token on its own but stops
            // being one with the next character appended.
            if !self.word.is_empty() && self.table.classify(&self.word).is_single() {
                let mut prospective = self.word.clone();
                prospective.push(ch);
                if !self.table.classify(&prospective).is_single() {
                    return self.flush();
                }
            }

            if self.word.is_empty() {
                self.word_span = Span {
                    start: index,
                    end: index,
                    line: self.line,
                    column: self.column,
                };
            }
            self.word.push(ch);
            self.advance_char();
        }

        self.flush()
    }

    fn flush(&mut self) -> LexResult<Option<Token>> {
        if self.word.is_empty() {
            return Ok(None);
        }

        let word = std::mem::take(&mut self.word);
        let mut span = self.word_span;
        span.end = span.start + word.len();

        match self.table.classify(&word) {
            Classification::Single(definition) => {
                trace!(name = %definition.name, value = %word, line = span.line, column = span.column, "token");
                Ok(Some(Token::new(definition.name.as_str(), word, span)))
            }
            Classification::None => Err(LexError::UnknownToken {
                word,
                line: span.line,
                column: span.column,
            }),
            Classification::Ambiguous(names) => Err(LexError::AmbiguousToken {
                candidates: names.join(", "),
                word,
                line: span.line,
                column: span.column,
            }),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

pub fn tokenize(table: &TokenTable, input: &str) -> LexResult<Vec<Token>> {
    let tokens = Lexer::new(table, input).collect::<LexResult<Vec<_>>>()?;
    debug!(tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}
