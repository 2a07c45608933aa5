use std::fmt::Write as _;

use crate::token::{Span, Token};

/// A node of the generic parse tree.
///
/// Terminal nodes carry the token they matched and its text as `value`.
/// Nonterminal nodes carry their own name as `value` and the first token they
/// consumed, which is what runtime diagnostics point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub name: String,
    pub value: String,
    pub terminal: bool,
    pub token: Option<Token>,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn terminal(token: Token) -> Self {
        Self {
            name: token.name.clone(),
            value: token.value.clone(),
            terminal: true,
            token: Some(token),
            children: Vec::new(),
        }
    }

    pub fn nonterminal(name: impl Into<String>, children: Vec<ParseNode>) -> Self {
        let name = name.into();
        let token = children.first().and_then(|child| child.token.clone());
        Self {
            value: name.clone(),
            name,
            terminal: false,
            token,
            children,
        }
    }

    pub fn span(&self) -> Span {
        self.token.as_ref().map(Token::span).unwrap_or_default()
    }

    pub fn child(&self, index: usize) -> Option<&ParseNode> {
        self.children.get(index)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|child| child.name.as_str())
    }

    /// Walks a right-recursive list such as `PROGRAM -> EXPRESSION PROGRAM`.
    ///
    /// A link `[item, rest]` yields `item` and continues into `rest` while
    /// `rest` has this node's name. A final link holding a single nonterminal
    /// yields that child. Any other final link, such as a lone `end` marker,
    /// ends the chain without yielding.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            name: &self.name,
            next: Some(self),
        }
    }

    /// Depth-indented outline with one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        if self.terminal {
            let _ = writeln!(out, "{indent}{} {:?}", self.name, self.value);
        } else {
            let _ = writeln!(out, "{indent}{}", self.name);
        }
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

pub struct Chain<'a> {
    name: &'a str,
    next: Option<&'a ParseNode>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ParseNode;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.next.take()?;
        match link.children.as_slice() {
            [item, rest] if rest.name == self.name => {
                self.next = Some(rest);
                Some(item)
            }
            [item] if !item.terminal => Some(item),
            _ => None,
        }
    }
}
