//! Template backend: rewrites a parse tree into text by matching each node
//! against `parent` / `children` rules and filling in `$child$` placeholders.

use tracing::debug;

use crate::ast::ParseNode;
use crate::error::TableError;

/// Separates rules in an assembler resource.
pub const RULE_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerRule {
    pub parent: String,
    pub children: Vec<String>,
    pub template: String,
}

impl AssemblerRule {
    fn matches(&self, node: &ParseNode) -> bool {
        self.parent == node.name
            && self.children.len() == node.children.len()
            && self.children.iter().map(String::as_str).eq(node.child_names())
    }
}

#[derive(Debug, Default)]
struct PendingRule {
    parent: Option<(String, usize)>,
    children: Option<Vec<String>>,
    template: Vec<String>,
}

impl PendingRule {
    fn finish(self) -> Result<Option<AssemblerRule>, TableError> {
        let Some((parent, line)) = self.parent else {
            return Ok(None);
        };
        let Some(children) = self.children else {
            return Err(TableError::IncompleteAssemblerRule {
                parent,
                missing: "children",
                line,
            });
        };
        if self.template.is_empty() {
            return Err(TableError::IncompleteAssemblerRule {
                parent,
                missing: "template",
                line,
            });
        }
        Ok(Some(AssemblerRule {
            parent,
            children,
            template: self.template.join("\n"),
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssemblerRules {
    rules: Vec<AssemblerRule>,
}

impl AssemblerRules {
    pub fn new(rules: Vec<AssemblerRule>) -> Self {
        Self { rules }
    }

    /// Reads `---` separated rules: a parent line, a children line, then
    /// template lines. Blank lines are ignored everywhere.
    pub fn load(text: &str) -> Result<Self, TableError> {
        let mut rules = Vec::new();
        let mut pending = PendingRule::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if line == RULE_SEPARATOR {
                rules.extend(std::mem::take(&mut pending).finish()?);
                continue;
            }

            if pending.parent.is_none() {
                pending.parent = Some((line.to_string(), index + 1));
            } else if pending.children.is_none() {
                pending.children = Some(line.split_whitespace().map(str::to_string).collect());
            } else {
                pending.template.push(line.to_string());
            }
        }
        rules.extend(pending.finish()?);

        debug!(rules = rules.len(), "loaded assembler rules");
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[AssemblerRule] {
        &self.rules
    }

    pub fn assemble(&self, node: &ParseNode) -> String {
        if node.terminal {
            return node.value.clone();
        }
        match self.rules.iter().find(|rule| rule.matches(node)) {
            Some(rule) => self.render(&rule.template, node),
            None => node.children.iter().map(|child| self.assemble(child)).collect(),
        }
    }

    /// Replaces each `$name$` with the output of the first child called
    /// `name`. Other text, including unknown placeholders, is kept as is.
    fn render(&self, template: &str, node: &ParseNode) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('$') else {
                out.push_str(&rest[start..]);
                return out;
            };

            let name = &after[..end];
            match node.children.iter().find(|child| child.name == name) {
                Some(child) => {
                    out.push_str(&self.assemble(child));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

pub fn assemble(node: &ParseNode, rules: &AssemblerRules) -> String {
    rules.assemble(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Toolchain;
    use crate::config;
    use indoc::indoc;

    fn bundled() -> AssemblerRules {
        AssemblerRules::load(config::ASSEMBLER).expect("bundled rules should load")
    }

    fn parse(source: &str) -> ParseNode {
        Toolchain::builtin()
            .expect("bundled tables should load")
            .parse(source)
            .expect("parse failed")
    }

    #[test]
    fn loads_rules_with_multi_line_templates() {
        let rules = AssemblerRules::load(indoc! {"
            PRINT
            write MATH
            $MATH$

            out
            ---
            VALUE
            binary
            push $binary$
        "})
        .expect("load failed");

        assert_eq!(
            rules.rules(),
            &[
                AssemblerRule {
                    parent: "PRINT".to_string(),
                    children: vec!["write".to_string(), "MATH".to_string()],
                    template: "$MATH$\nout".to_string(),
                },
                AssemblerRule {
                    parent: "VALUE".to_string(),
                    children: vec!["binary".to_string()],
                    template: "push $binary$".to_string(),
                },
            ]
        );
    }

    #[test]
    fn rejects_rules_without_templates() {
        let err = AssemblerRules::load("---\nVALUE\nvar\n---\n").expect_err("expected failure");
        assert_eq!(
            err,
            TableError::IncompleteAssemblerRule {
                parent: "VALUE".to_string(),
                missing: "template",
                line: 2
            }
        );

        let err = AssemblerRules::load("VALUE\n").expect_err("expected failure");
        assert_eq!(err.to_string(), "ln 1 col 1: Assembler rule for VALUE is missing its children");
    }

    #[test]
    fn assembles_the_bundled_language() {
        let program = parse(indoc! {"
            X = pipo + pi
            print X
        "});
        assert_eq!(
            bundled().assemble(&program),
            "push pipo\npush pi\nadd\nstore X\nload X\noutln"
        );
    }

    #[test]
    fn concatenates_children_without_a_rule() {
        let program = parse("L = [ pi pipo ]");
        let rules = AssemblerRules::new(vec![AssemblerRule {
            parent: "ASSIGN".to_string(),
            children: vec!["var".to_string(), "assign".to_string(), "MATH".to_string()],
            template: "$var$ <- $MATH$".to_string(),
        }]);
        assert_eq!(assemble(&program, &rules), "L <- [pipipo]");
    }

    #[test]
    fn keeps_unknown_placeholders() {
        let program = parse("print X");
        let rules = AssemblerRules::new(vec![AssemblerRule {
            parent: "PRINTLN".to_string(),
            children: vec!["print".to_string(), "MATH".to_string()],
            template: "$ $nothing$ $MATH$ $".to_string(),
        }]);
        assert_eq!(rules.assemble(&program), "$ $nothing$ X $");
    }
}
