//! Locating the token table, grammar and assembler templates.
//!
//! The bundled language ships inside the binary. Any of the three resources
//! can be replaced by a file, either one at a time or by pointing at a
//! directory that holds `tokens.list`, `grammar.list` and `assemble.list`.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TableError;

pub const TOKENS: &str = include_str!("../config/tokens.list");
pub const GRAMMAR: &str = include_str!("../config/grammar.list");
pub const ASSEMBLER: &str = include_str!("../config/assemble.list");

pub const TOKENS_FILE: &str = "tokens.list";
pub const GRAMMAR_FILE: &str = "grammar.list";
pub const ASSEMBLER_FILE: &str = "assemble.list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Embedded(&'static str),
    File(PathBuf),
}

impl Resource {
    pub fn read(&self) -> Result<Cow<'static, str>, TableError> {
        match self {
            Resource::Embedded(text) => Ok(Cow::Borrowed(text)),
            Resource::File(path) => {
                debug!(path = %path.display(), "reading resource");
                fs::read_to_string(path)
                    .map(Cow::Owned)
                    .map_err(|error| TableError::Unreadable {
                        path: path.display().to_string(),
                        message: error.to_string(),
                    })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub tokens: Resource,
    pub grammar: Resource,
    pub assembler: Resource,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            tokens: Resource::Embedded(TOKENS),
            grammar: Resource::Embedded(GRAMMAR),
            assembler: Resource::Embedded(ASSEMBLER),
        }
    }
}

impl Resources {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            tokens: Resource::File(dir.join(TOKENS_FILE)),
            grammar: Resource::File(dir.join(GRAMMAR_FILE)),
            assembler: Resource::File(dir.join(ASSEMBLER_FILE)),
        }
    }

    pub fn with_tokens(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.tokens = Resource::File(path);
        }
        self
    }

    pub fn with_grammar(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.grammar = Resource::File(path);
        }
        self
    }

    pub fn with_assembler(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.assembler = Resource::File(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_single_resources() {
        let resources = Resources::default()
            .with_grammar(Some(PathBuf::from("custom/grammar.list")))
            .with_tokens(None);
        assert_eq!(resources.tokens, Resource::Embedded(TOKENS));
        assert_eq!(
            resources.grammar,
            Resource::File(PathBuf::from("custom/grammar.list"))
        );
    }

    #[test]
    fn resolves_directory_layout() {
        let resources = Resources::from_dir(Path::new("lang"));
        assert_eq!(
            resources.assembler,
            Resource::File(Path::new("lang").join(ASSEMBLER_FILE))
        );
    }

    #[test]
    fn reports_unreadable_files() {
        let err = Resource::File(PathBuf::from("does/not/exist.list"))
            .read()
            .expect_err("expected failure");
        assert!(matches!(err, TableError::Unreadable { .. }));
        assert!(err.to_string().starts_with("ln 0 col 0: Unable to read does/not/exist.list"));
    }
}
