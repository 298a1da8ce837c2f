//! `$(name)$` placeholder expansion for action strings.
//!
//! Values may themselves contain placeholders, so expansion runs in rounds
//! until nothing is left to substitute. A table whose entries refer to each
//! other cyclically never converges; after [`MAX_REWRITE_ROUNDS`] the original
//! text is handed back unexpanded.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

pub const MAX_REWRITE_ROUNDS: usize = 16;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(\s*([^()$]*?)\s*\)\$").expect("placeholder regex is valid")
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpandError {
    #[error("cannot expand '{fragment}' in '{original}': undefined name")]
    Undefined { original: String, fragment: String },

    #[error("unterminated placeholder '{fragment}' in '{original}'")]
    Unterminated { original: String, fragment: String },
}

#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    values: BTreeMap<String, String>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand every placeholder in `text`.
    pub fn expand(&self, text: &str) -> Result<String, ExpandError> {
        let mut current = text.to_string();

        for _ in 0..MAX_REWRITE_ROUNDS {
            if !current.contains("$(") {
                return Ok(current);
            }

            let mut undefined = None;
            let next = PLACEHOLDER.replace_all(&current, |caps: &Captures<'_>| {
                match self.values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => {
                        undefined.get_or_insert_with(|| caps[0].to_string());
                        caps[0].to_string()
                    }
                }
            });

            if let Some(fragment) = undefined {
                warn!(original = text, fragment = %fragment, "undefined template name");
                return Err(ExpandError::Undefined {
                    original: text.to_string(),
                    fragment,
                });
            }

            if next == current {
                let start = current.find("$(").unwrap_or(0);
                let fragment = current[start..].to_string();
                warn!(original = text, fragment = %fragment, "unterminated placeholder");
                return Err(ExpandError::Unterminated {
                    original: text.to_string(),
                    fragment,
                });
            }

            current = next.into_owned();
        }

        warn!(
            original = text,
            rounds = MAX_REWRITE_ROUNDS,
            "template expansion did not converge; using original text"
        );
        Ok(text.to_string())
    }
}

impl FromIterator<(String, String)> for TemplateTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
