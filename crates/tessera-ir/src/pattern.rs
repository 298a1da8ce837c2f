use std::fmt;

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("empty action pattern")]
    Empty,

    #[error("invalid action pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        source: regex::Error,
    },
}

/// A regular expression matched against the whole action name.
#[derive(Debug, Clone)]
pub struct ActionPattern {
    text: String,
    regex: Regex,
}

impl ActionPattern {
    pub fn new(text: &str) -> Result<Self, PatternError> {
        if text.is_empty() {
            return Err(PatternError::Empty);
        }
        let regex = Regex::new(&format!("^(?:{text})$")).map_err(|source| {
            PatternError::Invalid {
                pattern: text.to_string(),
                source,
            }
        })?;
        Ok(Self {
            text: text.to_string(),
            regex,
        })
    }

    /// Pattern matching exactly one action name.
    pub fn literal(name: &str) -> Result<Self, PatternError> {
        Self::new(&regex::escape(name))
    }

    pub fn matches(&self, action_name: &str) -> bool {
        self.regex.is_match(action_name)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for ActionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for ActionPattern {}

impl fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
