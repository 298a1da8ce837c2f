//! Text inputs: JSON component descriptions and the rule-file grammar.
//!
//! Rule files contain two kinds of lines:
//!
//! ```text
//! Phone = "phone.lsts.json"
//! (Phone,"dial") (Exchange,"connect") -> "call"
//! ```
//!
//! Anything else (comments, blank lines, unrelated directives) is skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::lsts::{Lsts, LstsError};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid component model: {0}")]
    Lsts(#[from] LstsError),

    #[error("line {line}: malformed rule: {message}")]
    MalformedRule { line: usize, message: String },

    #[error("line {line}: process '{name}' declared twice")]
    DuplicateProcess { line: usize, name: String },
}

static PROCESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\w[\w\-]*)\s*=\s*"([^"]*)"\s*$"#).expect("process regex is valid")
});

static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\(.*\))\s*->\s*"([^"]*)"\s*$"#).expect("rule regex is valid")
});

static SYNC_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\(\s*(\w[\w\-]*)\s*,\s*"([^"]*)"\s*\)"#).expect("pair regex is valid")
});

/// `ID = "filename"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDecl {
    pub name: String,
    pub file: String,
}

/// One (process, local action) participant of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDecl {
    pub process: String,
    pub action: String,
}

/// `(ID,"a") (ID,"b") -> "result"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDecl {
    pub sync: Vec<SyncDecl>,
    pub result: String,
    /// 1-based source line, kept for diagnostics.
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFile {
    pub processes: Vec<ProcessDecl>,
    pub rules: Vec<RuleDecl>,
}

/// Parse and validate a JSON component description.
pub fn parse_lsts(json: &str) -> Result<Lsts, ParseError> {
    let lsts: Lsts = serde_json::from_str(json)?;
    lsts.validate()?;
    Ok(lsts)
}

/// Parse rule-file text.
///
/// A line is a rule candidate when it has the `(...) -> "..."` shape; such a
/// line must consist of well-formed pairs only, otherwise it is rejected.
/// Lines of any other shape are ignored.
pub fn parse_rules(text: &str) -> Result<RuleFile, ParseError> {
    let mut file = RuleFile::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;

        if let Some(caps) = PROCESS_LINE.captures(raw) {
            let name = caps[1].to_string();
            if file.processes.iter().any(|p| p.name == name) {
                return Err(ParseError::DuplicateProcess { line, name });
            }
            file.processes.push(ProcessDecl {
                name,
                file: caps[2].to_string(),
            });
            continue;
        }

        let Some(caps) = RULE_LINE.captures(raw) else {
            continue;
        };

        let lhs = &caps[1];
        let sync: Vec<SyncDecl> = SYNC_PAIR
            .captures_iter(lhs)
            .map(|pair| SyncDecl {
                process: pair[1].to_string(),
                action: pair[2].to_string(),
            })
            .collect();

        let leftover = SYNC_PAIR.replace_all(lhs, "");
        if !leftover.trim().is_empty() {
            return Err(ParseError::MalformedRule {
                line,
                message: format!("unexpected text '{}'", leftover.trim()),
            });
        }

        file.rules.push(RuleDecl {
            sync,
            result: caps[2].to_string(),
            line,
        });
    }

    Ok(file)
}
