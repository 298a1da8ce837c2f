//! Session configuration, read from JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tessera_explore::guidance::{LookaheadGuidance, VerificationPrefixes};

use crate::limits::ResourceLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuidanceConfig {
    Random {
        #[serde(default)]
        seed: u64,
    },
    Lookahead {
        #[serde(default = "default_lookahead_depth")]
        depth: usize,
        #[serde(default = "default_lookahead_nodes")]
        max_nodes: usize,
        #[serde(default)]
        seed: u64,
    },
}

fn default_lookahead_depth() -> usize {
    LookaheadGuidance::DEFAULT_DEPTH
}

fn default_lookahead_nodes() -> usize {
    LookaheadGuidance::DEFAULT_MAX_NODES
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        GuidanceConfig::Random { seed: 0 }
    }
}

/// Prefixes marking verification loops. Set `enabled: false` to run the
/// general guidance alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub enabled: bool,
    pub start_prefix: String,
    pub end_prefix: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        let prefixes = VerificationPrefixes::default();
        Self {
            enabled: true,
            start_prefix: prefixes.start,
            end_prefix: prefixes.end,
        }
    }
}

impl VerificationConfig {
    pub fn prefixes(&self) -> VerificationPrefixes {
        VerificationPrefixes {
            start: self.start_prefix.clone(),
            end: self.end_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequirementConfig {
    #[default]
    Null,
    /// `"p1 THEN p2 THEN ..."`.
    Sequence { text: String },
    /// Every alphabet action matching `pattern`.
    ActionCoverage { pattern: String },
    AllOf { children: Vec<RequirementConfig> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    ModelOnly {
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
    Scripted {
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig::ModelOnly {
            params: BTreeMap::new(),
        }
    }
}

/// One test run: which model, how to walk it, and against what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rule file. Relative paths resolve against the config file's directory;
    /// component files named in it resolve against the rule file's directory.
    pub rules: PathBuf,
    #[serde(default)]
    pub guidance: GuidanceConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub requirement: RequirementConfig,
    /// Patterns over composed action names that must never be executed.
    #[serde(default)]
    pub forbidden_actions: Vec<String>,
    #[serde(default)]
    pub adapter: AdapterConfig,
    /// Values for `$(name)$` placeholders in action names.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl SessionConfig {
    pub fn new(rules: impl Into<PathBuf>) -> Self {
        Self {
            rules: rules.into(),
            guidance: GuidanceConfig::default(),
            verification: VerificationConfig::default(),
            requirement: RequirementConfig::default(),
            forbidden_actions: Vec::new(),
            adapter: AdapterConfig::default(),
            templates: BTreeMap::new(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
