//! Loading a session from disk and running it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tessera_compiler::compile::{compile, CompileError, Composition};
use tessera_ir::action::{Action, ActionCode};
use tessera_ir::parse::{parse_lsts, parse_rules, ParseError};
use tessera_ir::pattern::{ActionPattern, PatternError};
use tessera_ir::template::TemplateTable;
use tessera_explore::engine::{EngineError, RunReport, StopReason, TestEngine};
use tessera_explore::guidance::{
    Guidance, LookaheadGuidance, RandomGuidance, VerificationLoopGuidance,
};
use tessera_explore::requirement::{
    ActionCoverageRequirement, AllOf, NullRequirement, Requirement, RequirementError,
    SequenceRequirement,
};
use tessera_model::{CachingModel, LstsModel, Model, ModelError, ProductModel};
use tessera_vif::adapter::{Adapter, AdapterError, ModelOnlyAdapter, ScriptedAdapter};
use tracing::{info, warn};

use crate::config::{AdapterConfig, GuidanceConfig, RequirementConfig, SessionConfig};
use crate::limits::ResourceChecker;

/// The model a session drives: the composed model behind the caching filter.
pub type SessionModel = CachingModel<ProductModel<LstsModel>>;

type SessionState = <SessionModel as Model>::State;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid session config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid rule file {path}: {source}")]
    Rules { path: PathBuf, source: ParseError },

    #[error("Invalid component '{name}' in {path}: {source}")]
    Component {
        name: String,
        path: PathBuf,
        source: ParseError,
    },

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid forbidden action pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("Invalid requirement: {0}")]
    Requirement(#[from] RequirementError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Run failed: {0}")]
    Engine(#[from] EngineError),
}

fn read(path: &Path) -> Result<String, SessionError> {
    fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON-friendly view of a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub verdict: String,
    pub stop_reason: String,
    pub steps: u64,
    pub percentage: f64,
    pub errors_found: u64,
    pub actions: Vec<String>,
}

impl From<&RunReport> for RunSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            verdict: format!("{:?}", report.verdict).to_lowercase(),
            stop_reason: report.stop_reason.to_string(),
            steps: report.steps,
            percentage: report.percentage,
            errors_found: report.errors_found,
            actions: report.trace.actions().map(str::to_string).collect(),
        }
    }
}

impl RunSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct TestSession {
    config: SessionConfig,
    base_dir: PathBuf,
}

impl TestSession {
    /// `base_dir` anchors a relative rule-file path.
    pub fn new(config: SessionConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn load(config_path: &Path) -> Result<Self, SessionError> {
        let config = SessionConfig::from_json(&read(config_path)?)?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self::new(config, base_dir))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn rules_path(&self) -> PathBuf {
        self.base_dir.join(&self.config.rules)
    }

    /// Read the rule file and every component it declares, and compile them.
    pub fn composition(&self) -> Result<Composition, SessionError> {
        let rules_path = self.rules_path();
        let rule_file =
            parse_rules(&read(&rules_path)?).map_err(|source| SessionError::Rules {
                path: rules_path.clone(),
                source,
            })?;
        let model_dir = rules_path.parent().unwrap_or_else(|| Path::new(""));

        let mut components = Vec::with_capacity(rule_file.processes.len());
        for process in &rule_file.processes {
            let path = model_dir.join(&process.file);
            let lsts = parse_lsts(&read(&path)?).map_err(|source| SessionError::Component {
                name: process.name.clone(),
                path: path.clone(),
                source,
            })?;
            components.push(lsts);
        }

        Ok(compile(&rule_file, components)?)
    }

    /// Build the cached composed model with the forbidden set applied.
    pub fn model(&self) -> Result<SessionModel, SessionError> {
        let composition = self.composition()?;
        let mut model = CachingModel::new(ProductModel::from_composition(&composition)?);
        let forbidden = self.forbidden_codes(&model.actions())?;
        if !forbidden.is_empty() {
            model.set_forbidden_actions(Some(forbidden));
        }
        Ok(model)
    }

    fn forbidden_codes(&self, alphabet: &[Action]) -> Result<HashSet<ActionCode>, SessionError> {
        let mut codes = HashSet::new();
        for text in &self.config.forbidden_actions {
            let pattern = ActionPattern::new(text)?;
            let before = codes.len();
            codes.extend(
                alphabet
                    .iter()
                    .filter(|a| pattern.matches(a.name()))
                    .map(Action::code),
            );
            if codes.len() == before {
                warn!(pattern = text.as_str(), "forbidden pattern matches no new actions");
            }
        }
        Ok(codes)
    }

    fn requirement(
        config: &RequirementConfig,
        alphabet: &[Action],
    ) -> Result<Box<dyn Requirement<SessionState>>, SessionError> {
        Ok(match config {
            RequirementConfig::Null => Box::new(NullRequirement::new()),
            RequirementConfig::Sequence { text } => Box::new(SequenceRequirement::parse(text)?),
            RequirementConfig::ActionCoverage { pattern } => Box::new(
                ActionCoverageRequirement::new(alphabet, &ActionPattern::new(pattern)?)?,
            ),
            RequirementConfig::AllOf { children } => Box::new(AllOf::new(
                children
                    .iter()
                    .map(|c| Self::requirement(c, alphabet))
                    .collect::<Result<Vec<_>, _>>()?,
            )?),
        })
    }

    fn guidance(&self) -> Box<dyn Guidance<SessionModel>> {
        let general: Box<dyn Guidance<SessionModel>> = match self.config.guidance {
            GuidanceConfig::Random { seed } => Box::new(RandomGuidance::seeded(seed)),
            GuidanceConfig::Lookahead {
                depth,
                max_nodes,
                seed,
            } => Box::new(LookaheadGuidance::new(depth, seed).with_max_nodes(max_nodes)),
        };
        if self.config.verification.enabled {
            Box::new(VerificationLoopGuidance::new(
                general,
                self.config.verification.prefixes(),
            ))
        } else {
            general
        }
    }

    fn adapter(&self) -> Result<Box<dyn Adapter>, SessionError> {
        Ok(match &self.config.adapter {
            AdapterConfig::ModelOnly { params } => {
                Box::new(ModelOnlyAdapter::from_params(params.clone())?)
            }
            AdapterConfig::Scripted { params } => {
                Box::new(ScriptedAdapter::from_params(params.clone())?)
            }
        })
    }

    /// Build everything, then run until the requirement is met, the model
    /// deadlocks, an input is rejected, or a resource limit is hit.
    pub fn run(&self) -> Result<RunReport, SessionError> {
        // Adapter parameters are checked before any file is read.
        let adapter = self.adapter()?;
        let model = self.model()?;
        let requirement = Self::requirement(&self.config.requirement, &model.actions())?;
        let templates: TemplateTable = self
            .config
            .templates
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut engine =
            TestEngine::new(model, self.guidance(), requirement, adapter).with_templates(templates);
        engine.start()?;
        let checker = ResourceChecker::new(self.config.limits.clone());
        let outcome = Self::drive(&mut engine, &checker);
        engine.stop();
        let reason = outcome?;
        let report = engine.report(reason);
        info!(
            verdict = ?report.verdict,
            steps = report.steps,
            percentage = report.percentage,
            elapsed_secs = checker.elapsed_secs(),
            "session finished"
        );
        Ok(report)
    }

    fn drive<G, A>(
        engine: &mut TestEngine<SessionModel, G, A>,
        checker: &ResourceChecker,
    ) -> Result<StopReason, EngineError>
    where
        G: Guidance<SessionModel>,
        A: Adapter,
    {
        loop {
            if let Some(reason) = checker.check(engine.steps()) {
                return Ok(reason);
            }
            if let Some(reason) = engine.step()?.stop_reason() {
                return Ok(reason);
            }
        }
    }
}
