use std::collections::HashMap;

use tessera_ir::action::{ActionCode, ComponentId};
use tessera_ir::lsts::{Lsts, LstsError};
use tessera_ir::parse::{RuleDecl, RuleFile};
use tracing::info;

use crate::index::{qualified_name, ActionIndex, IndexError};
use crate::rules::{Rule, RuleError, RuleSet};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{declared} processes declared but {loaded} component models supplied")]
    CountMismatch { declared: usize, loaded: usize },

    #[error("component '{component}' is already indexed")]
    AlreadyIndexed { component: String },

    #[error("component '{component}': {source}")]
    Lsts { component: String, source: LstsError },

    #[error("line {line}: unknown process '{name}'")]
    UnknownProcess { line: usize, name: String },

    #[error("line {line}: unknown action '{name}'")]
    UnknownAction { line: usize, name: String },

    #[error("line {line}: {source}")]
    Rule { line: usize, source: RuleError },

    #[error("Action index error: {0}")]
    Index(#[from] IndexError),
}

/// A component model taking part in a composition.
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    pub id: ComponentId,
    pub name: String,
    pub lsts: Lsts,
}

/// The frozen result of composing components through a rule set.
///
/// `local_index` maps qualified component actions to the codes now stored in
/// each component's transition table; `result_index` names the global
/// actions produced by the rules.
#[derive(Debug, Clone)]
pub struct Composition {
    pub components: Vec<ComponentEntry>,
    pub local_index: ActionIndex,
    pub result_index: ActionIndex,
    pub rules: RuleSet,
}

impl Composition {
    pub fn component(&self, name: &str) -> Option<&ComponentEntry> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Register every component action and rewrite transition tables in place.
///
/// Components are visited in slice order and actions in each component's own
/// order, so codes are reproducible for the same inputs.
pub fn index_components(
    components: &mut [ComponentEntry],
    index: &mut ActionIndex,
) -> Result<(), CompileError> {
    for entry in components.iter_mut() {
        if entry.lsts.is_indexed() {
            return Err(CompileError::AlreadyIndexed {
                component: entry.name.clone(),
            });
        }
        let codes = entry
            .lsts
            .actions
            .iter()
            .map(|local| index.register(&qualified_name(&entry.name, local)))
            .collect::<Result<Vec<ActionCode>, _>>()?;
        entry
            .lsts
            .rewrite_actions(codes)
            .map_err(|source| CompileError::Lsts {
                component: entry.name.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Compile a parsed rule file with its component models.
///
/// `models[i]` belongs to `rule_file.processes[i]`.
pub fn compile(rule_file: &RuleFile, models: Vec<Lsts>) -> Result<Composition, CompileError> {
    if rule_file.processes.len() != models.len() {
        return Err(CompileError::CountMismatch {
            declared: rule_file.processes.len(),
            loaded: models.len(),
        });
    }
    let named = rule_file
        .processes
        .iter()
        .map(|p| p.name.clone())
        .zip(models)
        .collect();
    compile_parts(named, &rule_file.rules)
}

/// Compile `(name, model)` pairs, in order, with rule declarations.
pub fn compile_parts(
    named: Vec<(String, Lsts)>,
    rule_decls: &[RuleDecl],
) -> Result<Composition, CompileError> {
    let mut components: Vec<ComponentEntry> = named
        .into_iter()
        .enumerate()
        .map(|(i, (name, lsts))| ComponentEntry {
            id: ComponentId(i as u32),
            name,
            lsts,
        })
        .collect();

    for entry in &components {
        entry.lsts.validate().map_err(|source| CompileError::Lsts {
            component: entry.name.clone(),
            source,
        })?;
    }

    let mut local_index = ActionIndex::new();
    index_components(&mut components, &mut local_index)?;
    local_index.freeze();

    let ids: HashMap<&str, ComponentId> = components
        .iter()
        .map(|c| (c.name.as_str(), c.id))
        .collect();

    let mut result_index = ActionIndex::new();
    let mut rules = RuleSet::new();

    for decl in rule_decls {
        let mut sync = Vec::with_capacity(decl.sync.len());
        for pair in &decl.sync {
            let id = ids.get(pair.process.as_str()).copied().ok_or_else(|| {
                CompileError::UnknownProcess {
                    line: decl.line,
                    name: pair.process.clone(),
                }
            })?;
            let name = qualified_name(&pair.process, &pair.action);
            let code = local_index
                .code(&name)
                .map_err(|_| CompileError::UnknownAction {
                    line: decl.line,
                    name,
                })?;
            sync.push((id, code));
        }

        let code = result_index.register(&decl.result)?;
        let result = result_index.action(code)?;
        let rule = Rule::new(sync, result).map_err(|source| CompileError::Rule {
            line: decl.line,
            source,
        })?;
        rules.push(rule);
    }
    result_index.freeze();

    info!(
        components = components.len(),
        local_actions = local_index.len(),
        global_actions = result_index.len(),
        rules = rules.len(),
        "composition compiled"
    );

    Ok(Composition {
        components,
        local_index,
        result_index,
        rules,
    })
}
