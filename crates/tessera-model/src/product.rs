//! Synchronous product of component models under a rule set.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tessera_compiler::compile::Composition;
use tessera_compiler::rules::{RuleSet, SyncPair};
use tessera_ir::action::{Action, ComponentId};
use tracing::trace;

use crate::explicit::LstsModel;
use crate::lts::{Model, ModelError, Transition, Transitions};

/// One state per component, in composition order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductState<S>(Rc<[S]>);

impl<S> ProductState<S> {
    pub fn new(parts: Vec<S>) -> Self {
        Self(parts.into())
    }

    pub fn parts(&self) -> &[S] {
        &self.0
    }
}

pub struct ProductModel<M: Model> {
    components: Vec<(ComponentId, M)>,
    positions: HashMap<ComponentId, usize>,
    rules: RuleSet,
    alphabet: Vec<Action>,
}

impl<M: Model> ProductModel<M> {
    /// Compose `components` (order significant) under `rules`. The alphabet
    /// is the set of distinct rule results.
    pub fn new(components: Vec<(ComponentId, M)>, rules: RuleSet) -> Result<Self, ModelError> {
        let alphabet = rules.result_actions();
        Self::with_alphabet(components, rules, alphabet)
    }

    pub fn with_alphabet(
        components: Vec<(ComponentId, M)>,
        rules: RuleSet,
        alphabet: Vec<Action>,
    ) -> Result<Self, ModelError> {
        let positions: HashMap<ComponentId, usize> = components
            .iter()
            .enumerate()
            .map(|(pos, (id, _))| (*id, pos))
            .collect();

        for rule in rules.iter() {
            for (component, _) in rule.sync() {
                if !positions.contains_key(component) {
                    return Err(ModelError::UnknownComponent {
                        rule: rule.result().name().to_string(),
                        component: *component,
                    });
                }
            }
        }

        Ok(Self {
            components,
            positions,
            rules,
            alphabet,
        })
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, id: ComponentId) -> Option<&M> {
        let pos = *self.positions.get(&id)?;
        Some(&self.components[pos].1)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl ProductModel<LstsModel> {
    /// Product of a compiled composition's explicit components.
    pub fn from_composition(composition: &Composition) -> Result<Self, ModelError> {
        let components = composition
            .components
            .iter()
            .map(|entry| {
                LstsModel::with_index(&entry.lsts, &composition.local_index)
                    .map(|model| (entry.id, model))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_alphabet(
            components,
            composition.rules.clone(),
            composition.result_index.actions(),
        )
    }
}

impl<M: Model> Model for ProductModel<M> {
    type State = ProductState<M::State>;

    fn initial_state(&mut self) -> Self::State {
        ProductState::new(
            self.components
                .iter_mut()
                .map(|(_, model)| model.initial_state())
                .collect(),
        )
    }

    fn actions(&self) -> Vec<Action> {
        self.alphabet.clone()
    }

    fn outgoing(&mut self, state: &Self::State) -> Result<Transitions<Self::State>, ModelError> {
        let parts = state.parts();
        if parts.len() != self.components.len() {
            return Err(ModelError::UnknownState {
                state: format!("{state:?}"),
            });
        }

        let mut local = Vec::with_capacity(parts.len());
        let mut offered: HashSet<SyncPair> = HashSet::new();
        for ((id, model), part) in self.components.iter_mut().zip(parts) {
            let transitions = model.outgoing(part)?;
            offered.extend(transitions.iter().map(|t| (*id, t.action.code())));
            local.push(transitions);
        }

        let mut result = Vec::new();
        for rule in self.rules.enabled(&offered) {
            // Every combination of participant steps is a distinct successor.
            let mut dests: Vec<Vec<M::State>> = vec![parts.to_vec()];
            for &(component, code) in rule.sync() {
                let pos = self.positions[&component];
                let steps: Vec<&M::State> = local[pos]
                    .iter()
                    .filter(|t| t.action.code() == code)
                    .map(|t| &t.dest)
                    .collect();
                if steps.is_empty() {
                    return Err(ModelError::RuleInvariant {
                        rule: rule.result().name().to_string(),
                        component,
                        action: code,
                    });
                }
                dests = dests
                    .into_iter()
                    .flat_map(|dest| {
                        steps.iter().map(move |&step| {
                            let mut next = dest.clone();
                            next[pos] = step.clone();
                            next
                        })
                    })
                    .collect();
            }

            for dest in dests {
                result.push(Transition {
                    source: state.clone(),
                    action: rule.result().clone(),
                    dest: ProductState::new(dest),
                });
            }
        }

        trace!(state = ?state, transitions = result.len(), "product state expanded");
        Ok(result.into())
    }

    fn clear_cache(&mut self) {
        for (_, model) in &mut self.components {
            model.clear_cache();
        }
    }
}
