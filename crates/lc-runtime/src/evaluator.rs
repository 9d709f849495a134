use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use lc_core::{ConvertError, ScopeScript};
use rhai::{Engine, Scope};
use tracing::debug;

use crate::builtins::register_builtins;
use crate::rng::SeededRng;
use crate::DEFAULT_RANDOM_SEED;

pub trait BindingProbe {
    fn top_level_bindings(&self, scripts: &[ScopeScript]) -> Result<BTreeSet<String>, ConvertError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptEvaluator {
    random_seed: u32,
}

impl Default for ScriptEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_SEED)
    }
}

impl ScriptEvaluator {
    pub fn new(random_seed: u32) -> Self {
        Self { random_seed }
    }

    pub fn random_seed(&self) -> u32 {
        self.random_seed
    }

    pub(crate) fn engine(&self) -> Engine {
        let mut engine = Engine::new();
        register_builtins(&mut engine, Rc::new(RefCell::new(SeededRng::new(self.random_seed))));
        engine
    }

    pub(crate) fn run_scope_script(
        engine: &Engine,
        scope: &mut Scope<'_>,
        scope_id: &str,
        script: &str,
    ) -> Result<(), ConvertError> {
        if script.trim().is_empty() {
            debug!(scope = scope_id, "no script for scope");
            return Ok(());
        }
        engine.run_with_scope(scope, script).map_err(|error| {
            ConvertError::verification(scope_id, format!("script execution failed: {}", error))
        })
    }
}

impl BindingProbe for ScriptEvaluator {
    fn top_level_bindings(&self, scripts: &[ScopeScript]) -> Result<BTreeSet<String>, ConvertError> {
        let engine = self.engine();
        let mut scope = Scope::new();
        for entry in scripts {
            Self::run_scope_script(&engine, &mut scope, &entry.scope, &entry.script)?;
        }
        Ok(scope.iter().map(|(name, _, _)| name.to_string()).collect())
    }
}
