use std::collections::{BTreeSet, HashMap};

use lc_core::{ConvertError, ScopeTable};
use lc_runtime::{BindingProbe, ScriptEvaluator, StaticScan};
use tracing::debug;

use crate::{TranslateOptions, VisibilityMode};

pub struct TranslationContext {
    table: ScopeTable,
    probe: Box<dyn BindingProbe>,
    visible: HashMap<String, BTreeSet<String>>,
}

impl TranslationContext {
    pub fn new(options: &TranslateOptions) -> Self {
        let probe: Box<dyn BindingProbe> = match options.visibility {
            VisibilityMode::Execute => Box::new(ScriptEvaluator::new(options.random_seed)),
            VisibilityMode::StaticScan => Box::new(StaticScan),
        };
        Self::with_probe(ScopeTable::new(options.dedup), probe)
    }

    pub fn with_probe(table: ScopeTable, probe: Box<dyn BindingProbe>) -> Self {
        Self {
            table,
            probe,
            visible: HashMap::new(),
        }
    }

    pub fn table(&self) -> &ScopeTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ScopeTable {
        &mut self.table
    }

    pub fn into_table(self) -> ScopeTable {
        self.table
    }

    // Any memoized prefix may include the replaced script.
    pub fn set_script(&mut self, scope: &str, script: impl Into<String>) {
        self.table.set_script(scope, script);
        self.visible.clear();
    }

    pub fn visible_names(&mut self, scope: &str) -> Result<&BTreeSet<String>, ConvertError> {
        if !self.visible.contains_key(scope) {
            let names = self
                .probe
                .top_level_bindings(self.table.scripts_through(scope))?;
            debug!(scope, count = names.len(), "computed visible names");
            self.visible.insert(scope.to_string(), names);
        }
        Ok(&self.visible[scope])
    }

    pub fn is_visible(&mut self, scope: &str, name: &str) -> Result<bool, ConvertError> {
        Ok(self.visible_names(scope)?.contains(name))
    }
}
