use serde::{Deserialize, Serialize};

use crate::types::{DedupPolicy, Reference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeScript {
    pub scope: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionEntry {
    pub name: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeExpressions {
    pub scope: String,
    pub entries: Vec<ExpressionEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    scripts: Vec<ScopeScript>,
    expressions: Vec<ScopeExpressions>,
    next_value: usize,
    dedup: DedupPolicy,
}

impl ScopeTable {
    pub fn new(dedup: DedupPolicy) -> Self {
        Self {
            dedup,
            ..Self::default()
        }
    }

    pub fn dedup_policy(&self) -> DedupPolicy {
        self.dedup
    }

    // Last write wins, in place.
    pub fn set_script(&mut self, scope: &str, script: impl Into<String>) {
        let script = script.into();
        if let Some(entry) = self.scripts.iter_mut().find(|entry| entry.scope == scope) {
            entry.script = script;
            return;
        }
        self.scripts.push(ScopeScript {
            scope: scope.to_string(),
            script,
        });
    }

    pub fn script(&self, scope: &str) -> Option<&str> {
        self.scripts
            .iter()
            .find(|entry| entry.scope == scope)
            .map(|entry| entry.script.as_str())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scripts.iter().any(|entry| entry.scope == scope)
    }

    pub fn scripts(&self) -> &[ScopeScript] {
        &self.scripts
    }

    pub fn scripts_through(&self, scope: &str) -> &[ScopeScript] {
        match self.scripts.iter().position(|entry| entry.scope == scope) {
            Some(index) => &self.scripts[..=index],
            None => &self.scripts,
        }
    }

    pub fn add_reference(&mut self, scope: &str, expr: &str) -> Reference {
        if let Some(existing) = self.find_expression(scope, expr) {
            return existing;
        }

        let name = format!("value-{}", self.next_value);
        self.next_value += 1;

        let entry = ExpressionEntry {
            name: name.clone(),
            expr: expr.to_string(),
        };
        match self
            .expressions
            .iter_mut()
            .find(|group| group.scope == scope)
        {
            Some(group) => group.entries.push(entry),
            None => self.expressions.push(ScopeExpressions {
                scope: scope.to_string(),
                entries: vec![entry],
            }),
        }

        Reference {
            name,
            scope: scope.to_string(),
        }
    }

    fn find_expression(&self, scope: &str, expr: &str) -> Option<Reference> {
        self.expressions
            .iter()
            .filter(|group| match self.dedup {
                DedupPolicy::Global => true,
                DedupPolicy::PerScope => group.scope == scope,
            })
            .find_map(|group| {
                group
                    .entries
                    .iter()
                    .find(|entry| entry.expr == expr)
                    .map(|entry| Reference {
                        name: entry.name.clone(),
                        scope: group.scope.clone(),
                    })
            })
    }

    pub fn expressions(&self, scope: &str) -> &[ExpressionEntry] {
        self.expressions
            .iter()
            .find(|group| group.scope == scope)
            .map(|group| group.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn expression_groups(&self) -> &[ScopeExpressions] {
        &self.expressions
    }
}
