use std::collections::BTreeMap;

use lc_core::{ConvertError, SampleValues, ScopeTable};
use rhai::{Dynamic, Scope};
use tracing::{debug, info};

use crate::bridge::dynamic_to_value;
use crate::evaluator::ScriptEvaluator;

impl ScriptEvaluator {
    pub fn verify(&self, table: &ScopeTable) -> Result<SampleValues, ConvertError> {
        if let Some(orphan) = table
            .expression_groups()
            .iter()
            .find(|group| !table.has_scope(&group.scope))
        {
            return Err(ConvertError::verification(
                &orphan.scope,
                "expressions are registered for a scope that never registered a script",
            ));
        }

        let engine = self.engine();
        let mut scope = Scope::new();
        let mut samples = SampleValues::new();

        for entry in table.scripts() {
            info!(scope = %entry.scope, "verifying scope");
            Self::run_scope_script(&engine, &mut scope, &entry.scope, &entry.script)?;

            let mut values = BTreeMap::new();
            for expression in table.expressions(&entry.scope) {
                let result = engine
                    .eval_expression_with_scope::<Dynamic>(&mut scope, &expression.expr)
                    .map_err(|error| {
                        ConvertError::verification(
                            &entry.scope,
                            format!(
                                "expression {} ({}) failed: {}",
                                expression.name, expression.expr, error
                            ),
                        )
                    })?;
                let Some(value) = dynamic_to_value(result) else {
                    return Err(ConvertError::verification(
                        &entry.scope,
                        format!(
                            "expression {} ({}) evaluated to null",
                            expression.name, expression.expr
                        ),
                    ));
                };
                debug!(scope = %entry.scope, name = %expression.name, "expression verified");
                values.insert(expression.name.clone(), value);
            }

            if !values.is_empty() {
                samples.insert(entry.scope.clone(), values);
            }
        }

        Ok(samples)
    }
}
