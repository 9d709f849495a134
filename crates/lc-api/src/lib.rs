use lc_core::{
    ConvertError, HintSite, MarkupSegment, ResponseSite, SampleValues, ScopeExpressions,
    ScopeScript,
};
use lc_parser::{parse_xml_document, prepare_problem_source};
use lc_runtime::ScriptEvaluator;
use lc_translator::{walk_document, TranslationContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use lc_core::DedupPolicy;
pub use lc_runtime::DEFAULT_RANDOM_SEED;
pub use lc_translator::{TranslateOptions, VisibilityMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedProblem {
    pub scripts: Vec<ScopeScript>,
    pub expressions: Vec<ScopeExpressions>,
    pub segments: Vec<MarkupSegment>,
    pub responses: Vec<ResponseSite>,
    pub hints: Vec<HintSite>,
    pub sample_values: SampleValues,
}

pub fn translate_problem(
    source: &str,
    options: &TranslateOptions,
) -> Result<TranslatedProblem, ConvertError> {
    let prepared = prepare_problem_source(source)?;
    let document = parse_xml_document(&prepared)?;
    let Some(problem) = document.root.find_descendant("problem") else {
        return Err(ConvertError::InvalidDocument {
            message: "document has no <problem> element".to_string(),
        });
    };

    let mut context = TranslationContext::new(options);
    let walked = walk_document(&mut context, problem)?;
    let table = context.into_table();
    debug!(
        scopes = table.scripts().len(),
        segments = walked.segments.len(),
        responses = walked.responses.len(),
        "walk finished"
    );

    let sample_values = ScriptEvaluator::new(options.random_seed).verify(&table)?;
    info!(scopes = table.scripts().len(), "problem verified");

    Ok(TranslatedProblem {
        scripts: table.scripts().to_vec(),
        expressions: table.expression_groups().to_vec(),
        segments: walked.segments,
        responses: walked.responses,
        hints: walked.hints,
        sample_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::{GeneratedValue, ROOT_SCOPE};

    const PROBLEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<problem>
<script type="loncapa/perl">
$m = &random(2, 2, 1);
$a = 3.5;
$f = $m * $a;
$shown = &prettyprint($f, "2f");
</script>
<startouttext />A <b>$m kg</b> cart accelerates at $a m/s&amp;sup2;.<endouttext />
<part id="force">
<startouttext />Find the force.<endouttext />
<numericalresponse answer="$f" unit="N">
<responseparam name="tol" default="1%" />
<textline />
</numericalresponse>
</part>
</problem>"#;

    #[test]
    fn translate_problem_produces_verified_output() {
        let result = translate_problem(PROBLEM, &TranslateOptions::default())
            .expect("problem should translate");

        let scopes: Vec<_> = result.scripts.iter().map(|s| s.scope.as_str()).collect();
        assert_eq!(scopes, vec![ROOT_SCOPE, "scope_force"]);
        assert!(result.scripts[0].script.contains("let scalar_f = scalar_m * scalar_a;"));

        assert_eq!(result.responses.len(), 1);
        assert_eq!(result.responses[0].answer_id, "ans-1");
        assert_eq!(result.responses[0].prompt.trim(), "Find the force.");
        assert_eq!(
            result.responses[0].attributes[0],
            ("answer".to_string(), "{{value-2}}".to_string())
        );

        let root = &result.sample_values[ROOT_SCOPE];
        assert_eq!(root["value-0"], GeneratedValue::Number(2.0));
        assert_eq!(root["value-1"], GeneratedValue::Number(3.5));
        let force = &result.sample_values["scope_force"];
        assert_eq!(force["value-2"], GeneratedValue::Number(7.0));
    }

    #[test]
    fn serialized_result_uses_camel_case_keys() {
        let result = translate_problem(PROBLEM, &TranslateOptions::default())
            .expect("problem should translate");
        let json = serde_json::to_value(&result).expect("serializes");
        assert!(json.get("sampleValues").is_some());
        assert_eq!(json["responses"][0]["answerId"], "ans-1");
        assert_eq!(json["hints"], serde_json::json!([]));
    }

    #[test]
    fn missing_problem_element_is_invalid() {
        let error = translate_problem("<library><p>text</p></library>", &TranslateOptions::default())
            .expect_err("no problem element");
        assert_eq!(error.code(), "DOCUMENT_INVALID");
    }

    #[test]
    fn html_documents_are_unsupported() {
        let error = translate_problem("<html><problem /></html>", &TranslateOptions::default())
            .expect_err("html");
        assert_eq!(error.code(), "DOCUMENT_UNSUPPORTED");
        assert!(error.is_tolerable());
    }

    #[test]
    fn failing_script_blocks_the_result() {
        let source = r#"<problem><script type="loncapa/perl">$x = 1 / 0;</script><p>text</p></problem>"#;
        let error = translate_problem(source, &TranslateOptions::default())
            .expect_err("division by zero");
        assert_eq!(error.code(), "VERIFY_FAILED");
    }
}
