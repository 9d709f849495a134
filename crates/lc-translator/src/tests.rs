use lc_core::{ConvertError, DedupPolicy, PlaceholderForm, ResponseKind, ROOT_SCOPE};
use lc_parser::{parse_xml_document, prepare_problem_source};
use lc_runtime::ScriptEvaluator;
use pretty_assertions::assert_eq;

use crate::{
    reduce_embedded_exprs, walk_document, TranslateOptions, TranslationContext, VisibilityMode,
    WalkOutput,
};

fn walk(source: &str, options: &TranslateOptions) -> Result<(WalkOutput, TranslationContext), ConvertError> {
    let prepared = prepare_problem_source(source)?;
    let document = parse_xml_document(&prepared)?;
    let mut context = TranslationContext::new(options);
    let output = walk_document(&mut context, &document.root)?;
    Ok((output, context))
}

fn context_with_root_script(script: &str) -> TranslationContext {
    let mut context = TranslationContext::new(&TranslateOptions::default());
    context
        .set_script(ROOT_SCOPE, crate::translate_script(script).expect("script translates"));
    context
}

#[test]
fn scalar_reference_registers_one_expression() {
    let mut context = context_with_root_script("$x = 5;");
    let reduced =
        reduce_embedded_exprs(&mut context, "$x + 2", ROOT_SCOPE, PlaceholderForm::Bare)
            .expect("reduces");
    assert_eq!(reduced, "{{value-0}} + 2");
    let entries = context.table().expressions(ROOT_SCOPE);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "value-0");
    assert_eq!(entries[0].expr, "scalar_x");
}

#[test]
fn element_reference_uses_the_vector_name() {
    let mut context = context_with_root_script("@arr = (4, 5, 6);");
    let reduced =
        reduce_embedded_exprs(&mut context, "$arr[2]", ROOT_SCOPE, PlaceholderForm::Bare)
            .expect("reduces");
    assert_eq!(reduced, "{{value-0}}");
    assert_eq!(context.table().expressions(ROOT_SCOPE)[0].expr, "vector_arr[2]");
}

#[test]
fn undeclared_reference_is_left_alone() {
    let mut context = context_with_root_script("$x = 5;");
    let reduced =
        reduce_embedded_exprs(&mut context, "$undeclared", ROOT_SCOPE, PlaceholderForm::Bare)
            .expect("reduces");
    assert_eq!(reduced, "$undeclared");
    assert!(context.table().expression_groups().is_empty());
}

#[test]
fn duplicate_part_ids_stop_the_walk() {
    let source = r#"<problem>
<part id="1"><script type="loncapa/perl">$a = 1;</script>first $a</part>
<part id="1">second</part>
</problem>"#;
    let error = walk(source, &TranslateOptions::default())
        .err()
        .expect("duplicate id must fail");
    assert_eq!(error.code(), "SCOPE_DUPLICATE_ID");
    assert!(matches!(
        error,
        ConvertError::DuplicateScopeId { ref scope, span: Some(_) } if scope == "scope_1"
    ));
}

#[test]
fn division_by_zero_fails_verification() {
    let source = r#"<problem>
<script type="loncapa/perl">$x = 4;</script>
<part id="a"><script type="loncapa/perl">$y = $x / 0;</script>Value</part>
</problem>"#;
    let options = TranslateOptions {
        visibility: VisibilityMode::StaticScan,
        ..TranslateOptions::default()
    };
    let (_, context) = walk(source, &options).expect("static scan does not execute");
    let error = ScriptEvaluator::new(options.random_seed)
        .verify(context.table())
        .expect_err("verification must fail");
    assert!(matches!(
        error,
        ConvertError::VerificationFailure { ref scope, .. } if scope == "scope_a"
    ));
}

#[test]
fn repeated_expressions_share_one_placeholder() {
    let source = r#"<problem>
<script type="loncapa/perl">$x = 2;</script>
<p>$x and $x</p>
<part id="p1">again $x</part>
</problem>"#;
    let (output, context) = walk(source, &TranslateOptions::default()).expect("walks");
    assert_eq!(
        output.segments[0].text.trim(),
        "<p>{{generated-values.__scope_default__.value-0}} and {{generated-values.__scope_default__.value-0}}</p>"
    );
    assert_eq!(output.segments[1].scope, "scope_p1");
    assert_eq!(
        output.segments[1].text.trim(),
        "again {{generated-values.__scope_default__.value-0}}"
    );
    assert_eq!(context.table().expression_groups().len(), 1);
}

#[test]
fn per_scope_dedup_registers_under_each_scope() {
    let source = r#"<problem>
<script type="loncapa/perl">$x = 2;</script>
<p>$x</p>
<part id="p1">again $x</part>
</problem>"#;
    let options = TranslateOptions {
        dedup: DedupPolicy::PerScope,
        ..TranslateOptions::default()
    };
    let (output, context) = walk(source, &options).expect("walks");
    assert_eq!(
        output.segments[1].text,
        "again {{generated-values.scope_p1.value-1}}"
    );
    assert_eq!(context.table().expressions("scope_p1")[0].expr, "scalar_x");
}

#[test]
fn segments_follow_scope_changes_in_document_order() {
    let source = r#"<problem>
<startouttext />Intro<endouttext />
<part>Inside <b>bold</b></part>
Outro
</problem>"#;
    let (output, context) = walk(source, &TranslateOptions::default()).expect("walks");
    let scopes: Vec<_> = output.segments.iter().map(|s| s.scope.as_str()).collect();
    assert_eq!(scopes, vec![ROOT_SCOPE, "scope_part1", ROOT_SCOPE]);
    assert_eq!(output.segments[1].text, "Inside <b>bold</b>");
    let registered: Vec<_> = context
        .table()
        .scripts()
        .iter()
        .map(|entry| entry.scope.as_str())
        .collect();
    assert_eq!(registered, vec![ROOT_SCOPE, "scope_part1"]);
}

#[test]
fn responses_take_the_preceding_markup_as_prompt() {
    let source = r#"<problem>
<script type="loncapa/perl">$v = 9.81; $unit = "m/s^2";</script>
<part id="g">What is g? $v
<numericalresponse answer="$v" unit="$unit"><responseparam name="tol" default="1%" /></numericalresponse>
</part>
</problem>"#;
    let (output, _) = walk(source, &TranslateOptions::default()).expect("walks");
    assert_eq!(output.responses.len(), 1);
    let response = &output.responses[0];
    assert_eq!(response.answer_id, "ans-1");
    assert_eq!(response.kind, ResponseKind::NumericalResponse);
    assert_eq!(response.scope, "scope_g");
    assert_eq!(
        response.prompt,
        "What is g? {{generated-values.scope_g.value-0}}\n"
    );
    assert_eq!(
        response.attributes,
        vec![
            ("answer".to_string(), "{{value-0}}".to_string()),
            ("unit".to_string(), "{{value-1}}".to_string()),
        ]
    );
    assert!(output.segments.iter().all(|segment| !segment.text.contains("responseparam")));
}

#[test]
fn walked_problem_verifies_with_sampled_values() {
    let source = r#"<problem>
<script type="loncapa/perl">
@masses = (2, 4, 6);
$i = 1;
$m = $masses[$i];
$label = "mass $m kg";
</script>
<p>$label: $masses[$i]</p>
</problem>"#;
    let (output, context) = walk(source, &TranslateOptions::default()).expect("walks");
    assert_eq!(
        output.segments[0].text.trim(),
        "<p>{{generated-values.__scope_default__.value-0}}: {{generated-values.__scope_default__.value-1}}</p>"
    );
    let samples = ScriptEvaluator::default()
        .verify(context.table())
        .expect("verifies");
    let root = &samples[ROOT_SCOPE];
    assert_eq!(root["value-0"].as_string(), Some("mass 4 kg"));
    assert_eq!(root["value-1"].as_number(), Some(4.0));
}

fn verified_root_values(source: &str) -> Vec<(String, lc_core::GeneratedValue)> {
    let (_, context) = walk(source, &TranslateOptions::default()).expect("walks");
    let samples = ScriptEvaluator::default()
        .verify(context.table())
        .expect("verifies");
    samples[ROOT_SCOPE]
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[test]
fn assignments_in_either_branch_reach_the_markup() {
    for (start, expected) in [("1", "plus"), ("-1", "minus")] {
        let source = format!(
            r#"<problem>
<script type="loncapa/perl">
$a = {};
if ($a > 0) {{ $sign = "plus"; }} else {{ $sign = "minus"; }}
</script>
<p>The sign is $sign.</p>
</problem>"#,
            start
        );
        let (output, context) = walk(&source, &TranslateOptions::default()).expect("walks");
        assert_eq!(
            output.segments[0].text.trim(),
            "<p>The sign is {{generated-values.__scope_default__.value-0}}.</p>"
        );
        let samples = ScriptEvaluator::default()
            .verify(context.table())
            .expect("both branches verify");
        assert_eq!(samples[ROOT_SCOPE]["value-0"].as_string(), Some(expected));
    }
}

#[test]
fn integer_division_samples_a_fraction() {
    let values = verified_root_values(
        r#"<problem>
<script type="loncapa/perl">$a = 5; $b = $a / 2; $c = 6 / 2;</script>
<p>$b and $c</p>
</problem>"#,
    );
    assert_eq!(values[0].1.as_number(), Some(2.5));
    assert_eq!(values[1].1.as_number(), Some(3.0));
}

#[test]
fn list_ranges_index_like_the_legacy_list() {
    let values = verified_root_values(
        r#"<problem>
<script type="loncapa/perl">@v = (1..5); $n = $v[4];</script>
<p>$n is $v[0]</p>
</problem>"#,
    );
    assert_eq!(values[0].1.as_number(), Some(5.0));
    assert_eq!(values[1].1.as_number(), Some(1.0));
}

#[test]
fn hints_are_reduced_with_their_links() {
    let source = r#"<problem>
<script type="loncapa/perl">$v = 3; $t = 2;</script>
<part id="h">
Before $v
<hintgroup>Try <b>$v</b> times $t. <a href="/res/u/help.html">help</a></hintgroup>
After
<stringresponse answer="$v"><hintgroup>  Think about   $t </hintgroup></stringresponse>
</part>
</problem>"#;
    let (output, _) = walk(source, &TranslateOptions::default()).expect("walks");
    assert_eq!(output.hints.len(), 2);

    let standalone = &output.hints[0];
    assert_eq!(standalone.scope, "scope_h");
    assert_eq!(standalone.answer_id, None);
    assert_eq!(
        standalone.preceding_text.trim(),
        "Before {{generated-values.scope_h.value-0}}"
    );
    assert_eq!(
        standalone.prompt,
        "Try {{generated-values.scope_h.value-0}} times {{generated-values.scope_h.value-1}}. help"
    );
    assert_eq!(standalone.files.len(), 1);
    assert_eq!(standalone.files[0].name, "help.html");
    assert_eq!(standalone.files[0].kind, lc_core::HintFileKind::Html);

    let nested = &output.hints[1];
    assert_eq!(nested.answer_id.as_deref(), Some("ans-1"));
    assert_eq!(nested.preceding_text, "");
    assert_eq!(nested.prompt, "Think about {{generated-values.scope_h.value-1}}");

    assert_eq!(output.responses[0].prompt.trim(), "After");
    assert!(output.segments.iter().all(|segment| !segment.text.contains("hintgroup")));
}

#[test]
fn empty_hints_are_skipped() {
    let source = r#"<problem><p>text</p><hintgroup>   </hintgroup></problem>"#;
    let (output, _) = walk(source, &TranslateOptions::default()).expect("walks");
    assert!(output.hints.is_empty());
    assert_eq!(output.segments[0].text, "<p>text</p>");
}
