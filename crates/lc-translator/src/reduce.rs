use lc_core::{ConvertError, PlaceholderForm};
use tracing::warn;

use crate::context::TranslationContext;
use crate::reference::{
    match_reference, normalize_index, scalar_symbol, vector_symbol, ElementIndex, InlineReference,
};

pub fn reduce_embedded_exprs(
    context: &mut TranslationContext,
    text: &str,
    scope: &str,
    form: PlaceholderForm,
) -> Result<String, ConvertError> {
    let text = text.replace("&amp;", "&");
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    while let Some(found) = text[cursor..].find('$') {
        let start = cursor + found;
        out.push_str(&text[cursor..start]);
        let rest = &text[start..];

        let Some(reference) = match_reference(rest) else {
            out.push('$');
            cursor = start + 1;
            continue;
        };
        let matched = &rest[..reference.len()];
        match resolve(context, &reference, scope, matched)? {
            Some(expr) => {
                let registered = context.table_mut().add_reference(scope, &expr);
                out.push_str(&registered.render(form));
            }
            None => out.push_str(matched),
        }
        cursor = start + reference.len();
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}

fn resolve(
    context: &mut TranslationContext,
    reference: &InlineReference<'_>,
    scope: &str,
    matched: &str,
) -> Result<Option<String>, ConvertError> {
    match *reference {
        InlineReference::Element { array, index, .. } => {
            let vector = vector_symbol(array);
            if !context.is_visible(scope, &vector)? {
                warn_unresolved(scope, &vector, matched);
                return Ok(None);
            }
            let index = match index {
                ElementIndex::Literal(digits) => normalize_index(digits).to_string(),
                ElementIndex::Variable(name) => {
                    let scalar = scalar_symbol(name);
                    if !context.is_visible(scope, &scalar)? {
                        warn_unresolved(scope, &scalar, matched);
                        return Ok(None);
                    }
                    scalar
                }
            };
            Ok(Some(format!("{}[{}]", vector, index)))
        }
        InlineReference::Scalar { name, .. } => {
            let scalar = scalar_symbol(name);
            if !context.is_visible(scope, &scalar)? {
                warn_unresolved(scope, &scalar, matched);
                return Ok(None);
            }
            Ok(Some(scalar))
        }
    }
}

fn warn_unresolved(scope: &str, name: &str, text: &str) {
    let error = ConvertError::UnresolvedReference {
        scope: scope.to_string(),
        name: name.to_string(),
        text: text.to_string(),
    };
    warn!(code = error.code(), "{}", error);
}
