use std::collections::BTreeMap;

use lc_core::GeneratedValue;
use rhai::{Array, Dynamic, EvalAltResult, ImmutableString, Map, Position, FLOAT, INT};

// Unit maps to None.
pub(crate) fn dynamic_to_value(value: Dynamic) -> Option<GeneratedValue> {
    if value.is_unit() {
        return None;
    }
    if value.is::<bool>() {
        return Some(GeneratedValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Some(GeneratedValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Some(GeneratedValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Some(GeneratedValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        return Some(GeneratedValue::Array(
            array.into_iter().filter_map(dynamic_to_value).collect(),
        ));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            if let Some(value) = dynamic_to_value(value) {
                out.insert(key.to_string(), value);
            }
        }
        return Some(GeneratedValue::Map(out));
    }

    Some(GeneratedValue::String(value.to_string()))
}

pub(crate) fn number_arg(value: &Dynamic, function: &str) -> Result<f64, Box<EvalAltResult>> {
    if let Ok(value) = value.as_int() {
        return Ok(value as f64);
    }
    if let Ok(value) = value.as_float() {
        return Ok(value);
    }
    if let Some(text) = value.read_lock::<ImmutableString>() {
        if let Ok(parsed) = text.trim().parse::<f64>() {
            return Ok(parsed);
        }
    }
    Err(runtime_error(format!(
        "{} expects a number, got {}",
        function,
        value.type_name()
    )))
}

pub(crate) fn text_arg(value: &Dynamic) -> String {
    match value.read_lock::<ImmutableString>() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

pub(crate) fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message.into()),
        Position::NONE,
    ))
}
