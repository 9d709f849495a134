use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedValue {
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<GeneratedValue>),
    Map(BTreeMap<String, GeneratedValue>),
}

impl GeneratedValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => {
                if value.fract().abs() < f64::EPSILON {
                    (*value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
            Self::String(value) => value.clone(),
            Self::Array(values) => values
                .iter()
                .map(Self::display_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(_) => format!("{:?}", self),
        }
    }
}

pub type SampleValues = BTreeMap<String, BTreeMap<String, GeneratedValue>>;
