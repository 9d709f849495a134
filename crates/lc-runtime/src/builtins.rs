use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use lc_core::ConvertError;
use regex::Regex;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, FLOAT, INT};

use crate::bridge::{number_arg, runtime_error, text_arg};
use crate::rng::SeededRng;

pub(crate) const BUILTIN_PREFIX: &str = "builtin_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSpec {
    Significant(usize),
    Fixed(usize),
    Exponent { digits: usize, upper: bool },
    General(usize),
}

impl FormatSpec {
    pub fn parse(pattern: &str) -> Result<Self, ConvertError> {
        let unsupported = || ConvertError::UnsupportedFormatSpecifier {
            pattern: pattern.to_string(),
        };
        let captures = format_pattern_regex()
            .captures(pattern.trim())
            .ok_or_else(unsupported)?;
        let digits = captures[1].parse::<usize>().map_err(|_| unsupported())?;
        match &captures[2] {
            "s" | "S" => Ok(Self::Significant(digits)),
            "f" | "F" => Ok(Self::Fixed(digits)),
            "e" => Ok(Self::Exponent {
                digits,
                upper: false,
            }),
            "E" => Ok(Self::Exponent {
                digits,
                upper: true,
            }),
            "g" => Ok(Self::General(digits)),
            _ => Err(unsupported()),
        }
    }

    fn render(&self, value: f64) -> String {
        match *self {
            Self::Significant(digits) | Self::General(digits) => significant_text(value, digits),
            Self::Fixed(digits) => format!("{:.*}", digits, value),
            Self::Exponent { digits, upper } => {
                let text = format!("{:.*e}", digits, value);
                if upper {
                    text.to_uppercase()
                } else {
                    text
                }
            }
        }
    }
}

pub fn format_number(value: f64, pattern: &str) -> Result<f64, ConvertError> {
    let spec = FormatSpec::parse(pattern)?;
    spec.render(value)
        .to_lowercase()
        .parse::<f64>()
        .map_err(|_| ConvertError::UnsupportedFormatSpecifier {
            pattern: pattern.to_string(),
        })
}

pub fn pretty_print(value: f64, pattern: &str) -> Result<String, ConvertError> {
    match FormatSpec::parse(pattern)? {
        FormatSpec::General(_) => Err(ConvertError::UnsupportedFormatSpecifier {
            pattern: pattern.to_string(),
        }),
        FormatSpec::Exponent { digits, .. } => {
            let text = format!("{:.*e}", digits, value);
            let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
            Ok(format!("{}\u{00D7}10^{}", mantissa, exponent))
        }
        spec => Ok(spec.render(value)),
    }
}

fn significant_text(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.*e}", digits - 1, value)
        .parse::<f64>()
        .unwrap_or(value);
    rounded.to_string()
}

fn format_pattern_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(\d+)([sSeEfFg])$").expect("format pattern regex"))
}

pub(crate) fn interpolate(template: &str, args: &[Dynamic]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(ch);
            }
            ('{', Some('}')) => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(&text_arg(arg));
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn random_in_range(
    rng: &Rc<RefCell<SeededRng>>,
    lower: &Dynamic,
    upper: &Dynamic,
    step: &Dynamic,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let name = "random";
    let (a, b, step_value) = (
        number_arg(lower, name)?,
        number_arg(upper, name)?,
        number_arg(step, name)?,
    );
    if step_value <= 0.0 {
        return Err(runtime_error("random expects a positive step"));
    }
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let slots = slot_count(high - low, step_value);
    let bound = u32::try_from(slots).map_err(|_| runtime_error("random range is too large"))?;
    let index = rng.borrow_mut().pick(bound);
    let value = low + f64::from(index) * step_value;

    if lower.is_int() && upper.is_int() && step.is_int() {
        return Ok(Dynamic::from_int(value.round() as INT));
    }
    Ok(Dynamic::from_float((value * 1e10).round() / 1e10))
}

// Steps that land on the upper bound up to float error still count it.
fn slot_count(span: f64, step: f64) -> u64 {
    (span / step + STEP_EPSILON).floor() as u64 + 1
}

const STEP_EPSILON: f64 = 1e-9;

const RANGE_LIMIT: INT = 1_000_000;

fn divide(numerator: INT, denominator: INT) -> Result<Dynamic, Box<EvalAltResult>> {
    if denominator == 0 {
        return Err(runtime_error("division by zero"));
    }
    match (
        numerator.checked_rem(denominator),
        numerator.checked_div(denominator),
    ) {
        (Some(0), Some(quotient)) => Ok(Dynamic::from_int(quotient)),
        _ => Ok(Dynamic::from_float(numerator as FLOAT / denominator as FLOAT)),
    }
}

fn inclusive_range(low: &Dynamic, high: &Dynamic) -> Result<Array, Box<EvalAltResult>> {
    let start = number_arg(low, "range")?.trunc() as INT;
    let end = number_arg(high, "range")?.trunc() as INT;
    if end.saturating_sub(start) > RANGE_LIMIT {
        return Err(runtime_error("range is too large"));
    }
    Ok((start..=end).map(Dynamic::from_int).collect())
}

fn flatten_list(items: Array) -> Array {
    let mut out = Array::with_capacity(items.len());
    for item in items {
        if item.is::<Array>() {
            out.extend(item.cast::<Array>());
        } else {
            out.push(item);
        }
    }
    out
}

fn math1(
    engine: &mut Engine,
    name: &'static str,
    op: fn(f64) -> f64,
) {
    engine.register_fn(
        format!("{}{}", BUILTIN_PREFIX, name),
        move |value: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            Ok(op(number_arg(&value, name)?))
        },
    );
}

pub(crate) fn register_builtins(engine: &mut Engine, rng: Rc<RefCell<SeededRng>>) {
    // The `/` overload is only consulted with fast operators off.
    engine.set_fast_operators(false);
    engine.register_fn("/", divide);
    engine.register_fn("inclusive_range", |low: Dynamic, high: Dynamic| {
        inclusive_range(&low, &high)
    });
    engine.register_fn("flatten_list", flatten_list);

    let shared = Rc::clone(&rng);
    engine.register_fn(
        "builtin_random",
        move |lower: Dynamic, upper: Dynamic, step: Dynamic| {
            random_in_range(&shared, &lower, &upper, &step)
        },
    );
    engine.register_fn("builtin_random", move |lower: Dynamic, upper: Dynamic| {
        random_in_range(&rng, &lower, &upper, &Dynamic::from_int(1))
    });

    engine.register_fn(
        "builtin_format",
        |value: Dynamic, pattern: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            let number = number_arg(&value, "format")?;
            format_number(number, &text_arg(&pattern))
                .map_err(|error| runtime_error(error.to_string()))
        },
    );
    engine.register_fn(
        "builtin_prettyprint",
        |value: Dynamic, pattern: Dynamic| -> Result<String, Box<EvalAltResult>> {
            let number = number_arg(&value, "prettyprint")?;
            pretty_print(number, &text_arg(&pattern))
                .map_err(|error| runtime_error(error.to_string()))
        },
    );
    engine.register_fn(
        "builtin_prettyprint",
        |value: Dynamic, pattern: Dynamic, _target: Dynamic| -> Result<String, Box<EvalAltResult>> {
            let number = number_arg(&value, "prettyprint")?;
            pretty_print(number, &text_arg(&pattern))
                .map_err(|error| runtime_error(error.to_string()))
        },
    );
    engine.register_fn(
        "builtin_roundto",
        |value: Dynamic, decimals: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            let number = number_arg(&value, "roundto")?;
            let places = number_arg(&decimals, "roundto")?.max(0.0) as usize;
            format!("{:.*}", places, number)
                .parse::<FLOAT>()
                .map_err(|error| runtime_error(error.to_string()))
        },
    );
    engine.register_fn(
        "builtin_pow",
        |base: Dynamic, exponent: Dynamic| -> Result<FLOAT, Box<EvalAltResult>> {
            Ok(number_arg(&base, "pow")?.powf(number_arg(&exponent, "pow")?))
        },
    );

    math1(engine, "sqrt", f64::sqrt);
    math1(engine, "log", f64::ln);
    math1(engine, "log10", f64::log10);
    math1(engine, "exp", f64::exp);
    engine.register_fn(
        "builtin_abs",
        |value: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            if let Ok(int) = value.as_int() {
                return Ok(Dynamic::from_int(int.abs()));
            }
            Ok(Dynamic::from_float(number_arg(&value, "abs")?.abs()))
        },
    );

    engine.register_fn("interpolate", |template: ImmutableString, args: Array| {
        interpolate(template.as_str(), &args)
    });
}

#[cfg(test)]
mod builtins_tests {
    use super::*;
    use crate::evaluator::ScriptEvaluator;

    #[test]
    fn format_spec_parses_known_patterns() {
        assert_eq!(FormatSpec::parse("3s"), Ok(FormatSpec::Significant(3)));
        assert_eq!(FormatSpec::parse("2F"), Ok(FormatSpec::Fixed(2)));
        assert_eq!(
            FormatSpec::parse("4E"),
            Ok(FormatSpec::Exponent {
                digits: 4,
                upper: true
            })
        );
        assert_eq!(FormatSpec::parse("5g"), Ok(FormatSpec::General(5)));
    }

    #[test]
    fn malformed_patterns_are_unsupported() {
        for pattern in ["s3", "3x", "", "3.2f", "abc"] {
            let error = FormatSpec::parse(pattern).expect_err("pattern should be rejected");
            assert_eq!(error.code(), "FORMAT_UNSUPPORTED");
        }
    }

    #[test]
    fn format_number_rounds_per_pattern() {
        assert_eq!(format_number(1234.5678, "3s").expect("3s"), 1230.0);
        assert_eq!(format_number(3.14159, "2f").expect("2f"), 3.14);
        assert_eq!(format_number(0.000123456, "2e").expect("2e"), 0.000123);
        assert_eq!(format_number(0.0, "3s").expect("zero"), 0.0);
    }

    #[test]
    fn pretty_print_renders_exponent_with_times_sign() {
        assert_eq!(pretty_print(12346.0, "2e").expect("2e"), "1.23\u{00D7}10^4");
        assert_eq!(pretty_print(2.0, "3f").expect("3f"), "2.000");
        assert_eq!(pretty_print(0.012345, "2s").expect("2s"), "0.012");
        assert!(pretty_print(1.0, "3g").is_err());
    }

    #[test]
    fn interpolate_fills_slots_in_order() {
        let args = vec![Dynamic::from_int(5), Dynamic::from("kg".to_string())];
        assert_eq!(interpolate("m = {} {}", &args), "m = 5 kg");
        assert_eq!(interpolate("{{literal}} {}", &args), "{literal} 5");
        assert_eq!(interpolate("none {} {} {}", &args), "none 5 kg ");
    }

    #[test]
    fn integer_division_keeps_the_fraction() {
        let engine = ScriptEvaluator::default().engine();
        assert_eq!(engine.eval::<FLOAT>("let a = 5; a / 2").expect("divides"), 2.5);
        assert_eq!(engine.eval::<INT>("let a = 6; a / 2").expect("divides"), 3);
        assert_eq!(engine.eval::<FLOAT>("let a = 5.0; a / 2").expect("divides"), 2.5);
        assert!(engine.eval::<Dynamic>("let a = 1; a / 0").is_err());
    }

    #[test]
    fn ranges_are_inclusive_and_lists_flatten() {
        let engine = ScriptEvaluator::default().engine();
        let values: Vec<INT> = engine
            .eval::<Array>("flatten_list([0, inclusive_range(2, 4), 9])")
            .expect("list builds")
            .into_iter()
            .map(|value| value.as_int().expect("integer"))
            .collect();
        assert_eq!(values, vec![0, 2, 3, 4, 9]);
        let empty = engine.eval::<Array>("inclusive_range(3, 1)").expect("empty range");
        assert!(empty.is_empty());
    }

    #[test]
    fn float_steps_reach_the_upper_bound() {
        assert_eq!(slot_count(0.3 - 0.1, 0.1), 3);
        assert_eq!(slot_count(9.0, 1.0), 10);
        assert_eq!(slot_count(0.0, 2.0), 1);
    }
}
