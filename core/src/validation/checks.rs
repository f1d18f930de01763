//! Comparison primitives shared by the built-in validators.
//!
//! Each check returns the failure message, or `None` when the comparison
//! holds. Several violations of one value are reported in a single message.

use rust_decimal::Decimal;

use crate::types::{Cardinality, Constraints};

/// Checks that `count` values of field `name` satisfy `cardinality`.
///
/// ```
/// use modelkit_core::Cardinality;
/// use modelkit_core::validation::check_cardinality;
///
/// assert_eq!(
///     check_cardinality("city", 0, Cardinality::REQUIRED).as_deref(),
///     Some("'city' is a required field but does not exist.")
/// );
/// assert_eq!(check_cardinality("city", 1, Cardinality::REQUIRED), None);
/// ```
pub fn check_cardinality(name: &str, count: usize, cardinality: Cardinality) -> Option<String> {
    let min = cardinality.min as usize;
    if count < min {
        return Some(if count == 0 {
            format!("'{name}' is a required field but does not exist.")
        } else {
            format!("Minimum of {min} '{name}' is expected but found {count}.")
        });
    }
    match cardinality.max {
        Some(max) if count > max as usize => Some(format!(
            "Maximum of {max} '{name}' are expected but found {count}."
        )),
        _ => None,
    }
}

/// Checks a numeric value against range and digit constraints.
pub fn check_number(name: &str, value: &Decimal, constraints: &Constraints) -> Option<String> {
    let mut failures = Vec::new();

    if let Some(min) = constraints.min_value.filter(|min| value < min) {
        failures.push(format!(
            "Expected a number greater than or equal to {min} for '{name}', but found {value}."
        ));
    }
    if let Some(max) = constraints.max_value.filter(|max| value > max) {
        failures.push(format!(
            "Expected a number less than or equal to {max} for '{name}', but found {value}."
        ));
    }

    let (integer_digits, fraction_digits) = digit_counts(value);
    if let Some(digits) = constraints.digits {
        let actual = integer_digits + fraction_digits;
        if actual > digits {
            failures.push(format!(
                "Expected a maximum of {digits} digits for '{name}', but the number {value} has {actual}."
            ));
        }
    }
    if let Some(digits) = constraints.fraction_digits.filter(|d| fraction_digits > *d) {
        failures.push(format!(
            "Expected a maximum of {digits} fractional digits for '{name}', but the number {value} has {fraction_digits}."
        ));
    }

    join(failures)
}

/// Checks a string value against length and pattern constraints.
///
/// Lengths count characters, not bytes.
pub fn check_string(name: &str, value: &str, constraints: &Constraints) -> Option<String> {
    let mut failures = Vec::new();
    let length = value.chars().count();

    if let Some(min) = constraints.min_length.filter(|min| length < *min) {
        failures.push(format!(
            "Field '{name}' requires a value with minimum length of {min} characters but value '{value}' has length of {length} characters."
        ));
    }
    if let Some(max) = constraints.max_length.filter(|max| length > *max) {
        failures.push(format!(
            "Field '{name}' requires a value with maximum length of {max} characters but value '{value}' has length of {length} characters."
        ));
    }
    if let Some(pattern) = constraints.pattern.as_ref().filter(|p| !p.is_match(value)) {
        failures.push(format!(
            "Field '{name}' with value '{value}' does not match the pattern /{}/.",
            pattern.as_str()
        ));
    }

    join(failures)
}

/// Integer and fractional digit counts, ignoring leading and trailing zeros.
fn digit_counts(value: &Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let integer = normalized.trunc().abs();
    let integer_digits = if integer.is_zero() {
        0
    } else {
        integer.to_string().len() as u32
    };
    (integer_digits, normalized.scale())
}

fn join(failures: Vec<String>) -> Option<String> {
    (!failures.is_empty()).then(|| failures.join(" "))
}
