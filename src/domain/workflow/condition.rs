//! Trigger conditions evaluated against event data.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::foundation::{AttributeMap, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// One field's condition: a bare scalar means equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionSpec {
    Compare { operator: Operator, value: Scalar },
    Equals(Scalar),
}

/// Field name to condition. All entries must hold.
pub type Conditions = BTreeMap<String, ConditionSpec>;

static NULL: Scalar = Scalar::Null;

impl ConditionSpec {
    pub fn holds_for(&self, actual: &Scalar) -> bool {
        match self {
            ConditionSpec::Equals(expected) => equals(actual, expected),
            ConditionSpec::Compare { operator, value } => match operator {
                Operator::Equals => equals(actual, value),
                Operator::NotEquals => !equals(actual, value),
                Operator::Contains => actual.render().contains(&value.render()),
                Operator::GreaterThan => compare(actual, value) == Some(Ordering::Greater),
                Operator::LessThan => compare(actual, value) == Some(Ordering::Less),
            },
        }
    }
}

/// True iff every condition holds. Missing fields compare as null.
pub fn conditions_match(conditions: &Conditions, data: &AttributeMap) -> bool {
    conditions.iter().all(|(field, spec)| {
        let actual = data.get(field).unwrap_or(&NULL);
        spec.holds_for(actual)
    })
}

fn equals(actual: &Scalar, expected: &Scalar) -> bool {
    match (actual.is_null(), expected.is_null()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        _ => {}
    }
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual.render() == expected.render(),
    }
}

/// Numeric when both sides are numeric, else by rendered text. Null never orders.
fn compare(actual: &Scalar, expected: &Scalar) -> Option<Ordering> {
    if actual.is_null() || expected.is_null() {
        return None;
    }
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(actual.render().cmp(&expected.render())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Scalar)]) -> AttributeMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn parse(value: serde_json::Value) -> Conditions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_conditions_always_match() {
        assert!(conditions_match(&Conditions::new(), &AttributeMap::new()));
    }

    #[test]
    fn bare_scalar_is_equality() {
        let conditions = parse(json!({"fitness_level": "beginner"}));
        assert!(conditions_match(&conditions, &data(&[("fitness_level", "beginner".into())])));
        assert!(!conditions_match(&conditions, &data(&[("fitness_level", "advanced".into())])));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        let conditions = parse(json!({"payment_amount": {"operator": "greater_than", "value": 100}}));
        assert!(conditions_match(&conditions, &data(&[("payment_amount", "150.00".into())])));
        assert!(!conditions_match(&conditions, &data(&[("payment_amount", "99.50".into())])));
        // "9" > "100" as text, but numerically it is not.
        assert!(!conditions_match(&conditions, &data(&[("payment_amount", "9".into())])));
    }

    #[test]
    fn missing_field_is_null() {
        let eq = parse(json!({"client_phone": "555"}));
        assert!(!conditions_match(&eq, &AttributeMap::new()));

        let ne = parse(json!({"client_phone": {"operator": "not_equals", "value": "555"}}));
        assert!(conditions_match(&ne, &AttributeMap::new()));

        let null_eq = parse(json!({"client_phone": null}));
        assert!(conditions_match(&null_eq, &AttributeMap::new()));
    }

    #[test]
    fn conditions_are_anded() {
        let conditions = parse(json!({
            "client_name": {"operator": "contains", "value": "Ann"},
            "booking_status": "pending"
        }));
        let both = data(&[("client_name", "Annika".into()), ("booking_status", "pending".into())]);
        let one = data(&[("client_name", "Annika".into()), ("booking_status", "confirmed".into())]);
        assert!(conditions_match(&conditions, &both));
        assert!(!conditions_match(&conditions, &one));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let result: Result<Conditions, _> =
            serde_json::from_value(json!({"x": {"operator": "matches", "value": "a"}}));
        assert!(result.is_err());
    }
}
