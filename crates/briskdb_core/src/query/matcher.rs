//! Per-property predicate evaluation.

use crate::error::EngineResult;
use crate::value::Value;

/// A predicate on a single property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Property equals the value (structural equality).
    Eq(Value),
    /// Property is greater than or equal to the bound.
    Gte(Value),
    /// Property is strictly greater than the bound.
    Gt(Value),
    /// Property is less than or equal to the bound.
    Lte(Value),
    /// Property is strictly less than the bound.
    Lt(Value),
}

impl Matcher {
    /// Evaluates this matcher against a property value.
    ///
    /// Equality is structural; bounds use the total natural [`Value`] order.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Eq(expected) => value == expected,
            Matcher::Gte(bound) => value >= bound,
            Matcher::Gt(bound) => value > bound,
            Matcher::Lte(bound) => value <= bound,
            Matcher::Lt(bound) => value < bound,
        }
    }

    /// Interprets a dynamic value as a matcher.
    ///
    /// A map value is checked for the tag keys `$equals`, `$gte`, `$gt`,
    /// `$lte`, `$lt` — in that order, which is significant: a map that
    /// happens to carry a `$gte`-shaped key is a range matcher, never a
    /// literal. Only when no tag key is present does the value itself become
    /// an equality literal. `$equals` exists precisely so map-valued
    /// properties overlapping the tag shapes can still be matched literally.
    pub fn from_value(value: Value) -> Self {
        if let Value::Map(map) = &value {
            if let Some(inner) = map.get("$equals") {
                return Matcher::Eq(inner.clone());
            }
            if let Some(inner) = map.get("$gte") {
                return Matcher::Gte(inner.clone());
            }
            if let Some(inner) = map.get("$gt") {
                return Matcher::Gt(inner.clone());
            }
            if let Some(inner) = map.get("$lte") {
                return Matcher::Lte(inner.clone());
            }
            if let Some(inner) = map.get("$lt") {
                return Matcher::Lt(inner.clone());
            }
        }
        Matcher::Eq(value)
    }

    /// Parses a matcher from a JSON value, applying the same tag dispatch as
    /// [`from_value`](Self::from_value).
    pub fn from_json(json: &serde_json::Value) -> EngineResult<Self> {
        Ok(Self::from_value(Value::from_json(json)?))
    }

    /// The value or bound this matcher carries.
    pub fn operand(&self) -> &Value {
        match self {
            Matcher::Eq(v)
            | Matcher::Gte(v)
            | Matcher::Gt(v)
            | Matcher::Lte(v)
            | Matcher::Lt(v) => v,
        }
    }
}

/// Matches properties equal to `value`.
pub fn eq(value: impl Into<Value>) -> Matcher {
    Matcher::Eq(value.into())
}

/// Matches properties greater than or equal to `bound`.
pub fn gte(bound: impl Into<Value>) -> Matcher {
    Matcher::Gte(bound.into())
}

/// Matches properties strictly greater than `bound`.
pub fn gt(bound: impl Into<Value>) -> Matcher {
    Matcher::Gt(bound.into())
}

/// Matches properties less than or equal to `bound`.
pub fn lte(bound: impl Into<Value>) -> Matcher {
    Matcher::Lte(bound.into())
}

/// Matches properties strictly less than `bound`.
pub fn lt(bound: impl Into<Value>) -> Matcher {
    Matcher::Lt(bound.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn equality_is_structural() {
        assert!(eq("Alice").matches(&Value::from("Alice")));
        assert!(!eq("Alice").matches(&Value::from("Bob")));

        // Two separately built composites with equal content match.
        let a = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert!(Matcher::Eq(a).matches(&b));
    }

    #[test]
    fn bounds() {
        assert!(gt(25).matches(&Value::Int(26)));
        assert!(!gt(25).matches(&Value::Int(25)));
        assert!(gte(25).matches(&Value::Int(25)));
        assert!(lt(25).matches(&Value::Int(24)));
        assert!(!lt(25).matches(&Value::Int(25)));
        assert!(lte(25).matches(&Value::Int(25)));
    }

    #[test]
    fn text_bounds_are_lexicographic() {
        assert!(gte("bob").matches(&Value::from("carol")));
        assert!(!gte("bob").matches(&Value::from("alice")));
    }

    #[test]
    fn from_value_bare_literal() {
        assert_eq!(Matcher::from_value(Value::Int(5)), Matcher::Eq(Value::Int(5)));
    }

    #[test]
    fn from_value_tag_dispatch() {
        let mut map = BTreeMap::new();
        map.insert("$gte".to_string(), Value::Int(25));
        assert_eq!(
            Matcher::from_value(Value::Map(map)),
            Matcher::Gte(Value::Int(25))
        );
    }

    #[test]
    fn equals_tag_wins_over_range_tags() {
        // A map carrying both $equals and $gte is an equality matcher: tag
        // keys are checked in order, $equals first.
        let mut map = BTreeMap::new();
        map.insert("$equals".to_string(), Value::Int(1));
        map.insert("$gte".to_string(), Value::Int(25));
        assert_eq!(
            Matcher::from_value(Value::Map(map)),
            Matcher::Eq(Value::Int(1))
        );
    }

    #[test]
    fn tagless_map_is_a_literal() {
        let mut map = BTreeMap::new();
        map.insert("city".to_string(), Value::from("Berlin"));
        let matcher = Matcher::from_value(Value::Map(map.clone()));
        assert_eq!(matcher, Matcher::Eq(Value::Map(map)));
    }

    #[test]
    fn from_json() {
        let matcher = Matcher::from_json(&serde_json::json!({"$gt": 25})).unwrap();
        assert_eq!(matcher, Matcher::Gt(Value::Int(25)));

        let literal = Matcher::from_json(&serde_json::json!("Alice")).unwrap();
        assert_eq!(literal, Matcher::Eq(Value::from("Alice")));
    }
}
