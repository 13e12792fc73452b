//! Composable filters and their evaluation.

use crate::error::{EngineError, EngineResult};
use crate::query::matcher::Matcher;
use crate::record::Record;
use std::collections::BTreeMap;

/// A conjunction of per-property matchers: a record passes iff every listed
/// property matches. A property absent from the record matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    matchers: BTreeMap<String, Matcher>,
}

impl WhereClause {
    /// Creates an empty clause (no constraints).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property constraint, builder style.
    #[must_use]
    pub fn field(mut self, property: impl Into<String>, matcher: Matcher) -> Self {
        self.matchers.insert(property.into(), matcher);
        self
    }

    /// Returns the matcher for `property`, if constrained.
    pub fn get(&self, property: &str) -> Option<&Matcher> {
        self.matchers.get(property)
    }

    /// Iterates over the constrained properties.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.matchers.iter().map(|(k, m)| (k.as_str(), m))
    }

    /// Returns true if the clause carries no constraints.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Evaluates the clause against a record.
    pub fn matches(&self, record: &Record) -> bool {
        self.matchers.iter().all(|(property, matcher)| {
            record
                .get(property)
                .is_some_and(|value| matcher.matches(value))
        })
    }
}

/// A recursive filter expression.
///
/// Filters are stateless: built per call, never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// All listed properties must match.
    Where(WhereClause),
    /// Every child filter must match.
    And(Vec<Filter>),
    /// At least one child filter must match.
    Or(Vec<Filter>),
}

impl Filter {
    /// A filter constraining a single property.
    pub fn field(property: impl Into<String>, matcher: Matcher) -> Self {
        Filter::Where(WhereClause::new().field(property, matcher))
    }

    /// Conjunction of child filters.
    pub fn and(children: Vec<Filter>) -> Self {
        Filter::And(children)
    }

    /// Disjunction of child filters.
    pub fn or(children: Vec<Filter>) -> Self {
        Filter::Or(children)
    }

    /// Evaluates the filter against a record.
    ///
    /// This is the final authority on correctness: index-accelerated
    /// candidate sets are always re-checked through here before being
    /// returned to a caller.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Where(clause) => clause.matches(record),
            Filter::And(children) => children.iter().all(|child| child.matches(record)),
            Filter::Or(children) => children.iter().any(|child| child.matches(record)),
        }
    }

    /// Parses a filter from a JSON value.
    ///
    /// An object with an `AND` (or `OR`) key is a conjunction (disjunction)
    /// over the nested array; any other object is a where-clause whose
    /// values go through the matcher tag dispatch.
    pub fn from_json(json: &serde_json::Value) -> EngineResult<Self> {
        let serde_json::Value::Object(object) = json else {
            return Err(EngineError::invalid_value(
                "a filter must be a JSON object",
            ));
        };

        if let Some(children) = object.get("AND") {
            return Ok(Filter::And(Self::children_from_json(children, "AND")?));
        }
        if let Some(children) = object.get("OR") {
            return Ok(Filter::Or(Self::children_from_json(children, "OR")?));
        }

        let mut clause = WhereClause::new();
        for (property, value) in object {
            clause = clause.field(property, Matcher::from_json(value)?);
        }
        Ok(Filter::Where(clause))
    }

    fn children_from_json(
        children: &serde_json::Value,
        combinator: &str,
    ) -> EngineResult<Vec<Filter>> {
        let serde_json::Value::Array(items) = children else {
            return Err(EngineError::invalid_value(format!(
                "{combinator} expects an array of filters"
            )));
        };
        items.iter().map(Self::from_json).collect()
    }
}

impl From<WhereClause> for Filter {
    fn from(clause: WhereClause) -> Self {
        Filter::Where(clause)
    }
}

/// Keeps the records that pass `filter`.
pub fn apply(records: Vec<Record>, filter: &Filter) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::matcher::{eq, gt, lt};

    fn alice() -> Record {
        Record::new().with("id", 1).with("name", "Alice").with("age", 23)
    }

    fn bob() -> Record {
        Record::new().with("id", 2).with("name", "Bob").with("age", 45)
    }

    #[test]
    fn where_conjoins_properties() {
        let filter = Filter::Where(
            WhereClause::new()
                .field("name", eq("Alice"))
                .field("age", gt(20)),
        );
        assert!(filter.matches(&alice()));
        assert!(!filter.matches(&bob()));
    }

    #[test]
    fn missing_property_never_matches() {
        let filter = Filter::field("email", eq("a@example.com"));
        assert!(!filter.matches(&alice()));
    }

    #[test]
    fn empty_where_matches_everything() {
        let filter = Filter::Where(WhereClause::new());
        assert!(filter.matches(&alice()));
    }

    #[test]
    fn and_composition() {
        let filter = Filter::and(vec![
            Filter::field("age", gt(20)),
            Filter::field("age", lt(30)),
        ]);
        assert!(filter.matches(&alice()));
        assert!(!filter.matches(&bob()));
    }

    #[test]
    fn or_composition() {
        let filter = Filter::or(vec![
            Filter::field("name", eq("Alice")),
            Filter::field("name", eq("Bob")),
        ]);
        assert!(filter.matches(&alice()));
        assert!(filter.matches(&bob()));
        assert!(!filter.matches(&Record::new().with("name", "Charlie")));
    }

    #[test]
    fn apply_retains_matches() {
        let filter = Filter::field("age", gt(30));
        let result = apply(vec![alice(), bob()], &filter);
        assert_eq!(result, vec![bob()]);
    }

    #[test]
    fn from_json_where() {
        let filter =
            Filter::from_json(&serde_json::json!({"name": "Alice", "age": {"$gt": 20}})).unwrap();
        assert!(filter.matches(&alice()));
        assert!(!filter.matches(&bob()));
    }

    #[test]
    fn from_json_combinators() {
        let filter = Filter::from_json(&serde_json::json!({
            "OR": [{"name": "Alice"}, {"name": "Bob"}]
        }))
        .unwrap();
        assert!(filter.matches(&alice()));
        assert!(filter.matches(&bob()));

        let band = Filter::from_json(&serde_json::json!({
            "AND": [{"age": {"$gt": 20}}, {"age": {"$lt": 30}}]
        }))
        .unwrap();
        assert!(band.matches(&alice()));
        assert!(!band.matches(&bob()));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(Filter::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Filter::from_json(&serde_json::json!({"AND": 3})).is_err());
    }
}
