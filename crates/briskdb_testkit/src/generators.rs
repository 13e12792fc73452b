//! Property-based test generators.

use briskdb_core::{Matcher, Record, Value};
use proptest::prelude::*;

/// Strategy for scalar values (no composites).
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,12}".prop_map(Value::Text),
    ]
}

/// Strategy for user records with a bounded integer primary key.
///
/// Bounded keys collide across a generated batch, which is what most
/// pipeline tests want: duplicate inserts and hit-or-miss updates.
pub fn user_record(max_id: i64) -> impl Strategy<Value = Record> {
    (0..max_id, "[a-z]{1,8}", 0i64..100).prop_map(|(id, name, age)| {
        Record::new().with("id", id).with("name", name).with("age", age)
    })
}

/// Strategy for matchers over integer ages.
pub fn age_matcher() -> impl Strategy<Value = Matcher> {
    let bound = 0i64..100;
    prop_oneof![
        bound.clone().prop_map(|b| Matcher::Eq(Value::Int(b))),
        bound.clone().prop_map(|b| Matcher::Gt(Value::Int(b))),
        bound.clone().prop_map(|b| Matcher::Gte(Value::Int(b))),
        bound.clone().prop_map(|b| Matcher::Lt(Value::Int(b))),
        bound.prop_map(|b| Matcher::Lte(Value::Int(b))),
    ]
}
