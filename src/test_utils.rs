//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::{Parameters, Symbol, Value};

/// Lowercase keys; never contain the characters of indexed-field or
/// fields-for keys.
pub(crate) fn arb_key() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Scalar values of the kinds JSON and form decoding produce. Floats are
/// left out so equality stays reflexive.
pub(crate) fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
        "[a-z]{1,8}".prop_map(|s| Value::Symbol(Symbol::new(s))),
    ]
}

/// Arbitrary value trees up to three levels deep.
pub(crate) fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((arb_key(), inner), 0..4)
                .prop_map(|entries| Value::Params(entries.into_iter().collect())),
        ]
    })
}

/// Unpermitted parameters with arbitrary nesting.
pub(crate) fn arb_parameters() -> impl Strategy<Value = Parameters> {
    prop::collection::vec((arb_key(), arb_value()), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Unpermitted parameters holding scalars and arrays of scalars only.
pub(crate) fn arb_flat_parameters() -> impl Strategy<Value = Parameters> {
    let value = prop_oneof![
        arb_scalar(),
        prop::collection::vec(arb_scalar(), 0..3).prop_map(Value::Array),
    ];
    prop::collection::vec((arb_key(), value), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}
