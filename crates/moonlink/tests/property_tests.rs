//! Property-based tests for the conversion bridge
//!
//! - Exported scalars import back unchanged
//! - Scoring is total and never touches the stack
//! - Every compatible score is honoured by import
//!
//! # Running Tests
//! ```bash
//! cargo test --test property_tests
//! ```

use moonlink::memory::{LuaValue, MemoryState, TableRef};
use moonlink::{
    Converter, DefaultConverter, Distance, HostClass, HostType, HostValue, NativeFunction,
    StackAccess,
};
use proptest::prelude::*;

fn round_trip(value: HostValue, target: HostType) -> HostValue {
    let converter = DefaultConverter::default();
    let mut state = MemoryState::new();
    converter.push_host(&mut state, &value).unwrap();
    converter.to_host(&mut state, -1, &target).unwrap()
}

fn targets() -> Vec<HostType> {
    let mut targets = vec![
        HostType::Void,
        HostType::ValueProxy,
        HostType::Any,
        HostType::Bool,
        HostType::Text,
        HostType::Bytes,
        HostType::Map,
        HostType::List,
        HostType::array_of(HostType::I32),
        HostType::array_of(HostType::Text),
        HostType::NativeFunction,
        HostType::TypedObject,
        HostType::Class(HostClass::new("Opaque")),
    ];
    targets.extend(moonlink::registry::NUMERIC_TYPES);
    targets
}

fn lua_value() -> impl Strategy<Value = LuaValue> {
    prop_oneof![
        Just(LuaValue::Nil),
        any::<bool>().prop_map(LuaValue::Boolean),
        any::<i64>().prop_map(LuaValue::Integer),
        any::<f64>().prop_map(LuaValue::Number),
        "[a-d0-9 .e]{0,8}".prop_map(|s| LuaValue::string(s)),
        prop::collection::vec(any::<i32>(), 0..6).prop_map(|v| TableRef::from_sequence(v).into()),
        Just(LuaValue::from(NativeFunction::new("f", |_state| Ok(0)))),
        any::<u8>().prop_map(|b| LuaValue::userdata(HostValue::U8(b))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ===== Scalar round trips =====

    #[test]
    fn prop_bool_round_trip(b in any::<bool>()) {
        prop_assert_eq!(round_trip(HostValue::Bool(b), HostType::Bool), HostValue::Bool(b));
    }

    #[test]
    fn prop_i32_round_trip(v in any::<i32>()) {
        prop_assert_eq!(round_trip(HostValue::I32(v), HostType::I32), HostValue::I32(v));
    }

    #[test]
    fn prop_i64_round_trip(v in any::<i64>()) {
        prop_assert_eq!(round_trip(HostValue::I64(v), HostType::I64), HostValue::I64(v));
    }

    #[test]
    fn prop_u16_round_trip(v in any::<u16>()) {
        prop_assert_eq!(round_trip(HostValue::U16(v), HostType::U16), HostValue::U16(v));
    }

    #[test]
    fn prop_f64_round_trip(v in prop::num::f64::NORMAL | prop::num::f64::ZERO) {
        prop_assert_eq!(round_trip(HostValue::F64(v), HostType::F64), HostValue::F64(v));
    }

    #[test]
    fn prop_char_round_trip(c in any::<char>()) {
        prop_assert_eq!(round_trip(HostValue::Char(c), HostType::Char), HostValue::Char(c));
    }

    #[test]
    fn prop_text_round_trip(s in ".{0,32}") {
        prop_assert_eq!(
            round_trip(HostValue::Text(s.clone()), HostType::Text),
            HostValue::Text(s.clone())
        );
        prop_assert_eq!(round_trip(HostValue::Text(s.clone()), HostType::Any), HostValue::Text(s));
    }

    // ===== Scoring =====

    #[test]
    fn prop_distance_is_total_and_pure(value in lua_value()) {
        let converter = DefaultConverter::default();
        let mut state = MemoryState::new();
        state.push(value).unwrap();
        for target in targets() {
            let distance = converter.distance(&state, 1, &target);
            prop_assert!(distance <= Distance::INCOMPATIBLE);
            prop_assert_eq!(state.top(), 1);
        }
    }

    #[test]
    fn prop_compatible_scores_import(value in lua_value()) {
        let converter = DefaultConverter::default();
        let mut state = MemoryState::new();
        state.push(value).unwrap();
        for target in targets() {
            let distance = converter.type_distance(&state, 1, &target);
            let imported = converter.to_host(&mut state, 1, &target);
            prop_assert_eq!(state.top(), 1);
            if distance.is_compatible() {
                prop_assert!(imported.is_ok(), "{} scored {} but failed: {:?}", target, distance, imported);
            } else {
                prop_assert!(imported.is_err(), "{} incompatible but imported", target);
            }
        }
    }
}
