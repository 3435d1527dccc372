//! Stack-to-Host Conversion Tests
//!
//! Covers import for every runtime category, the scalar registry, arrays,
//! views and userdata unwrapping, plus error reporting.
//!
//! # Running Tests
//! ```bash
//! cargo test --test import_tests
//! ```

use moonlink::memory::{LuaValue, MemoryState, TableRef};
use moonlink::{
    BigInt, BigRational, BridgeError, Converter, ConverterConfig, DefaultConverter, Distance,
    HostArray, HostClass, HostType, HostValue, NativeFunction, StackAccess, TextEncoding,
    TypedObject,
};

fn import(state: &mut MemoryState, index: i32, target: HostType) -> Result<HostValue, BridgeError> {
    DefaultConverter::default().to_host(state, index, &target)
}

// ===== Errors =====

#[test]
fn test_missing_value_is_invalid_index() {
    let mut state = MemoryState::new();
    assert_eq!(import(&mut state, 1, HostType::Any), Err(BridgeError::InvalidIndex(1)));
}

#[test]
fn test_void_is_mismatch() {
    let mut state = MemoryState::new();
    state.push(1i64).unwrap();
    let err = import(&mut state, 1, HostType::Void).unwrap_err();
    assert_eq!(err, BridgeError::mismatch("number", HostType::Void));
}

#[test]
fn test_incompatible_target_is_mismatch() {
    let mut state = MemoryState::new();
    state.push(true).unwrap();
    let err = import(&mut state, 1, HostType::I32).unwrap_err();
    assert_eq!(err.to_string(), "cannot convert boolean to i32");
    assert!(err.is_candidate_failure());
}

// ===== Scalars =====

#[test]
fn test_nil_imports_null() {
    let mut state = MemoryState::new();
    state.push(LuaValue::Nil).unwrap();
    for target in [HostType::Any, HostType::I32, HostType::Text, HostType::Map] {
        assert_eq!(import(&mut state, 1, target), Ok(HostValue::Null));
    }
}

#[test]
fn test_numeric_string_to_integer() {
    let mut state = MemoryState::new();
    state.push("42").unwrap();
    assert_eq!(import(&mut state, 1, HostType::I32), Ok(HostValue::I32(42)));
    assert_eq!(import(&mut state, 1, HostType::F64), Ok(HostValue::F64(42.0)));
}

#[test]
fn test_integer_truncation_wraps() {
    let mut state = MemoryState::new();
    state.push(300i64).unwrap();
    state.push(-1i64).unwrap();
    assert_eq!(import(&mut state, 1, HostType::U8), Ok(HostValue::U8(44)));
    assert_eq!(import(&mut state, 1, HostType::I8), Ok(HostValue::I8(44)));
    assert_eq!(import(&mut state, 2, HostType::U16), Ok(HostValue::U16(u16::MAX)));
    assert_eq!(import(&mut state, 2, HostType::U64), Ok(HostValue::U64(u64::MAX)));
}

#[test]
fn test_float_to_integer_truncates() {
    let mut state = MemoryState::new();
    state.push(3.9).unwrap();
    assert_eq!(import(&mut state, 1, HostType::I64), Ok(HostValue::I64(3)));
    assert_eq!(import(&mut state, 1, HostType::F32), Ok(HostValue::F32(3.9)));
}

#[test]
fn test_number_to_text_and_bytes() {
    let mut state = MemoryState::new();
    state.push(12i64).unwrap();
    assert_eq!(import(&mut state, 1, HostType::Text), Ok(HostValue::Text("12".into())));
    assert_eq!(import(&mut state, 1, HostType::Bytes), Ok(HostValue::Bytes(b"12".to_vec())));
}

#[test]
fn test_big_numbers() {
    let mut state = MemoryState::new();
    state.push(2.5).unwrap();
    state.push(0.1).unwrap();
    state.push(f64::INFINITY).unwrap();
    assert_eq!(
        import(&mut state, 1, HostType::BigInt),
        Ok(HostValue::BigInt(BigInt::from(2)))
    );
    assert_eq!(
        import(&mut state, 2, HostType::Decimal),
        Ok(HostValue::Decimal(BigRational::new(BigInt::from(1), BigInt::from(10))))
    );
    assert!(matches!(
        import(&mut state, 3, HostType::BigInt),
        Err(BridgeError::NotRepresentable { .. })
    ));
}

#[test]
fn test_non_finite_numbers_reject_big_targets() {
    let converter = DefaultConverter::default();
    let mut state = MemoryState::new();
    state.push(f64::NAN).unwrap();
    state.push(f64::INFINITY).unwrap();
    state.push(f64::NEG_INFINITY).unwrap();
    state.push("1e999").unwrap();

    for index in 1..=4 {
        for target in [HostType::BigInt, HostType::Decimal] {
            assert_eq!(
                converter.type_distance(&state, index, &target),
                Distance::INCOMPATIBLE,
                "index {} to {}",
                index,
                target
            );
            assert!(matches!(
                converter.to_host(&mut state, index, &target),
                Err(BridgeError::NotRepresentable { .. })
            ));
        }
        assert!(converter.type_distance(&state, index, &HostType::F64).is_compatible());
    }
    assert_eq!(state.top(), 4);
}

#[test]
fn test_char_import() {
    let mut state = MemoryState::new();
    state.push(65i64).unwrap();
    state.push(0xD800i64).unwrap();
    assert_eq!(import(&mut state, 1, HostType::Char), Ok(HostValue::Char('A')));
    assert_eq!(
        import(&mut state, 2, HostType::Char),
        Ok(HostValue::Char(char::REPLACEMENT_CHARACTER))
    );
}

#[test]
fn test_scalars_through_any() {
    let mut state = MemoryState::new();
    state.push(false).unwrap();
    state.push(7i64).unwrap();
    state.push("hello").unwrap();
    assert_eq!(import(&mut state, 1, HostType::Any), Ok(HostValue::Bool(false)));
    assert_eq!(import(&mut state, 2, HostType::Any), Ok(HostValue::F64(7.0)));
    assert_eq!(import(&mut state, 3, HostType::Any), Ok(HostValue::Text("hello".into())));
}

#[test]
fn test_invalid_utf8_through_any_is_bytes() {
    let mut state = MemoryState::new();
    state.push(&[0xffu8, 0xfe][..]).unwrap();
    assert_eq!(
        import(&mut state, 1, HostType::Any),
        Ok(HostValue::Bytes(vec![0xff, 0xfe]))
    );
    assert_eq!(
        import(&mut state, 1, HostType::Text),
        Ok(HostValue::Text("\u{fffd}\u{fffd}".into()))
    );
}

#[test]
fn test_latin1_always_text() {
    let converter =
        DefaultConverter::new(ConverterConfig::new().with_text_encoding(TextEncoding::Latin1));
    let mut state = MemoryState::new();
    state.push(&[0x63u8, 0x61, 0x66, 0xe9][..]).unwrap();
    assert_eq!(
        converter.to_host(&mut state, 1, &HostType::Any),
        Ok(HostValue::Text("caf\u{e9}".into()))
    );
}

#[test]
fn test_raw_byte_array_rejects_bytes() {
    let converter = DefaultConverter::new(ConverterConfig::new().with_raw_byte_array(true));
    let mut state = MemoryState::new();
    state.push("abc").unwrap();
    assert_eq!(
        converter.to_host(&mut state, 1, &HostType::Bytes),
        Err(BridgeError::mismatch("string", HostType::Bytes))
    );
}

// ===== Tables =====

#[test]
fn test_sequence_to_array() {
    let mut state = MemoryState::new();
    state.push(TableRef::from_sequence([10i64, 20, 30])).unwrap();
    let expected = HostArray::from_elements(
        HostType::I32,
        vec![HostValue::I32(10), HostValue::I32(20), HostValue::I32(30)],
    );
    assert_eq!(
        import(&mut state, 1, HostType::array_of(HostType::I32)),
        Ok(HostValue::Array(expected))
    );
    assert_eq!(state.top(), 1);
}

#[test]
fn test_empty_table_to_empty_array() {
    let mut state = MemoryState::new();
    state.push(TableRef::new()).unwrap();
    match import(&mut state, -1, HostType::array_of(HostType::Text)) {
        Ok(HostValue::Array(array)) => assert!(array.is_empty()),
        other => panic!("expected empty array, got {:?}", other),
    }
}

#[test]
fn test_nested_arrays() {
    let mut state = MemoryState::new();
    let rows = TableRef::from_sequence([
        TableRef::from_sequence([1i64, 2]),
        TableRef::from_sequence([3i64]),
    ]);
    state.push(rows).unwrap();
    let target = HostType::array_of(HostType::array_of(HostType::I64));
    match import(&mut state, 1, target) {
        Ok(HostValue::Array(outer)) => {
            assert_eq!(outer.len(), 2);
            match outer.get(0) {
                Some(HostValue::Array(inner)) => {
                    assert_eq!(inner.elements(), &[HostValue::I64(1), HostValue::I64(2)])
                }
                other => panic!("expected inner array, got {:?}", other),
            }
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_array_element_failure_releases_scratch_slot() {
    let mut state = MemoryState::new();
    let table = TableRef::from_sequence([LuaValue::Integer(1), LuaValue::Boolean(true)]);
    state.push(table).unwrap();
    let err = import(&mut state, 1, HostType::array_of(HostType::I32)).unwrap_err();
    assert_eq!(err, BridgeError::mismatch("boolean", HostType::I32));
    assert_eq!(state.top(), 1);
}

#[test]
fn test_table_to_views() {
    let mut state = MemoryState::new();
    state.push(TableRef::new()).unwrap();
    assert!(matches!(import(&mut state, 1, HostType::Map), Ok(HostValue::Map(_))));
    assert!(matches!(import(&mut state, 1, HostType::Any), Ok(HostValue::Map(_))));
    assert!(matches!(import(&mut state, 1, HostType::List), Ok(HostValue::List(_))));
    assert!(matches!(
        import(&mut state, 1, HostType::ValueProxy),
        Ok(HostValue::Proxy(_))
    ));
}

// ===== Functions =====

#[test]
fn test_native_function_import() {
    let function = NativeFunction::new("len", |_state| Ok(1));
    let mut state = MemoryState::new();
    state.push(function.clone()).unwrap();
    assert_eq!(
        import(&mut state, 1, HostType::NativeFunction),
        Ok(HostValue::NativeFunction(function.clone()))
    );
    assert_eq!(
        import(&mut state, 1, HostType::Any),
        Ok(HostValue::NativeFunction(function))
    );
}

#[test]
fn test_script_function_only_as_proxy() {
    let mut state = MemoryState::new();
    state.push_script_function("callback").unwrap();
    assert!(matches!(
        import(&mut state, 1, HostType::Any),
        Ok(HostValue::Proxy(_))
    ));
    assert_eq!(
        import(&mut state, 1, HostType::NativeFunction),
        Err(BridgeError::mismatch("function", HostType::NativeFunction))
    );
}

// ===== Userdata =====

#[test]
fn test_foreign_object_import() {
    let shape = HostClass::new("Shape");
    let square = HostClass::with_supertypes("Square", vec![shape.clone()]);
    let object = HostValue::object(square.clone(), 4u32);

    let mut state = MemoryState::new();
    state.push(LuaValue::userdata(object.clone())).unwrap();
    assert_eq!(import(&mut state, 1, HostType::Class(shape)), Ok(object.clone()));
    assert_eq!(import(&mut state, 1, HostType::Any), Ok(object));
    assert_eq!(
        import(&mut state, 1, HostType::Class(HostClass::new("Circle"))),
        Err(BridgeError::mismatch("userdata", "Circle"))
    );
}

#[test]
fn test_typed_wrapper_import() {
    let strong = TypedObject::strong(HostType::Text, HostValue::Text("s".into()));
    let weak = TypedObject::weak(HostType::Text, HostValue::Text("w".into()));

    let mut state = MemoryState::new();
    state.push(LuaValue::userdata(HostValue::Typed(strong.clone()))).unwrap();
    state.push(LuaValue::userdata(HostValue::Typed(weak))).unwrap();

    assert_eq!(
        import(&mut state, 1, HostType::TypedObject),
        Ok(HostValue::Typed(strong))
    );
    assert_eq!(import(&mut state, 1, HostType::Text), Ok(HostValue::Text("s".into())));
    assert_eq!(import(&mut state, 2, HostType::Text), Ok(HostValue::Text("w".into())));
    assert!(import(&mut state, 2, HostType::TypedObject).is_err());
}

// ===== Typed access =====

#[test]
fn test_typed_get() {
    let converter = DefaultConverter::default();
    let mut state = MemoryState::new();
    state.push(5i64).unwrap();
    state.push(LuaValue::Nil).unwrap();
    state.push("name").unwrap();

    assert_eq!(converter.get::<i32>(&mut state, 1), Ok(5));
    assert_eq!(converter.get::<Option<i32>>(&mut state, 2), Ok(None));
    assert_eq!(converter.get::<String>(&mut state, 3), Ok("name".to_string()));
    assert!(converter.get::<i32>(&mut state, 2).is_err());
}
