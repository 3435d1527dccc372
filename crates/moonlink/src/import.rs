//! Stack-to-host conversion
//!
//! Every rule here mirrors a finite score in [`DistanceEvaluator`]: when the
//! evaluator accepts a (value, target) pair, import does not fail on it.
//!
//! [`DistanceEvaluator`]: crate::DistanceEvaluator

use std::sync::Arc;

use moonlink_sdk::{
    BigInt, BigRational, BridgeError, BridgeResult, Converter, HostArray, HostType, HostValue,
    LuaCategory, LuaState, TableList, TableMap,
};
use num_traits::FromPrimitive;
use tracing::trace;

use crate::converter::DefaultConverter;
use crate::registry::ConversionTables;

/// Converts stack values into host values.
#[derive(Debug, Clone)]
pub struct ValueImporter {
    tables: Arc<ConversionTables>,
}

impl ValueImporter {
    /// Create an importer over `tables`
    pub fn new(tables: Arc<ConversionTables>) -> Self {
        Self { tables }
    }

    /// Convert the value at `index` into `target`
    pub fn import(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        target: &HostType,
    ) -> BridgeResult<HostValue> {
        let category = state
            .category(index)
            .ok_or(BridgeError::InvalidIndex(index))?;
        match target {
            HostType::Void => return Err(BridgeError::mismatch(category.name(), target)),
            HostType::ValueProxy => return Ok(HostValue::Proxy(state.capture(index)?)),
            _ => {}
        }

        let imported = match category {
            LuaCategory::Nil => Some(HostValue::Null),
            LuaCategory::Boolean | LuaCategory::Number | LuaCategory::String => {
                self.import_scalar(state, index, category, target)?
            }
            LuaCategory::Table => self.import_table(state, index, target)?,
            LuaCategory::Function => match target {
                HostType::NativeFunction | HostType::Any => state
                    .to_native_function(index)
                    .map(HostValue::NativeFunction),
                _ => None,
            },
            LuaCategory::UserData => import_userdata(state, index, target),
        };

        match imported {
            Some(value) => Ok(value),
            None if *target == HostType::Any => Ok(HostValue::Proxy(state.capture(index)?)),
            None => Err(BridgeError::mismatch(category.name(), target)),
        }
    }

    fn import_scalar(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        category: LuaCategory,
        target: &HostType,
    ) -> BridgeResult<Option<HostValue>> {
        if *target == HostType::Any {
            let value = match category {
                LuaCategory::Boolean => HostValue::Bool(state.to_boolean(index)),
                LuaCategory::Number => HostValue::F64(state.to_number(index)),
                _ => {
                    let bytes = state.to_bytes(index).unwrap_or_default();
                    match self.tables.config().text_encoding.decode_exact(&bytes) {
                        Some(text) => HostValue::Text(text),
                        None => HostValue::Bytes(bytes),
                    }
                }
            };
            return Ok(Some(value));
        }

        if self.tables.has_import(target) && self.tables.category_distance(category, target).is_some() {
            return self.convert_scalar(state, index, target).map(Some);
        }
        Ok(None)
    }

    /// Per-type import of a boolean, number or string
    fn convert_scalar(
        &self,
        state: &dyn LuaState,
        index: i32,
        target: &HostType,
    ) -> BridgeResult<HostValue> {
        // Integer targets truncate like a C cast
        let value = match target {
            HostType::Bool => HostValue::Bool(state.to_boolean(index)),
            HostType::I8 => HostValue::I8(state.to_integer(index) as i8),
            HostType::I16 => HostValue::I16(state.to_integer(index) as i16),
            HostType::I32 => HostValue::I32(state.to_integer(index) as i32),
            HostType::I64 => HostValue::I64(state.to_integer(index)),
            HostType::U8 => HostValue::U8(state.to_integer(index) as u8),
            HostType::U16 => HostValue::U16(state.to_integer(index) as u16),
            HostType::U32 => HostValue::U32(state.to_integer(index) as u32),
            HostType::U64 => HostValue::U64(state.to_integer(index) as u64),
            HostType::F32 => HostValue::F32(state.to_number(index) as f32),
            HostType::F64 => HostValue::F64(state.to_number(index)),
            HostType::BigInt => HostValue::BigInt(big_integer(state.to_number(index))?),
            HostType::Decimal => HostValue::Decimal(decimal(state.to_number(index))?),
            HostType::Char => HostValue::Char(
                char::from_u32(state.to_integer(index) as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
            ),
            HostType::Text => {
                let bytes = state.to_bytes(index).unwrap_or_default();
                HostValue::Text(self.tables.config().text_encoding.decode(&bytes))
            }
            HostType::Bytes => HostValue::Bytes(state.to_bytes(index).unwrap_or_default()),
            other => return Err(BridgeError::mismatch(state.type_name(index), other)),
        };
        Ok(value)
    }

    fn import_table(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        target: &HostType,
    ) -> BridgeResult<Option<HostValue>> {
        let value = match target {
            HostType::Map | HostType::Any => {
                HostValue::Map(TableMap::new(state.capture(index)?, self.view_converter()))
            }
            HostType::List => {
                HostValue::List(TableList::new(state.capture(index)?, self.view_converter()))
            }
            HostType::Array(component) => HostValue::Array(self.import_array(state, index, component)?),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Copy a sequence into a host array, one scratch slot at a time
    fn import_array(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        component: &HostType,
    ) -> BridgeResult<HostArray> {
        let table = state.abs_index(index);
        let len = usize::try_from(state.raw_len(table)).unwrap_or(0);
        trace!(len, %component, "importing array");

        let mut elements = Vec::with_capacity(len);
        for n in 1..=len {
            state.raw_get_index(table, n as i64)?;
            let element = self.import(state, -1, component);
            state.pop(1);
            elements.push(element?);
        }
        Ok(HostArray::from_elements(component.clone(), elements))
    }

    fn view_converter(&self) -> Arc<dyn Converter> {
        Arc::new(DefaultConverter::from_tables(Arc::clone(&self.tables)))
    }
}

fn import_userdata(state: &dyn LuaState, index: i32, target: &HostType) -> Option<HostValue> {
    match state.to_userdata(index)? {
        HostValue::Typed(typed) => {
            if typed.is_strong() && target.is_assignable_from(&HostType::TypedObject) {
                Some(HostValue::Typed(typed))
            } else if target.is_assignable_from(typed.declared_type()) {
                Some(typed.into_payload())
            } else {
                None
            }
        }
        payload => target.is_assignable_from(&payload.host_type()).then_some(payload),
    }
}

fn not_representable(value: f64, target: HostType) -> BridgeError {
    BridgeError::NotRepresentable {
        value,
        target: target.to_string(),
    }
}

/// Round half-to-even, then convert exactly
pub(crate) fn big_integer(value: f64) -> BridgeResult<BigInt> {
    if !value.is_finite() {
        return Err(not_representable(value, HostType::BigInt));
    }
    BigInt::from_f64(value.round_ties_even()).ok_or_else(|| not_representable(value, HostType::BigInt))
}

/// Exact decimal of the shortest representation that round-trips `value`
pub(crate) fn decimal(value: f64) -> BridgeResult<BigRational> {
    if !value.is_finite() {
        return Err(not_representable(value, HostType::Decimal));
    }
    let text = value.to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let numer: BigInt = format!("{}{}", whole, fraction)
        .parse()
        .map_err(|_| not_representable(value, HostType::Decimal))?;
    let denom = num_traits::pow(BigInt::from(10u32), fraction.len());
    Ok(BigRational::new(numer, denom))
}
