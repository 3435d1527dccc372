//! Host-to-stack conversion

use std::sync::Arc;

use moonlink_sdk::{BigInt, BigRational, BridgeError, BridgeResult, HostValue, LuaState};
use num_traits::{Signed, ToPrimitive};
use tracing::{debug, warn};

use crate::registry::ConversionTables;

/// Pushes host values onto the stack.
#[derive(Debug, Clone)]
pub struct ValueExporter {
    tables: Arc<ConversionTables>,
}

impl ValueExporter {
    /// Create an exporter over `tables`
    pub fn new(tables: Arc<ConversionTables>) -> Self {
        Self { tables }
    }

    /// Push `value` as exactly one stack value.
    ///
    /// Values with no runtime counterpart are pushed as opaque userdata.
    pub fn export(&self, state: &mut dyn LuaState, value: &HostValue) -> BridgeResult<()> {
        if value.is_null() {
            return state.push_nil();
        }
        if self.tables.has_export(value) {
            return self.export_scalar(state, value);
        }
        if let HostValue::NativeFunction(function) = value {
            return state.push_native_function(function.clone());
        }
        if let Some(proxy) = value.as_proxy() {
            if proxy.runtime() != state.runtime_id() {
                warn!(
                    expected = %state.runtime_id(),
                    found = %proxy.runtime(),
                    "refusing to export a proxy into a foreign runtime"
                );
            }
            return proxy.push(state);
        }

        debug!(host_type = %value.host_type(), "exporting as opaque userdata");
        state.push_userdata(value.clone())
    }

    fn export_scalar(&self, state: &mut dyn LuaState, value: &HostValue) -> BridgeResult<()> {
        match value {
            HostValue::Bool(b) => state.push_boolean(*b),
            HostValue::I8(v) => state.push_integer(i64::from(*v)),
            HostValue::I16(v) => state.push_integer(i64::from(*v)),
            HostValue::I32(v) => state.push_integer(i64::from(*v)),
            HostValue::I64(v) => state.push_integer(*v),
            HostValue::U8(v) => state.push_integer(i64::from(*v)),
            HostValue::U16(v) => state.push_integer(i64::from(*v)),
            HostValue::U32(v) => state.push_integer(i64::from(*v)),
            HostValue::U64(v) => match i64::try_from(*v) {
                Ok(i) => state.push_integer(i),
                Err(_) => state.push_number(*v as f64),
            },
            HostValue::F32(v) => state.push_number(f64::from(*v)),
            HostValue::F64(v) => state.push_number(*v),
            HostValue::BigInt(v) => match v.to_i64() {
                Some(i) => state.push_integer(i),
                None => state.push_number(big_to_f64(v)),
            },
            HostValue::Decimal(v) => state.push_number(ratio_to_f64(v)),
            HostValue::Char(c) => state.push_integer(i64::from(u32::from(*c))),
            HostValue::Text(text) => {
                let bytes = self.tables.config().text_encoding.encode(text);
                state.push_bytes(&bytes)
            }
            HostValue::Bytes(bytes) => state.push_bytes(bytes),
            other => Err(BridgeError::mismatch(
                other.host_type().to_string(),
                "runtime scalar",
            )),
        }
    }
}

fn big_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(if value.is_negative() {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}

fn ratio_to_f64(value: &BigRational) -> f64 {
    value.to_f64().unwrap_or(if value.is_negative() {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}
