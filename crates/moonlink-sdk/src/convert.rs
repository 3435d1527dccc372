//! Conversion surface and typed conversion traits
//!
//! [`Converter`] is what a call dispatcher programs against: score a stack
//! value against a candidate type, import it, export a return value.
//! [`FromHost`] and [`IntoHost`] map concrete Rust types onto [`HostValue`]
//! so bindings can work with `i32` or `String` instead of matching on
//! variants.
//!
//! # Example
//!
//! ```ignore
//! use moonlink_sdk::{Converter, FromHost, LuaState, BridgeResult};
//!
//! fn first_arg<T: FromHost>(converter: &dyn Converter, state: &mut dyn LuaState) -> BridgeResult<T> {
//!     let value = converter.to_host(state, 1, &T::host_type())?;
//!     T::from_host(value)
//! }
//! ```

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::context::LuaState;
use crate::distance::Distance;
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::ValueProxy;
use crate::tables::{TableList, TableMap};
use crate::types::HostType;
use crate::value::{HostValue, NativeFunction};

// ============================================================================
// Converter
// ============================================================================

/// Stack-to-host and host-to-stack conversion.
pub trait Converter: Send + Sync {
    /// Score how well the value at `index` converts to `target`.
    ///
    /// Never fails; an impossible conversion is [`Distance::INCOMPATIBLE`].
    fn type_distance(&self, state: &dyn LuaState, index: i32, target: &HostType) -> Distance;

    /// Convert the value at `index` into a host value of type `target`
    fn to_host(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        target: &HostType,
    ) -> BridgeResult<HostValue>;

    /// Push `value` onto the stack as exactly one runtime value
    fn push_host(&self, state: &mut dyn LuaState, value: &HostValue) -> BridgeResult<()>;
}

// ============================================================================
// Typed conversion traits
// ============================================================================

/// Extract a Rust value from a [`HostValue`].
pub trait FromHost: Sized {
    /// Host type to request when importing this type
    fn host_type() -> HostType;

    /// Convert from an imported value, failing if the variant doesn't match
    fn from_host(value: HostValue) -> BridgeResult<Self>;
}

/// Wrap a Rust value as a [`HostValue`].
pub trait IntoHost {
    /// Convert into a host value
    fn into_host(self) -> HostValue;
}

fn type_error(value: &HostValue, expected: HostType) -> BridgeError {
    BridgeError::mismatch(value.host_type().to_string(), expected)
}

macro_rules! host_conversions {
    ($($ty:ty => $host_type:ident / $variant:ident),* $(,)?) => {
        $(
            impl FromHost for $ty {
                fn host_type() -> HostType {
                    HostType::$host_type
                }

                fn from_host(value: HostValue) -> BridgeResult<Self> {
                    match value {
                        HostValue::$variant(v) => Ok(v),
                        other => Err(type_error(&other, HostType::$host_type)),
                    }
                }
            }

            impl IntoHost for $ty {
                fn into_host(self) -> HostValue {
                    HostValue::$variant(self)
                }
            }
        )*
    };
}

host_conversions! {
    bool => Bool / Bool,
    i8 => I8 / I8,
    i16 => I16 / I16,
    i32 => I32 / I32,
    i64 => I64 / I64,
    u8 => U8 / U8,
    u16 => U16 / U16,
    u32 => U32 / U32,
    u64 => U64 / U64,
    f32 => F32 / F32,
    f64 => F64 / F64,
    char => Char / Char,
    String => Text / Text,
    Vec<u8> => Bytes / Bytes,
    BigInt => BigInt / BigInt,
    BigRational => Decimal / Decimal,
    NativeFunction => NativeFunction / NativeFunction,
    ValueProxy => ValueProxy / Proxy,
    TableMap => Map / Map,
    TableList => List / List,
}

impl FromHost for HostValue {
    fn host_type() -> HostType {
        HostType::Any
    }

    fn from_host(value: HostValue) -> BridgeResult<Self> {
        Ok(value)
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::Text(self.to_string())
    }
}

// Unit type (for functions that return nothing)
impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::Null
    }
}

// nil <-> None
impl<T: FromHost> FromHost for Option<T> {
    fn host_type() -> HostType {
        T::host_type()
    }

    fn from_host(value: HostValue) -> BridgeResult<Self> {
        match value {
            HostValue::Null => Ok(None),
            other => T::from_host(other).map(Some),
        }
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        match self {
            Some(value) => value.into_host(),
            None => HostValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_from_host() {
        assert_eq!(i32::from_host(HostValue::I32(7)), Ok(7));
        assert_eq!(String::from_host(HostValue::Text("hi".into())), Ok("hi".to_string()));
        assert_eq!(<Vec<u8>>::host_type(), HostType::Bytes);
    }

    #[test]
    fn test_from_host_mismatch() {
        let err = i32::from_host(HostValue::Text("x".into())).unwrap_err();
        assert_eq!(err, BridgeError::mismatch("String", HostType::I32));
        assert!(err.is_candidate_failure());
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<i64>::from_host(HostValue::Null), Ok(None));
        assert_eq!(Option::<i64>::from_host(HostValue::I64(3)), Ok(Some(3)));
        assert_eq!(Option::<i64>::host_type(), HostType::I64);
        assert_eq!(None::<bool>.into_host(), HostValue::Null);
    }

    #[test]
    fn test_into_host() {
        assert_eq!(1.5f64.into_host(), HostValue::F64(1.5));
        assert_eq!("abc".into_host(), HostValue::Text("abc".into()));
        assert_eq!(().into_host(), HostValue::Null);
        assert_eq!('x'.into_host(), HostValue::Char('x'));
    }
}
