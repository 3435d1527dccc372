//! Runtime stack interfaces
//!
//! The conversion core never touches runtime internals. Everything it needs
//! is expressed by the three traits below, which the embedding runtime
//! implements; [`LuaState`] bundles them so callers can pass a single
//! `&dyn LuaState` or `&mut dyn LuaState`.
//!
//! Indices follow the runtime's convention: positive indices count from the
//! bottom of the stack (`1` is the first slot), negative indices from the top
//! (`-1` is the top). `0` is never a valid index.

use crate::category::LuaCategory;
use crate::error::BridgeResult;
use crate::proxy::{RuntimeId, ValueProxy};
use crate::value::{HostValue, NativeFunction};

/// Read access to the runtime stack.
pub trait StackAccess {
    // ========================================================================
    // Identity
    // ========================================================================

    /// Runtime that owns this stack
    fn runtime_id(&self) -> RuntimeId;

    /// Index of the top slot (equal to the number of slots)
    fn top(&self) -> i32;

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Category of the value at `index`, or `None` if there is no value
    fn category(&self, index: i32) -> Option<LuaCategory>;

    /// Truthiness of the value (`nil` and `false` are false)
    fn to_boolean(&self, index: i32) -> bool;

    /// Integer value of a number or numeric string, `0` otherwise
    fn to_integer(&self, index: i32) -> i64;

    /// Float value of a number or numeric string, `0.0` otherwise
    fn to_number(&self, index: i32) -> f64;

    /// Bytes of a string, or the textual form of a number
    fn to_bytes(&self, index: i32) -> Option<Vec<u8>>;

    /// Raw length of a string or the border of a table
    fn raw_len(&self, index: i32) -> i64;

    /// Whether the value is a function that originated on the host side
    fn is_native_function(&self, index: i32) -> bool;

    /// The host function behind a native-originated function value
    fn to_native_function(&self, index: i32) -> Option<NativeFunction>;

    /// Host payload of a userdata value
    fn to_userdata(&self, index: i32) -> Option<HostValue>;

    /// Whether the value is userdata wrapping a value proxy
    fn is_proxy_reference(&self, index: i32) -> bool {
        matches!(self.to_userdata(index), Some(HostValue::Proxy(_)))
    }

    /// Convert a relative index into an absolute one
    fn abs_index(&self, index: i32) -> i32 {
        if index < 0 {
            self.top() + index + 1
        } else {
            index
        }
    }

    /// Runtime type name of the value at `index`
    fn type_name(&self, index: i32) -> &'static str {
        self.category(index)
            .map(LuaCategory::name)
            .unwrap_or("no value")
    }

    // ========================================================================
    // Table reads (no metamethods)
    // ========================================================================

    /// Push `table[n]` where `table` is at `index`
    fn raw_get_index(&mut self, index: i32, n: i64) -> BridgeResult<()>;

    /// Pop a key and push `table[key]` where `table` is at `index`
    fn raw_get(&mut self, index: i32) -> BridgeResult<()>;

    /// Pop a key and push the next key and value of the table at `index`.
    ///
    /// Returns `false`, pushing nothing, when the traversal is finished.
    fn next(&mut self, index: i32) -> BridgeResult<bool>;

    /// Remove `count` values from the top of the stack
    fn pop(&mut self, count: i32);
}

/// Write access to the runtime stack.
pub trait StackWrite {
    /// Push `nil`
    fn push_nil(&mut self) -> BridgeResult<()>;

    /// Push a boolean
    fn push_boolean(&mut self, value: bool) -> BridgeResult<()>;

    /// Push an integer
    fn push_integer(&mut self, value: i64) -> BridgeResult<()>;

    /// Push a float
    fn push_number(&mut self, value: f64) -> BridgeResult<()>;

    /// Push a byte string
    fn push_bytes(&mut self, value: &[u8]) -> BridgeResult<()>;

    /// Push a host function as a callable value
    fn push_native_function(&mut self, function: NativeFunction) -> BridgeResult<()>;

    /// Push a host value as opaque userdata
    fn push_userdata(&mut self, value: HostValue) -> BridgeResult<()>;

    /// Push a copy of the value at `index`
    fn push_value(&mut self, index: i32) -> BridgeResult<()>;

    /// Pop a value and a key and store `table[key] = value` (no metamethods)
    fn raw_set(&mut self, index: i32) -> BridgeResult<()>;

    /// Pop a value and store `table[n] = value` (no metamethods)
    fn raw_set_index(&mut self, index: i32, n: i64) -> BridgeResult<()>;
}

/// Creation and resolution of value proxies.
pub trait ProxySource {
    /// Capture a stable reference to the value at `index`
    fn capture(&mut self, index: i32) -> BridgeResult<ValueProxy>;

    /// Push the value a proxy refers to
    fn push_proxy(&mut self, proxy: &ValueProxy) -> BridgeResult<()>;
}

/// Full runtime interface used by the conversion core.
pub trait LuaState: StackAccess + StackWrite + ProxySource {}

impl<T: StackAccess + StackWrite + ProxySource + ?Sized> LuaState for T {}
