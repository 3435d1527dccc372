//! Host values
//!
//! [`HostValue`] is what an import produces and what an export consumes.
//! Scalars are stored inline; tables come back as lazy views; anything the
//! runtime cannot introspect travels as a [`ForeignObject`] or a
//! [`TypedObject`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::context::LuaState;
use crate::error::BridgeResult;
use crate::proxy::ValueProxy;
use crate::tables::{TableList, TableMap};
use crate::types::{HostClass, HostType};

// ============================================================================
// Native functions
// ============================================================================

/// Native function signature.
///
/// Receives the calling state with its arguments on the stack and returns
/// the number of results it pushed.
pub type NativeFn = Arc<dyn Fn(&mut dyn LuaState) -> BridgeResult<i32> + Send + Sync>;

/// Host function exposed to the runtime as a callable value.
///
/// Identity is by function pointer: clones compare equal, two separately
/// created functions never do.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: NativeFn,
}

impl NativeFunction {
    /// Wrap a closure as a native function
    pub fn new(
        name: impl Into<Arc<str>>,
        func: impl Fn(&mut dyn LuaState) -> BridgeResult<i32> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with the given state
    pub fn call(&self, state: &mut dyn LuaState) -> BridgeResult<i32> {
        (self.func)(state)
    }

    /// Address identifying the underlying closure; equal for clones
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.func) as *const () as usize
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

// ============================================================================
// Foreign objects
// ============================================================================

/// Arbitrary host object tagged with its class.
#[derive(Clone)]
pub struct ForeignObject {
    class: HostClass,
    value: Arc<dyn Any + Send + Sync>,
}

impl ForeignObject {
    /// Wrap `value` as an instance of `class`
    pub fn new<T: Any + Send + Sync>(class: HostClass, value: T) -> Self {
        Self {
            class,
            value: Arc::new(value),
        }
    }

    /// Class of the object
    pub fn class(&self) -> &HostClass {
        &self.class
    }

    /// Borrow the object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &ForeignObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl PartialEq for ForeignObject {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.ptr_eq(other)
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignObject({})", self.class.name())
    }
}

// ============================================================================
// Typed foreign object wrapper
// ============================================================================

/// Userdata payload carrying a declared host type.
///
/// A `Strong` wrapper matches targets its own type ([`HostType::TypedObject`])
/// is assignable to, and is then handed over whole. Otherwise, and always for
/// `Weak`, only the declared type is checked and the payload is handed over.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedObject {
    /// Wrapper itself is a conversion candidate
    Strong {
        /// Declared type of the payload
        declared: HostType,
        /// Wrapped value
        payload: Box<HostValue>,
    },
    /// Only the payload is a conversion candidate
    Weak {
        /// Declared type of the payload
        declared: HostType,
        /// Wrapped value
        payload: Box<HostValue>,
    },
}

impl TypedObject {
    /// Create a strong wrapper
    pub fn strong(declared: HostType, payload: HostValue) -> Self {
        TypedObject::Strong {
            declared,
            payload: Box::new(payload),
        }
    }

    /// Create a weak wrapper
    pub fn weak(declared: HostType, payload: HostValue) -> Self {
        TypedObject::Weak {
            declared,
            payload: Box::new(payload),
        }
    }

    /// Whether this is a strong wrapper
    pub fn is_strong(&self) -> bool {
        matches!(self, TypedObject::Strong { .. })
    }

    /// Declared type of the payload
    pub fn declared_type(&self) -> &HostType {
        match self {
            TypedObject::Strong { declared, .. } | TypedObject::Weak { declared, .. } => declared,
        }
    }

    /// Wrapped value
    pub fn payload(&self) -> &HostValue {
        match self {
            TypedObject::Strong { payload, .. } | TypedObject::Weak { payload, .. } => payload,
        }
    }

    /// Unwrap the payload
    pub fn into_payload(self) -> HostValue {
        match self {
            TypedObject::Strong { payload, .. } | TypedObject::Weak { payload, .. } => *payload,
        }
    }
}

// ============================================================================
// Arrays
// ============================================================================

/// Fixed-length host array with a component type.
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    component: HostType,
    elements: Vec<HostValue>,
}

impl HostArray {
    /// Array of `len` nulls
    pub fn new(component: HostType, len: usize) -> Self {
        Self {
            component,
            elements: vec![HostValue::Null; len],
        }
    }

    /// Array from existing elements
    pub fn from_elements(component: HostType, elements: Vec<HostValue>) -> Self {
        Self {
            component,
            elements,
        }
    }

    /// Component type
    pub fn component(&self) -> &HostType {
        &self.component
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the array is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&HostValue> {
        self.elements.get(index)
    }

    /// Replace the element at `index`; returns `false` when out of bounds
    pub fn set(&mut self, index: usize, value: HostValue) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Elements in order
    pub fn elements(&self) -> &[HostValue] {
        &self.elements
    }

    /// Take the elements
    pub fn into_elements(self) -> Vec<HostValue> {
        self.elements
    }
}

// ============================================================================
// HostValue
// ============================================================================

/// A value on the host side of the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HostValue {
    /// Absent value
    #[default]
    Null,
    /// `bool`
    Bool(bool),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// Arbitrary-precision integer
    BigInt(BigInt),
    /// Arbitrary-precision decimal, held exactly
    Decimal(BigRational),
    /// Unicode scalar value
    Char(char),
    /// Text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Host array
    Array(HostArray),
    /// Associative view over a runtime table
    Map(TableMap),
    /// Sequential view over a runtime table
    List(TableList),
    /// Native callable
    NativeFunction(NativeFunction),
    /// Reference to a runtime value
    Proxy(ValueProxy),
    /// Typed foreign object wrapper
    Typed(TypedObject),
    /// Opaque host object
    Object(ForeignObject),
}

impl HostValue {
    /// Wrap a host object
    pub fn object<T: Any + Send + Sync>(class: HostClass, value: T) -> Self {
        HostValue::Object(ForeignObject::new(class, value))
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Concrete runtime type of the value; `Any` for `Null`
    pub fn host_type(&self) -> HostType {
        match self {
            HostValue::Null => HostType::Any,
            HostValue::Bool(_) => HostType::Bool,
            HostValue::I8(_) => HostType::I8,
            HostValue::I16(_) => HostType::I16,
            HostValue::I32(_) => HostType::I32,
            HostValue::I64(_) => HostType::I64,
            HostValue::U8(_) => HostType::U8,
            HostValue::U16(_) => HostType::U16,
            HostValue::U32(_) => HostType::U32,
            HostValue::U64(_) => HostType::U64,
            HostValue::F32(_) => HostType::F32,
            HostValue::F64(_) => HostType::F64,
            HostValue::BigInt(_) => HostType::BigInt,
            HostValue::Decimal(_) => HostType::Decimal,
            HostValue::Char(_) => HostType::Char,
            HostValue::Text(_) => HostType::Text,
            HostValue::Bytes(_) => HostType::Bytes,
            HostValue::Array(array) => HostType::array_of(array.component().clone()),
            HostValue::Map(_) => HostType::Map,
            HostValue::List(_) => HostType::List,
            HostValue::NativeFunction(_) => HostType::NativeFunction,
            HostValue::Proxy(_) => HostType::ValueProxy,
            HostValue::Typed(_) => HostType::TypedObject,
            HostValue::Object(object) => HostType::Class(object.class().clone()),
        }
    }

    /// Proxy behind a proxy-like value (`Proxy`, `Map`, `List`)
    pub fn as_proxy(&self) -> Option<&ValueProxy> {
        match self {
            HostValue::Proxy(proxy) => Some(proxy),
            HostValue::Map(map) => Some(map.proxy()),
            HostValue::List(list) => Some(list.proxy()),
            _ => None,
        }
    }

    /// Text content, if this is `Text`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        use num_traits::ToPrimitive;

        match self {
            HostValue::I8(v) => Some(f64::from(*v)),
            HostValue::I16(v) => Some(f64::from(*v)),
            HostValue::I32(v) => Some(f64::from(*v)),
            HostValue::I64(v) => Some(*v as f64),
            HostValue::U8(v) => Some(f64::from(*v)),
            HostValue::U16(v) => Some(f64::from(*v)),
            HostValue::U32(v) => Some(f64::from(*v)),
            HostValue::U64(v) => Some(*v as f64),
            HostValue::F32(v) => Some(f64::from(*v)),
            HostValue::F64(v) => Some(*v),
            HostValue::BigInt(v) => v.to_f64(),
            HostValue::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }
}
