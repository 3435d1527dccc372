//! Host type model
//!
//! [`HostType`] is the closed set of targets a stack value can be converted
//! into. Conversions are selected by matching on it; anything the host
//! defines itself is described by a [`HostClass`] and checked through
//! [`HostType::is_assignable_from`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Host classes
// ============================================================================

/// Unique identifier of a host class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ClassId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ClassInfo {
    id: ClassId,
    name: String,
    supertypes: Vec<HostClass>,
}

/// A host-defined class with declared supertypes.
///
/// Identity is by [`ClassId`]: two classes created with the same name are
/// still different classes.
#[derive(Debug, Clone)]
pub struct HostClass(Arc<ClassInfo>);

impl HostClass {
    /// Create a class with no supertypes
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_supertypes(name, Vec::new())
    }

    /// Create a class extending or implementing `supertypes`
    pub fn with_supertypes(name: impl Into<String>, supertypes: Vec<HostClass>) -> Self {
        HostClass(Arc::new(ClassInfo {
            id: ClassId::next(),
            name: name.into(),
            supertypes,
        }))
    }

    /// Class ID
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Directly declared supertypes
    pub fn supertypes(&self) -> &[HostClass] {
        &self.0.supertypes
    }

    /// Whether `self` is `other` or transitively extends it
    pub fn is_subclass_of(&self, other: &HostClass) -> bool {
        if self == other {
            return true;
        }
        self.0
            .supertypes
            .iter()
            .any(|parent| parent.is_subclass_of(other))
    }
}

impl PartialEq for HostClass {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for HostClass {}

impl Hash for HostClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

// ============================================================================
// Host types
// ============================================================================

/// Target type of a conversion from the runtime stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    /// "No value"; never a valid conversion target
    Void,
    /// Keep the runtime value as-is, behind a [`ValueProxy`](crate::ValueProxy)
    ValueProxy,
    /// Generic top type
    Any,
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// Arbitrary-precision integer
    BigInt,
    /// Arbitrary-precision decimal
    Decimal,
    /// Unicode scalar value
    Char,
    /// Text
    Text,
    /// Raw byte sequence
    Bytes,
    /// Generic associative container
    Map,
    /// Generic sequential container
    List,
    /// Fixed-length array of a component type
    Array(Box<HostType>),
    /// Host function callable from the runtime
    NativeFunction,
    /// The typed foreign object wrapper itself
    TypedObject,
    /// Host-defined class
    Class(HostClass),
}

impl HostType {
    /// Array of `component`
    pub fn array_of(component: HostType) -> Self {
        HostType::Array(Box::new(component))
    }

    /// Component type if this is an array type
    pub fn component(&self) -> Option<&HostType> {
        match self {
            HostType::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Numeric types, including `Char`
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            HostType::I8
                | HostType::I16
                | HostType::I32
                | HostType::I64
                | HostType::U8
                | HostType::U16
                | HostType::U32
                | HostType::U64
                | HostType::F32
                | HostType::F64
                | HostType::BigInt
                | HostType::Decimal
                | HostType::Char
        )
    }

    /// Fixed-size value types (`bool`, fixed-width numbers, `char`)
    pub fn is_primitive(&self) -> bool {
        match self {
            HostType::Bool => true,
            HostType::BigInt | HostType::Decimal => false,
            other => other.is_numeric(),
        }
    }

    /// Whether a value whose concrete type is `actual` can be used where
    /// `self` is expected.
    pub fn is_assignable_from(&self, actual: &HostType) -> bool {
        match (self, actual) {
            (HostType::Void, _) | (_, HostType::Void) => false,
            (target, actual) if target == actual => true,
            (HostType::Any, _) => true,
            (HostType::Class(target), HostType::Class(class)) => class.is_subclass_of(target),
            (HostType::Array(target), HostType::Array(component)) => {
                !target.is_primitive()
                    && !component.is_primitive()
                    && target.is_assignable_from(component)
            }
            _ => false,
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Void => f.write_str("void"),
            HostType::ValueProxy => f.write_str("ValueProxy"),
            HostType::Any => f.write_str("Any"),
            HostType::Bool => f.write_str("bool"),
            HostType::I8 => f.write_str("i8"),
            HostType::I16 => f.write_str("i16"),
            HostType::I32 => f.write_str("i32"),
            HostType::I64 => f.write_str("i64"),
            HostType::U8 => f.write_str("u8"),
            HostType::U16 => f.write_str("u16"),
            HostType::U32 => f.write_str("u32"),
            HostType::U64 => f.write_str("u64"),
            HostType::F32 => f.write_str("f32"),
            HostType::F64 => f.write_str("f64"),
            HostType::BigInt => f.write_str("BigInt"),
            HostType::Decimal => f.write_str("Decimal"),
            HostType::Char => f.write_str("char"),
            HostType::Text => f.write_str("String"),
            HostType::Bytes => f.write_str("Bytes"),
            HostType::Map => f.write_str("Map"),
            HostType::List => f.write_str("List"),
            HostType::Array(component) => write!(f, "[{}]", component),
            HostType::NativeFunction => f.write_str("NativeFunction"),
            HostType::TypedObject => f.write_str("TypedObject"),
            HostType::Class(class) => f.write_str(class.name()),
        }
    }
}
