//! Runtime values of the reference runtime

use std::fmt;
use std::sync::Arc;

use moonlink_sdk::{HostValue, LuaCategory, NativeFunction};

use super::table::TableRef;

/// Function value
#[derive(Clone)]
pub enum LuaFunction {
    /// Host function pushed through the bridge
    Native(NativeFunction),
    /// Stand-in for a function defined in script code
    Script(Arc<str>),
}

impl LuaFunction {
    /// Create a script function placeholder
    pub fn script(name: impl Into<Arc<str>>) -> Self {
        LuaFunction::Script(name.into())
    }

    fn identity(&self) -> usize {
        match self {
            LuaFunction::Native(function) => function.id(),
            LuaFunction::Script(name) => Arc::as_ptr(name) as *const u8 as usize,
        }
    }
}

impl PartialEq for LuaFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaFunction::Native(a), LuaFunction::Native(b)) => a == b,
            (LuaFunction::Script(a), LuaFunction::Script(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for LuaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaFunction::Native(function) => write!(f, "function: builtin {}", function.name()),
            LuaFunction::Script(name) => write!(f, "function: {} @{:#x}", name, self.identity()),
        }
    }
}

/// A value held in a stack slot, a table or the reference registry.
#[derive(Clone, Default)]
pub enum LuaValue {
    /// `nil`
    #[default]
    Nil,
    /// Boolean
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Float number
    Number(f64),
    /// Immutable byte string
    String(Arc<[u8]>),
    /// Shared table
    Table(TableRef),
    /// Function
    Function(LuaFunction),
    /// Host payload
    UserData(Arc<HostValue>),
}

impl LuaValue {
    /// Byte string from text
    pub fn string(text: impl AsRef<[u8]>) -> Self {
        LuaValue::String(Arc::from(text.as_ref()))
    }

    /// Wrap a host value as userdata
    pub fn userdata(value: HostValue) -> Self {
        LuaValue::UserData(Arc::new(value))
    }

    /// Category of the value
    pub fn category(&self) -> LuaCategory {
        match self {
            LuaValue::Nil => LuaCategory::Nil,
            LuaValue::Boolean(_) => LuaCategory::Boolean,
            LuaValue::Integer(_) | LuaValue::Number(_) => LuaCategory::Number,
            LuaValue::String(_) => LuaCategory::String,
            LuaValue::Table(_) => LuaCategory::Table,
            LuaValue::Function(_) => LuaCategory::Function,
            LuaValue::UserData(_) => LuaCategory::UserData,
        }
    }

    /// Check if this is `nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    /// Truthiness: everything except `nil` and `false`
    pub fn truthy(&self) -> bool {
        !matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    /// Integer value; floats truncate toward zero, numeric strings parse
    pub fn to_integer(&self) -> i64 {
        match self {
            LuaValue::Integer(i) => *i,
            LuaValue::Number(n) => *n as i64,
            LuaValue::String(bytes) => match parse_number(bytes) {
                Some(Numeric::Int(i)) => i,
                Some(Numeric::Float(f)) => f as i64,
                None => 0,
            },
            _ => 0,
        }
    }

    /// Float value; numeric strings parse
    pub fn to_number(&self) -> f64 {
        match self {
            LuaValue::Integer(i) => *i as f64,
            LuaValue::Number(n) => *n,
            LuaValue::String(bytes) => match parse_number(bytes) {
                Some(Numeric::Int(i)) => i as f64,
                Some(Numeric::Float(f)) => f,
                None => 0.0,
            },
            _ => 0.0,
        }
    }

    /// String bytes, or the textual form of a number
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            LuaValue::String(bytes) => Some(bytes.to_vec()),
            LuaValue::Integer(i) => Some(i.to_string().into_bytes()),
            LuaValue::Number(n) => Some(format_number(*n).into_bytes()),
            _ => None,
        }
    }

    /// Identity of reference values (tables, functions, userdata)
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            LuaValue::Table(table) => Some(table.identity()),
            LuaValue::Function(function) => Some(function.identity()),
            LuaValue::UserData(data) => Some(Arc::as_ptr(data) as usize),
            _ => None,
        }
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Number(a), LuaValue::Number(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Number(b)) | (LuaValue::Number(b), LuaValue::Integer(a)) => {
                *a as f64 == *b
            }
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Function(a), LuaValue::Function(b)) => a == b,
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => f.write_str("nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Integer(i) => write!(f, "{}", i),
            LuaValue::Number(n) => write!(f, "{:?}", n),
            LuaValue::String(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            LuaValue::Table(table) => write!(f, "{:?}", table),
            LuaValue::Function(function) => write!(f, "{:?}", function),
            LuaValue::UserData(data) => write!(f, "userdata: {:?}", data),
        }
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<i32> for LuaValue {
    fn from(i: i32) -> Self {
        LuaValue::Integer(i64::from(i))
    }
}

impl From<f64> for LuaValue {
    fn from(n: f64) -> Self {
        LuaValue::Number(n)
    }
}

impl From<&str> for LuaValue {
    fn from(s: &str) -> Self {
        LuaValue::string(s)
    }
}

impl From<&[u8]> for LuaValue {
    fn from(bytes: &[u8]) -> Self {
        LuaValue::string(bytes)
    }
}

impl From<TableRef> for LuaValue {
    fn from(table: TableRef) -> Self {
        LuaValue::Table(table)
    }
}

impl From<NativeFunction> for LuaValue {
    fn from(function: NativeFunction) -> Self {
        LuaValue::Function(LuaFunction::Native(function))
    }
}

// ============================================================================
// Number to string coercion
// ============================================================================

/// Significant digits in the textual form of a float
const FLOAT_DIGITS: i32 = 14;

/// Text of a float as the runtime prints it: `%.14g`, with `.0` appended when
/// the result would otherwise read as an integer.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let scientific = format!("{:.*e}", (FLOAT_DIGITS - 1) as usize, n);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut text = if exponent < -4 || exponent >= FLOAT_DIGITS {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let fixed = format!("{:.*}", (FLOAT_DIGITS - 1 - exponent) as usize, n);
        trim_fraction(&fixed).to_string()
    };
    if text.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        text.push_str(".0");
    }
    text
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

// ============================================================================
// String to number coercion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Numeric {
    Int(i64),
    Float(f64),
}

/// Parse a numeric string the way the runtime coerces strings in arithmetic.
///
/// Accepts surrounding whitespace, decimal and `0x` hexadecimal integers and
/// decimal floats. `inf` and `nan` spellings are rejected.
pub(crate) fn parse_number(bytes: &[u8]) -> Option<Numeric> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    let (negative, digits) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let value = u64::from_str_radix(hex, 16).ok()? as i64;
        return Some(Numeric::Int(if negative { value.wrapping_neg() } else { value }));
    }

    if let Ok(i) = text.parse::<i64>() {
        return Some(Numeric::Int(i));
    }

    let lower = digits.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return None;
    }
    text.parse::<f64>().ok().map(Numeric::Float)
}
