//! Moonlink - value conversion between an embedded Lua-style runtime and Rust
//!
//! Three components share one set of immutable [`ConversionTables`]:
//!
//! - [`DistanceEvaluator`]: scores a stack value against a candidate host
//!   type so a dispatcher can rank overloads
//! - [`ValueImporter`]: converts a stack value into a [`HostValue`]
//! - [`ValueExporter`]: pushes a [`HostValue`] onto the stack
//!
//! [`DefaultConverter`] bundles them behind the [`Converter`] trait. The
//! [`memory`] module provides an in-memory runtime implementing the stack
//! interfaces, for tests and for exercising bindings without a native runtime.
//!
//! # Example
//!
//! ```ignore
//! use moonlink::memory::{MemoryState, TableRef};
//! use moonlink::{DefaultConverter, HostType};
//!
//! let converter = DefaultConverter::default();
//! let mut state = MemoryState::new();
//! state.push(TableRef::from_sequence([10i64, 20, 30]))?;
//!
//! let array = converter.distance(&state, 1, &HostType::array_of(HostType::I32));
//! assert_eq!(array.get(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod converter;
pub mod distance;
pub mod export;
pub mod import;
pub mod memory;
pub mod registry;

pub use config::{ConfigError, ConfigResult, ConverterConfig, TextEncoding};
pub use converter::DefaultConverter;
pub use distance::DistanceEvaluator;
pub use export::ValueExporter;
pub use import::ValueImporter;
pub use registry::ConversionTables;

pub use moonlink_sdk::{
    BigInt, BigRational, BridgeError, BridgeResult, Converter, Distance, ForeignObject, FromHost,
    HostArray, HostClass, HostType, HostValue, IntoHost, LuaCategory, LuaState, NativeFunction,
    ProxySource, RuntimeId, StackAccess, StackWrite, TableList, TableMap, TypedObject, ValueProxy,
};
