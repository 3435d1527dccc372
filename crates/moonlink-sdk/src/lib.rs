//! Moonlink SDK - host value model and runtime stack interfaces
//!
//! This crate holds the types shared by the conversion core and by whatever
//! runtime bridge embeds it:
//!
//! - [`LuaCategory`]: the coarse tag of a value on the runtime stack
//! - [`HostType`] / [`HostValue`]: the host side of every conversion
//! - [`Distance`]: the overload ranking score
//! - [`LuaState`]: the stack, write and proxy interfaces a runtime provides
//! - [`Converter`]: the conversion surface consumed by call dispatchers
//! - [`TableMap`] / [`TableList`]: lazy host views over runtime tables
//!
//! The conversion logic itself lives in the `moonlink` crate.
//!
//! # Example
//!
//! ```ignore
//! use moonlink_sdk::{Converter, HostType, LuaState};
//!
//! fn pick(converter: &dyn Converter, state: &dyn LuaState, candidates: &[HostType]) -> Option<usize> {
//!     candidates
//!         .iter()
//!         .map(|ty| converter.type_distance(state, 1, ty))
//!         .enumerate()
//!         .filter(|(_, d)| d.is_compatible())
//!         .min_by_key(|(_, d)| *d)
//!         .map(|(i, _)| i)
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod category;
pub mod context;
pub mod convert;
pub mod distance;
pub mod error;
pub mod proxy;
pub mod tables;
pub mod types;
pub mod value;

pub use category::LuaCategory;
pub use context::{LuaState, ProxySource, StackAccess, StackWrite};
pub use convert::{Converter, FromHost, IntoHost};
pub use distance::Distance;
pub use error::{BridgeError, BridgeResult};
pub use proxy::{RuntimeId, ValueProxy};
pub use tables::{TableList, TableListIter, TableMap, TableMapIter};
pub use types::{ClassId, HostClass, HostType};
pub use value::{ForeignObject, HostArray, HostValue, NativeFn, NativeFunction, TypedObject};

pub use num_bigint::BigInt;
pub use num_rational::BigRational;
