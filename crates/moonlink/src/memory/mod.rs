//! In-memory reference runtime
//!
//! Implements the stack interfaces over plain Rust data so the converter can
//! be driven without a native runtime: tests, benchmarks, and host-side unit
//! tests of bindings. There is no parser and no interpreter; script functions
//! exist only as named placeholders.

mod state;
mod table;
mod value;

pub use state::MemoryState;
pub use table::TableRef;
pub use value::{LuaFunction, LuaValue};
