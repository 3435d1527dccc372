//! In-memory runtime state
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ MemoryState  │     │ MemoryState  │   same RuntimeId (threads)
//! │  stack       │     │  stack       │
//! └──────┬───────┘     └──────┬───────┘
//!        │   Arc<Mutex<ReferenceRegistry>>
//!        └──────────┬─────────┘
//!                   ▼
//!        reference -> LuaValue        released by ValueProxy drop
//! ```
//!
//! Tables are `Arc`-shared, so a table pushed onto two states is the same
//! table in both.

use std::sync::{Arc, Weak};

use moonlink_sdk::{
    BridgeError, BridgeResult, HostValue, LuaCategory, NativeFunction, ProxySource, RuntimeId,
    StackAccess, StackWrite, ValueProxy,
};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::table::TableRef;
use super::value::{LuaFunction, LuaValue};

/// Default maximum stack size (in slots)
const DEFAULT_MAX_STACK_SIZE: usize = 1024 * 64;

/// Values kept alive by outstanding proxies
#[derive(Default)]
struct ReferenceRegistry {
    next: u64,
    slots: FxHashMap<u64, LuaValue>,
}

/// Reference runtime implementing the stack interfaces.
pub struct MemoryState {
    /// Owning runtime
    id: RuntimeId,

    /// Stack slots, bottom first
    stack: Vec<LuaValue>,

    /// Maximum stack size (in slots)
    max_size: usize,

    /// Proxy referents, shared by every state of the runtime
    references: Arc<Mutex<ReferenceRegistry>>,
}

impl MemoryState {
    /// Create a state for a fresh runtime
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_STACK_SIZE)
    }

    /// Create a state with a specific maximum stack size
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            id: RuntimeId::new(),
            stack: Vec::with_capacity(64),
            max_size,
            references: Arc::new(Mutex::new(ReferenceRegistry::default())),
        }
    }

    /// Another state of the same runtime, with its own empty stack
    pub fn new_thread(&self) -> Self {
        Self {
            id: self.id,
            stack: Vec::with_capacity(64),
            max_size: self.max_size,
            references: Arc::clone(&self.references),
        }
    }

    /// Number of live proxy references
    pub fn reference_count(&self) -> usize {
        self.references.lock().slots.len()
    }

    // ========================================================================
    // Host-side helpers
    // ========================================================================

    /// Push a runtime value
    pub fn push(&mut self, value: impl Into<LuaValue>) -> BridgeResult<()> {
        if self.stack.len() >= self.max_size {
            return Err(BridgeError::StackOverflow);
        }
        self.stack.push(value.into());
        Ok(())
    }

    /// Push a new empty table and return a handle to it
    pub fn push_new_table(&mut self) -> BridgeResult<TableRef> {
        let table = TableRef::new();
        self.push(table.clone())?;
        Ok(table)
    }

    /// Push a script function placeholder
    pub fn push_script_function(&mut self, name: &str) -> BridgeResult<()> {
        self.push(LuaValue::Function(LuaFunction::script(name)))
    }

    /// Copy of the value at `index`
    pub fn get(&self, index: i32) -> Option<LuaValue> {
        self.value(index).cloned()
    }

    /// Pop the top value
    pub fn pop_value(&mut self) -> Option<LuaValue> {
        self.stack.pop()
    }

    fn slot(&self, index: i32) -> Option<usize> {
        let top = self.stack.len() as i32;
        let absolute = if index < 0 { top + index + 1 } else { index };
        if absolute >= 1 && absolute <= top {
            Some((absolute - 1) as usize)
        } else {
            None
        }
    }

    fn value(&self, index: i32) -> Option<&LuaValue> {
        self.slot(index).map(|slot| &self.stack[slot])
    }

    fn require(&self, index: i32) -> BridgeResult<&LuaValue> {
        self.value(index).ok_or(BridgeError::InvalidIndex(index))
    }

    fn table(&self, index: i32) -> BridgeResult<TableRef> {
        match self.require(index)? {
            LuaValue::Table(table) => Ok(table.clone()),
            other => Err(BridgeError::Runtime(format!(
                "attempt to index a {} value",
                other.category()
            ))),
        }
    }

    fn pop_top(&mut self) -> BridgeResult<LuaValue> {
        self.stack
            .pop()
            .ok_or_else(|| BridgeError::Runtime("stack underflow".to_string()))
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl StackAccess for MemoryState {
    fn runtime_id(&self) -> RuntimeId {
        self.id
    }

    fn top(&self) -> i32 {
        self.stack.len() as i32
    }

    fn category(&self, index: i32) -> Option<LuaCategory> {
        self.value(index).map(LuaValue::category)
    }

    fn to_boolean(&self, index: i32) -> bool {
        self.value(index).is_some_and(LuaValue::truthy)
    }

    fn to_integer(&self, index: i32) -> i64 {
        self.value(index).map_or(0, LuaValue::to_integer)
    }

    fn to_number(&self, index: i32) -> f64 {
        self.value(index).map_or(0.0, LuaValue::to_number)
    }

    fn to_bytes(&self, index: i32) -> Option<Vec<u8>> {
        self.value(index).and_then(LuaValue::to_bytes)
    }

    fn raw_len(&self, index: i32) -> i64 {
        match self.value(index) {
            Some(LuaValue::String(bytes)) => bytes.len() as i64,
            Some(LuaValue::Table(table)) => table.len(),
            _ => 0,
        }
    }

    fn is_native_function(&self, index: i32) -> bool {
        matches!(
            self.value(index),
            Some(LuaValue::Function(LuaFunction::Native(_)))
        )
    }

    fn to_native_function(&self, index: i32) -> Option<NativeFunction> {
        match self.value(index) {
            Some(LuaValue::Function(LuaFunction::Native(function))) => Some(function.clone()),
            _ => None,
        }
    }

    fn to_userdata(&self, index: i32) -> Option<HostValue> {
        match self.value(index) {
            Some(LuaValue::UserData(data)) => Some(HostValue::clone(data)),
            _ => None,
        }
    }

    fn raw_get_index(&mut self, index: i32, n: i64) -> BridgeResult<()> {
        let table = self.table(index)?;
        let value = table.get_value(&LuaValue::Integer(n));
        self.push(value)
    }

    fn raw_get(&mut self, index: i32) -> BridgeResult<()> {
        let table = self.table(index)?;
        let key = self.pop_top()?;
        let value = table.get_value(&key);
        self.push(value)
    }

    fn next(&mut self, index: i32) -> BridgeResult<bool> {
        let table = self.table(index)?;
        let key = self.pop_top()?;
        match table.next(&key)? {
            Some((key, value)) => {
                self.push(key)?;
                self.push(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn pop(&mut self, count: i32) {
        let count = usize::try_from(count).unwrap_or(0).min(self.stack.len());
        self.stack.truncate(self.stack.len() - count);
    }
}

impl StackWrite for MemoryState {
    fn push_nil(&mut self) -> BridgeResult<()> {
        self.push(LuaValue::Nil)
    }

    fn push_boolean(&mut self, value: bool) -> BridgeResult<()> {
        self.push(LuaValue::Boolean(value))
    }

    fn push_integer(&mut self, value: i64) -> BridgeResult<()> {
        self.push(LuaValue::Integer(value))
    }

    fn push_number(&mut self, value: f64) -> BridgeResult<()> {
        self.push(LuaValue::Number(value))
    }

    fn push_bytes(&mut self, value: &[u8]) -> BridgeResult<()> {
        self.push(LuaValue::string(value))
    }

    fn push_native_function(&mut self, function: NativeFunction) -> BridgeResult<()> {
        self.push(LuaValue::Function(LuaFunction::Native(function)))
    }

    fn push_userdata(&mut self, value: HostValue) -> BridgeResult<()> {
        self.push(LuaValue::userdata(value))
    }

    fn push_value(&mut self, index: i32) -> BridgeResult<()> {
        let value = self.require(index)?.clone();
        self.push(value)
    }

    fn raw_set(&mut self, index: i32) -> BridgeResult<()> {
        let table = self.table(index)?;
        let value = self.pop_top()?;
        let key = self.pop_top()?;
        table.set_value(&key, value)
    }

    fn raw_set_index(&mut self, index: i32, n: i64) -> BridgeResult<()> {
        let table = self.table(index)?;
        let value = self.pop_top()?;
        table.set_value(&LuaValue::Integer(n), value)
    }
}

impl ProxySource for MemoryState {
    fn capture(&mut self, index: i32) -> BridgeResult<ValueProxy> {
        let value = self.require(index)?.clone();
        let reference = {
            let mut registry = self.references.lock();
            registry.next += 1;
            let reference = registry.next;
            registry.slots.insert(reference, value);
            reference
        };

        let registry: Weak<Mutex<ReferenceRegistry>> = Arc::downgrade(&self.references);
        Ok(ValueProxy::with_release(self.id, reference, move |reference| {
            if let Some(registry) = registry.upgrade() {
                let released = registry.lock().slots.remove(&reference);
                drop(released);
            }
        }))
    }

    fn push_proxy(&mut self, proxy: &ValueProxy) -> BridgeResult<()> {
        if proxy.runtime() != self.id {
            return Err(BridgeError::CrossRuntimeReference {
                expected: self.id,
                found: proxy.runtime(),
            });
        }
        let value = self
            .references
            .lock()
            .slots
            .get(&proxy.reference())
            .cloned()
            .ok_or(BridgeError::StaleReference(proxy.reference()))?;
        self.push(value)
    }
}
