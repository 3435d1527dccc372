//! Lazy host views over runtime tables
//!
//! A view holds nothing but a [`ValueProxy`] to the table and the converter
//! that produced it. Every access re-pushes the table, performs raw reads or
//! writes, and restores the stack, so a view always observes the table's
//! current contents and a view over a large table costs nothing to create.
//!
//! Keys and values are converted through [`HostType::Any`] on the way out and
//! through [`Converter::push_host`] on the way in.

use std::fmt;
use std::sync::Arc;

use crate::category::LuaCategory;
use crate::context::LuaState;
use crate::convert::Converter;
use crate::error::{BridgeError, BridgeResult};
use crate::proxy::ValueProxy;
use crate::types::HostType;
use crate::value::HostValue;

/// Run `f` with the proxied table pushed on top of the stack.
///
/// `f` receives the absolute index of the table. Whatever `f` leaves on the
/// stack is popped afterwards, on success and on error alike.
fn with_table<R>(
    proxy: &ValueProxy,
    state: &mut dyn LuaState,
    f: impl FnOnce(&mut dyn LuaState, i32) -> BridgeResult<R>,
) -> BridgeResult<R> {
    proxy.check_owner(state)?;
    let top = state.top();
    state.push_proxy(proxy)?;
    let table = state.top();
    let result = f(&mut *state, table);
    let leftover = state.top() - top;
    if leftover > 0 {
        state.pop(leftover);
    }
    result
}

// ============================================================================
// TableMap
// ============================================================================

/// Associative view over a runtime table.
#[derive(Clone)]
pub struct TableMap {
    proxy: ValueProxy,
    converter: Arc<dyn Converter>,
}

impl TableMap {
    /// Create a view over the table behind `proxy`
    pub fn new(proxy: ValueProxy, converter: Arc<dyn Converter>) -> Self {
        Self { proxy, converter }
    }

    /// Proxy to the underlying table
    pub fn proxy(&self) -> &ValueProxy {
        &self.proxy
    }

    /// Number of entries
    pub fn len(&self, state: &mut dyn LuaState) -> BridgeResult<usize> {
        with_table(&self.proxy, state, |state, table| {
            let mut count = 0;
            state.push_nil()?;
            while state.next(table)? {
                count += 1;
                state.pop(1);
            }
            Ok(count)
        })
    }

    /// Check if the table has no entries
    pub fn is_empty(&self, state: &mut dyn LuaState) -> BridgeResult<bool> {
        with_table(&self.proxy, state, |state, table| {
            state.push_nil()?;
            Ok(!state.next(table)?)
        })
    }

    /// Whether `key` maps to a non-nil value
    pub fn contains_key(&self, state: &mut dyn LuaState, key: &HostValue) -> BridgeResult<bool> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            converter.push_host(state, key)?;
            state.raw_get(table)?;
            Ok(!matches!(state.category(-1), None | Some(LuaCategory::Nil)))
        })
    }

    /// Value stored under `key`, `Null` if absent
    pub fn get(&self, state: &mut dyn LuaState, key: &HostValue) -> BridgeResult<HostValue> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            converter.push_host(state, key)?;
            state.raw_get(table)?;
            converter.to_host(state, -1, &HostType::Any)
        })
    }

    /// Store `value` under `key` and return the previous value.
    ///
    /// Storing `Null` removes the key.
    pub fn insert(
        &self,
        state: &mut dyn LuaState,
        key: &HostValue,
        value: &HostValue,
    ) -> BridgeResult<HostValue> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            converter.push_host(state, key)?;
            state.raw_get(table)?;
            let previous = converter.to_host(state, -1, &HostType::Any)?;
            state.pop(1);

            converter.push_host(state, key)?;
            converter.push_host(state, value)?;
            state.raw_set(table)?;
            Ok(previous)
        })
    }

    /// Remove `key` and return its previous value
    pub fn remove(&self, state: &mut dyn LuaState, key: &HostValue) -> BridgeResult<HostValue> {
        self.insert(state, key, &HostValue::Null)
    }

    /// Remove every entry
    pub fn clear(&self, state: &mut dyn LuaState) -> BridgeResult<()> {
        with_table(&self.proxy, state, |state, table| {
            let mut keys = Vec::new();
            state.push_nil()?;
            while state.next(table)? {
                keys.push(state.capture(-2)?);
                state.pop(1);
            }
            for key in &keys {
                state.push_proxy(key)?;
                state.push_nil()?;
                state.raw_set(table)?;
            }
            Ok(())
        })
    }

    /// Lazy iterator over `(key, value)` entries
    pub fn iter<'a>(&'a self, state: &'a mut dyn LuaState) -> TableMapIter<'a> {
        TableMapIter {
            map: self,
            state,
            key: None,
            done: false,
        }
    }
}

impl PartialEq for TableMap {
    fn eq(&self, other: &Self) -> bool {
        self.proxy == other.proxy
    }
}

impl fmt::Debug for TableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TableMap").field(&self.proxy).finish()
    }
}

/// Entry iterator of a [`TableMap`].
///
/// Each step resumes the runtime's traversal from the previous key, so
/// entries added or removed while iterating follow the runtime's `next`
/// rules.
pub struct TableMapIter<'a> {
    map: &'a TableMap,
    state: &'a mut dyn LuaState,
    key: Option<ValueProxy>,
    done: bool,
}

impl Iterator for TableMapIter<'_> {
    type Item = BridgeResult<(HostValue, HostValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let previous = self.key.take();
        let converter = &*self.map.converter;
        let step = with_table(&self.map.proxy, &mut *self.state, |state, table| {
            match &previous {
                Some(key) => state.push_proxy(key)?,
                None => state.push_nil()?,
            }
            if !state.next(table)? {
                return Ok(None);
            }
            let cursor = state.capture(-2)?;
            let key = converter.to_host(state, -2, &HostType::Any)?;
            let value = converter.to_host(state, -1, &HostType::Any)?;
            Ok(Some((cursor, key, value)))
        });

        match step {
            Ok(Some((cursor, key, value))) => {
                self.key = Some(cursor);
                Some(Ok((key, value)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// ============================================================================
// TableList
// ============================================================================

/// Sequential view over a runtime table.
///
/// Host positions are zero-based; position `i` is table key `i + 1`. The
/// length is the table's border as reported by [`raw_len`](crate::StackAccess::raw_len).
#[derive(Clone)]
pub struct TableList {
    proxy: ValueProxy,
    converter: Arc<dyn Converter>,
}

fn border(state: &dyn LuaState, table: i32) -> usize {
    usize::try_from(state.raw_len(table)).unwrap_or(0)
}

fn check_bounds(index: usize, len: usize) -> BridgeResult<()> {
    if index >= len {
        return Err(BridgeError::IndexOutOfBounds { index, len });
    }
    Ok(())
}

fn slot(index: usize) -> i64 {
    index as i64 + 1
}

impl TableList {
    /// Create a view over the table behind `proxy`
    pub fn new(proxy: ValueProxy, converter: Arc<dyn Converter>) -> Self {
        Self { proxy, converter }
    }

    /// Proxy to the underlying table
    pub fn proxy(&self) -> &ValueProxy {
        &self.proxy
    }

    /// Current length
    pub fn len(&self, state: &mut dyn LuaState) -> BridgeResult<usize> {
        with_table(&self.proxy, state, |state, table| Ok(border(state, table)))
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self, state: &mut dyn LuaState) -> BridgeResult<bool> {
        Ok(self.len(state)? == 0)
    }

    /// Element at `index`
    pub fn get(&self, state: &mut dyn LuaState, index: usize) -> BridgeResult<HostValue> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            check_bounds(index, border(state, table))?;
            state.raw_get_index(table, slot(index))?;
            converter.to_host(state, -1, &HostType::Any)
        })
    }

    /// Replace the element at `index` and return the previous one
    pub fn set(
        &self,
        state: &mut dyn LuaState,
        index: usize,
        value: &HostValue,
    ) -> BridgeResult<HostValue> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            check_bounds(index, border(state, table))?;
            state.raw_get_index(table, slot(index))?;
            let previous = converter.to_host(state, -1, &HostType::Any)?;
            state.pop(1);

            converter.push_host(state, value)?;
            state.raw_set_index(table, slot(index))?;
            Ok(previous)
        })
    }

    /// Append `value`
    pub fn push(&self, state: &mut dyn LuaState, value: &HostValue) -> BridgeResult<()> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            let len = border(state, table);
            converter.push_host(state, value)?;
            state.raw_set_index(table, slot(len))
        })
    }

    /// Insert `value` at `index`, shifting later elements up
    pub fn insert(
        &self,
        state: &mut dyn LuaState,
        index: usize,
        value: &HostValue,
    ) -> BridgeResult<()> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            let len = border(state, table);
            if index > len {
                return Err(BridgeError::IndexOutOfBounds { index, len });
            }
            for i in (index..len).rev() {
                state.raw_get_index(table, slot(i))?;
                state.raw_set_index(table, slot(i + 1))?;
            }
            converter.push_host(state, value)?;
            state.raw_set_index(table, slot(index))
        })
    }

    /// Remove the element at `index`, shifting later elements down
    pub fn remove(&self, state: &mut dyn LuaState, index: usize) -> BridgeResult<HostValue> {
        let converter = &*self.converter;
        with_table(&self.proxy, state, |state, table| {
            let len = border(state, table);
            check_bounds(index, len)?;
            state.raw_get_index(table, slot(index))?;
            let previous = converter.to_host(state, -1, &HostType::Any)?;
            state.pop(1);

            for i in index + 1..len {
                state.raw_get_index(table, slot(i))?;
                state.raw_set_index(table, slot(i - 1))?;
            }
            state.push_nil()?;
            state.raw_set_index(table, slot(len - 1))?;
            Ok(previous)
        })
    }

    /// Lazy iterator over the elements in order
    pub fn iter<'a>(&'a self, state: &'a mut dyn LuaState) -> TableListIter<'a> {
        TableListIter {
            list: self,
            state,
            index: 0,
            done: false,
        }
    }
}

impl PartialEq for TableList {
    fn eq(&self, other: &Self) -> bool {
        self.proxy == other.proxy
    }
}

impl fmt::Debug for TableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TableList").field(&self.proxy).finish()
    }
}

/// Element iterator of a [`TableList`].
///
/// The length is re-read on every step.
pub struct TableListIter<'a> {
    list: &'a TableList,
    state: &'a mut dyn LuaState,
    index: usize,
    done: bool,
}

impl Iterator for TableListIter<'_> {
    type Item = BridgeResult<HostValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let index = self.index;
        let converter = &*self.list.converter;
        let step = with_table(&self.list.proxy, &mut *self.state, |state, table| {
            if index >= border(state, table) {
                return Ok(None);
            }
            state.raw_get_index(table, slot(index))?;
            converter.to_host(state, -1, &HostType::Any).map(Some)
        });

        match step {
            Ok(Some(value)) => {
                self.index += 1;
                Some(Ok(value))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
