//! Shared tables
//!
//! Entries keep insertion order so `next` traversal is deterministic. Storing
//! `nil` leaves a dead entry behind instead of removing it, which keeps an
//! in-progress traversal valid when the caller clears fields as it goes.

use std::fmt;
use std::sync::Arc;

use moonlink_sdk::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::value::LuaValue;

/// Hashable identity of a table key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyId {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(Arc<[u8]>),
    Reference(usize),
}

/// Normalize a key: integral floats address the same slot as integers
fn normalize(key: &LuaValue) -> BridgeResult<(KeyId, LuaValue)> {
    match key {
        LuaValue::Nil => Err(BridgeError::Runtime("table index is nil".to_string())),
        LuaValue::Number(n) if n.is_nan() => {
            Err(BridgeError::Runtime("table index is NaN".to_string()))
        }
        LuaValue::Number(n) if n.fract() == 0.0 && *n >= -(2f64.powi(63)) && *n < 2f64.powi(63) => {
            let i = *n as i64;
            Ok((KeyId::Integer(i), LuaValue::Integer(i)))
        }
        LuaValue::Number(n) => Ok((KeyId::Float(n.to_bits()), key.clone())),
        LuaValue::Boolean(b) => Ok((KeyId::Boolean(*b), key.clone())),
        LuaValue::Integer(i) => Ok((KeyId::Integer(*i), key.clone())),
        LuaValue::String(bytes) => Ok((KeyId::String(Arc::clone(bytes)), key.clone())),
        other => match other.identity() {
            Some(id) => Ok((KeyId::Reference(id), key.clone())),
            None => Err(BridgeError::Runtime("invalid table key".to_string())),
        },
    }
}

/// Dead entries tolerated before an insertion compacts the table
const MIN_DEAD_TO_COMPACT: usize = 16;

/// Table contents
#[derive(Default)]
struct LuaTable {
    entries: Vec<(LuaValue, LuaValue)>,
    index: FxHashMap<KeyId, usize>,
    /// Entries whose value is `nil`
    dead: usize,
    /// `t[1..=border]` are all non-nil and `t[border + 1]` is nil
    border: i64,
}

impl LuaTable {
    fn get(&self, key: &LuaValue) -> LuaValue {
        match normalize(key) {
            Ok((id, _)) => self.get_id(&id),
            Err(_) => LuaValue::Nil,
        }
    }

    fn get_id(&self, id: &KeyId) -> LuaValue {
        self.index
            .get(id)
            .map(|&slot| self.entries[slot].1.clone())
            .unwrap_or_default()
    }

    fn set(&mut self, key: &LuaValue, value: LuaValue) -> BridgeResult<()> {
        let (id, key) = normalize(key)?;
        let clearing = value.is_nil();
        match self.index.get(&id) {
            Some(&slot) => {
                let was_dead = self.entries[slot].1.is_nil();
                self.entries[slot].1 = value;
                match (was_dead, clearing) {
                    (false, true) => self.dead += 1,
                    (true, false) => self.dead -= 1,
                    _ => {}
                }
            }
            None if clearing => {}
            None => {
                // New keys may not be added mid-traversal, so slots can move here
                if self.dead >= MIN_DEAD_TO_COMPACT && self.dead * 2 > self.entries.len() {
                    self.compact();
                }
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
        if let KeyId::Integer(n) = id {
            self.update_border(n, clearing);
        }
        Ok(())
    }

    fn update_border(&mut self, n: i64, cleared: bool) {
        if cleared {
            if n >= 1 && n <= self.border {
                self.border = n - 1;
            }
        } else if n == self.border + 1 {
            self.extend_border();
        }
    }

    fn extend_border(&mut self) {
        while !self.get_id(&KeyId::Integer(self.border + 1)).is_nil() {
            self.border += 1;
        }
    }

    /// Drop dead entries and reindex the live ones
    fn compact(&mut self) {
        self.entries.retain(|(_, value)| !value.is_nil());
        self.index.clear();
        for (slot, (key, _)) in self.entries.iter().enumerate() {
            if let Ok((id, _)) = normalize(key) {
                self.index.insert(id, slot);
            }
        }
        self.dead = 0;
    }

    fn next(&self, key: &LuaValue) -> BridgeResult<Option<(LuaValue, LuaValue)>> {
        let start = if key.is_nil() {
            0
        } else {
            let (id, _) = normalize(key)?;
            match self.index.get(&id) {
                Some(&slot) => slot + 1,
                None => return Err(BridgeError::Runtime("invalid key to 'next'".to_string())),
            }
        };
        Ok(self.entries[start..]
            .iter()
            .find(|(_, value)| !value.is_nil())
            .cloned())
    }
}

/// Shared handle to a table.
///
/// Clones refer to the same table; equality is identity.
#[derive(Clone, Default)]
pub struct TableRef(Arc<Mutex<LuaTable>>);

impl TableRef {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence `{v1, v2, ...}`
    pub fn from_sequence<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<LuaValue>,
    {
        let table = Self::new();
        {
            let mut inner = table.0.lock();
            for (i, value) in values.into_iter().enumerate() {
                let n = i as i64 + 1;
                let value = value.into();
                if !value.is_nil() {
                    let slot = inner.entries.len();
                    inner.index.insert(KeyId::Integer(n), slot);
                    inner.entries.push((LuaValue::Integer(n), value));
                }
            }
            inner.extend_border();
        }
        table
    }

    /// Raw read
    pub fn get(&self, key: impl Into<LuaValue>) -> LuaValue {
        self.0.lock().get(&key.into())
    }

    /// Raw write; storing `nil` removes the key
    pub fn set(&self, key: impl Into<LuaValue>, value: impl Into<LuaValue>) -> BridgeResult<()> {
        self.set_value(&key.into(), value.into())
    }

    pub(crate) fn get_value(&self, key: &LuaValue) -> LuaValue {
        self.0.lock().get(key)
    }

    pub(crate) fn set_value(&self, key: &LuaValue, value: LuaValue) -> BridgeResult<()> {
        let previous = {
            let mut inner = self.0.lock();
            let previous = inner.get(key);
            inner.set(key, value)?;
            previous
        };
        // Old value may own proxies; release them unlocked
        drop(previous);
        Ok(())
    }

    /// Next entry after `key` (`nil` starts the traversal)
    pub fn next(&self, key: &LuaValue) -> BridgeResult<Option<(LuaValue, LuaValue)>> {
        self.0.lock().next(key)
    }

    /// Border: `n` such that `t[n]` is non-nil and `t[n + 1]` is nil
    pub fn len(&self) -> i64 {
        self.0.lock().border
    }

    /// Check if the table has no live entries
    pub fn is_empty(&self) -> bool {
        matches!(self.next(&LuaValue::Nil), Ok(None))
    }

    /// Whether both handles refer to the same table
    pub fn ptr_eq(&self, other: &TableRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.0.lock().entries.len()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table: {:#x}", self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_keys_alias_integers() {
        let table = TableRef::new();
        table.set(2.0, "two").unwrap();
        assert_eq!(table.get(2i64), LuaValue::string("two"));
        table.set(2.5, "half").unwrap();
        assert_eq!(table.get(2.5), LuaValue::string("half"));
    }

    #[test]
    fn test_invalid_keys() {
        let table = TableRef::new();
        assert!(table.set(LuaValue::Nil, 1i64).is_err());
        assert!(table.set(f64::NAN, 1i64).is_err());
        assert_eq!(table.get(LuaValue::Nil), LuaValue::Nil);
    }

    #[test]
    fn test_border() {
        let table = TableRef::from_sequence([10i64, 20, 30]);
        assert_eq!(table.len(), 3);
        table.set(3i64, LuaValue::Nil).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(TableRef::new().len(), 0);
    }

    #[test]
    fn test_border_tracks_holes() {
        let table = TableRef::new();
        for n in 1..=100i64 {
            table.set(n, n).unwrap();
        }
        assert_eq!(table.len(), 100);

        table.set(50i64, LuaValue::Nil).unwrap();
        assert_eq!(table.len(), 49);
        table.set(200i64, 1i64).unwrap();
        assert_eq!(table.len(), 49);
        table.set(50i64, 0i64).unwrap();
        assert_eq!(table.len(), 100);
        table.set(1.0, LuaValue::Nil).unwrap();
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_dead_entries_are_reclaimed() {
        let table = TableRef::new();
        table.set("keep", true).unwrap();
        for i in 0..10_000i64 {
            let key = format!("k{}", i);
            table.set(key.as_str(), i).unwrap();
            table.set(key.as_str(), LuaValue::Nil).unwrap();
        }
        assert!(table.slot_count() <= 2 * MIN_DEAD_TO_COMPACT + 2);
        assert_eq!(table.get("keep"), LuaValue::Boolean(true));
        let first = table.next(&LuaValue::Nil).unwrap().map(|(key, _)| key);
        assert_eq!(first, Some(LuaValue::string("keep")));
    }

    #[test]
    fn test_compaction_keeps_border_and_order() {
        let table = TableRef::from_sequence([1i64, 2, 3]);
        for i in 0..64i64 {
            table.set(format!("tmp{}", i).as_str(), i).unwrap();
        }
        for i in 0..64i64 {
            table.set(format!("tmp{}", i).as_str(), LuaValue::Nil).unwrap();
        }
        table.set("after", 4i64).unwrap();
        assert_eq!(table.slot_count(), 4);
        assert_eq!(table.len(), 3);

        let mut keys = Vec::new();
        let mut key = LuaValue::Nil;
        while let Some((k, _)) = table.next(&key).unwrap() {
            keys.push(k.clone());
            key = k;
        }
        assert_eq!(
            keys,
            vec![
                LuaValue::Integer(1),
                LuaValue::Integer(2),
                LuaValue::Integer(3),
                LuaValue::string("after")
            ]
        );
    }

    #[test]
    fn test_traversal_survives_clearing() {
        let table = TableRef::new();
        table.set("a", 1i64).unwrap();
        table.set("b", 2i64).unwrap();
        table.set("c", 3i64).unwrap();

        let mut key = LuaValue::Nil;
        let mut seen = 0;
        while let Some((k, _)) = table.next(&key).unwrap() {
            table.set(k.clone(), LuaValue::Nil).unwrap();
            seen += 1;
            key = k;
        }
        assert_eq!(seen, 3);
        assert!(table.is_empty());
    }

    #[test]
    fn test_table_keys_by_identity() {
        let outer = TableRef::new();
        let a = TableRef::new();
        let b = TableRef::new();
        outer.set(a.clone(), 1i64).unwrap();
        assert_eq!(outer.get(a), LuaValue::Integer(1));
        assert_eq!(outer.get(b), LuaValue::Nil);
    }
}
