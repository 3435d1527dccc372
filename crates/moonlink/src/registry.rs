//! Distance tables and conversion registries
//!
//! Built once from a [`ConverterConfig`] and shared read-only between the
//! evaluator, importer and exporter.

use moonlink_sdk::{Distance, HostType, HostValue, LuaCategory};
use rustc_hash::FxHashMap;

use crate::config::ConverterConfig;

/// Natural match
pub const NATURAL: Distance = Distance::new(1);

/// Natural match through the generic top type
pub const GENERIC: Distance = Distance::new(2);

/// Lossy cross-category coercion
pub const COERCION: Distance = Distance::new(3);

/// Every numeric host type a runtime number converts to
pub const NUMERIC_TYPES: [HostType; 13] = [
    HostType::I8,
    HostType::I16,
    HostType::I32,
    HostType::I64,
    HostType::U8,
    HostType::U16,
    HostType::U32,
    HostType::U64,
    HostType::F32,
    HostType::F64,
    HostType::BigInt,
    HostType::Decimal,
    HostType::Char,
];

type DistanceTable = FxHashMap<HostType, Distance>;

/// Immutable per-category distance tables.
#[derive(Debug, Clone)]
pub struct ConversionTables {
    config: ConverterConfig,
    boolean: DistanceTable,
    number: DistanceTable,
    string: DistanceTable,
    function: DistanceTable,
}

impl ConversionTables {
    /// Build the tables for `config`
    pub fn new(config: ConverterConfig) -> Self {
        let mut boolean = DistanceTable::default();
        boolean.insert(HostType::Bool, NATURAL);
        boolean.insert(HostType::Any, GENERIC);

        let mut number = DistanceTable::default();
        for ty in NUMERIC_TYPES {
            number.insert(ty, NATURAL);
        }
        number.insert(HostType::Any, GENERIC);
        number.insert(HostType::Text, COERCION);
        if !config.raw_byte_array {
            number.insert(HostType::Bytes, COERCION);
        }

        let mut string = DistanceTable::default();
        string.insert(HostType::Text, NATURAL);
        if !config.raw_byte_array {
            string.insert(HostType::Bytes, NATURAL);
        }
        string.insert(HostType::Any, GENERIC);
        for ty in NUMERIC_TYPES {
            string.insert(ty, COERCION);
        }

        let mut function = DistanceTable::default();
        function.insert(HostType::NativeFunction, NATURAL);
        function.insert(HostType::Any, GENERIC);

        Self {
            config,
            boolean,
            number,
            string,
            function,
        }
    }

    /// Configuration the tables were built from
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Table lookup for categories that have a table.
    ///
    /// `None` both for categories without a table and for targets the table
    /// does not list.
    pub fn category_distance(&self, category: LuaCategory, target: &HostType) -> Option<Distance> {
        let table = match category {
            LuaCategory::Boolean => &self.boolean,
            LuaCategory::Number => &self.number,
            LuaCategory::String => &self.string,
            LuaCategory::Function => &self.function,
            LuaCategory::Nil | LuaCategory::Table | LuaCategory::UserData => return None,
        };
        table.get(target).copied()
    }

    /// Whether `target` has a per-type import from scalar stack values
    pub fn has_import(&self, target: &HostType) -> bool {
        match target {
            HostType::Bool | HostType::Text => true,
            HostType::Bytes => !self.config.raw_byte_array,
            other => NUMERIC_TYPES.contains(other),
        }
    }

    /// Whether `value` has a per-type export to a runtime scalar
    pub fn has_export(&self, value: &HostValue) -> bool {
        match value {
            HostValue::Bytes(_) => !self.config.raw_byte_array,
            other => {
                let ty = other.host_type();
                ty == HostType::Bool || ty == HostType::Text || NUMERIC_TYPES.contains(&ty)
            }
        }
    }
}

impl Default for ConversionTables {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}
