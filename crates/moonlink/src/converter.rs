//! Default converter
//!
//! Bundles the evaluator, importer and exporter over one set of
//! [`ConversionTables`] and exposes them through the [`Converter`] trait.

use std::sync::{Arc, LazyLock};

use moonlink_sdk::{
    BridgeResult, Converter, Distance, FromHost, HostType, HostValue, IntoHost, LuaState,
};
use tracing::warn;

use crate::config::ConverterConfig;
use crate::distance::DistanceEvaluator;
use crate::export::ValueExporter;
use crate::import::ValueImporter;
use crate::registry::ConversionTables;

static GLOBAL: LazyLock<DefaultConverter> = LazyLock::new(|| {
    let config = ConverterConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring converter environment, using defaults");
        ConverterConfig::default()
    });
    DefaultConverter::new(config)
});

/// The standard [`Converter`].
#[derive(Debug, Clone)]
pub struct DefaultConverter {
    tables: Arc<ConversionTables>,
    evaluator: DistanceEvaluator,
    importer: ValueImporter,
    exporter: ValueExporter,
}

impl DefaultConverter {
    /// Build a converter for `config`
    pub fn new(config: ConverterConfig) -> Self {
        Self::from_tables(Arc::new(ConversionTables::new(config)))
    }

    /// Build a converter sharing existing tables
    pub fn from_tables(tables: Arc<ConversionTables>) -> Self {
        Self {
            evaluator: DistanceEvaluator::new(Arc::clone(&tables)),
            importer: ValueImporter::new(Arc::clone(&tables)),
            exporter: ValueExporter::new(Arc::clone(&tables)),
            tables,
        }
    }

    /// Process-wide converter configured from the environment on first use
    pub fn global() -> &'static DefaultConverter {
        &GLOBAL
    }

    /// Active configuration
    pub fn config(&self) -> &ConverterConfig {
        self.tables.config()
    }

    /// Shared conversion tables
    pub fn tables(&self) -> &Arc<ConversionTables> {
        &self.tables
    }

    /// Distance of the value at `index` to `target`
    pub fn distance(&self, state: &dyn LuaState, index: i32, target: &HostType) -> Distance {
        self.evaluator.distance(state, index, target)
    }

    /// Total distance of the arguments from `first` to the top against `params`
    pub fn signature_distance(&self, state: &dyn LuaState, first: i32, params: &[HostType]) -> Distance {
        self.evaluator.signature_distance(state, first, params)
    }

    /// Import the value at `index` as `T`
    pub fn get<T: FromHost>(&self, state: &mut dyn LuaState, index: i32) -> BridgeResult<T> {
        let value = self.importer.import(state, index, &T::host_type())?;
        T::from_host(value)
    }

    /// Export `value`
    pub fn push<T: IntoHost>(&self, state: &mut dyn LuaState, value: T) -> BridgeResult<()> {
        self.exporter.export(state, &value.into_host())
    }
}

impl Default for DefaultConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl Converter for DefaultConverter {
    fn type_distance(&self, state: &dyn LuaState, index: i32, target: &HostType) -> Distance {
        self.evaluator.distance(state, index, target)
    }

    fn to_host(
        &self,
        state: &mut dyn LuaState,
        index: i32,
        target: &HostType,
    ) -> BridgeResult<HostValue> {
        self.importer.import(state, index, target)
    }

    fn push_host(&self, state: &mut dyn LuaState, value: &HostValue) -> BridgeResult<()> {
        self.exporter.export(state, value)
    }
}
