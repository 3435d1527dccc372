//! Overload scoring
//!
//! Scores how well the value at a stack position converts to a candidate host
//! type. The scale, lowest first:
//!
//! ```text
//! 0  value proxy (the value is kept as-is)
//! 1  nil, natural matches, assignable userdata
//! 2  natural match through the generic top type
//! 3  lossy cross-category coercion (number <-> string)
//! UNIVERSAL     only the generic top type accepts it
//! INCOMPATIBLE  no conversion
//! ```
//!
//! Scoring never fails and never touches the stack.

use std::sync::Arc;

use moonlink_sdk::{Distance, HostType, HostValue, LuaCategory, LuaState};
use tracing::trace;

use crate::registry::{ConversionTables, GENERIC, NATURAL};

/// Scores stack values against candidate host types.
#[derive(Debug, Clone)]
pub struct DistanceEvaluator {
    tables: Arc<ConversionTables>,
}

impl DistanceEvaluator {
    /// Create an evaluator over `tables`
    pub fn new(tables: Arc<ConversionTables>) -> Self {
        Self { tables }
    }

    /// Distance from the value at `index` to `target`
    pub fn distance(&self, state: &dyn LuaState, index: i32, target: &HostType) -> Distance {
        let distance = self.evaluate(state, index, target);
        trace!(
            index,
            category = state.type_name(index),
            %target,
            %distance,
            "scored conversion"
        );
        distance
    }

    /// Sum of distances for consecutive arguments starting at `first`.
    ///
    /// Incompatible if any argument is, or if the arity differs from the
    /// number of values on the stack above `first`.
    pub fn signature_distance(&self, state: &dyn LuaState, first: i32, params: &[HostType]) -> Distance {
        let first = state.abs_index(first);
        let available = (state.top() - first + 1).max(0) as usize;
        if available != params.len() {
            return Distance::INCOMPATIBLE;
        }
        params
            .iter()
            .zip(first..)
            .fold(Distance::EXACT, |total, (param, index)| {
                total.saturating_add(self.distance(state, index, param))
            })
    }

    fn evaluate(&self, state: &dyn LuaState, index: i32, target: &HostType) -> Distance {
        let Some(category) = state.category(index) else {
            return Distance::INCOMPATIBLE;
        };
        match target {
            HostType::Void => return Distance::INCOMPATIBLE,
            HostType::ValueProxy => return Distance::EXACT,
            _ => {}
        }

        let matched = match category {
            LuaCategory::Nil => Some(NATURAL),
            LuaCategory::Number | LuaCategory::String
                if matches!(target, HostType::BigInt | HostType::Decimal)
                    && !state.to_number(index).is_finite() =>
            {
                // nan and inf have no exact arbitrary-precision form
                None
            }
            LuaCategory::Boolean | LuaCategory::Number | LuaCategory::String => {
                self.tables.category_distance(category, target)
            }
            LuaCategory::Table => match target {
                HostType::Map | HostType::List | HostType::Array(_) => Some(NATURAL),
                HostType::Any => Some(GENERIC),
                _ => None,
            },
            LuaCategory::Function if state.is_native_function(index) => {
                self.tables.category_distance(category, target)
            }
            LuaCategory::Function => None,
            LuaCategory::UserData => userdata_distance(state, index, target),
        };

        matched.unwrap_or(if *target == HostType::Any {
            Distance::UNIVERSAL
        } else {
            Distance::INCOMPATIBLE
        })
    }
}

fn userdata_distance(state: &dyn LuaState, index: i32, target: &HostType) -> Option<Distance> {
    let payload = state.to_userdata(index)?;
    let actual = match &payload {
        HostValue::Typed(typed) => {
            if typed.is_strong() && target.is_assignable_from(&HostType::TypedObject) {
                return Some(NATURAL);
            }
            typed.declared_type().clone()
        }
        other => other.host_type(),
    };
    target.is_assignable_from(&actual).then_some(NATURAL)
}
