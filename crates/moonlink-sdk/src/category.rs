//! Runtime value categories

use std::fmt;

/// Coarse tag of a value on the runtime stack.
///
/// Both distance scoring and import switch on this tag. A position with no
/// value at all is reported as `None` by [`StackAccess::category`](crate::StackAccess::category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuaCategory {
    /// The nil value
    Nil,
    /// `true` / `false`
    Boolean,
    /// Integer or floating-point number
    Number,
    /// Byte string
    String,
    /// Associative table
    Table,
    /// Script-defined or native function
    Function,
    /// Opaque host payload
    UserData,
}

impl LuaCategory {
    /// All categories, in tag order
    pub const ALL: [LuaCategory; 7] = [
        LuaCategory::Nil,
        LuaCategory::Boolean,
        LuaCategory::Number,
        LuaCategory::String,
        LuaCategory::Table,
        LuaCategory::Function,
        LuaCategory::UserData,
    ];

    /// Type name as the runtime spells it
    pub const fn name(self) -> &'static str {
        match self {
            LuaCategory::Nil => "nil",
            LuaCategory::Boolean => "boolean",
            LuaCategory::Number => "number",
            LuaCategory::String => "string",
            LuaCategory::Table => "table",
            LuaCategory::Function => "function",
            LuaCategory::UserData => "userdata",
        }
    }
}

impl fmt::Display for LuaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
