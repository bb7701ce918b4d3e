//! The declarable skt types.

use serde::Serialize;
use std::fmt;

/// A variable's declared type.
///
/// These are the only four types the language knows; every expression the
/// semantic analyzer accepts resolves to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    Bool,
    /// Serialized and displayed as `string`, matching the source keyword.
    #[serde(rename = "string")]
    Str,
}

impl Type {
    /// Map a reserved word (`int`, `float`, `bool`, `string`) to its type.
    pub fn from_keyword(word: &str) -> Option<Type> {
        match word {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "bool" => Some(Type::Bool),
            "string" => Some(Type::Str),
            _ => None,
        }
    }

    /// True for `int` and `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Str => "string",
        };
        write!(f, "{}", name)
    }
}
