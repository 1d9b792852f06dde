//! Values exchanged with a target device model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an object in the target device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Attribute value read from or written to a target object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Ref(ObjectId),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Option<ObjectId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness as the host model reports flags: non-zero numbers, non-empty text.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Text(value) => !value.is_empty(),
            Self::Ref(_) => true,
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Numeric list view; non-numeric entries are skipped.
    pub fn numbers(&self) -> Vec<f64> {
        self.as_list()
            .map(|items| items.iter().filter_map(Self::as_f64).collect())
            .unwrap_or_default()
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectId> for AttrValue {
    fn from(value: ObjectId) -> Self {
        Self::Ref(value)
    }
}

impl From<Option<ObjectId>> for AttrValue {
    fn from(value: Option<ObjectId>) -> Self {
        value.map_or(Self::Null, Self::Ref)
    }
}
