//! Presence-tracking field for partial updates
//!
//! `Option<T>` alone cannot tell `{"note": null}` apart from `{}`.
//! `Patch<T>` keeps the three states separate; pair it with
//! `#[serde(default)]` so omitted fields become [`Patch::Missing`].

use serde::{Deserialize, Deserializer};

use super::ValidationError;

/// A single field of a partial update payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field absent from the payload: leave the column untouched
    Missing,
    /// Field present with `null`
    Null,
    /// Field present with a value
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Patch<T> {
    /// Map a supplied value through a fallible constructor, preserving presence.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Self::Missing => Patch::Missing,
            Self::Null => Patch::Null,
            Self::Value(v) => Patch::Value(f(v)?),
        })
    }

    /// Change for a nullable column: `None` when missing,
    /// `Some(None)` to clear, `Some(Some(v))` to set.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Self::Missing => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }

    /// Change for a non-nullable column; an explicit `null` is rejected.
    pub fn into_required(self, field: &'static str) -> Result<Option<T>, ValidationError> {
        match self {
            Self::Missing => Ok(None),
            Self::Null => Err(ValidationError::Null { field }),
            Self::Value(v) => Ok(Some(v)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key is present; absence goes through Default.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Value(v),
            None => Self::Null,
        })
    }
}
