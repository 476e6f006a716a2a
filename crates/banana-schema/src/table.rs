//! Type table - the client-side view of the variables in scope
//!
//! The backend answers `POST /banana/metadata` with a bare mapping from
//! variable name to [`Type`]. A table is always replaced wholesale,
//! never merged.

use crate::types::Type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from variable name to its resolved type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTable {
    vars: IndexMap<String, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or redefines) a variable
    pub fn define(&mut self, name: impl Into<String>, ty: Type) -> Option<Type> {
        self.vars.insert(name.into(), ty)
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.vars.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// Replaces this table with `fresh` unless `fresh` is empty.
    ///
    /// An empty answer from the checker carries no information (it is what
    /// a syntactically broken intermediate edit produces), so the previous
    /// table is kept. Returns whether the table was replaced.
    pub fn replace_or_keep(&mut self, fresh: TypeTable) -> bool {
        if fresh.is_empty() {
            return false;
        }
        *self = fresh;
        true
    }
}

impl FromIterator<(String, Type)> for TypeTable {
    fn from_iter<I: IntoIterator<Item = (String, Type)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TypeTable {
    type Item = (String, Type);
    type IntoIter = indexmap::map::IntoIter<String, Type>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}
