//! Component catalog of the banana language
//!
//! The catalog lists every component the backend can instantiate,
//! together with the parameters each one accepts.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parameter of a component (or of a component-typed value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Primitive or structured default, `null` when the backend sent none
    #[serde(default)]
    pub default_value: Value,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type, default_value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value,
        }
    }

    /// Documentation shown next to the parameter in completion lists
    pub fn documentation(&self) -> String {
        format!("{} default_value: {}", self.ty.id(), self.default_value)
    }
}

/// One invocable unit of the pipeline language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Component {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// The catalog as served by `GET /banana/metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Catalog {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Finds a component by exact name
    pub fn find(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}
