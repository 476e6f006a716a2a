//! Completion candidates handed to the editor

use banana_schema::{Component, Param, Type};
use serde::Serialize;

/// Icon the editor shows next to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    /// Property of an object-typed value
    Field,
    /// Component parameter
    Property,
    /// Component constructor
    Class,
}

/// A single suggested insertion at the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCandidate {
    pub label: String,
    pub insert_text: String,
    pub documentation: String,
    pub kind: CandidateKind,
}

impl CompletionCandidate {
    /// Object property reached through a dotted path; `prefix` is the path
    /// typed so far so that accepting completes the whole path
    pub fn field(prefix: &str, name: &str, ty: &Type) -> Self {
        let label = format!("{}{}", prefix, name);
        Self {
            insert_text: label.clone(),
            label,
            documentation: ty.id().to_string(),
            kind: CandidateKind::Field,
        }
    }

    /// Component parameter, optionally behind a dotted path
    pub fn parameter(prefix: &str, param: &Param) -> Self {
        let label = format!("{}{}", prefix, param.name);
        Self {
            insert_text: label.clone(),
            label,
            documentation: param.documentation(),
            kind: CandidateKind::Property,
        }
    }

    /// Call skeleton for a component. The doubled braces are the editor's
    /// snippet syntax for literal braces.
    pub fn component(component: &Component) -> Self {
        Self {
            label: component.name.clone(),
            insert_text: format!("{}({{{{}}}})", component.name),
            documentation: component.description.clone(),
            kind: CandidateKind::Class,
        }
    }
}
