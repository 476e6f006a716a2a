//! Candidate generation
//!
//! Pure functions over a snapshot of the type table and the catalog.
//! Lookup misses of any kind end in an empty list; nothing here fails.

use crate::candidate::CompletionCandidate;
use crate::context::{classify, CompletionContext};
use banana_schema::{Component, Type, TypeTable};

/// Resolves the completions for the text before the cursor
pub fn resolve(
    text_before_cursor: &str,
    table: &TypeTable,
    components: &[Component],
) -> Vec<CompletionCandidate> {
    match classify(text_before_cursor) {
        CompletionContext::DottedPath { path } => match resolve_path(&path, table) {
            Some(ty) if ty.has_members() => members(&path, ty),
            Some(ty) => {
                tracing::trace!(%path, ty = ty.id(), "dotted path ends on a leaf type");
                Vec::new()
            }
            None => {
                tracing::trace!(%path, "dotted path does not resolve");
                Vec::new()
            }
        },
        CompletionContext::CallArgument { component, .. } => {
            match components.iter().find(|c| c.name == component) {
                Some(found) => found
                    .params
                    .iter()
                    .map(|param| CompletionCandidate::parameter("", param))
                    .collect(),
                None => {
                    tracing::trace!(%component, "unknown component");
                    Vec::new()
                }
            }
        }
        CompletionContext::PostAssignment => {
            components.iter().map(CompletionCandidate::component).collect()
        }
        CompletionContext::None => Vec::new(),
    }
}

/// Walks a dotted path through the type table.
///
/// The first segment names a variable. The segments in between are
/// member lookups; the last one is still being typed and is ignored.
/// Segments are trimmed, so `x . a .` walks like `x.a.`.
pub fn resolve_path<'t>(path: &str, table: &'t TypeTable) -> Option<&'t Type> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    let (variable, rest) = segments.split_first()?;
    let root = table.lookup(variable)?;
    match rest.split_last() {
        Some((_, walk)) => root.member_path(walk.iter().copied()),
        None => Some(root),
    }
}

/// Member candidates of `ty`, prefixed with the path typed so far
fn members(prefix: &str, ty: &Type) -> Vec<CompletionCandidate> {
    match ty {
        Type::Object { props } => props
            .iter()
            .map(|(name, prop)| CompletionCandidate::field(prefix, name, prop))
            .collect(),
        Type::Component { args, .. } => args
            .iter()
            .map(|param| CompletionCandidate::parameter(prefix, param))
            .collect(),
        Type::Any | Type::String | Type::Number | Type::Enum { .. } => Vec::new(),
    }
}

/// Returns the text before a 1-based editor position.
///
/// `column` counts characters; a column past the end of the line stops at
/// the line end. Returns `None` when `line` is not in the source.
pub fn line_prefix(source: &str, line: usize, column: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }

    let mut start = 0;
    for _ in 1..line {
        start += source[start..].find('\n')? + 1;
    }

    let line_text = source[start..].split('\n').next().unwrap_or("");
    let width: usize = line_text
        .chars()
        .take(column.saturating_sub(1))
        .map(char::len_utf8)
        .sum();

    Some(&source[..start + width])
}
