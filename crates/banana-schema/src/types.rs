//! Type system of the banana language
//!
//! Types are declared by the backend; the client never infers them. The
//! wire encoding is a union tagged by the `id` field.

use crate::component::Param;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of the banana language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Type {
    /// Any value, no structure
    Any,
    /// String literal
    String,
    /// Integer or float literal
    Number,
    /// One label out of a fixed set
    Enum { variants: Vec<std::string::String> },
    /// Nested structure, keys in declaration order
    Object {
        props: IndexMap<std::string::String, Type>,
    },
    /// An instance of the named component, described by its parameters
    Component {
        name: std::string::String,
        args: Vec<Param>,
    },
}

impl Type {
    /// Returns the wire tag of the type
    pub fn id(&self) -> &'static str {
        match self {
            Type::Any => "any",
            Type::String => "string",
            Type::Number => "number",
            Type::Enum { .. } => "enum",
            Type::Object { .. } => "object",
            Type::Component { .. } => "component",
        }
    }

    /// Looks up the member `name` of this type.
    ///
    /// Leaf types have no members; an unknown member also yields `None`.
    pub fn member(&self, name: &str) -> Option<&Type> {
        match self {
            Type::Any | Type::String | Type::Number | Type::Enum { .. } => None,
            Type::Object { props } => props.get(name),
            Type::Component { args, .. } => args.iter().find(|p| p.name == name).map(|p| &p.ty),
        }
    }

    /// Follows `path` member by member, stopping at the first miss
    pub fn member_path<'a, I>(&self, path: I) -> Option<&Type>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter().try_fold(self, |ty, name| ty.member(name))
    }

    /// Checks if the type has members that can be completed
    pub fn has_members(&self) -> bool {
        matches!(self, Type::Object { .. } | Type::Component { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::String => write!(f, "string"),
            Type::Number => write!(f, "number"),
            Type::Enum { variants } => write!(f, "enum({})", variants.join(" | ")),
            Type::Object { props } => {
                write!(f, "{{")?;
                for (i, (name, ty)) in props.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
            Type::Component { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", arg.name, arg.ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(props: Vec<(&str, Type)>) -> Type {
        Type::Object {
            props: props.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    #[test]
    fn test_decode_tagged_union() {
        let ty: Type = serde_json::from_value(json!({
            "id": "object",
            "props": {
                "mode": { "id": "enum", "variants": ["fast", "slow"] },
                "sink": {
                    "id": "component",
                    "name": "HttpSink",
                    "args": [{ "name": "port", "type": { "id": "number" }, "default_value": 9090 }]
                },
                "extra": { "id": "any" }
            }
        }))
        .unwrap();

        let Type::Object { props } = &ty else {
            panic!("expected object, got {:?}", ty);
        };
        let keys: Vec<_> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["mode", "sink", "extra"]);
        assert_eq!(ty.member("extra"), Some(&Type::Any));
        assert_eq!(ty.member_path(["sink", "port"]), Some(&Type::Number));
    }

    #[test]
    fn test_encode_uses_id_tag() {
        let json = serde_json::to_value(Type::Enum {
            variants: vec!["a".into()],
        })
        .unwrap();
        assert_eq!(json, json!({ "id": "enum", "variants": ["a"] }));
        assert_eq!(serde_json::to_value(Type::String).unwrap(), json!({ "id": "string" }));
    }

    #[test]
    fn test_leaf_types_have_no_members() {
        let enum_ty = Type::Enum {
            variants: vec!["a".into(), "b".into()],
        };
        for ty in [Type::Any, Type::String, Type::Number, enum_ty] {
            assert_eq!(ty.member("a"), None);
            assert!(!ty.has_members());
        }
    }

    #[test]
    fn test_member_path_stops_at_miss() {
        let ty = object(vec![("a", object(vec![("b", Type::Number)]))]);
        assert_eq!(ty.member_path(["a", "b"]), Some(&Type::Number));
        assert_eq!(ty.member_path(["a", "c"]), None);
        assert_eq!(ty.member_path(["a", "b", "c"]), None);
        assert_eq!(ty.member_path(Vec::<&str>::new()), Some(&ty));
    }

    #[test]
    fn test_type_display() {
        let ty = object(vec![
            ("a", Type::Number),
            (
                "b",
                Type::Enum {
                    variants: vec!["x".into(), "y".into()],
                },
            ),
        ]);
        assert_eq!(ty.to_string(), "{a: number, b: enum(x | y)}");

        let comp = Type::Component {
            name: "Foo".into(),
            args: vec![Param::new("p1", Type::String, json!("v"))],
        };
        assert_eq!(comp.to_string(), "Foo(p1: string)");
        assert_eq!(comp.id(), "component");
    }
}
