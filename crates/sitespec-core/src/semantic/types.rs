//! The type algebra of the site spec IR.
//!
//! Textual type expressions found in `type` blocks and method signatures are
//! resolved into a closed set of variants:
//! - [`PrimitiveType`] - builtin scalar names such as `string` or `int64`
//! - [`StructType`] - a named record, carrying its fields when declared
//! - [`ArrayType`] - `[]T`
//! - [`MapType`] - `map[K]V`
//! - [`PointerType`] - `*T`
//! - [`InterfaceType`] - `any` / `interface{}`
//!
//! Every variant answers [`Type::name`] and [`Type::fields`], so generators can
//! treat request and response payloads uniformly.

use std::fmt;

use serde::Serialize;

/// Builtin scalar type names that resolve to [`PrimitiveType`].
pub const PRIMITIVE_TYPE_NAMES: &[&str] = &[
    "bool",
    "string",
    "byte",
    "rune",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "error",
    "time.Time",
    "time.Duration",
    "json.RawMessage",
];

/// Type names that resolve to [`InterfaceType`].
pub const INTERFACE_TYPE_NAMES: &[&str] = &["any", "interface{}"];

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Primitive(PrimitiveType),
    Struct(StructType),
    Array(ArrayType),
    Map(MapType),
    Pointer(PointerType),
    Interface(InterfaceType),
}

impl Type {
    /// Create a primitive type.
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive(PrimitiveType { name: name.into() })
    }

    /// Create a struct type with the given fields.
    pub fn structure(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::Struct(StructType {
            name: name.into(),
            fields,
        })
    }

    /// Create an array type of `value`.
    pub fn array(value: Type) -> Self {
        Self::Array(ArrayType {
            value: Box::new(value),
        })
    }

    /// Create a map type from `key` to `value`.
    pub fn map(key: impl Into<String>, value: Type) -> Self {
        Self::Map(MapType {
            key: key.into(),
            value: Box::new(value),
        })
    }

    /// Create a pointer type to `inner`.
    pub fn pointer(inner: Type) -> Self {
        Self::Pointer(PointerType {
            inner: Box::new(inner),
        })
    }

    /// Create an interface type.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::Interface(InterfaceType { name: name.into() })
    }

    /// Resolve a bare type name into a leaf type with no fields.
    ///
    /// Builtin scalar names become [`PrimitiveType`], `any`/`interface{}`
    /// become [`InterfaceType`], everything else is a [`StructType`].
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if PRIMITIVE_TYPE_NAMES.contains(&name.as_str()) {
            Self::primitive(name)
        } else if INTERFACE_TYPE_NAMES.contains(&name.as_str()) {
            Self::interface(name)
        } else {
            Self::structure(name, Vec::new())
        }
    }

    /// The rendered type name, e.g. `User`, `[]User`, `*User`, `map[string]User`.
    pub fn name(&self) -> String {
        match self {
            Type::Primitive(t) => t.name.clone(),
            Type::Struct(t) => t.name.clone(),
            Type::Array(t) => format!("[]{}", t.value.name()),
            Type::Map(t) => format!("map[{}]{}", t.key, t.value.name()),
            Type::Pointer(t) => format!("*{}", t.inner.name()),
            Type::Interface(t) => t.name.clone(),
        }
    }

    /// The fields of a struct type; empty for every other variant.
    pub fn fields(&self) -> &[Field] {
        match self {
            Type::Struct(t) => &t.fields,
            _ => &[],
        }
    }

    /// Returns `true` if this type has an empty rendered name.
    pub fn is_unnamed(&self) -> bool {
        self.name().is_empty()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A builtin scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveType {
    pub name: String,
}

/// A named record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructType {
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

/// A slice of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayType {
    pub value: Box<Type>,
}

/// A map from a key type name to a value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapType {
    pub key: String,
    pub value: Box<Type>,
}

/// A pointer to another type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerType {
    pub inner: Box<Type>,
}

/// An interface (dynamic) type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceType {
    pub name: String,
}

/// A field of a [`StructType`].
///
/// `type_name` is kept textual; generators render it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Raw tag text including backticks, empty when absent.
    pub tag: String,
}

impl Field {
    /// Create a new field.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            tag: tag.into(),
        }
    }

    /// Returns `true` if the tag contains a `key:` entry, e.g. `form:`.
    pub fn has_tag_key(&self, key: &str) -> bool {
        self.tag.contains(&format!("{key}:"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let user = Type::structure("User", Vec::new());

        assert_eq!(user.name(), "User");
        assert_eq!(Type::array(user.clone()).name(), "[]User");
        assert_eq!(Type::pointer(user.clone()).name(), "*User");
        assert_eq!(Type::map("string", user).name(), "map[string]User");
    }

    #[test]
    fn test_nested_type_names() {
        let inner = Type::pointer(Type::structure("User", Vec::new()));
        let nested = Type::map("string", Type::array(inner));

        assert_eq!(nested.name(), "map[string][]*User");
    }

    #[test]
    fn test_named_resolution() {
        assert!(matches!(Type::named("string"), Type::Primitive(_)));
        assert!(matches!(Type::named("time.Time"), Type::Primitive(_)));
        assert!(matches!(Type::named("any"), Type::Interface(_)));
        assert!(matches!(Type::named("User"), Type::Struct(_)));
    }

    #[test]
    fn test_fields_only_on_structs() {
        let fields = vec![Field::new("Name", "string", "")];
        let user = Type::structure("User", fields);

        assert_eq!(user.fields().len(), 1);
        assert!(Type::array(user).fields().is_empty());
        assert!(Type::primitive("int").fields().is_empty());
    }

    #[test]
    fn test_field_tag_keys() {
        let field = Field::new("Email", "string", r#"`json:"email" form:"email"`"#);

        assert!(field.has_tag_key("form"));
        assert!(field.has_tag_key("json"));
        assert!(!field.has_tag_key("file"));
    }
}
