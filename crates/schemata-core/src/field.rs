//! Field descriptors
//!
//! A [`Field`] is the contract for one schema attribute: its kind, whether it
//! may be absent, and its default. Descriptors validate values against that
//! contract and, when asked to regularize, convert them to the canonical
//! in-memory representation.
//!
//! Validation returns `Ok(None)` when the value is acceptable as it is and
//! `Ok(Some(new))` when regularization produced a replacement. Containers are
//! only rebuilt when at least one element actually changed.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::coerce;
use crate::error::ValidationError;
use crate::schema::Schema;
use crate::time;
use crate::value::Value;

/// Validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// Only check that reference fields hold instances of the right class,
    /// without validating the nested instances' own fields
    pub shallow: bool,

    /// Convert values to their canonical representation where possible
    pub regularize: bool,
}

impl Validation {
    /// Deep, no coercion
    pub const STRICT: Validation = Validation { shallow: false, regularize: false };

    /// Own fields only, no coercion (used before dumping)
    pub const SHALLOW: Validation = Validation { shallow: true, regularize: false };

    /// Deep, with coercion
    pub const REGULARIZE: Validation = Validation { shallow: false, regularize: true };

    /// Own fields only, with coercion (used after loading)
    pub const SHALLOW_REGULARIZE: Validation = Validation { shallow: true, regularize: true };
}

impl Default for Validation {
    fn default() -> Self {
        Self::STRICT
    }
}

/// What a field holds
#[derive(Clone)]
pub enum Kind {
    Bool,
    Int,
    Float,
    String,

    /// Epoch seconds, canonically a float
    Timestamp,

    /// Exactly `n` elements, each described by `content`
    Tuple { n: usize, content: Box<Field> },

    /// Any number of elements, each described by `content`
    List { content: Box<Field> },

    /// Instance of the schema or of a schema derived from it
    Reference(Arc<Schema>),
}

impl Kind {
    /// Name used in error messages for primitive kinds
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Tuple { .. } => "tuple",
            Self::List { .. } => "list",
            Self::Reference(_) => "object",
        }
    }

    /// True when values of this kind are presented differently on output
    fn has_presentation(&self) -> bool {
        match self {
            Self::Timestamp => true,
            Self::Tuple { content, .. } | Self::List { content } => content.kind.has_presentation(),
            _ => false,
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tuple { n, content } => write!(f, "Tuple({}, {:?})", n, content.kind),
            Self::List { content } => write!(f, "List({:?})", content.kind),
            Self::Reference(schema) => write!(f, "Reference({})", schema.name()),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tuple { n, content } => write!(f, "tuple of {} {}", n, content.kind),
            Self::List { content } => write!(f, "list of {}", content.kind),
            Self::Reference(schema) => write!(f, "{}", schema.name()),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Contract for one schema attribute
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    kind: Kind,
    optional: bool,
    default: Option<Value>,
}

impl Field {
    fn of(kind: Kind) -> Self {
        Self {
            name: None,
            kind,
            optional: false,
            default: None,
        }
    }

    pub fn bool() -> Self {
        Self::of(Kind::Bool)
    }

    pub fn int() -> Self {
        Self::of(Kind::Int)
    }

    pub fn float() -> Self {
        Self::of(Kind::Float)
    }

    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    pub fn timestamp() -> Self {
        Self::of(Kind::Timestamp)
    }

    /// Fixed-arity tuple of `n` elements described by `content`
    pub fn tuple(n: usize, content: Field) -> Self {
        Self::of(Kind::Tuple {
            n,
            content: Box::new(content),
        })
    }

    /// List of elements described by `content`
    pub fn list(content: Field) -> Self {
        Self::of(Kind::List {
            content: Box::new(content),
        })
    }

    /// Reference to instances of `schema` (or schemas derived from it)
    pub fn reference(schema: &Arc<Schema>) -> Self {
        Self::of(Kind::Reference(Arc::clone(schema)))
    }

    /// Mark the field optional: it may hold the absence-sentinel
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the default used when construction does not supply a value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Name assigned when the field was declared on a schema
    ///
    /// Content descriptors of lists and tuples stay anonymous.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Default value, or `None` if the field has no default
    ///
    /// A stored absence-sentinel counts as no default. Lists default to an
    /// empty list. Tuples default to a tuple of their content default when
    /// the content has one.
    pub fn default_value(&self) -> Option<Value> {
        if let Some(value) = self.default.as_ref().filter(|v| !v.is_none()) {
            return Some(value.clone());
        }

        match &self.kind {
            Kind::List { .. } => Some(Value::List(Vec::new())),
            Kind::Tuple { n, content } => content
                .default_value()
                .map(|v| Value::Tuple(vec![v; *n])),
            _ => None,
        }
    }

    /// Validate `value` against this descriptor
    ///
    /// Returns the replacement value when regularization changed it.
    pub fn validate(&self, value: &Value, mode: Validation) -> Result<Option<Value>, ValidationError> {
        self.validate_at(value, mode, FieldPath { field: self, parent: None })
    }

    fn validate_at(
        &self,
        value: &Value,
        mode: Validation,
        path: FieldPath<'_>,
    ) -> Result<Option<Value>, ValidationError> {
        if self.optional && value.is_none() {
            return Ok(None);
        }

        match &self.kind {
            Kind::Tuple { n, content } => {
                let items = match value {
                    Value::Tuple(items) => items,
                    Value::List(items) if mode.regularize => items,
                    _ => return Err(path.type_mismatch("tuple", value)),
                };

                if items.len() != *n {
                    return Err(ValidationError::Length {
                        path: path.to_string(),
                        expected: *n,
                        actual: items.len(),
                    });
                }

                let changed = validate_elements(content, items, mode, &path)?;
                Ok(match (changed, value) {
                    (Some(items), _) => Some(Value::Tuple(items)),
                    (None, Value::List(items)) => Some(Value::Tuple(items.clone())),
                    (None, _) => None,
                })
            }

            Kind::List { content } => {
                let items = match value {
                    Value::List(items) => items,
                    Value::Tuple(items) if mode.regularize => items,
                    _ => return Err(path.type_mismatch("list", value)),
                };

                let changed = validate_elements(content, items, mode, &path)?;
                Ok(match (changed, value) {
                    (Some(items), _) => Some(Value::List(items)),
                    (None, Value::Tuple(items)) => Some(Value::List(items.clone())),
                    (None, _) => None,
                })
            }

            Kind::Reference(schema) => {
                let obj = match value {
                    Value::Object(obj) if obj.schema().is_a(schema) => obj,
                    Value::Object(obj) => {
                        return Err(ValidationError::NotInstance {
                            path: path.to_string(),
                            expected: schema.name().to_string(),
                            found: obj.class_name().to_string(),
                        })
                    }
                    other => {
                        return Err(ValidationError::NotInstance {
                            path: path.to_string(),
                            expected: schema.name().to_string(),
                            found: other.to_string(),
                        })
                    }
                };

                if mode.shallow {
                    return Ok(None);
                }

                let regularized = obj
                    .regularized(mode)
                    .map_err(|e| e.within(&path.to_string()))?;
                Ok(regularized.map(Value::from))
            }

            primitive => {
                if coerce::is_canonical(primitive, value) {
                    return Ok(None);
                }

                if !mode.regularize {
                    return Err(path.type_mismatch(primitive.name(), value));
                }

                coerce::regularize(primitive, value)
                    .map(Some)
                    .map_err(|reason| ValidationError::Coercion {
                        path: path.to_string(),
                        expected: primitive.name(),
                        value: value.to_string(),
                        reason,
                    })
            }
        }
    }

    /// Output form of a stored value
    ///
    /// Timestamps are presented as structured UTC date-times; everything
    /// else is borrowed unchanged.
    pub fn present<'a>(&self, value: &'a Value) -> Cow<'a, Value> {
        match (&self.kind, value) {
            (Kind::Timestamp, Value::Float(t)) => match time::time_to_datetime(*t) {
                Some(dt) => Cow::Owned(Value::DateTime(dt)),
                None => Cow::Borrowed(value),
            },
            (Kind::Tuple { content, .. }, Value::Tuple(items)) if content.kind.has_presentation() => {
                Cow::Owned(Value::Tuple(present_all(content, items)))
            }
            (Kind::List { content }, Value::List(items)) if content.kind.has_presentation() => {
                Cow::Owned(Value::List(present_all(content, items)))
            }
            _ => Cow::Borrowed(value),
        }
    }
}

fn present_all(content: &Field, items: &[Value]) -> Vec<Value> {
    items.iter().map(|v| content.present(v).into_owned()).collect()
}

fn validate_elements(
    content: &Field,
    items: &[Value],
    mode: Validation,
    parent: &FieldPath<'_>,
) -> Result<Option<Vec<Value>>, ValidationError> {
    let path = FieldPath {
        field: content,
        parent: Some(parent),
    };

    let mut rebuilt: Option<Vec<Value>> = None;
    for (i, item) in items.iter().enumerate() {
        if let Some(new) = content.validate_at(item, mode, path)? {
            rebuilt.get_or_insert_with(|| items.to_vec())[i] = new;
        }
    }

    Ok(rebuilt)
}

/// Human-readable location of a descriptor, rendered only on error
///
/// Anonymous content descriptors report themselves as
/// `element of <parent>`, recursively.
#[derive(Clone, Copy)]
struct FieldPath<'a> {
    field: &'a Field,
    parent: Option<&'a FieldPath<'a>>,
}

impl FieldPath<'_> {
    fn type_mismatch(&self, expected: &'static str, value: &Value) -> ValidationError {
        ValidationError::TypeMismatch {
            path: self.to_string(),
            expected,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field.name, self.parent) {
            (Some(name), _) => write!(f, "{}", name),
            (None, Some(parent)) => write!(f, "element of {}", parent),
            (None, None) => write!(f, "value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_accepts_sentinel() {
        let field = Field::float().optional();
        assert_eq!(field.validate(&Value::None, Validation::STRICT), Ok(None));

        let required = Field::float().named("lat");
        let err = required.validate(&Value::None, Validation::STRICT).unwrap_err();
        assert_eq!(err.to_string(), "lat: \"None\" is not a float");
    }

    #[test]
    fn strict_primitive_mismatch() {
        let field = Field::float().named("gain");
        let err = field.validate(&Value::Int(3), Validation::STRICT).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { expected: "float", .. }));
    }

    #[test]
    fn regularize_widens_int() {
        let field = Field::float();
        assert_eq!(
            field.validate(&Value::Int(3), Validation::REGULARIZE),
            Ok(Some(Value::Float(3.0)))
        );
        assert_eq!(field.validate(&Value::Float(3.0), Validation::REGULARIZE), Ok(None));
    }

    #[test]
    fn nested_element_paths() {
        let field = Field::list(Field::list(Field::float())).named("poles");
        let value = Value::list([Value::list([Value::Float(1.0), Value::from("x")])]);

        let err = field.validate(&value, Validation::STRICT).unwrap_err();
        assert_eq!(err.path(), Some("element of element of poles"));
    }

    #[test]
    fn tuple_length_fatal_even_when_regularizing() {
        let field = Field::tuple(6, Field::float()).named("m6");
        let value = Value::tuple([1.0, 2.0, 3.0, 4.0, 5.0]);

        for mode in [Validation::STRICT, Validation::REGULARIZE] {
            let err = field.validate(&value, mode).unwrap_err();
            assert!(err.to_string().contains("should have length 6"));
        }
    }

    #[test]
    fn tuple_rebuilt_only_on_change() {
        let field = Field::tuple(2, Field::float());

        let canonical = Value::tuple([1.0, 2.0]);
        assert_eq!(field.validate(&canonical, Validation::REGULARIZE), Ok(None));

        let mixed = Value::Tuple(vec![Value::Float(1.0), Value::Int(2)]);
        assert_eq!(
            field.validate(&mixed, Validation::REGULARIZE),
            Ok(Some(Value::tuple([1.0, 2.0])))
        );
    }

    #[test]
    fn list_regularizes_into_tuple() {
        let field = Field::tuple(2, Field::int());
        let value = Value::list([1, 2]);

        assert!(field.validate(&value, Validation::STRICT).is_err());
        assert_eq!(
            field.validate(&value, Validation::REGULARIZE),
            Ok(Some(Value::tuple([1, 2])))
        );
    }

    #[test]
    fn defaults() {
        assert_eq!(Field::list(Field::float()).default_value(), Some(Value::List(vec![])));
        assert_eq!(
            Field::tuple(3, Field::float().with_default(0.0)).default_value(),
            Some(Value::tuple([0.0, 0.0, 0.0]))
        );
        assert_eq!(Field::tuple(3, Field::float()).default_value(), None);
        assert_eq!(Field::string().with_default("").default_value(), Some(Value::from("")));
        assert_eq!(Field::float().default_value(), None);
        assert_eq!(Field::float().with_default(None::<f64>).default_value(), None);
    }

    #[test]
    fn timestamp_presented_as_datetime() {
        let field = Field::list(Field::timestamp());
        let value = Value::list([1234567890.5]);

        match field.present(&value).into_owned() {
            Value::List(items) => assert!(matches!(items[0], Value::DateTime(_))),
            other => panic!("unexpected {:?}", other),
        }

        let plain = Field::list(Field::float());
        assert!(matches!(plain.present(&value), Cow::Borrowed(_)));
    }
}
