//! Schema instances
//!
//! An [`Object`] holds one value per field of its schema, in declaration
//! order. Optional fields may hold [`Value::None`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ArgumentError, ValidationError};
use crate::field::{Field, Validation};
use crate::schema::Schema;
use crate::value::Value;

/// An instance of a schema
#[derive(Debug, Clone)]
pub struct Object {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Object {
    /// Construct an instance from keyword-style field values
    ///
    /// Fields not supplied take their descriptor's default. A required field
    /// without a default, or a key that matches no field, is an error.
    pub fn new<K, I>(schema: &Arc<Schema>, args: I) -> Result<Self, ArgumentError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut args: HashMap<String, Value> =
            args.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut values = Vec::with_capacity(schema.fields().len());
        for (name, field) in schema.field_names().iter().zip(schema.fields()) {
            let value = match args.remove(name) {
                Some(value) => value,
                None => match field.default_value() {
                    Some(default) => default,
                    None if field.is_optional() => Value::None,
                    None => {
                        return Err(ArgumentError::MissingArgument {
                            class: schema.name().to_string(),
                            field: name.clone(),
                        })
                    }
                },
            };
            values.push(value);
        }

        if !args.is_empty() {
            let mut keys: Vec<String> = args.into_keys().collect();
            keys.sort();
            return Err(ArgumentError::InvalidArguments {
                class: schema.name().to_string(),
                keys,
            });
        }

        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    /// Construct an instance using defaults for every field
    pub fn with_defaults(schema: &Arc<Schema>) -> Result<Self, ArgumentError> {
        Self::new(schema, std::iter::empty::<(String, Value)>())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Simple class name of the schema
    pub fn class_name(&self) -> &str {
        self.schema.name()
    }

    /// Value of a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Mutable value of a field, e.g. to push into a list
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.schema.index_of(name).map(move |i| &mut self.values[i])
    }

    /// Assign a field
    ///
    /// The value is not validated until the next `validate` call.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ArgumentError> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| ArgumentError::UnknownField {
                class: self.schema.name().to_string(),
                field: name.to_string(),
            })?;

        self.values[index] = value.into();
        Ok(())
    }

    /// Field values in declaration order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Descriptors paired with their current values, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.schema.fields().iter().zip(&self.values)
    }

    /// Validate every field in declaration order
    ///
    /// When regularizing, changed values are written back only after all
    /// fields passed, so a failure leaves the instance untouched.
    pub fn validate(&mut self, mode: Validation) -> Result<(), ValidationError> {
        let changes = self.changes(mode)?;
        if !changes.is_empty() {
            tracing::debug!(class = %self.class_name(), changed = changes.len(), "regularized fields");
        }

        for (index, value) in changes {
            self.values[index] = value;
        }
        Ok(())
    }

    /// Strict validation without mutation
    pub fn check(&self, shallow: bool) -> Result<(), ValidationError> {
        self.changes(Validation {
            shallow,
            regularize: false,
        })
        .map(|_| ())
    }

    /// Validated copy, or `None` if regularization changed nothing
    pub fn regularized(&self, mode: Validation) -> Result<Option<Object>, ValidationError> {
        let changes = self.changes(mode)?;
        if changes.is_empty() {
            return Ok(None);
        }

        let mut copy = self.clone();
        for (index, value) in changes {
            copy.values[index] = value;
        }
        Ok(Some(copy))
    }

    fn changes(&self, mode: Validation) -> Result<Vec<(usize, Value)>, ValidationError> {
        let mut changes = Vec::new();
        for (index, (field, value)) in self.fields().enumerate() {
            if let Some(new) = field.validate(value, mode)? {
                changes.push((index, new));
            }
        }
        Ok(changes)
    }

    /// `(name, value)` pairs as written on output
    ///
    /// Unset optional fields are skipped; timestamps are presented as
    /// structured date-times.
    pub fn serialization_view(&self) -> impl Iterator<Item = (&str, Cow<'_, Value>)> {
        self.schema
            .field_names()
            .iter()
            .zip(self.fields())
            .filter(|(_, (field, value))| !(field.is_optional() && value.is_none()))
            .map(|(name, (field, value))| (name.as_str(), field.present(value)))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}
