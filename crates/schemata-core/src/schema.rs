//! Schemas: named, ordered lists of field descriptors

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::field::Field;

/// A named, ordered collection of field descriptors
///
/// Field order is declaration order: inherited fields first, then the
/// schema's own. This order is the canonical serialization order.
pub struct Schema {
    name: String,
    base: Option<Arc<Schema>>,
    fields: Vec<Field>,
    field_names: Vec<String>,
}

impl Schema {
    /// Start declaring a schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            base: None,
            fields: Vec::new(),
        }
    }

    /// Simple class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema this one was derived from
    pub fn base(&self) -> Option<&Arc<Schema>> {
        self.base.as_ref()
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Position of a field in declaration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|n| n == name)
    }

    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    /// True if this schema is `other` or derives from it
    pub fn is_a(&self, other: &Schema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, other) {
                return true;
            }
            current = schema.base.as_deref();
        }
        false
    }

    /// Reference descriptor for nesting this schema as a field of another
    pub fn t(self: &Arc<Self>) -> Field {
        Field::reference(self)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("fields", &self.field_names)
            .finish()
    }
}

/// Builder collecting field declarations in order
pub struct SchemaBuilder {
    name: String,
    base: Option<Arc<Schema>>,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    /// Inherit the fields of `base`
    pub fn extends(mut self, base: &Arc<Schema>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Declare the next field
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Name of the schema being declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Freeze the declaration
    ///
    /// Inherited fields keep their order. A field redeclared under an
    /// inherited name replaces the inherited one and takes its own
    /// declaration position.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut fields: Vec<Field> = Vec::new();
        let mut field_names: Vec<String> = Vec::new();

        if let Some(base) = &self.base {
            fields.extend(base.fields.iter().cloned());
            field_names.extend(base.field_names.iter().cloned());
        }

        let mut declared: HashSet<String> = HashSet::new();
        for (name, field) in self.fields {
            if !declared.insert(name.clone()) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name,
                    field: name,
                });
            }

            // Override of an inherited field
            if let Some(pos) = field_names.iter().position(|n| *n == name) {
                fields.remove(pos);
                field_names.remove(pos);
            }

            fields.push(field.named(&name));
            field_names.push(name);
        }

        Ok(Schema {
            name: self.name,
            base: self.base,
            fields,
            field_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Kind;

    fn station() -> Schema {
        Schema::builder("Station")
            .field("network", Field::string().with_default(""))
            .field("station", Field::string().with_default(""))
            .field("lat", Field::float().with_default(0.0))
            .build()
            .unwrap()
    }

    #[test]
    fn declaration_order() {
        let schema = station();
        assert_eq!(schema.field_names(), ["network", "station", "lat"]);
        assert_eq!(schema.index_of("lat"), Some(2));
        assert_eq!(schema.field("station").unwrap().name(), Some("station"));
        assert!(schema.field("nope").is_none());
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = Schema::builder("Bad")
            .field("a", Field::int())
            .field("a", Field::float())
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateField {
                schema: "Bad".to_string(),
                field: "a".to_string()
            }
        );
    }

    #[test]
    fn inheritance_and_override() {
        let base = Arc::new(
            Schema::builder("Base")
                .field("a", Field::int())
                .field("b", Field::int())
                .build()
                .unwrap(),
        );

        let derived = Schema::builder("Derived")
            .extends(&base)
            .field("c", Field::string())
            .field("a", Field::float())
            .build()
            .unwrap();

        assert_eq!(derived.field_names(), ["b", "c", "a"]);
        assert!(matches!(derived.field("a").unwrap().kind(), Kind::Float));
        // Base is untouched
        assert_eq!(base.field_names(), ["a", "b"]);
    }

    #[test]
    fn subclass_relation() {
        let response = Arc::new(Schema::builder("Response").build().unwrap());
        let gain = Arc::new(
            Schema::builder("Gain")
                .extends(&response)
                .field("gain", Field::float())
                .build()
                .unwrap(),
        );

        assert!(gain.is_a(&response));
        assert!(gain.is_a(&gain));
        assert!(!response.is_a(&gain));
        assert!(matches!(response.t().kind(), Kind::Reference(_)));
    }
}
