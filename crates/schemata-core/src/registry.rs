//! Tag registry
//!
//! Maps `<prefix>.<ClassName>` tags to schemas and back. Populated once at
//! startup; registration is append-only and a tag collision fails
//! immediately.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::{Schema, SchemaBuilder};

/// Tag prefix used when none is configured
pub const DEFAULT_TAG_PREFIX: &str = "schemata";

/// Bidirectional tag <-> schema mapping
#[derive(Debug)]
pub struct Registry {
    prefix: String,
    by_tag: HashMap<String, Arc<Schema>>,
    order: Vec<String>,
}

impl Registry {
    /// Create an empty registry using `prefix` for all tags
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            by_tag: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tag a schema with the given class name is registered under
    pub fn tag_name(&self, class_name: &str) -> String {
        format!("{}.{}", self.prefix, class_name)
    }

    /// Register a schema under `<prefix>.<name>`
    pub fn register(&mut self, schema: Schema) -> Result<Arc<Schema>, SchemaError> {
        let tag = self.tag_name(schema.name());
        if self.by_tag.contains_key(&tag) {
            return Err(SchemaError::DuplicateTag { tag });
        }

        tracing::debug!(tag = %tag, fields = ?schema.field_names(), "registered schema");

        let schema = Arc::new(schema);
        self.by_tag.insert(tag.clone(), Arc::clone(&schema));
        self.order.push(tag);
        Ok(schema)
    }

    /// Build and register in one step
    pub fn declare(&mut self, builder: SchemaBuilder) -> Result<Arc<Schema>, SchemaError> {
        let tag = self.tag_name(builder.name());
        if self.by_tag.contains_key(&tag) {
            return Err(SchemaError::DuplicateTag { tag });
        }
        self.register(builder.build()?)
    }

    /// Schema registered under `tag`
    pub fn lookup(&self, tag: &str) -> Option<&Arc<Schema>> {
        self.by_tag.get(tag)
    }

    /// Tag of a registered schema
    ///
    /// Returns `None` for schemas that were not registered here, even if
    /// another schema with the same name was.
    pub fn tag_of(&self, schema: &Schema) -> Option<String> {
        let tag = self.tag_name(schema.name());
        self.by_tag
            .get(&tag)
            .filter(|registered| std::ptr::eq(registered.as_ref(), schema))
            .map(|_| tag)
    }

    /// Registered tags and schemas in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.order
            .iter()
            .filter_map(|tag| self.by_tag.get(tag).map(|schema| (tag.as_str(), schema)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}
