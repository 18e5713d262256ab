//! Tagged-mapping YAML codec
//!
//! Every instance is written as a mapping tagged `!<prefix>.<ClassName>`,
//! with keys in declaration order and unset optional fields omitted. Each
//! document starts with an explicit `---` marker.
//!
//! Before an instance is written it validates itself shallowly; nested
//! instances do the same when the writer reaches them. On load, nested
//! nodes are resolved and constructed first, then each instance is
//! regularized shallowly so on-disk forms become canonical values.

use std::io::{Read, Write};

use serde::Deserialize;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Number, Value as Yaml};

use schemata_core::time;
use schemata_core::{Config, Object, Registry, Validation, ValidationError, Value};

use crate::banner::Banner;
use crate::error::CodecError;

/// Maximum nesting depth accepted by the loader
pub const MAX_DEPTH: usize = 128;

const DOCUMENT_START: &str = "---\n";

/// Dumps and loads instances of the schemas in a registry
#[derive(Debug, Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r Registry,
    fraction_digits: u8,
}

impl<'r> Codec<'r> {
    /// Codec with default timestamp rendering
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            fraction_digits: 6,
        }
    }

    /// Codec using the timestamp settings of `config`
    pub fn from_config(registry: &'r Registry, config: &Config) -> Self {
        Self::new(registry).with_fraction_digits(config.timestamps.fraction_digits)
    }

    /// Fractional second digits for timestamps on output (clamped to 1..=9)
    pub fn with_fraction_digits(mut self, digits: u8) -> Self {
        self.fraction_digits = digits.clamp(1, 9);
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Dump one instance as a single document
    pub fn dump(&self, obj: &Object) -> Result<String, CodecError> {
        let mut out = String::new();
        self.push_document(&mut out, obj)?;
        Ok(out)
    }

    /// Dump a sequence of instances, one document each
    pub fn dump_all<'a, I>(&self, objects: I) -> Result<String, CodecError>
    where
        I: IntoIterator<Item = &'a Object>,
    {
        let mut out = String::new();
        for obj in objects {
            self.push_document(&mut out, obj)?;
        }
        Ok(out)
    }

    /// Dump a sequence of instances preceded by a banner
    pub fn dump_all_with_banner<'a, I>(&self, objects: I, banner: &Banner) -> Result<String, CodecError>
    where
        I: IntoIterator<Item = &'a Object>,
    {
        let mut out = banner.render();
        out.push_str(&self.dump_all(objects)?);
        Ok(out)
    }

    /// Stream documents to a writer, one instance at a time
    pub fn write_all<'a, W, I>(&self, mut writer: W, objects: I, banner: Option<&Banner>) -> Result<(), CodecError>
    where
        W: Write,
        I: IntoIterator<Item = &'a Object>,
    {
        if let Some(banner) = banner {
            writer.write_all(banner.render().as_bytes())?;
        }

        let mut count = 0usize;
        for obj in objects {
            let mut document = String::new();
            self.push_document(&mut document, obj)?;
            writer.write_all(document.as_bytes())?;
            count += 1;
        }

        writer.flush()?;
        tracing::debug!(documents = count, "wrote document stream");
        Ok(())
    }

    fn push_document(&self, out: &mut String, obj: &Object) -> Result<(), CodecError> {
        let node = self.object_to_yaml(obj)?;
        let text = serde_yaml::to_string(&node)?;

        // The emitter may open the document itself, either alone or before the root tag
        let body = text
            .strip_prefix(DOCUMENT_START)
            .or_else(|| text.strip_prefix("--- "))
            .unwrap_or(&text);

        out.push_str(DOCUMENT_START);
        out.push_str(body);
        Ok(())
    }

    fn object_to_yaml(&self, obj: &Object) -> Result<Yaml, CodecError> {
        obj.check(true)?;

        let tag = self
            .registry
            .tag_of(obj.schema())
            .ok_or_else(|| CodecError::Unregistered {
                class: obj.class_name().to_string(),
            })?;

        let mut mapping = Mapping::new();
        for (name, value) in obj.serialization_view() {
            mapping.insert(Yaml::String(name.to_string()), self.value_to_yaml(&value)?);
        }

        Ok(Yaml::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value: Yaml::Mapping(mapping),
        })))
    }

    fn value_to_yaml(&self, value: &Value) -> Result<Yaml, CodecError> {
        Ok(match value {
            Value::None => Yaml::Null,
            Value::Bool(b) => Yaml::Bool(*b),
            Value::Int(i) => Yaml::Number(Number::from(*i)),
            Value::Float(x) => Yaml::Number(Number::from(*x)),
            Value::String(s) => Yaml::String(s.clone()),
            Value::DateTime(dt) => Yaml::String(time::format_datetime(dt, self.fraction_digits)),
            Value::Tuple(items) | Value::List(items) => Yaml::Sequence(
                items
                    .iter()
                    .map(|item| self.value_to_yaml(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(obj) => self.object_to_yaml(obj)?,
        })
    }

    /// Load exactly one document
    pub fn load(&self, text: &str) -> Result<Object, CodecError> {
        let mut documents = self.load_all(text);
        let first = documents
            .next()
            .ok_or(CodecError::DocumentCount { found: 0 })??;

        let rest = documents.count();
        if rest > 0 {
            return Err(CodecError::DocumentCount { found: rest + 1 });
        }
        Ok(first)
    }

    /// Lazily load every document of a stream
    pub fn load_all<'de>(&self, text: &'de str) -> LoadAll<'de, 'r> {
        LoadAll::new(serde_yaml::Deserializer::from_str(text), self.registry)
    }

    /// Lazily load every document read from `reader`
    ///
    /// The YAML parser reads the whole input into memory before the first
    /// document is produced; only the conversion into instances is lazy.
    pub fn load_reader<'de, R>(&self, reader: R) -> LoadAll<'de, 'r>
    where
        R: Read + 'de,
    {
        LoadAll::new(serde_yaml::Deserializer::from_reader(reader), self.registry)
    }
}

/// Forward-only iterator over the instances of a document stream
///
/// Each document is converted only when requested. Null documents are
/// skipped, so an empty or banner-only stream yields nothing. A document
/// that fails validation yields an error and the stream continues;
/// malformed YAML ends the stream.
pub struct LoadAll<'de, 'r> {
    documents: serde_yaml::Deserializer<'de>,
    registry: &'r Registry,
    finished: bool,
    index: usize,
}

impl<'de, 'r> LoadAll<'de, 'r> {
    fn new(documents: serde_yaml::Deserializer<'de>, registry: &'r Registry) -> Self {
        Self {
            documents,
            registry,
            finished: false,
            index: 0,
        }
    }
}

impl Iterator for LoadAll<'_, '_> {
    type Item = Result<Object, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let document = match self.documents.next() {
                Some(document) => document,
                None => {
                    self.finished = true;
                    return None;
                }
            };

            let node = match Yaml::deserialize(document) {
                Ok(node) => node,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err.into()));
                }
            };

            // Empty and comment-only streams parse as a single null document
            if node.is_null() {
                continue;
            }

            self.index += 1;
            tracing::debug!(document = self.index, "loading document");

            return Some(Loader { registry: self.registry }.document(node));
        }
    }
}

/// Rebuilds instances from YAML nodes
struct Loader<'r> {
    registry: &'r Registry,
}

impl Loader<'_> {
    fn document(&self, node: Yaml) -> Result<Object, CodecError> {
        match node {
            Yaml::Tagged(tagged) => self.object(*tagged, 0),
            other => Err(CodecError::NotAnObject {
                found: node_kind(&other).to_string(),
            }),
        }
    }

    fn object(&self, tagged: TaggedValue, depth: usize) -> Result<Object, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::RecursionLimitExceeded { max_depth: MAX_DEPTH });
        }

        // Resolve the tag before touching any child node
        let tag = tagged.tag.to_string();
        let tag = tag.trim_start_matches('!');
        let schema = self
            .registry
            .lookup(tag)
            .ok_or_else(|| ValidationError::UnknownTag { tag: tag.to_string() })?;

        let mapping = match tagged.value {
            Yaml::Mapping(mapping) => mapping,
            _ => return Err(CodecError::NotAMapping { tag: tag.to_string() }),
        };

        let mut args = Vec::with_capacity(mapping.len());
        for (key, node) in mapping {
            let key = match key {
                Yaml::String(key) => key,
                other => {
                    return Err(CodecError::InvalidKey {
                        found: node_kind(&other).to_string(),
                    })
                }
            };
            let value = self.value(node, &key, depth + 1)?;
            args.push((key, value));
        }

        let mut obj = Object::new(schema, args)?;
        obj.validate(Validation::SHALLOW_REGULARIZE)?;
        Ok(obj)
    }

    fn value(&self, node: Yaml, path: &str, depth: usize) -> Result<Value, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::RecursionLimitExceeded { max_depth: MAX_DEPTH });
        }

        Ok(match node {
            Yaml::Null => Value::None,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => {
                let element_path = format!("element of {}", path);
                Value::List(
                    items
                        .into_iter()
                        .map(|item| self.value(item, &element_path, depth + 1))
                        .collect::<Result<_, _>>()?,
                )
            }
            Yaml::Mapping(_) => {
                return Err(ValidationError::UntaggedMapping {
                    path: path.to_string(),
                }
                .into())
            }
            Yaml::Tagged(tagged) => match self.object(*tagged, depth) {
                Ok(obj) => Value::from(obj),
                Err(CodecError::Validation(err)) => return Err(err.within(path).into()),
                Err(err) => return Err(err),
            },
        })
    }
}

fn node_kind(node: &Yaml) -> &'static str {
    match node {
        Yaml::Null => "null",
        Yaml::Bool(_) => "bool",
        Yaml::Number(_) => "number",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "sequence",
        Yaml::Mapping(_) => "untagged mapping",
        Yaml::Tagged(_) => "tagged value",
    }
}

/// Dump one instance with default settings
pub fn dump(obj: &Object, registry: &Registry) -> Result<String, CodecError> {
    Codec::new(registry).dump(obj)
}

/// Dump several instances with default settings
pub fn dump_all<'a, I>(objects: I, registry: &Registry) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'a Object>,
{
    Codec::new(registry).dump_all(objects)
}

/// Load exactly one document
pub fn load(text: &str, registry: &Registry) -> Result<Object, CodecError> {
    Codec::new(registry).load(text)
}

/// Lazily load every document of a stream
pub fn load_all<'de, 'r>(text: &'de str, registry: &'r Registry) -> LoadAll<'de, 'r> {
    Codec::new(registry).load_all(text)
}
