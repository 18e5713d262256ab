//! Schemata Core
//!
//! Declarative, typed object schemas with field validation, defaults and
//! type regularization. Schemas are declared once at startup, registered
//! under stable tags, and instances are validated against them at runtime.
//! The on-disk codec lives in `schemata-yaml`.

pub mod config;
pub mod error;
pub mod field;
pub mod object;
pub mod registry;
pub mod schema;
pub mod time;
pub mod value;

mod coerce;

pub use config::{BannerConfig, Config, ConfigError, TimestampConfig};
pub use error::{ArgumentError, SchemaError, ValidationError};
pub use field::{Field, Kind, Validation};
pub use object::Object;
pub use registry::{Registry, DEFAULT_TAG_PREFIX};
pub use schema::{Schema, SchemaBuilder};
pub use value::Value;
