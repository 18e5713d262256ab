//! Leading comment banner of multi-document streams
//!
//! ```text
//! # schemata-format: 1
//! # schemata-model: 1
//! # schemata-producer: schemata 0.1.0
//! ```

use schemata_core::BannerConfig;

/// Version of the on-disk format written by this crate
pub const FORMAT_VERSION: &str = "1";

const FORMAT_KEY: &str = "schemata-format";
const MODEL_KEY: &str = "schemata-model";
const PRODUCER_KEY: &str = "schemata-producer";

/// Format, schema-model and producer versions recorded ahead of the first document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub format_version: String,
    pub model_version: String,
    pub producer: String,
}

impl Banner {
    /// Banner for the current format and producer
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            model_version: model_version.into(),
            producer: format!("schemata {}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Banner described by the config, `None` when disabled
    pub fn from_config(config: &BannerConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.model_version.clone()))
    }

    /// Override the producing tool
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Comment lines, each terminated by a newline
    pub fn render(&self) -> String {
        format!(
            "# {}: {}\n# {}: {}\n# {}: {}\n",
            FORMAT_KEY, self.format_version, MODEL_KEY, self.model_version, PRODUCER_KEY, self.producer
        )
    }

    /// Read the banner from the leading comment lines of a stream
    ///
    /// Returns `None` if no format line precedes the first non-comment line.
    pub fn parse(text: &str) -> Option<Self> {
        let mut format_version = None;
        let mut model_version = String::new();
        let mut producer = String::new();

        for line in text.lines() {
            let Some(comment) = line.trim_start().strip_prefix('#') else {
                break;
            };
            let Some((key, value)) = comment.split_once(':') else {
                continue;
            };

            let value = value.trim().to_string();
            match key.trim() {
                FORMAT_KEY => format_version = Some(value),
                MODEL_KEY => model_version = value,
                PRODUCER_KEY => producer = value,
                _ => {}
            }
        }

        format_version.map(|format_version| Self {
            format_version,
            model_version,
            producer,
        })
    }
}
