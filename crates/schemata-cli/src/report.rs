//! Check report (check-report.json)

use serde::{Deserialize, Serialize};

/// Report format version
pub const REPORT_VERSION: u32 = 1;

/// Summary statistics for a check run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Files read
    pub files: usize,

    /// Documents loaded, valid or not
    pub documents: usize,

    /// Documents that loaded and validated
    pub valid: usize,

    /// Documents or files that failed
    pub failed: usize,
}

/// A single failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub file: String,

    /// 1-based document number, absent when the whole file failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<usize>,

    pub message: String,
}

/// Result of a check run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub version: u32,

    /// Timestamp (RFC 3339)
    pub timestamp: String,

    pub summary: CheckSummary,

    pub failures: Vec<Failure>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self {
            version: REPORT_VERSION,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: CheckSummary::default(),
            failures: Vec::new(),
        }
    }

    /// Record a validated document
    pub fn add_valid(&mut self) {
        self.summary.documents += 1;
        self.summary.valid += 1;
    }

    /// Record a failure; `document` is `None` for file-level errors
    pub fn add_failure(&mut self, file: impl Into<String>, document: Option<usize>, message: impl Into<String>) {
        if document.is_some() {
            self.summary.documents += 1;
        }
        self.summary.failed += 1;
        self.failures.push(Failure {
            file: file.into(),
            document,
            message: message.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for CheckReport {
    fn default() -> Self {
        Self::new()
    }
}
