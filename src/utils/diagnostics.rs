use serde::{Deserialize, Serialize};
use std::fmt;

/// severity level for non-fatal events reported while processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// problem with a single item; the batch still continues
    Error,
    /// suspicious but harmless, e.g. re-adding a known release
    Warning,
    /// progress or precedence decisions worth a note
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!(
                "invalid severity: {}, use 'error', 'warning' or 'info'",
                s
            )),
        }
    }
}

/// single structured diagnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// sink for non-fatal events, threaded through the calls that produce them
///
/// every record is also forwarded to `tracing` so the binary sees it in its log.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let record = Diagnostic::new(severity, message);
        match severity {
            Severity::Error => tracing::error!("{}", record.message),
            Severity::Warning => tracing::warn!("{}", record.message),
            Severity::Info => tracing::info!("{}", record.message),
        }
        self.records.push(record);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|r| r.severity == severity).count()
    }

    /// true if any record of the given severity contains `needle`
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.severity == severity && r.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_str() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("INFO".parse::<Severity>().unwrap(), Severity::Info);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_sink_collects_records() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.warn("release 1.0.0 already exists");
        diags.info("skipping prelude");

        assert_eq!(diags.records().len(), 2);
        assert_eq!(diags.count(Severity::Warning), 1);
        assert!(!diags.has_errors());
        assert!(diags.contains(Severity::Warning, "1.0.0"));
        assert_eq!(
            diags.records()[0].to_string(),
            "[WARN] release 1.0.0 already exists"
        );
    }
}
