use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub severity: Severity,
    /// Jour du planning concerné, s'il y en a un.
    pub date: Option<NaiveDate>,
    pub message: String,
}

/// Journal horodaté d'une génération ; chaque entrée est aussi émise via `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn info(&mut self, date: Option<NaiveDate>, message: impl Into<String>) {
        self.record(Severity::Info, date, message.into());
    }

    pub fn warn(&mut self, date: Option<NaiveDate>, message: impl Into<String>) {
        self.record(Severity::Warning, date, message.into());
    }

    pub fn error(&mut self, date: Option<NaiveDate>, message: impl Into<String>) {
        self.record(Severity::Error, date, message.into());
    }

    fn record(&mut self, severity: Severity, date: Option<NaiveDate>, message: String) {
        let day = date.map(|d| d.to_string()).unwrap_or_default();
        match severity {
            Severity::Info => tracing::info!(date = %day, "{message}"),
            Severity::Warning => tracing::warn!(date = %day, "{message}"),
            Severity::Error => tracing::error!(date = %day, "{message}"),
        }
        self.entries.push(JournalEntry {
            at: Utc::now(),
            severity,
            date,
            message,
        });
    }
}
