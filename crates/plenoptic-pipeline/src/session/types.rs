//! Session bookkeeping: metadata, operation log and export records.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// From `ProblemType::name()`.
    pub problem_type: String,
    pub schema_version: u32,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub last_modified: u64,
    pub description: Option<String>,
}

impl SessionMetadata {
    pub fn new(problem_type: impl Into<String>, schema_version: u32) -> Self {
        let now = current_timestamp();
        Self {
            problem_type: problem_type.into(),
            schema_version,
            created_at: now,
            last_modified: now,
            description: None,
        }
    }

    pub fn with_description(
        problem_type: impl Into<String>,
        schema_version: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::new(problem_type, schema_version)
        }
    }

    pub fn touch(&mut self) {
        self.last_modified = current_timestamp();
    }
}

/// One step run recorded on a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: u64,
    /// Step name, e.g. `prepare_scene`.
    pub operation: String,
    pub success: bool,
    /// Informational note or error message.
    pub notes: Option<String>,
}

impl LogEntry {
    fn record(operation: impl Into<String>, success: bool, notes: String) -> Self {
        Self {
            timestamp: current_timestamp(),
            operation: operation.into(),
            success,
            notes: Some(notes),
        }
    }

    pub fn success_with_notes(operation: impl Into<String>, notes: impl Into<String>) -> Self {
        Self::record(operation, true, notes.into())
    }

    pub fn failure(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self::record(operation, false, error.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord<E> {
    pub timestamp: u64,
    pub export: E,
}

impl<E> ExportRecord<E> {
    pub fn new(export: E) -> Self {
        Self {
            timestamp: current_timestamp(),
            export,
        }
    }
}

/// Seconds since the Unix epoch, or 0 if the clock is before it.
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_starts_unmodified() {
        let meta = SessionMetadata::with_description("capture", 2, "turntable");
        assert_eq!(meta.problem_type, "capture");
        assert_eq!(meta.schema_version, 2);
        assert_eq!(meta.created_at, meta.last_modified);
        assert_eq!(meta.description.as_deref(), Some("turntable"));
    }

    #[test]
    fn log_entries_carry_notes() {
        let noted = LogEntry::success_with_notes("write_metadata", "no active object");
        assert!(noted.success);
        assert_eq!(noted.notes.as_deref(), Some("no active object"));

        let failed = LogEntry::failure("start_render", "metadata missing");
        assert!(!failed.success);
        assert_eq!(failed.operation, "start_render");
    }

    #[test]
    fn export_record_roundtrips() {
        let record = ExportRecord::new(vec!["meta.json".to_string()]);
        let json = serde_json::to_string(&record).unwrap();
        let back: ExportRecord<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.export, record.export);
        assert!(back.timestamp > 0);
    }
}
