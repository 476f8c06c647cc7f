//! Append-only operations log, one JSON record per line.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bdt_core::{BusinessNeed, Company, Connection, Contact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOperation {
    CompanyCreated,
    CompanyDeleted,
    ContactCreated,
    BusinessNeedCreated,
    ConnectionCreated,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::CompanyCreated => "COMPANY_CREATED",
            AuditOperation::CompanyDeleted => "COMPANY_DELETED",
            AuditOperation::ContactCreated => "CONTACT_CREATED",
            AuditOperation::BusinessNeedCreated => "BUSINESS_NEED_CREATED",
            AuditOperation::ConnectionCreated => "CONNECTION_CREATED",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record. Written once and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: AuditOperation,
    pub subject_id: String,
    pub subject_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Deletion reason, or the free-form note given on creation.
    #[serde(default)]
    pub note: String,
    /// Full copy of the record at the time of the operation.
    #[serde(default)]
    pub snapshot: Value,
}

impl LogEntry {
    fn new(
        operation: AuditOperation,
        subject_id: impl ToString,
        subject_name: impl Into<String>,
        note: &str,
        snapshot: Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            subject_id: subject_id.to_string(),
            subject_name: subject_name.into(),
            actor: None,
            note: note.to_string(),
            snapshot,
        }
    }

    pub fn company_created(company: &Company, note: &str) -> Self {
        Self::new(
            AuditOperation::CompanyCreated,
            company.id,
            company.name.clone(),
            note,
            snapshot(company),
        )
    }

    pub fn company_deleted(company: &Company, reason: &str, actor: &str) -> Self {
        let mut entry = Self::new(
            AuditOperation::CompanyDeleted,
            company.id,
            company.name.clone(),
            reason,
            snapshot(company),
        );
        entry.actor = Some(actor.to_string());
        entry
    }

    pub fn contact_created(contact: &Contact, note: &str) -> Self {
        Self::new(
            AuditOperation::ContactCreated,
            contact.id,
            contact.name.clone(),
            note,
            snapshot(contact),
        )
    }

    pub fn business_need_created(need: &BusinessNeed, note: &str) -> Self {
        Self::new(
            AuditOperation::BusinessNeedCreated,
            need.id,
            need.title.clone(),
            note,
            snapshot(need),
        )
    }

    pub fn connection_created(connection: &Connection, note: &str) -> Self {
        Self::new(
            AuditOperation::ConnectionCreated,
            connection.id,
            format!("{} -> {}", connection.from_entity, connection.to_entity),
            note,
            snapshot(connection),
        )
    }
}

impl LogEntry {
    /// `needle` must already be lowercase.
    fn mentions(&self, needle: &str) -> bool {
        let hit = |text: &str| text.to_lowercase().contains(needle);
        hit(self.operation.as_str())
            || hit(&self.subject_id)
            || hit(&self.subject_name)
            || self.actor.as_deref().is_some_and(hit)
            || hit(&self.note)
            || value_mentions(&self.snapshot, needle)
    }
}

fn value_mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Bool(_) | Value::Number(_) => value.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|v| value_mentions(v, needle)),
        Value::Object(fields) => fields.values().any(|v| value_mentions(v, needle)),
    }
}

fn snapshot<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_event(&self, entry: &LogEntry) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> anyhow::Result<Vec<LogEntry>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading audit log {}", self.path.display()));
            }
        };

        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(line = index + 1, error = %err, "skipping malformed audit line"),
            }
        }
        Ok(entries)
    }

    /// The last `limit` entries, oldest first.
    pub async fn recent(&self, limit: usize) -> anyhow::Result<Vec<LogEntry>> {
        let entries = self.read_entries().await?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }

    /// Entries with a field value containing `term`, ignoring case. Field
    /// names are not searched.
    pub async fn search(&self, term: &str) -> anyhow::Result<Vec<LogEntry>> {
        let needle = term.to_lowercase();
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.mentions(&needle))
            .collect())
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn record_event(&self, entry: &LogEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry).context("serializing audit entry")?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating audit directory {}", parent.display()))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("appending to audit log {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing audit log {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdt_core::{NeedType, Sector};
    use tempfile::tempdir;

    #[tokio::test]
    async fn entries_append_and_read_back_in_order() {
        let dir = tempdir().expect("tempdir");
        let log = AuditLog::new(dir.path().join("ops.log"));
        let acme = Company::new("Acme").with_sector(Sector::Retail);
        let need = BusinessNeed::new("Acme", "Find a supplier", NeedType::PreSaleAction);

        log.record_event(&LogEntry::company_created(&acme, "imported"))
            .await
            .expect("record company");
        log.record_event(&LogEntry::business_need_created(&need, ""))
            .await
            .expect("record need");
        log.record_event(&LogEntry::company_deleted(&acme, "Duplicate", "Dana"))
            .await
            .expect("record deletion");

        let all = log.recent(10).await.expect("recent");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].operation, AuditOperation::CompanyCreated);
        assert_eq!(all[2].actor.as_deref(), Some("Dana"));
        assert_eq!(all[2].snapshot["sector"], "Retail");

        let last = log.recent(1).await.expect("recent one");
        assert_eq!(last, vec![all[2].clone()]);
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let dir = tempdir().expect("tempdir");
        let log = AuditLog::new(dir.path().join("ops.log"));
        log.record_event(&LogEntry::company_created(&Company::new("FinanceFlow"), ""))
            .await
            .expect("record");
        log.record_event(&LogEntry::company_created(&Company::new("Acme"), ""))
            .await
            .expect("record");

        let hits = log.search("financeflow").await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subject_name, "FinanceFlow");
        assert!(log.search("company_deleted").await.expect("search").is_empty());
    }

    #[tokio::test]
    async fn search_skips_field_names() {
        let dir = tempdir().expect("tempdir");
        let log = AuditLog::new(dir.path().join("ops.log"));
        let company = Company::new("Acme").with_description("Cloud tooling");
        log.record_event(&LogEntry::company_created(&company, "met at expo"))
            .await
            .expect("record");

        for field in ["name", "note", "snapshot", "subject_name", "created_date"] {
            assert!(
                log.search(field).await.expect("search").is_empty(),
                "`{field}` matched a field name"
            );
        }
        assert_eq!(log.search("EXPO").await.expect("search").len(), 1);
        assert_eq!(log.search("cloud").await.expect("search").len(), 1);
        assert_eq!(log.search("company_created").await.expect("search").len(), 1);
    }

    #[tokio::test]
    async fn missing_log_reads_empty_and_bad_lines_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ops.log");
        let log = AuditLog::new(&path);
        assert!(log.recent(5).await.expect("recent").is_empty());

        log.record_event(&LogEntry::company_created(&Company::new("Acme"), ""))
            .await
            .expect("record");
        let mut text = std::fs::read_to_string(&path).expect("read log");
        text.push_str("=== not json ===\n");
        std::fs::write(&path, text).expect("write log");

        assert_eq!(log.recent(5).await.expect("recent").len(), 1);
    }
}
