//! The JSON data file and the in-memory dataset it holds.
//!
//! Every mutation is written back immediately through a temp file and an
//! atomic rename, so a crash mid-write leaves the previous file intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bdt_connect::{append_note, schedule_follow_up, transition};
use bdt_core::{
    BusinessNeed, Company, Connection, ConnectionStatus, Contact, FollowUpTask, NeedStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::StoreError;

const SAMPLE_DATA: &str = include_str!("../fixtures/sample_data.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub business_needs: Vec<BusinessNeed>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUpTask>,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub companies: usize,
    pub contacts: usize,
    pub business_needs: usize,
    pub connections: usize,
}

/// Record counts shown at the top of the stats dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetTotals {
    pub companies: usize,
    pub contacts: usize,
    pub active_needs: usize,
    pub connections: usize,
}

#[derive(Debug)]
pub struct DataStore {
    path: PathBuf,
    data: Dataset,
}

impl DataStore {
    /// Loads the data file. A missing file starts an empty dataset. A file
    /// that fails to parse is renamed to `<file>.corrupt-<timestamp>` before
    /// starting empty, so the next save never overwrites it.
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<Dataset>(&text) {
                Ok(data) => data,
                Err(err) => {
                    let moved_to = quarantine(&path, Utc::now()).await?;
                    warn!(
                        path = %path.display(),
                        moved_to = %moved_to.display(),
                        error = %err,
                        "data file unreadable; moved aside and starting empty"
                    );
                    Dataset::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Dataset::default(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading data file {}", path.display()));
            }
        };
        debug!(
            path = %path.display(),
            companies = data.companies.len(),
            connections = data.connections.len(),
            "opened data store"
        );
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    pub(crate) fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.data
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.data).context("serializing dataset")?;
        write_atomic(&self.path, &bytes).await
    }

    // Companies

    pub fn companies(&self) -> &[Company] {
        &self.data.companies
    }

    pub fn company_by_id(&self, id: Uuid) -> Option<&Company> {
        self.data.companies.iter().find(|c| c.id == id)
    }

    pub fn company_by_name(&self, name: &str) -> Option<&Company> {
        self.data.companies.iter().find(|c| c.name == name)
    }

    pub async fn add_company(&mut self, company: Company) -> Result<(), StoreError> {
        if company.name.trim().is_empty() {
            return Err(StoreError::Validation("company name is required".into()));
        }
        if self.company_by_name(&company.name).is_some() {
            return Err(StoreError::Validation(format!(
                "company `{}` already exists",
                company.name
            )));
        }
        self.data.companies.push(company);
        self.save().await?;
        Ok(())
    }

    // Contacts

    pub fn contacts(&self) -> &[Contact] {
        &self.data.contacts
    }

    pub fn contacts_for(&self, company_name: &str) -> Vec<&Contact> {
        self.data
            .contacts
            .iter()
            .filter(|c| c.company_name == company_name)
            .collect()
    }

    pub async fn add_contact(&mut self, contact: Contact) -> Result<(), StoreError> {
        if contact.name.trim().is_empty() || contact.email.trim().is_empty() {
            return Err(StoreError::Validation(
                "contact name and email are required".into(),
            ));
        }
        self.data.contacts.push(contact);
        self.save().await?;
        Ok(())
    }

    pub async fn delete_contact(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let before = self.data.contacts.len();
        self.data.contacts.retain(|c| c.id != id);
        if self.data.contacts.len() == before {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    // Business needs

    pub fn business_needs(&self) -> &[BusinessNeed] {
        &self.data.business_needs
    }

    pub fn active_needs(&self) -> Vec<&BusinessNeed> {
        self.data
            .business_needs
            .iter()
            .filter(|n| n.is_active())
            .collect()
    }

    pub fn business_need_by_id(&self, id: Uuid) -> Option<&BusinessNeed> {
        self.data.business_needs.iter().find(|n| n.id == id)
    }

    pub async fn add_business_need(&mut self, need: BusinessNeed) -> Result<(), StoreError> {
        if need.title.trim().is_empty() || need.company_name.trim().is_empty() {
            return Err(StoreError::Validation(
                "business need title and company are required".into(),
            ));
        }
        self.data.business_needs.push(need);
        self.save().await?;
        Ok(())
    }

    pub async fn update_need_status(
        &mut self,
        id: Uuid,
        status: NeedStatus,
    ) -> Result<bool, StoreError> {
        let Some(need) = self.data.business_needs.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        need.status = status;
        self.save().await?;
        Ok(true)
    }

    /// Removes the need together with every connection opened for it.
    pub async fn delete_business_need(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let before = self.data.business_needs.len();
        self.data.business_needs.retain(|n| n.id != id);
        if self.data.business_needs.len() == before {
            return Ok(false);
        }
        let connections_before = self.data.connections.len();
        self.data.connections.retain(|c| c.business_need_id != id);
        debug!(
            need_id = %id,
            connections_removed = connections_before - self.data.connections.len(),
            "deleted business need"
        );
        self.save().await?;
        Ok(true)
    }

    // Connections

    pub fn connections(&self) -> &[Connection] {
        &self.data.connections
    }

    pub fn connection_by_id(&self, id: Uuid) -> Option<&Connection> {
        self.data.connections.iter().find(|c| c.id == id)
    }

    pub async fn add_connection(&mut self, connection: Connection) -> Result<(), StoreError> {
        if self.business_need_by_id(connection.business_need_id).is_none() {
            return Err(StoreError::Validation(format!(
                "business need {} does not exist",
                connection.business_need_id
            )));
        }
        self.data.connections.push(connection);
        self.save().await?;
        Ok(())
    }

    /// Swaps in an updated copy of an existing connection, matched by id.
    pub async fn replace_connection(&mut self, connection: Connection) -> Result<bool, StoreError> {
        let Some(slot) = self
            .data
            .connections
            .iter_mut()
            .find(|c| c.id == connection.id)
        else {
            return Ok(false);
        };
        *slot = connection;
        self.save().await?;
        Ok(true)
    }

    /// Parses `status` as a stage label and applies it.
    pub async fn update_connection_status(
        &mut self,
        id: Uuid,
        status: &str,
    ) -> Result<bool, StoreError> {
        let status: ConnectionStatus = status.parse()?;
        self.set_connection_status(id, status, Utc::now()).await
    }

    pub async fn set_connection_status(
        &mut self,
        id: Uuid,
        status: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(connection) = self.data.connections.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        transition(connection, status, at);
        self.save().await?;
        Ok(true)
    }

    pub async fn add_connection_note(
        &mut self,
        id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::Validation("note text is required".into()));
        }
        let Some(connection) = self.data.connections.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        append_note(connection, text.trim(), at);
        self.save().await?;
        Ok(true)
    }

    pub async fn delete_connection(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let before = self.data.connections.len();
        self.data.connections.retain(|c| c.id != id);
        if self.data.connections.len() == before {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    // Follow-ups

    pub fn follow_ups(&self) -> &[FollowUpTask] {
        &self.data.follow_ups
    }

    pub async fn schedule_follow_up(
        &mut self,
        connection_id: Uuid,
        days_from_now: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<FollowUpTask>, StoreError> {
        if days_from_now < 0 {
            return Err(StoreError::Validation(
                "follow-up cannot be scheduled in the past".into(),
            ));
        }
        if self.connection_by_id(connection_id).is_none() {
            return Ok(None);
        }
        let task = schedule_follow_up(connection_id, days_from_now, now);
        self.data.follow_ups.push(task.clone());
        self.save().await?;
        Ok(Some(task))
    }

    // Whole dataset

    pub fn totals(&self) -> DatasetTotals {
        DatasetTotals {
            companies: self.data.companies.len(),
            contacts: self.data.contacts.len(),
            active_needs: self.data.business_needs.iter().filter(|n| n.is_active()).count(),
            connections: self.data.connections.len(),
        }
    }

    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.data = Dataset::default();
        self.save().await?;
        info!(path = %self.path.display(), "cleared all data");
        Ok(())
    }

    /// Merges the bundled sample dataset, skipping records whose id is
    /// already present, so seeding twice changes nothing.
    pub async fn load_sample_data(&mut self) -> Result<SeedSummary, StoreError> {
        let sample: Dataset =
            serde_json::from_str(SAMPLE_DATA).context("parsing bundled sample data")?;
        let summary = SeedSummary {
            companies: merge_by_id(&mut self.data.companies, sample.companies, |c| c.id),
            contacts: merge_by_id(&mut self.data.contacts, sample.contacts, |c| c.id),
            business_needs: merge_by_id(
                &mut self.data.business_needs,
                sample.business_needs,
                |n| n.id,
            ),
            connections: merge_by_id(&mut self.data.connections, sample.connections, |c| c.id),
        };
        self.save().await?;
        info!(?summary, "loaded sample data");
        Ok(summary)
    }
}

fn merge_by_id<T>(existing: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> Uuid) -> usize {
    let mut added = 0;
    for item in incoming {
        let item_id = id(&item);
        if existing.iter().any(|e| id(e) == item_id) {
            continue;
        }
        existing.push(item);
        added += 1;
    }
    added
}

async fn quarantine(path: &Path, at: DateTime<Utc>) -> anyhow::Result<PathBuf> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", at.format("%Y%m%dT%H%M%S%.3f")));
    let target = path.with_file_name(name);
    fs::rename(path, &target).await.with_context(|| {
        format!(
            "moving unreadable data file {} -> {}",
            path.display(),
            target.display()
        )
    })?;
    Ok(target)
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("creating data directory {}", parent.display()))?;

    let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await
        .with_context(|| format!("opening temp data file {}", temp_path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("writing temp data file {}", temp_path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("flushing temp data file {}", temp_path.display()))?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err).with_context(|| {
            format!(
                "atomically renaming temp data file {} -> {}",
                temp_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}
