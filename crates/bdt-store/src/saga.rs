//! Company deletion as an ordered cascade.
//!
//! The audit record is written first so the snapshot survives even if a
//! later step fails. A failing audit write is logged and does not stop the
//! deletion.

use bdt_core::{Company, NeedStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{AuditSink, LogEntry};
use crate::store::DataStore;
use crate::StoreError;

pub const DEFAULT_ACTOR: &str = "System User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CascadeStep {
    RecordAudit,
    DeleteCompany,
    DeleteContacts,
    DeactivateNeeds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionReport {
    pub company: Company,
    pub completed: Vec<CascadeStep>,
    pub audit_recorded: bool,
    pub contacts_removed: usize,
    pub needs_deactivated: usize,
}

/// Deletes `company_name`, its contacts, and marks its needs inactive.
/// Returns `Ok(None)` when no such company exists. A blank reason is refused
/// before anything is touched.
pub async fn delete_company(
    store: &mut DataStore,
    audit: &dyn AuditSink,
    company_name: &str,
    reason: &str,
    actor: Option<&str>,
) -> Result<Option<DeletionReport>, StoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(StoreError::Validation(
            "a deletion reason is required".into(),
        ));
    }
    let Some(company) = store.company_by_name(company_name).cloned() else {
        return Ok(None);
    };
    let actor = actor
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ACTOR);

    let mut completed = Vec::with_capacity(4);

    let audit_recorded = match audit
        .record_event(&LogEntry::company_deleted(&company, reason, actor))
        .await
    {
        Ok(()) => {
            completed.push(CascadeStep::RecordAudit);
            true
        }
        Err(err) => {
            warn!(company = %company.name, error = %err, "audit write failed; continuing deletion");
            false
        }
    };

    let data = store.dataset_mut();

    data.companies.retain(|c| c.name != company.name);
    completed.push(CascadeStep::DeleteCompany);

    let contacts_before = data.contacts.len();
    data.contacts.retain(|c| c.company_name != company.name);
    let contacts_removed = contacts_before - data.contacts.len();
    completed.push(CascadeStep::DeleteContacts);

    let mut needs_deactivated = 0;
    for need in data
        .business_needs
        .iter_mut()
        .filter(|n| n.company_name == company.name)
    {
        need.status = NeedStatus::Inactive;
        needs_deactivated += 1;
    }
    completed.push(CascadeStep::DeactivateNeeds);

    store.save().await?;

    info!(
        company = %company.name,
        actor,
        contacts_removed,
        needs_deactivated,
        audit_recorded,
        "company deleted"
    );
    Ok(Some(DeletionReport {
        company,
        completed,
        audit_recorded,
        contacts_removed,
        needs_deactivated,
    }))
}
