//! Applies a single structured action against the content store.
//!
//! The executor performs exactly one table mutation per call and never
//! writes history; recording the resulting change is the caller's job.

use serde::Serialize;

use crate::action::{Action, ActionKind};
use crate::error::CoreError;
use crate::store::{ContentStore, StoreError};
use crate::tables::{self, ContentTable, ID_FIELD};
use crate::types::{Record, RecordId};

/// What one successful action did to one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub table: ContentTable,
    pub record_id: RecordId,
    /// Full record before the action; `None` for creates.
    pub previous_data: Option<Record>,
    /// Full record after the action; `None` for deletes.
    pub new_data: Option<Record>,
}

pub struct ActionExecutor<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Execute `action`. Placeholders must already be resolved.
    ///
    /// The table allow-list and field names are checked before any I/O.
    pub async fn execute(&self, action: &Action) -> Result<ActionOutcome, CoreError> {
        let table: ContentTable = action.table.parse()?;
        tables::validate_fields(&action.data)?;

        match action.kind {
            ActionKind::Create => self.create(table, action).await,
            ActionKind::Update => self.update(table, action).await,
            ActionKind::Delete => self.delete(table, action).await,
        }
    }

    async fn create(&self, table: ContentTable, action: &Action) -> Result<ActionOutcome, CoreError> {
        if action.record_id.is_some() {
            return Err(CoreError::Validation(
                "Create actions must not carry a record_id".to_string(),
            ));
        }

        let missing = table.schema().missing_fields(&action.data);
        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "Missing required field(s) for {table}: {}",
                missing.join(", ")
            )));
        }

        let inserted = self.store.insert(table, action.data.clone()).await?;
        let record_id = record_id_of(&inserted)?;

        tracing::debug!(%table, %record_id, "Record created");

        Ok(ActionOutcome {
            table,
            record_id,
            previous_data: None,
            new_data: Some(inserted),
        })
    }

    async fn update(&self, table: ContentTable, action: &Action) -> Result<ActionOutcome, CoreError> {
        let record_id = required_record_id(action)?;
        if action.data.is_empty() {
            return Err(CoreError::Validation(
                "Update actions must set at least one field".to_string(),
            ));
        }

        let previous = self
            .store
            .fetch(table, record_id)
            .await?
            .ok_or_else(|| CoreError::not_found(table.as_str(), record_id))?;

        // The record can disappear between the read and the write.
        let updated = self
            .store
            .update(table, record_id, action.data.clone())
            .await?
            .ok_or_else(|| CoreError::not_found(table.as_str(), record_id))?;

        tracing::debug!(%table, %record_id, fields = action.data.len(), "Record updated");

        Ok(ActionOutcome {
            table,
            record_id,
            previous_data: Some(previous),
            new_data: Some(updated),
        })
    }

    async fn delete(&self, table: ContentTable, action: &Action) -> Result<ActionOutcome, CoreError> {
        let record_id = required_record_id(action)?;

        let previous = self
            .store
            .fetch(table, record_id)
            .await?
            .ok_or_else(|| CoreError::not_found(table.as_str(), record_id))?;

        if !self.store.delete(table, record_id).await? {
            return Err(CoreError::not_found(table.as_str(), record_id));
        }

        tracing::debug!(%table, %record_id, "Record deleted");

        Ok(ActionOutcome {
            table,
            record_id,
            previous_data: Some(previous),
            new_data: None,
        })
    }
}

fn required_record_id(action: &Action) -> Result<RecordId, CoreError> {
    action
        .record_id
        .ok_or_else(|| {
            CoreError::Validation(format!("{} actions require a record_id", action.kind))
        })?
        .concrete()
}

/// Extract the store-assigned id from a returned record.
pub fn record_id_of(record: &Record) -> Result<RecordId, CoreError> {
    record
        .get(ID_FIELD)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            CoreError::Store(StoreError::Corrupt(
                "Inserted record has no valid id".to_string(),
            ))
        })
}
