use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Queued,
    InProgress,
    Completed,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Queued => "queued",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
            ItemStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Cancelled)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of work in the queue.
///
/// Serialized with camelCase keys; absent optional fields are left out of the
/// document entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Documents written before statuses existed carry no `status`; those
    /// records load as queued.
    #[serde(default, deserialize_with = "status_or_queued")]
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeue_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requeued_by: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_created_at(title, description, Utc::now())
    }

    pub fn with_created_at(
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_item_id(),
            title: title.into(),
            description: description.into(),
            status: ItemStatus::Queued,
            created_at,
            claimed_at: None,
            claimed_by: None,
            claim_token: None,
            completed_at: None,
            completed_by: None,
            result: None,
            cancelled_at: None,
            working_dir: None,
            requeue_reason: None,
            requeued_by: None,
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_string_lossy().to_string());
        self
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn new_claim_token() -> String {
    Uuid::new_v4().to_string()
}

/// First eight characters of an identifier, or the whole thing if shorter.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn status_or_queued<'de, D>(deserializer: D) -> Result<ItemStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ItemStatus>::deserialize(deserializer)?.unwrap_or_default())
}
