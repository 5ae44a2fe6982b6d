//! Audit log entries written by the backend on every mutation (read-only)

use super::{EntityKind, Paging};
use crate::api::query::QueryParams;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

impl FromStr for LogAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("Unknown log action: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub user_id: String,
    pub action: LogAction,
    pub entity_type: EntityKind,
    pub entity_id: String,
    /// Record snapshots are kept untyped; nested timestamps are normalized
    /// to RFC 3339 text by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilters {
    pub paging: Paging,
    pub user_id: Option<String>,
    pub action: Option<LogAction>,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl LogFilters {
    pub(crate) fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push("page", self.paging.page);
        params.push("limit", self.paging.limit);
        params.push_str("userId", self.user_id.as_deref());
        params.push("action", self.action);
        params.push("entityType", self.entity_type);
        params.push_str("entityId", self.entity_id.as_deref());
        params.push_date("startDate", self.start_date);
        params.push_date("endDate", self.end_date);
        params
    }
}
