//! Notes: free-form text records with optional tags

use super::{impl_entity, impl_list_filters, EntityKind, Paging};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /notes`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NoteDraft {
    /// A note needs a title and some content before it is sent
    pub fn is_submittable(&self) -> bool {
        !super::is_blank(&self.title) && !super::is_blank(&self.content)
    }
}

/// Payload for `PATCH /notes/:id`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilters {
    pub paging: Paging,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Comma-separated tag list
    pub tags: Option<String>,
}

impl_entity!(Note, EntityKind::Note, NoteDraft, NotePatch, NoteFilters);

impl_list_filters!(NoteFilters, |f, params| {
    params.push_str("title", f.title.as_deref());
    params.push_str("content", f.content.as_deref());
    params.push_str("tags", f.tags.as_deref());
});
