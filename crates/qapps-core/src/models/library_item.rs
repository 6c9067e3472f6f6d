use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Q App library item belonging to one application.
///
/// The list call fills the summary fields; `title` and `description` only
/// arrive through the detail call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubApplicationItem {
    pub library_item_id: String,
    /// Owning application (foreign key)
    pub application_id: String,
    pub app_id: Option<String>,
    pub version: Option<i64>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SubApplicationItem {
    pub fn new(application_id: impl Into<String>, library_item_id: impl Into<String>) -> Self {
        Self {
            library_item_id: library_item_id.into(),
            application_id: application_id.into(),
            app_id: None,
            version: None,
            status: None,
            created_at: None,
            updated_by: None,
            updated_at: None,
            title: None,
            description: None,
        }
    }

    /// Name shown in the export: the title when known, else the library item id.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.library_item_id)
    }

    /// Overlay detail fields onto the summary record.
    ///
    /// Detail values replace summary values when present. Identity fields
    /// (`library_item_id`, `application_id`) never change.
    pub fn merge_detail(mut self, detail: SubApplicationItem) -> Self {
        self.app_id = detail.app_id.or(self.app_id);
        self.version = detail.version.or(self.version);
        self.status = detail.status.or(self.status);
        self.created_at = detail.created_at.or(self.created_at);
        self.updated_by = detail.updated_by.or(self.updated_by);
        self.updated_at = detail.updated_at.or(self.updated_at);
        self.title = detail.title.or(self.title);
        self.description = detail.description.or(self.description);
        self
    }
}

/// Usage counters attached to an item when the detail call succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub user_count: Option<i64>,
    pub owner_id: Option<String>,
    pub rating_count: Option<i64>,
    pub is_verified: Option<bool>,
    pub is_rated_by_current_user: Option<bool>,
    pub categories: Vec<String>,
}
