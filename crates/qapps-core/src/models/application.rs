use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Q Business application as returned by the list call, optionally
/// enriched by the detail call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub identity_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Customer managed KMS key, `None` when the service-owned key is used
    pub encryption_key_ref: Option<String>,
}

impl Application {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: None,
            identity_type: None,
            created_at: None,
            updated_at: None,
            encryption_key_ref: None,
        }
    }

    /// Display name, falling back to the id when the application is unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Fill fields missing from `self` with values from a detail record.
    ///
    /// Fields already present on the summary win; the detail call only adds.
    pub fn merge_detail(mut self, detail: Application) -> Self {
        self.name = self.name.or(detail.name);
        self.status = self.status.or(detail.status);
        self.identity_type = self.identity_type.or(detail.identity_type);
        self.created_at = self.created_at.or(detail.created_at);
        self.updated_at = self.updated_at.or(detail.updated_at);
        self.encryption_key_ref = self.encryption_key_ref.or(detail.encryption_key_ref);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_id() {
        let app = Application::new("app-1");
        assert_eq!(app.display_name(), "app-1");

        let named = Application {
            name: Some("Sales".to_string()),
            ..Application::new("app-1")
        };
        assert_eq!(named.display_name(), "Sales");
    }

    #[test]
    fn merge_detail_keeps_summary_fields() {
        let summary = Application {
            name: Some("Sales".to_string()),
            status: Some("ACTIVE".to_string()),
            ..Application::new("app-1")
        };
        let detail = Application {
            name: Some("Renamed".to_string()),
            encryption_key_ref: Some("arn:aws:kms:us-east-1:123:key/abc".to_string()),
            ..Application::new("app-1")
        };

        let merged = summary.merge_detail(detail);
        assert_eq!(merged.name.as_deref(), Some("Sales"));
        assert_eq!(merged.status.as_deref(), Some("ACTIVE"));
        assert_eq!(
            merged.encryption_key_ref.as_deref(),
            Some("arn:aws:kms:us-east-1:123:key/abc")
        );
    }
}
