use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stamped onto every export row of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub retrieval_timestamp: DateTime<Utc>,
    pub region: String,
    pub account_id: Option<String>,
}
