use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const IN_PROGRESS: &str = "InProgress";

/// A row from the `ingestions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingestion {
    pub id: String,
    pub process_id: String,
    pub status: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerIngestion {
    pub message: String,
}

/// A row from the `documents` table.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub document_title: String,
    pub document_url: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument {
    pub document_title: String,
    pub document_url: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocument {
    pub document_title: Option<String>,
    pub document_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_serializes_camel_case() {
        let now = Utc::now();
        let record = Ingestion {
            id: "a".into(),
            process_id: "42".into(),
            status: IN_PROGRESS.into(),
            payload: "hello".into(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["processId"], "42");
        assert_eq!(json["status"], "InProgress");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("process_id").is_none());
    }

    #[test]
    fn test_create_document_accepts_camel_case() {
        let dto: CreateDocument =
            serde_json::from_str(r#"{"documentTitle":"Q3 report","userId":"u-1"}"#).unwrap();

        assert_eq!(dto.document_title, "Q3 report");
        assert_eq!(dto.document_url, None);
        assert_eq!(dto.user_id.as_deref(), Some("u-1"));
    }
}
