/// Identifier of a row in one of the content tables.
pub type RecordId = uuid::Uuid;

/// Identifier of a content plan.
pub type PlanId = uuid::Uuid;

/// Identifier of a recorded change.
pub type ChangeId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A content row as a field-name to JSON-value mapping.
pub type Record = serde_json::Map<String, serde_json::Value>;
