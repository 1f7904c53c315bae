//! Log entry model.
//!
//! One row in `log` per ingested record, plus one row in `attribute` per
//! key/value pair. Entries are append-only: there is no update or delete.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{attribute::AttributeValue, severity::severity_number_for};
use crate::validation::{ValidationError, validate_id, validate_severity_number};

pub mod queries;
pub mod stats;

/// Column list shared by every query that materializes a [`LogEntry`].
/// Expects the `log` table to be aliased as `l`.
pub(crate) const LOG_COLUMNS: &str = "l.id, l.timestamp, l.severity_text, l.severity_number, \
     l.body, l.trace_id, l.span_id, l.service_name, l.service_version, \
     l.service_instance_id, l.host_name, l.scope_name, l.scope_version, l.created_at";

/// Stored timestamp format. Fixed width, so text order equals time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Encode a timestamp the way the `log` table stores it.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A stored log entry with its attributes.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LogEntry {
    pub id: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    pub severity_text: String,
    pub severity_number: i64,
    pub body: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub service_instance_id: Option<String>,
    pub host_name: Option<String>,
    pub scope_name: Option<String>,
    pub scope_version: Option<String>,
    /// Filled from the `attribute` table after the row is fetched.
    #[sqlx(skip)]
    pub attributes: BTreeMap<String, AttributeValue>,
    /// When the entry was ingested.
    pub created_at: DateTime<Utc>,
}

/// Ingestion payload.
///
/// Unknown fields are ignored. Empty strings in optional fields are treated as
/// absent. Duplicate attribute keys collapse to the last occurrence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLogEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub severity_text: String,
    #[serde(default)]
    pub severity_number: Option<i64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub span_id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_version: Option<String>,
    #[serde(default)]
    pub service_instance_id: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub scope_name: Option<String>,
    #[serde(default)]
    pub scope_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// `"attributes": null` means no attributes, same as leaving the key out.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, AttributeValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl CreateLogEntry {
    /// Decode a raw request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedPayload(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.severity_text.trim().is_empty() {
            return Err(ValidationError::MissingSeverity);
        }
        if let Some(number) = self.severity_number {
            validate_severity_number(number)?;
        }
        if let Some(id) = self.id.as_deref() {
            validate_id(id)?;
        }
        if self.attributes.keys().any(|k| k.is_empty()) {
            return Err(ValidationError::EmptyAttributeKey);
        }
        Ok(())
    }

    /// Validate and fill in identity, timestamp and severity rank.
    ///
    /// `now` becomes `created_at`, and also `timestamp` when the payload has
    /// none. Timestamps are truncated to microseconds, the stored precision.
    pub fn into_log_entry(self, now: DateTime<Utc>) -> Result<LogEntry, ValidationError> {
        self.validate()?;

        let now = now.trunc_subsecs(6);
        let severity_text = self.severity_text.trim().to_string();
        let severity_number = self
            .severity_number
            .unwrap_or_else(|| severity_number_for(&severity_text));

        Ok(LogEntry {
            id: non_empty(self.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: self.timestamp.map(|t| t.trunc_subsecs(6)).unwrap_or(now),
            severity_text,
            severity_number,
            body: self.body,
            trace_id: non_empty(self.trace_id),
            span_id: non_empty(self.span_id),
            service_name: non_empty(self.service_name),
            service_version: non_empty(self.service_version),
            service_instance_id: non_empty(self.service_instance_id),
            host_name: non_empty(self.host_name),
            scope_name: non_empty(self.scope_name),
            scope_version: non_empty(self.scope_version),
            attributes: self.attributes,
            created_at: now,
        })
    }
}

impl LogEntry {
    /// Write the entry and its attributes on `conn`.
    ///
    /// The caller owns the transaction; a failure part-way leaves rows behind
    /// until it rolls back.
    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        entry: &LogEntry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO log (
                id, timestamp, severity_text, severity_number, body,
                trace_id, span_id, service_name, service_version, service_instance_id,
                host_name, scope_name, scope_version, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(&entry.id)
        .bind(encode_timestamp(&entry.timestamp))
        .bind(&entry.severity_text)
        .bind(entry.severity_number)
        .bind(&entry.body)
        .bind(&entry.trace_id)
        .bind(&entry.span_id)
        .bind(&entry.service_name)
        .bind(&entry.service_version)
        .bind(&entry.service_instance_id)
        .bind(&entry.host_name)
        .bind(&entry.scope_name)
        .bind(&entry.scope_version)
        .bind(encode_timestamp(&entry.created_at))
        .execute(&mut *conn)
        .await?;

        for (key, value) in &entry.attributes {
            sqlx::query(
                "INSERT INTO attribute (log_id, key, value, value_type) VALUES ($1, $2, $3, $4)",
            )
            .bind(&entry.id)
            .bind(key)
            .bind(value.to_stored())
            .bind(value.kind().as_str())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(json: &str) -> CreateLogEntry {
        CreateLogEntry::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_defaults_are_assigned() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = payload(r#"{"severity_text":"INFO","body":"hello"}"#)
            .into_log_entry(now)
            .unwrap();

        assert!(Uuid::parse_str(&entry.id).is_ok());
        assert_eq!(entry.timestamp, now);
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.severity_number, 9);
        assert!(entry.attributes.is_empty());
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let now = Utc::now();
        let entry = payload(
            r#"{"id":"abc","timestamp":"2024-02-03T04:05:06+02:00","severity_text":"WARN",
                "severity_number":15,"body":"x","service_name":"api","host_name":""}"#,
        )
        .into_log_entry(now)
        .unwrap();

        assert_eq!(entry.id, "abc");
        assert_eq!(
            entry.timestamp,
            Utc.with_ymd_and_hms(2024, 2, 3, 2, 5, 6).unwrap()
        );
        assert_eq!(entry.severity_number, 15);
        assert_eq!(entry.service_name.as_deref(), Some("api"));
        assert_eq!(entry.host_name, None);
    }

    #[test]
    fn test_empty_id_means_absent() {
        let entry = payload(r#"{"id":"","severity_text":"INFO"}"#)
            .into_log_entry(Utc::now())
            .unwrap();
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_duplicate_attribute_keys_last_wins() {
        let create = payload(r#"{"severity_text":"INFO","attributes":{"k":"first","k":"second"}}"#);
        assert_eq!(
            create.attributes.get("k"),
            Some(&AttributeValue::String("second".into()))
        );
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            CreateLogEntry::from_json(b"not json"),
            Err(ValidationError::MalformedPayload(_))
        ));
        assert!(matches!(
            CreateLogEntry::from_json(br#"{"severity_number":"high"}"#),
            Err(ValidationError::MalformedPayload(_))
        ));
        assert_eq!(
            payload(r#"{"severity_text":"   "}"#).validate(),
            Err(ValidationError::MissingSeverity)
        );
        assert_eq!(
            payload(r#"{"severity_text":"INFO","severity_number":99}"#).validate(),
            Err(ValidationError::InvalidSeverityNumber(99))
        );
        assert_eq!(
            payload(r#"{"severity_text":"INFO","attributes":{"":"x"}}"#).validate(),
            Err(ValidationError::EmptyAttributeKey)
        );
        let long_id = format!(r#"{{"severity_text":"INFO","id":"{}"}}"#, "x".repeat(129));
        assert_eq!(
            payload(&long_id).validate(),
            Err(ValidationError::IdTooLong(129))
        );
    }

    #[test]
    fn test_null_attributes_are_empty() {
        let entry = payload(r#"{"severity_text":"INFO","body":"x","attributes":null}"#);
        assert!(entry.attributes.is_empty());
        assert_eq!(entry.validate(), Ok(()));

        let entry = payload(r#"{"severity_text":"INFO","body":"x"}"#);
        assert!(entry.attributes.is_empty());
    }

    #[test]
    fn test_encode_timestamp_is_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(encode_timestamp(&ts), "2024-02-01T00:00:00.000000Z");
    }
}
