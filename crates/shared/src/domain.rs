use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DocumentId);

/// Identifier of the patient whose documents are being managed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Bearer token acquired once per application lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    acquired_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            acquired_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<PatientId>,
    pub filename: String,
    pub size: u64,
    #[serde(deserialize_with = "deserialize_server_timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

/// Parses an upload timestamp. Offset-less values are taken as UTC.
pub fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_server_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_server_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable size, base 1024, two decimals at most.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    let mut threshold = 1024u64;
    while exponent < SIZE_UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn formats_sizes_like_the_document_list() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }

    #[test]
    fn parses_naive_server_timestamps_as_utc() {
        let parsed = parse_server_timestamp("2024-03-05T10:20:30.123456").expect("naive");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.second(), 30);
    }

    #[test]
    fn parses_offset_timestamps() {
        let parsed = parse_server_timestamp("2024-03-05T10:20:30+02:00").expect("rfc3339");
        assert_eq!(parsed.hour(), 8);
        assert!(parse_server_timestamp("yesterday").is_none());
    }

    #[test]
    fn document_entry_accepts_server_payload() {
        let entry: DocumentEntry = serde_json::from_value(serde_json::json!({
            "id": 4,
            "patient_id": "patient-123",
            "filename": "scan.pdf",
            "size": 2048,
            "uploaded_at": "2024-03-05T10:20:30"
        }))
        .expect("entry");
        assert_eq!(entry.id, DocumentId(4));
        assert_eq!(entry.patient_id, Some(PatientId::from("patient-123")));
        assert_eq!(entry.size, 2048);
    }

    #[test]
    fn credential_debug_hides_token() {
        let credential = Credential::new("secret-token");
        assert!(!format!("{credential:?}").contains("secret-token"));
        assert_eq!(credential.token(), "secret-token");
    }

    #[test]
    fn blank_patient_id_is_empty() {
        assert!(PatientId::from("  ").is_empty());
        assert!(!PatientId::from("patient-123").is_empty());
    }
}
