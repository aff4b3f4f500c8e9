//! UTC instants stamped on activities and escalations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized as RFC 3339, which is what channels send in `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// `2024-01-15 10:30:00`, printed on threshold transcripts.
    pub fn to_transcript_string(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// `January 15, 2024 10:30 AM`, printed on submitted forms.
    pub fn to_submission_string(&self) -> String {
        self.0.format("%B %d, %Y %I:%M %p").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
            .into()
    }

    #[test]
    fn channel_timestamps_round_trip() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(ts, fixed());
        assert!(serde_json::to_string(&ts).unwrap().contains("2024-01-15T10:30:00"));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T12:30:00+02:00\"").unwrap();
        assert_eq!(ts, fixed());
    }

    #[test]
    fn transcript_and_submission_formats() {
        assert_eq!(fixed().to_transcript_string(), "2024-01-15 10:30:00");
        assert_eq!(fixed().to_submission_string(), "January 15, 2024 10:30 AM");
    }

    #[test]
    fn display_is_rfc3339() {
        assert_eq!(fixed().to_string(), "2024-01-15T10:30:00+00:00");
    }
}
