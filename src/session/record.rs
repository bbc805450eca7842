use chrono::{DateTime, TimeZone, Utc};

pub(crate) const KEY_TOKEN: &str = "token";
pub(crate) const KEY_SUBJECT: &str = "username";
pub(crate) const KEY_ISSUED_AT: &str = "token_ts";

/// Credential, subject and issuance time held for the logged-in operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub credential: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new<C: Into<String>, S: Into<String>>(credential: C, subject: S, issued_at: DateTime<Utc>) -> Self {
        Self { credential: credential.into(), subject: subject.into(), issued_at }
    }

    /// Rebuild from the three stored fields. Any missing or unparsable field
    /// yields `None`: a partial record is an absent record.
    pub(crate) fn from_fields(token: Option<&String>, subject: Option<&String>, issued: Option<&String>) -> Option<Self> {
        let credential = token.filter(|t| !t.is_empty())?;
        let subject = subject?;
        let ms: i64 = issued?.trim().parse().ok()?;
        let issued_at = Utc.timestamp_millis_opt(ms).single()?;
        Some(Self { credential: credential.clone(), subject: subject.clone(), issued_at })
    }

    pub(crate) fn issued_at_field(&self) -> String { self.issued_at.timestamp_millis().to_string() }
}
