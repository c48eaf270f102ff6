use chrono::{DateTime, Utc};
use serde::Serialize;

/// One extracted email, normalized from the live page. Built fresh on every
/// scan and never mutated afterwards; the wire shape matches what the
/// classify and report endpoints expect.
#[derive(Debug, Clone, Serialize)]
pub struct EmailRecord {
    pub subject: String,
    pub sender: String,
    pub body: String,
    pub headers: EmailHeaders,
    /// Extraction instant, unix milliseconds.
    pub timestamp: i64,
}

/// Page-level metadata attached to every record.
#[derive(Debug, Clone, Serialize)]
pub struct EmailHeaders {
    pub url: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
}

/// Truncated snapshot of a record sent along with chat messages so the
/// assistant can ground its reply without receiving the full body.
#[derive(Debug, Clone, Serialize)]
pub struct EmailContext {
    pub subject: String,
    pub sender: String,
    pub body: String,
}

impl EmailRecord {
    pub fn new(subject: String, sender: String, body: String, url: &str, provider: &str) -> Self {
        let now = Utc::now();
        Self {
            subject,
            sender,
            body,
            headers: EmailHeaders {
                url: url.to_string(),
                provider: provider.to_string(),
                timestamp: now,
            },
            timestamp: now.timestamp_millis(),
        }
    }

    /// True when nothing readable was found on the page. Records in this
    /// state must never reach the classifier.
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.sender.is_empty() && self.body.is_empty()
    }

    /// Key used to decide whether a repeated observation is the same email.
    pub fn observation_key(&self) -> (String, i64) {
        (self.subject.clone(), self.timestamp)
    }

    pub fn context(&self, body_limit: usize) -> EmailContext {
        EmailContext {
            subject: self.subject.clone(),
            sender: self.sender.clone(),
            body: self.body.chars().take(body_limit).collect(),
        }
    }
}
