use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The classifier's structured judgment on one email. Produced solely by the
/// remote endpoint; never derived or cached locally beyond the banner that
/// displays it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub is_phishing: bool,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    pub recommendation: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One turn of a chat session transcript.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Process-wide scan counters, persisted across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    pub total_scans: i64,
    pub phish_detected: i64,
    pub last_scan: Option<DateTime<Utc>>,
}
