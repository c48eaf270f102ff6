use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub pages: Vec<PageSource>,
    /// Submit flagged emails to the report endpoint automatically.
    pub report_phish: bool,
}

/// Backend the pipeline talks to. One base URL covers the classify, chat and
/// report endpoints.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Cap on the email body forwarded as chat context.
    pub context_max_length: usize,
    /// Optional question sent to the assistant after the startup scans,
    /// grounded in the last extracted email.
    pub startup_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

/// A page snapshot registered and scanned at startup.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub snapshot_path: String,
    pub page_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed PAGE_SNAPSHOTS entry (expected path=url): {0}")]
    BadPageSource(String),
}
