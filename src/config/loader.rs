use std::env;

use super::env::{
    ApiConfig, AppConfig, ChatConfig, ConfigError, DirectoryConfig, LoggingConfig, PageSource,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api = ApiConfig {
            base_url: env::var("API_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "http://localhost:8080/api".to_string()),
        };

        let chat = ChatConfig {
            context_max_length: env::var("CHAT_CONTEXT_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(500),
            startup_prompt: env::var("CHAT_PROMPT").ok().filter(|v| !v.is_empty()),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "guardian.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let pages = match env::var("PAGE_SNAPSHOTS") {
            Ok(raw) => parse_page_sources(&raw)?,
            Err(_) => Vec::new(),
        };

        let report_phish = env::var("REPORT_PHISHING")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api,
            chat,
            directories,
            logging,
            pages,
            report_phish,
        })
    }
}

/// `PAGE_SNAPSHOTS` is a `;`-separated list of `path=url` pairs: the HTML
/// snapshot on disk and the page URL it was captured from.
fn parse_page_sources(raw: &str) -> Result<Vec<PageSource>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (path, url) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::BadPageSource(entry.to_string()))?;
            Ok(PageSource {
                snapshot_path: path.trim().to_string(),
                page_url: url.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_page_sources() {
        let sources = parse_page_sources(
            "inbox.html=https://mail.google.com/mail/u/0/; out.html=https://outlook.live.com/",
        )
        .unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].snapshot_path, "inbox.html");
        assert_eq!(sources[0].page_url, "https://mail.google.com/mail/u/0/");
        assert_eq!(sources[1].snapshot_path, "out.html");
    }

    #[test]
    fn empty_entries_are_skipped() {
        assert!(parse_page_sources("").unwrap().is_empty());
        assert!(parse_page_sources(" ; ;").unwrap().is_empty());
    }

    #[test]
    fn entry_without_separator_is_rejected() {
        assert!(parse_page_sources("inbox.html").is_err());
    }
}
