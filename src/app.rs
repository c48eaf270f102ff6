use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{task::JoinHandle, time::timeout};

use crate::{
    api::{ChatSession, GuardianClient},
    config::AppConfig,
    db::{self, stats::StatsRepository},
    domain::EmailRecord,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    messenger::{self, Messenger, Reply, Request},
    page::{Page, PageId, PageRegistry},
    tasks::scanner::ScanService,
};

pub struct GuardianApp {
    config: Arc<AppConfig>,
    http: Client,
    client: GuardianClient,
    registry: Arc<PageRegistry>,
    messenger: Messenger,
    scanner_handle: JoinHandle<()>,
    stats: StatsRepository,
    shutdown: Shutdown,
    page_ids: Vec<PageId>,
    _paths: ResolvedPaths,
}

impl GuardianApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path).await?;
        let stats = StatsRepository::new(pool);

        let http = Client::builder()
            .user_agent(format!("phishing-guardian/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (messenger, inbox) = messenger::channel(32);
        let client = GuardianClient::new(http.clone(), config.api.clone(), messenger.clone());

        let registry = Arc::new(PageRegistry::new());
        let mut page_ids = Vec::new();
        for source in &config.pages {
            let html = tokio::fs::read_to_string(&source.snapshot_path)
                .await
                .with_context(|| {
                    format!("failed to read page snapshot {}", source.snapshot_path)
                })?;
            page_ids.push(registry.insert(Page::new(&source.page_url, html)?));
        }

        tracing::debug!(data = %paths.data_dir.display(), db = %paths.db_path.display(), "storage ready");

        let scanner = Arc::new(ScanService::new(
            registry.clone(),
            client.clone(),
            stats.clone(),
        ));
        let scanner_handle = scanner.spawn(inbox, shutdown.subscribe());

        Ok(Self {
            config,
            http,
            client,
            registry,
            messenger,
            scanner_handle,
            stats,
            shutdown,
            page_ids,
            _paths: paths,
        })
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!(
            pages = self.page_ids.len(),
            api = %self.config.api.base_url,
            "phishing guardian started"
        );

        match self.messenger.request(Request::ConnectivityTest).await {
            Ok(Reply::Pong { pages }) => {
                tracing::info!(pages, "messenger connectivity verified");
            }
            Ok(other) => tracing::warn!(reply = ?other, "unexpected connectivity reply"),
            Err(err) => tracing::error!(error = %err, "messenger connectivity test failed"),
        }

        let mut last_record: Option<EmailRecord> = None;
        for id in &self.page_ids {
            match self
                .messenger
                .request(Request::ScanPage { page: id.clone() })
                .await
            {
                Ok(Reply::ScanComplete {
                    scanned: true,
                    record,
                    verdict: Some(verdict),
                }) => {
                    tracing::info!(
                        page = %id,
                        is_phishing = verdict.is_phishing,
                        confidence = verdict.confidence,
                        recommendation = %verdict.recommendation,
                        "scan complete"
                    );
                    if verdict.is_phishing {
                        if let Some(record) = &record {
                            self.maybe_report(id, record).await;
                        }
                    }
                    last_record = record.or(last_record);
                }
                Ok(Reply::ScanComplete {
                    scanned: true,
                    record,
                    verdict: None,
                }) => {
                    tracing::warn!(page = %id, "analysis unavailable; error banner shown");
                    last_record = record.or(last_record);
                }
                Ok(Reply::ScanComplete { scanned: false, .. }) => {
                    tracing::info!(page = %id, "nothing to scan");
                }
                Ok(other) => {
                    tracing::warn!(page = %id, reply = ?other, "unexpected scan reply");
                }
                Err(err) => {
                    tracing::error!(page = %id, error = %err, "scan request failed");
                }
            }
        }

        if let Some(prompt) = self.config.chat.startup_prompt.clone() {
            self.run_chat_prompt(&prompt, last_record.as_ref()).await;
        }

        match self.stats.snapshot().await {
            Ok(stats) => tracing::info!(
                total_scans = stats.total_scans,
                phish_detected = stats.phish_detected,
                "scan counters"
            ),
            Err(err) => tracing::warn!(error = %err, "failed to read scan counters"),
        }

        let mut listener = self.shutdown.subscribe();
        listener.notified().await;
        tracing::info!("shutdown signal received");

        self.finish().await;
        Ok(())
    }

    /// Submit a flagged email to the report endpoint when configured to,
    /// and only while the banner still offers the report action. Failure is
    /// surfaced as a retry prompt, never swallowed silently.
    async fn maybe_report(&self, page: &PageId, record: &EmailRecord) {
        if !self.config.report_phish {
            return;
        }
        let offers_report = self
            .registry
            .with_page(page, |p| {
                p.banner().is_some_and(|b| b.offers_action("report-email"))
            })
            .unwrap_or(false);
        if !offers_report {
            return;
        }
        match self.client.report(record).await {
            Ok(()) => tracing::info!(page = %page, "email reported; thank you for helping improve security"),
            Err(err) => {
                tracing::error!(page = %page, error = %err, "failed to report email, please try again");
            }
        }
    }

    /// Ask the assistant the configured question, grounded in the last
    /// scanned email when there is one. Chat fails soft, so this never
    /// aborts the run.
    async fn run_chat_prompt(&self, prompt: &str, record: Option<&EmailRecord>) {
        let page_url = record
            .map(|r| r.headers.url.clone())
            .or_else(|| self.page_ids.first().map(|id| id.as_str().to_string()))
            .unwrap_or_else(|| self.config.api.base_url.clone());

        let mut session = ChatSession::new(
            self.http.clone(),
            self.config.api.clone(),
            record.map(|r| r.sender.as_str()),
            &page_url,
        );
        if let Err(err) = session.load_history().await {
            tracing::debug!(error = %err, "chat history unavailable");
        }
        session.greet();

        let context = record.map(|r| r.context(self.config.chat.context_max_length));
        let turn = session.send(prompt, context.as_ref()).await;
        tracing::info!(
            session = session.session_id(),
            turns = session.transcript().len(),
            reply = %turn.text,
            "assistant replied"
        );
    }

    async fn finish(self) {
        let shutdown_timeout = Duration::from_secs(5);

        // The scan service stops once its shutdown listener fires; give it a
        // bounded window before abandoning it.
        self.shutdown.trigger();
        let mut handle = self.scanner_handle;
        match timeout(shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_panic() => {
                tracing::error!("scan service terminated by panic");
            }
            Ok(Err(_)) => {}
            Err(_) => {
                tracing::warn!(
                    target: "scanner",
                    "scan service did not stop within {:?}; aborting",
                    shutdown_timeout
                );
                handle.abort();
            }
        }

        if timeout(shutdown_timeout, self.stats.close())
            .await
            .is_err()
        {
            tracing::warn!(
                target: "db",
                "stats database did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!(pages = self.registry.len(), "phishing guardian stopped");
    }
}
