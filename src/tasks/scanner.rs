//! The scan service: serves messenger requests until shutdown.
//!
//! One scan is one straight pass through the pipeline: registry lookup →
//! provider resolve → extract → loading banner → classify → result or error
//! banner. There is no concurrent-scan protection and no cancellation; two
//! racing scans both run to completion, the later render wins visually and
//! both stats updates apply.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    api::GuardianClient,
    db::stats::StatsRepository,
    domain::{EmailRecord, ScanStats},
    extractor,
    infrastructure::shutdown::ShutdownListener,
    messenger::{Inbox, Reply, ReplySlot, Request},
    page::{PageId, PageRegistry},
    providers::{self, ProviderProfile},
    render::{self, BannerState},
};

pub struct ScanService {
    registry: Arc<PageRegistry>,
    client: GuardianClient,
    stats: StatsRepository,
}

impl ScanService {
    pub fn new(registry: Arc<PageRegistry>, client: GuardianClient, stats: StatsRepository) -> Self {
        Self {
            registry,
            client,
            stats,
        }
    }

    pub fn spawn(self: Arc<Self>, mut inbox: Inbox, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = inbox.recv() => match received {
                        Some((request, slot)) => self.handle(request, slot).await,
                        None => break,
                    },
                    _ = shutdown.notified() => break,
                }
            }
            info!(target: "scanner", "scan service stopped");
        })
    }

    async fn handle(&self, request: Request, slot: ReplySlot) {
        match request {
            Request::ScanPage { page } => slot.respond(self.scan(&page).await),
            Request::UpdateStats { is_phish } => {
                let stats = match self.stats.record_scan(is_phish).await {
                    Ok(stats) => stats,
                    Err(err) => {
                        error!(target: "scanner", error = %err, "failed to persist scan stats");
                        ScanStats::default()
                    }
                };
                slot.respond(Reply::StatsUpdated { stats });
            }
            Request::ConnectivityTest => slot.respond(Reply::Pong {
                pages: self.registry.len(),
            }),
        }
    }

    async fn scan(&self, page: &PageId) -> Reply {
        let prepared = self.registry.with_page(page, prepare_scan);

        let (profile, record) = match prepared {
            Some(Some(found)) => found,
            Some(None) => {
                // Unsupported provider or nothing readable: silent no-op.
                info!(target: "scanner", page = %page, "no scannable email on page");
                return no_scan();
            }
            None => {
                warn!(target: "scanner", page = %page, "scan requested for unknown page");
                return no_scan();
            }
        };

        self.registry
            .with_page(page, |p| render::show(p, profile, BannerState::Loading));

        match self.client.classify(&record).await {
            Ok(verdict) => {
                info!(
                    target: "scanner",
                    page = %page,
                    is_phishing = verdict.is_phishing,
                    confidence = verdict.confidence,
                    "classification complete"
                );
                self.registry.with_page(page, |p| {
                    render::show(p, profile, BannerState::Result(verdict.clone()));
                    if let Some(banner) = p.banner() {
                        debug!(
                            target: "scanner",
                            kind = ?banner.kind(),
                            insertion = ?banner.insertion(),
                            bytes = banner.html().len(),
                            "banner attached"
                        );
                    }
                });
                Reply::ScanComplete {
                    scanned: true,
                    record: Some(record),
                    verdict: Some(verdict),
                }
            }
            Err(err) => {
                warn!(target: "scanner", page = %page, error = %err, "classification failed");
                self.registry
                    .with_page(page, |p| render::show(p, profile, BannerState::Error));
                Reply::ScanComplete {
                    scanned: true,
                    record: Some(record),
                    verdict: None,
                }
            }
        }
    }
}

/// Synchronous half of a scan, run under the registry lock: resolve the
/// provider, extract, and note the observation for new-email detection.
fn prepare_scan(page: &mut crate::page::Page) -> Option<(&'static ProviderProfile, EmailRecord)> {
    let profile = providers::resolve(&page.hostname)?;
    let record = extractor::extract(profile, page)?;
    let is_new = page.note_observation(&record);
    info!(
        target: "scanner",
        provider = profile.name,
        subject = %record.subject,
        is_new,
        "email extracted"
    );
    Some((profile, record))
}

fn no_scan() -> Reply {
    Reply::ScanComplete {
        scanned: false,
        record: None,
        verdict: None,
    }
}
