//! Process-scoped page registry.
//!
//! One [`Page`] per observed webmail document: its identity, the raw HTML
//! snapshot, the at-most-one attached banner, and the last observation key
//! used to tell repeated scans of the same email apart from new ones. The
//! registry is created once at startup and passed by reference to every
//! component; there is no ambient global state.

use std::collections::HashMap;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use url::Url;

use crate::{domain::EmailRecord, render::Banner};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub struct Page {
    pub url: String,
    pub hostname: String,
    pub html: String,
    banner: Option<Banner>,
    last_observed: Option<(String, i64)>,
}

impl Page {
    pub fn new(url: &str, html: String) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("invalid page url {url}"))?;
        let hostname = parsed
            .host_str()
            .with_context(|| format!("page url {url} has no host"))?
            .to_string();
        Ok(Self {
            url: url.to_string(),
            hostname,
            html,
            banner: None,
            last_observed: None,
        })
    }

    /// Attach a banner, detaching any previous one first. At most one banner
    /// is ever attached to a page.
    pub fn attach_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    pub fn detach_banner(&mut self) -> Option<Banner> {
        self.banner.take()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Record an observation and report whether it differs from the last one
    /// by (subject, extraction instant).
    pub fn note_observation(&mut self, record: &EmailRecord) -> bool {
        let key = record.observation_key();
        let is_new = self.last_observed.as_ref() != Some(&key);
        self.last_observed = Some(key);
        is_new
    }
}

#[derive(Default)]
pub struct PageRegistry {
    pages: Mutex<HashMap<PageId, Page>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page under its URL; replaces any earlier snapshot of the
    /// same page.
    pub fn insert(&self, page: Page) -> PageId {
        let id = PageId(page.url.clone());
        self.pages.lock().insert(id.clone(), page);
        id
    }

    /// Run `f` against a registered page. The lock is released before this
    /// returns, so the closure must not block or await.
    pub fn with_page<R>(&self, id: &PageId, f: impl FnOnce(&mut Page) -> R) -> Option<R> {
        self.pages.lock().get_mut(id).map(f)
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }
}
