//! Verdict banner rendering.
//!
//! Four states per scan: idle, loading, result, error. Showing any state
//! first detaches the previous banner, so a page carries at most one banner
//! at a time. The banner is terminal per scan: it stays attached until
//! dismissed or replaced by the next scan's loading state.

use scraper::{Html, Selector};

use crate::{
    domain::Verdict,
    page::Page,
    providers::ProviderProfile,
};

#[derive(Debug, Clone)]
pub enum BannerState {
    Loading,
    Result(Verdict),
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Loading,
    Safe,
    Danger,
    Error,
}

/// Where the banner lands in the page, best anchor first: right before the
/// subject element, else the top of the conversation container, else the top
/// of the page body. Degrades across markup variance instead of failing the
/// scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    BeforeSubject,
    ContainerTop,
    PageTop,
}

#[derive(Debug, Clone)]
pub struct Banner {
    kind: BannerKind,
    insertion: InsertionPoint,
    html: String,
}

impl Banner {
    pub fn kind(&self) -> BannerKind {
        self.kind
    }

    pub fn insertion(&self) -> InsertionPoint {
        self.insertion
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Whether the banner markup exposes the given user action
    /// (`report-email`, `ignore-warning`, `close-banner`).
    pub fn offers_action(&self, action: &str) -> bool {
        self.html.contains(&format!("data-action=\"{action}\""))
    }
}

/// Render a state onto a page, replacing whatever banner was there before.
pub fn show(page: &mut Page, profile: &ProviderProfile, state: BannerState) {
    page.detach_banner();
    let insertion = choose_insertion(&page.html, profile);
    let (kind, html) = match state {
        BannerState::Loading => (BannerKind::Loading, loading_markup()),
        BannerState::Result(verdict) => {
            let kind = if verdict.is_phishing {
                BannerKind::Danger
            } else {
                BannerKind::Safe
            };
            (kind, result_markup(&verdict))
        }
        BannerState::Error => (BannerKind::Error, error_markup()),
    };
    page.attach_banner(Banner {
        kind,
        insertion,
        html,
    });
}

fn choose_insertion(html: &str, profile: &ProviderProfile) -> InsertionPoint {
    let doc = Html::parse_document(html);
    if any_selector_matches(&doc, profile.subject.selectors) {
        InsertionPoint::BeforeSubject
    } else if any_selector_matches(&doc, profile.container.selectors) {
        InsertionPoint::ContainerTop
    } else {
        InsertionPoint::PageTop
    }
}

fn any_selector_matches(doc: &Html, selectors: &[&str]) -> bool {
    selectors.iter().any(|raw| {
        Selector::parse(raw)
            .map(|sel| doc.select(&sel).next().is_some())
            .unwrap_or(false)
    })
}

fn loading_markup() -> String {
    "<div class=\"phishing-guardian-banner loading\">\
       <div class=\"banner-content\">\
         <div class=\"spinner\"></div>\
         <span>Analyzing email security...</span>\
       </div>\
     </div>"
        .to_string()
}

fn result_markup(verdict: &Verdict) -> String {
    let (class, icon, title) = if verdict.is_phishing {
        ("danger", "\u{26a0}\u{fe0f}", "SUSPICIOUS EMAIL DETECTED")
    } else {
        ("safe", "\u{2705}", "EMAIL APPEARS SAFE")
    };
    let confidence_pct = (verdict.confidence * 100.0).round();

    let mut html = format!(
        "<div class=\"phishing-guardian-banner {class}\">\
           <div class=\"banner-content\">\
             <div class=\"banner-header\">\
               <span class=\"banner-icon\">{icon}</span>\
               <span class=\"banner-title\">{title}</span>\
             </div>\
             <div class=\"banner-details\">\
               <p><strong>Confidence:</strong> {confidence_pct:.0}%</p>\
               <p><strong>Recommendation:</strong> {}</p>",
        escape_html(&verdict.recommendation)
    );

    if !verdict.risk_factors.is_empty() {
        html.push_str(&format!(
            "<details><summary>Risk Factors ({})</summary><ul>",
            verdict.risk_factors.len()
        ));
        for factor in &verdict.risk_factors {
            html.push_str(&format!("<li>{}</li>", escape_html(factor)));
        }
        html.push_str("</ul></details>");
    }
    html.push_str("</div>");

    if verdict.is_phishing {
        html.push_str(
            "<div class=\"banner-actions\">\
               <button class=\"btn-report\" data-action=\"report-email\">Report</button>\
               <button class=\"btn-ignore\" data-action=\"ignore-warning\">Ignore</button>\
             </div>",
        );
    }
    html.push_str(
        "<button class=\"banner-close\" data-action=\"close-banner\">\u{d7}</button>\
         </div></div>",
    );
    html
}

fn error_markup() -> String {
    "<div class=\"phishing-guardian-banner error\">\
       <div class=\"banner-content\">\
         <span class=\"banner-icon\">\u{26a0}\u{fe0f}</span>\
         <span>Unable to analyze email. Please review manually.</span>\
         <button class=\"banner-close\" data-action=\"close-banner\">\u{d7}</button>\
       </div>\
     </div>"
        .to_string()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
