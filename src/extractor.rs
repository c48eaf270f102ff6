//! Selector-based email extraction.
//!
//! Read-only: parses the page snapshot and walks the provider schema, never
//! touching the page itself. Field selectors are queried against the whole
//! document, so a missing container element does not abort extraction.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::{
    domain::EmailRecord,
    page::Page,
    providers::{FieldKind, FieldSchema, ProviderProfile},
};

/// Extract the visible email from a page snapshot. Returns `None` when
/// subject, sender and body all come back empty, which means "no readable
/// email on this page" rather than failure.
pub fn extract(profile: &ProviderProfile, page: &Page) -> Option<EmailRecord> {
    let doc = Html::parse_document(&page.html);

    let subject = extract_field(&doc, &profile.subject);
    let sender = extract_field(&doc, &profile.sender);
    let body = extract_field(&doc, &profile.body);

    let record = EmailRecord::new(subject, sender, body, &page.url, profile.name);
    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}

/// Try each fallback selector in declared order; the first match that yields
/// a non-empty value wins. A field whose selectors all miss is the empty
/// string, never absent.
fn extract_field(doc: &Html, schema: &FieldSchema) -> String {
    for raw in schema.selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(target: "extractor", selector = raw, error = %err, "skipping bad selector");
                continue;
            }
        };
        if let Some(element) = doc.select(&selector).next() {
            let value = match schema.kind {
                FieldKind::Text => element_text(&element),
                FieldKind::Address => element_address(&element),
            };
            if !value.is_empty() {
                return value;
            }
        }
    }
    String::new()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Structured attributes beat visible text for senders: the text node is
/// usually a display name, not an address.
fn element_address(element: &ElementRef<'_>) -> String {
    for attr in ["email", "title"] {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    element_text(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers;

    const GMAIL_URL: &str = "https://mail.google.com/mail/u/0/#inbox/abc123";

    fn gmail_page(html: &str) -> Page {
        Page::new(GMAIL_URL, html.to_string()).unwrap()
    }

    fn gmail() -> &'static ProviderProfile {
        providers::resolve("mail.google.com").unwrap()
    }

    #[test]
    fn full_message_extracts_all_fields() {
        let page = gmail_page(
            r#"<div data-message-id="m1">
                 <h2 class="hP">Quarterly report</h2>
                 <span class="gD" email="bob@example.com">Bob</span>
                 <div class="ii gt"><div>Please find attached.</div></div>
               </div>"#,
        );
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.subject, "Quarterly report");
        assert_eq!(record.sender, "bob@example.com");
        assert_eq!(record.body, "Please find attached.");
        assert_eq!(record.headers.provider, "gmail");
        assert_eq!(record.headers.url, GMAIL_URL);
    }

    #[test]
    fn sender_prefers_email_attribute_over_display_name() {
        let page = gmail_page(r#"<span email="alice@evil-bank-alerts.com">Alice Bank</span>"#);
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.sender, "alice@evil-bank-alerts.com");
    }

    #[test]
    fn sender_falls_back_to_title_then_text() {
        let outlook = providers::resolve("outlook.live.com").unwrap();
        let page = Page::new(
            "https://outlook.live.com/mail/0/",
            r#"<span title="carol@example.com">Carol</span>"#.to_string(),
        )
        .unwrap();
        let record = extract(outlook, &page).unwrap();
        assert_eq!(record.sender, "carol@example.com");
    }

    #[test]
    fn missing_body_does_not_discard_record() {
        // Subject and sender present, no body node: still classifiable.
        let page = gmail_page(
            r#"<h2>Urgent: verify your account</h2>
               <span email="alice@evil-bank-alerts.com">Alice</span>"#,
        );
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.subject, "Urgent: verify your account");
        assert_eq!(record.sender, "alice@evil-bank-alerts.com");
        assert_eq!(record.body, "");
    }

    #[test]
    fn all_fields_empty_yields_none() {
        assert!(extract(gmail(), &gmail_page("<p>inbox list view</p>")).is_none());
        assert!(extract(gmail(), &gmail_page("")).is_none());
    }

    #[test]
    fn missing_container_does_not_abort_extraction() {
        // No [data-message-id] or .adn anywhere, fields still resolve.
        let page = gmail_page(r#"<h2 class="hP">Standalone subject</h2>"#);
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.subject, "Standalone subject");
    }

    #[test]
    fn later_fallback_selector_used_when_first_is_empty() {
        let page = gmail_page(
            r#"<h2>   </h2>
               <div data-thread-perm-id="t"><h2>Real subject</h2></div>"#,
        );
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.subject, "Real subject");
    }

    #[test]
    fn text_is_trimmed_and_joined() {
        let page = gmail_page("<h2 class=\"hP\">  Hello <b>world</b>  </h2>");
        let record = extract(gmail(), &page).unwrap();
        assert_eq!(record.subject, "Hello world");
    }
}
