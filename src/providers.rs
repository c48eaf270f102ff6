//! Per-provider extraction schemas.
//!
//! Each supported webmail surface gets a declarative [`ProviderProfile`]:
//! for every logical field an ordered list of fallback CSS selectors plus a
//! typed extraction mode. The orchestration never needs to know which
//! provider it is scraping; swapping selector sets touches only this file.

/// How a matched element is turned into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed text content of the element.
    Text,
    /// Prefer an explicit `email` attribute, then `title`, then visible
    /// text. Visible sender text is often a display name, not an address.
    Address,
}

/// Ordered fallback selectors for one logical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub selectors: &'static [&'static str],
    pub kind: FieldKind,
}

/// Immutable extraction schema for one webmail provider, chosen once per
/// page based on hostname.
#[derive(Debug, Clone, Copy)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub container: FieldSchema,
    pub subject: FieldSchema,
    pub sender: FieldSchema,
    pub body: FieldSchema,
}

const GMAIL: ProviderProfile = ProviderProfile {
    name: "gmail",
    container: FieldSchema {
        selectors: &["[data-message-id]", ".adn"],
        kind: FieldKind::Text,
    },
    subject: FieldSchema {
        selectors: &["h2", "[data-thread-perm-id] h2", ".hP"],
        kind: FieldKind::Text,
    },
    sender: FieldSchema {
        selectors: &["[email]", ".go .g2", ".gD"],
        kind: FieldKind::Address,
    },
    body: FieldSchema {
        selectors: &[".ii.gt div", ".a3s.aiL", ".ii.gt"],
        kind: FieldKind::Text,
    },
};

const OUTLOOK: ProviderProfile = ProviderProfile {
    name: "outlook",
    container: FieldSchema {
        selectors: &["[role=\"main\"]", ".wide-content-host"],
        kind: FieldKind::Text,
    },
    subject: FieldSchema {
        selectors: &["[role=\"main\"] h1", "[data-testid=\"message-subject\"]"],
        kind: FieldKind::Text,
    },
    sender: FieldSchema {
        selectors: &[
            "[data-testid=\"message-header-from-single\"]",
            "[title*=\"@\"]",
        ],
        kind: FieldKind::Address,
    },
    body: FieldSchema {
        selectors: &[
            "[data-testid=\"message-body-content\"]",
            "[role=\"document\"]",
        ],
        kind: FieldKind::Text,
    },
};

/// Map a hostname to its extraction schema. `None` means "extraction
/// unsupported here", which callers treat as a silent no-op, not an error.
pub fn resolve(hostname: &str) -> Option<&'static ProviderProfile> {
    if hostname.contains("mail.google.com") {
        Some(&GMAIL)
    } else if hostname.contains("outlook") {
        Some(&OUTLOOK)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmail_hostname_resolves() {
        let profile = resolve("mail.google.com").unwrap();
        assert_eq!(profile.name, "gmail");
        assert_eq!(profile.sender.kind, FieldKind::Address);
    }

    #[test]
    fn outlook_variants_resolve_by_substring() {
        assert_eq!(resolve("outlook.live.com").unwrap().name, "outlook");
        assert_eq!(resolve("outlook.office365.com").unwrap().name, "outlook");
    }

    #[test]
    fn unknown_hostnames_yield_none() {
        assert!(resolve("example.com").is_none());
        assert!(resolve("mail.yahoo.com").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn all_schema_selectors_compile() {
        for profile in [&GMAIL, &OUTLOOK] {
            for schema in [
                profile.container,
                profile.subject,
                profile.sender,
                profile.body,
            ] {
                for sel in schema.selectors {
                    assert!(
                        scraper::Selector::parse(sel).is_ok(),
                        "invalid selector {sel:?} in {} schema",
                        profile.name
                    );
                }
            }
        }
    }
}
