use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Structured publisher/dataset metadata scraped from a documentation page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KittenData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publishers: Vec<Agent>,
    #[serde(default)]
    pub contacts: Vec<Agent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "email")]
    pub mbox: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: Option<String>,
    pub email: String,
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

fn normalise_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("mailto:").unwrap_or(trimmed);
    email_pattern()
        .is_match(trimmed)
        .then(|| trimmed.to_lowercase())
}

impl KittenData {
    /// Parses stored kitten data. A missing or malformed block is an empty one.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(data) => data,
            Err(e) => {
                warn!("Ignoring malformed kitten data: {}", e);
                Self::default()
            }
        }
    }

    /// Publishers first, then other contacts; entries without a usable email
    /// are skipped and repeated emails kept once.
    pub fn contacts_with_email(&self) -> Vec<Contact> {
        let mut seen = Vec::new();
        let mut contacts = Vec::new();
        for agent in self.publishers.iter().chain(self.contacts.iter()) {
            let Some(email) = agent.mbox.as_deref().and_then(normalise_email) else {
                continue;
            };
            if seen.contains(&email) {
                continue;
            }
            seen.push(email.clone());
            contacts.push(Contact {
                name: agent.name.clone().filter(|n| !n.trim().is_empty()),
                email,
            });
        }
        contacts
    }

    pub fn curator(&self) -> Option<&str> {
        self.publishers
            .iter()
            .filter_map(|p| p.name.as_deref())
            .find(|n| !n.trim().is_empty())
    }
}
