//! Comment layer configuration.
//!
//! `LayerConfig` carries everything a host needs to build a controller: the
//! remote table endpoint (optional; without it comments stay local), the
//! prototype the layer is mounted on, and the commenter's display name.
//! Values can be overridden from `PINLAYER_*` environment variables.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::DEFAULT_TABLE;

pub const ENV_SUPABASE_URL: &str = "PINLAYER_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "PINLAYER_SUPABASE_ANON_KEY";
pub const ENV_TABLE: &str = "PINLAYER_TABLE";
pub const ENV_PROTOTYPE: &str = "PINLAYER_PROTOTYPE";
pub const ENV_AUTHOR: &str = "PINLAYER_AUTHOR";

/// Runtime configuration for one comment layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub prototype: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Validated remote table settings
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

impl LayerConfig {
    /// Overlay values from `PINLAYER_*` environment variables
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup, non-empty values win
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |current: Option<String>, key: &str| {
            normalize_text_option(lookup(key)).or_else(|| normalize_text_option(current))
        };
        self.supabase_url = pick(self.supabase_url, ENV_SUPABASE_URL);
        self.supabase_anon_key = pick(self.supabase_anon_key, ENV_SUPABASE_ANON_KEY);
        self.table = pick(self.table, ENV_TABLE);
        self.prototype = pick(self.prototype, ENV_PROTOTYPE);
        self.author = pick(self.author, ENV_AUTHOR);
        self
    }

    /// Remote table settings, `None` when the layer runs local-only.
    ///
    /// Supplying only one of URL and key is an error rather than a silent
    /// fallback to local storage.
    pub fn remote(&self) -> Result<Option<RemoteConfig>> {
        let url = normalize_text_option(self.supabase_url.clone());
        let anon_key = normalize_text_option(self.supabase_anon_key.clone());

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => Ok(Some(RemoteConfig {
                url,
                anon_key,
                table: self.table_name(),
            })),
            _ => Err(Error::Configuration(
                "Supabase URL and anon key must be configured together".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn table_name(&self) -> String {
        normalize_text_option(self.table.clone()).unwrap_or_else(|| DEFAULT_TABLE.to_string())
    }

    #[must_use]
    pub fn prototype(&self) -> Option<String> {
        normalize_text_option(self.prototype.clone())
    }
}

/// Key under which a host remembers the commenter's name for a prototype
#[must_use]
pub fn author_storage_key(prototype: Option<&str>) -> String {
    match prototype {
        Some(prototype) => format!("comment_author_{prototype}"),
        None => "comment_author".to_string(),
    }
}

/// Pick the commenter's display name.
///
/// A remembered name wins, then the name the user just entered, then a
/// generated `Guest-xxxx` label. The caller persists the result under
/// [`author_storage_key`].
#[must_use]
pub fn resolve_author(stored: Option<String>, entered: Option<String>) -> String {
    normalize_text_option(stored)
        .or_else(|| normalize_text_option(entered))
        .unwrap_or_else(guest_author)
}

/// Generated fallback name such as `Guest-1a2b`
#[must_use]
pub fn guest_author() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("Guest-{}", &suffix[..4])
}

/// Normalize optional text by trimming whitespace and removing empties.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn remote_is_none_without_credentials() {
        assert_eq!(LayerConfig::default().remote().unwrap(), None);
    }

    #[test]
    fn remote_requires_url_and_key_together() {
        let config = LayerConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            ..LayerConfig::default()
        };
        assert!(config.remote().is_err());
    }

    #[test]
    fn remote_defaults_table_name() {
        let config = LayerConfig {
            supabase_url: Some(" https://demo.supabase.co ".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..LayerConfig::default()
        };
        let remote = config.remote().unwrap().unwrap();
        assert_eq!(remote.url, "https://demo.supabase.co");
        assert_eq!(remote.table, "commenting");
        assert!(format!("{remote:?}").contains("[REDACTED]"));
    }

    #[test]
    fn overrides_replace_only_non_empty_values() {
        let config = LayerConfig {
            prototype: Some("mobile-cpq-v1".to_string()),
            author: Some("Elliot".to_string()),
            ..LayerConfig::default()
        }
        .with_overrides(lookup(&[(ENV_PROTOTYPE, "desktop-v2"), (ENV_AUTHOR, "  ")]));

        assert_eq!(config.prototype(), Some("desktop-v2".to_string()));
        assert_eq!(config.author.as_deref(), Some("Elliot"));
    }

    #[test]
    fn resolve_author_prefers_stored_then_entered() {
        assert_eq!(
            resolve_author(Some("Stored".into()), Some("Typed".into())),
            "Stored"
        );
        assert_eq!(resolve_author(None, Some(" Typed ".into())), "Typed");
    }

    #[test]
    fn resolve_author_falls_back_to_guest() {
        let name = resolve_author(None, Some("   ".into()));
        assert!(name.starts_with("Guest-"));
        assert_eq!(name.len(), "Guest-".len() + 4);
    }

    #[test]
    fn author_storage_key_is_scoped_by_prototype() {
        assert_eq!(
            author_storage_key(Some("mobile-cpq-v1")),
            "comment_author_mobile-cpq-v1"
        );
        assert_eq!(author_storage_key(None), "comment_author");
    }

    #[test]
    fn normalize_text_option_trims_and_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" value ".to_string())),
            Some("value".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
    }
}
