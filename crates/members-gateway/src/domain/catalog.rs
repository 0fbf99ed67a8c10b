//! Code catalog: response code to localized message template.
//!
//! Loaded once at startup from `<dir>/<alias>/code-msg.json`, one JSON object
//! per locale:
//!
//! ```json
//! { "A0000": "Success", "M0014": "You can sign up again after {0}." }
//! ```
//!
//! The default locale file must load. Other locales are optional and fall back
//! to the default table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name inside each locale directory.
pub const CATALOG_FILE: &str = "code-msg.json";

/// Supported message locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Ko, Locale::En];

    /// Directory alias.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
        }
    }

    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.alias().eq_ignore_ascii_case(alias))
    }

    /// First supported language in an `Accept-Language` header value.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .filter_map(|tag| tag.trim().split('-').next())
            .find_map(Self::from_alias)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Catalog load failures.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("default locale '{locale}' catalog {path} unreadable: {source}")]
    DefaultUnreadable {
        locale: Locale,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("default locale '{locale}' catalog {path} unparsable: {source}")]
    DefaultUnparsable {
        locale: Locale,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("default locale '{0}' has no catalog table")]
    DefaultMissing(Locale),
}

type Table = HashMap<String, String>;

/// Read-only message store, shared behind an `Arc` after startup.
#[derive(Debug, Clone)]
pub struct CodeCatalog {
    default_locale: Locale,
    tables: HashMap<Locale, Table>,
}

impl CodeCatalog {
    /// Load every locale in `locales` from `dir`.
    pub fn load(dir: &Path, locales: &[Locale], default_locale: Locale) -> Result<Self, CatalogError> {
        let mut tables = HashMap::new();

        let path = Self::path_for(dir, default_locale);
        let raw = std::fs::read_to_string(&path).map_err(|source| CatalogError::DefaultUnreadable {
            locale: default_locale,
            path: path.clone(),
            source,
        })?;
        let table: Table = serde_json::from_str(&raw).map_err(|source| CatalogError::DefaultUnparsable {
            locale: default_locale,
            path: path.clone(),
            source,
        })?;
        info!(locale = %default_locale, entries = table.len(), path = %path.display(), "Loaded default code catalog");
        tables.insert(default_locale, table);

        for locale in locales.iter().copied().filter(|l| *l != default_locale) {
            let path = Self::path_for(dir, locale);
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<Table>(&raw).map_err(|e| e.to_string()));
            match parsed {
                Ok(table) => {
                    info!(locale = %locale, entries = table.len(), "Loaded code catalog");
                    tables.insert(locale, table);
                }
                Err(reason) => {
                    warn!(
                        locale = %locale,
                        path = %path.display(),
                        reason = %reason,
                        "Code catalog unavailable, falling back to default locale"
                    );
                }
            }
        }

        Ok(Self { default_locale, tables })
    }

    /// Build from in-memory tables.
    pub fn from_tables(default_locale: Locale, tables: HashMap<Locale, Table>) -> Result<Self, CatalogError> {
        if !tables.contains_key(&default_locale) {
            return Err(CatalogError::DefaultMissing(default_locale));
        }
        Ok(Self { default_locale, tables })
    }

    pub fn path_for(dir: &Path, locale: Locale) -> PathBuf {
        dir.join(locale.alias()).join(CATALOG_FILE)
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    pub fn has_locale(&self, locale: Locale) -> bool {
        self.tables.contains_key(&locale)
    }

    /// Raw template, falling back to the default locale.
    pub fn template(&self, code: &str, locale: Locale) -> Option<&str> {
        self.tables
            .get(&locale)
            .and_then(|t| t.get(code))
            .or_else(|| self.tables.get(&self.default_locale).and_then(|t| t.get(code)))
            .map(String::as_str)
    }

    /// Resolved message for `code`. Unknown codes resolve to `""`.
    pub fn message(&self, code: &str, params: &[String], locale: Locale) -> String {
        self.template(code, locale)
            .map(|t| substitute(t, params))
            .unwrap_or_default()
    }
}

/// Replace `{i}` with `params[i]`, or `""` when there is no such param.
/// Braces not enclosing a plain index are copied through.
pub fn substitute(template: &str, params: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let index = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));

        match index {
            Some((i, close)) => {
                if let Some(p) = params.get(i) {
                    out.push_str(p);
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
