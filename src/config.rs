use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://app.fakturoid.cz/api/v3";

const CLIENT_ID: &str = "FAKTUROID_CLIENT_ID";
const CLIENT_SECRET: &str = "FAKTUROID_CLIENT_SECRET";
const SLUG: &str = "FAKTUROID_SLUG";
const API_URL: &str = "FAKTUROID_API_URL";
const USER_AGENT: &str = "USER_AGENT";
const SUBJECT_ID: &str = "SUBJECT_ID";
const INVOICE_FOLDER: &str = "INVOICE_FOLDER";

/// Settings for one run, read once at startup.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub slug: String,
    pub user_agent: String,
    pub api_url: String,
    pub subject_id: u64,
    pub invoice_folder: PathBuf,
}

impl Config {
    /// Loads `env_file` into the process environment (if it exists) and
    /// reads the settings from there.
    pub fn from_env_file(env_file: &Path) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file) {
            Ok(()) => debug!("Loaded settings from {}", env_file.display()),
            Err(error) => {
                debug!("Not loading {}: {}", env_file.display(), error)
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required =
            |key: &'static str| value(key).ok_or(ConfigError::Missing { key });

        // Check everything up front so the first missing key in the list is
        // the one reported, whatever the parse order below.
        for key in [
            CLIENT_ID,
            CLIENT_SECRET,
            SLUG,
            USER_AGENT,
            SUBJECT_ID,
            INVOICE_FOLDER,
        ] {
            required(key)?;
        }

        let subject = required(SUBJECT_ID)?;
        let subject_id = subject
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ConfigError::Invalid {
                key: SUBJECT_ID,
                value: subject,
            })?;

        let api_url = value(API_URL)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client_id: required(CLIENT_ID)?,
            client_secret: required(CLIENT_SECRET)?,
            slug: required(SLUG)?,
            user_agent: required(USER_AGENT)?,
            api_url,
            subject_id,
            invoice_folder: PathBuf::from(required(INVOICE_FOLDER)?),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.api_url)
    }

    pub fn invoice_url(&self) -> String {
        format!("{}/accounts/{}/invoices.json", self.api_url, self.slug)
    }

    pub fn invoice_page_url(&self, id: u64) -> String {
        format!("{}/{}/invoices/{}", self.api_url, self.slug, id)
    }
}

// Keeps the client secret out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("slug", &self.slug)
            .field("user_agent", &self.user_agent)
            .field("api_url", &self.api_url)
            .field("subject_id", &self.subject_id)
            .field("invoice_folder", &self.invoice_folder)
            .finish()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (CLIENT_ID, "id"),
            (CLIENT_SECRET, "secret"),
            (SLUG, "acme"),
            (USER_AGENT, "Invoicer (ops@acme.test)"),
            (SUBJECT_ID, "1234"),
            (INVOICE_FOLDER, "invoices"),
        ])
    }

    fn load(
        settings: &HashMap<&'static str, &'static str>,
    ) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| settings.get(key).map(|v| v.to_string()))
    }

    /// Config pointing at a fake API, for tests in other modules.
    pub fn config(api_url: &str, invoice_folder: &Path) -> Config {
        Config {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            slug: "acme".to_string(),
            user_agent: "Invoicer (ops@acme.test)".to_string(),
            api_url: api_url.to_string(),
            subject_id: 1234,
            invoice_folder: invoice_folder.to_path_buf(),
        }
    }

    #[test]
    fn defaults_api_url() {
        let config = load(&settings()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.subject_id, 1234);
        assert_eq!(
            config.token_url(),
            "https://app.fakturoid.cz/api/v3/oauth/token"
        );
        assert_eq!(
            config.invoice_url(),
            "https://app.fakturoid.cz/api/v3/accounts/acme/invoices.json"
        );
        assert_eq!(
            config.invoice_page_url(42),
            "https://app.fakturoid.cz/api/v3/acme/invoices/42"
        );
    }

    #[test]
    fn custom_api_url() {
        let mut settings = settings();
        settings.insert(API_URL, "http://localhost:8080/api/");
        let config = load(&settings).unwrap();
        assert_eq!(config.token_url(), "http://localhost:8080/api/oauth/token");
    }

    #[test]
    fn missing_key_is_named() {
        for key in [CLIENT_ID, SLUG, INVOICE_FOLDER] {
            let mut settings = settings();
            settings.remove(key);
            match load(&settings) {
                Err(ConfigError::Missing { key: missing }) => {
                    assert_eq!(missing, key)
                }
                other => panic!("expected missing {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut settings = settings();
        settings.insert(USER_AGENT, "   ");
        let error = load(&settings).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Environment variable 'USER_AGENT' is not set. \
             Check your .env file."
        );
    }

    #[test]
    fn subject_id_must_be_numeric() {
        let mut settings = settings();
        settings.insert(SUBJECT_ID, "acme-customer");
        assert!(matches!(
            load(&settings),
            Err(ConfigError::Invalid { key: SUBJECT_ID, .. })
        ));
    }

    #[test]
    fn debug_hides_secret() {
        let config = load(&settings()).unwrap();
        assert!(!format!("{:?}", config).contains("secret\""));
    }
}
