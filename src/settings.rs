//! The boilerplate configuration record.
//!
//! [`Settings`] is the schema for everything the loader does: each field
//! becomes a `--kebab-case` flag, its doc comment becomes the flag's help
//! text, and its `#[config(default = ...)]` is the compiled default.
//!
//! | Flag | Env var (default app name) | Default |
//! |------|----------------------------|---------|
//! | `--app-name` | `BOILERPLATE_APP_NAME` | `boilerplate` |
//! | `--address` | `BOILERPLATE_ADDRESS` | `127.0.0.1` |
//! | `--port` | `BOILERPLATE_PORT` | `1323` |
//! | `--log-file` | `BOILERPLATE_LOG_FILE` | `stdout` |
//! | `--log-format` | `BOILERPLATE_LOG_FORMAT` | `text` |
//! | `--log-level` | `BOILERPLATE_LOG_LEVEL` | `info` |
//! | `--log-requests-disabled` | `BOILERPLATE_LOG_REQUESTS_DISABLED` | `false` |
//! | `--mongodb-uri` | `BOILERPLATE_MONGODB_URI` | `mongodb://` |
//! | `--sysadmin-email` | `BOILERPLATE_SYSADMIN_EMAIL` | `admin@example.com` |
//! | `--sysadmin-password` | `BOILERPLATE_SYSADMIN_PASSWORD` | (empty) |
//! | `--sysadmin-username` | `BOILERPLATE_SYSADMIN_USERNAME` | `admin` |
//! | `--token-secret` | `BOILERPLATE_TOKEN_SECRET` | `changeme` |

use std::net::IpAddr;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::builder::ConfigLoader;
use crate::error::ConfigError;

/// Keys whose values must never be printed in clear text.
pub const SECRET_KEYS: &[&str] = &["sysadmin_password", "token_secret"];

/// Key holding the application name, which also prefixes env variables.
pub const APP_NAME_KEY: &str = "app_name";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// The name of the application.
    #[config(default = "boilerplate")]
    pub app_name: String,

    /// The IP address to listen at.
    #[config(default = "127.0.0.1")]
    pub address: IpAddr,

    /// The port to listen at.
    #[config(default = 1323)]
    pub port: u16,

    /// The log file to write to. 'stdout' means log to stdout, 'stderr' means
    /// log to stderr and 'null' means discard log messages.
    #[config(default = "stdout")]
    pub log_file: String,

    /// The log format. Valid format values are: text, json.
    #[config(default = "text")]
    pub log_format: String,

    /// The granularity of log outputs. Valid log levels: debug, info,
    /// warning, error and critical.
    #[config(default = "info")]
    pub log_level: String,

    /// Disables HTTP requests logging.
    #[config(default = false)]
    pub log_requests_disabled: bool,

    /// MongoDB URI
    #[config(default = "mongodb://")]
    pub mongodb_uri: String,

    /// Email address for the system administrator user.
    #[config(default = "admin@example.com")]
    pub sysadmin_email: String,

    /// Password for the system administrator user. Empty means one will be
    /// generated automatically.
    #[config(default = "")]
    pub sysadmin_password: String,

    /// Username for the system administrator user.
    #[config(default = "admin")]
    pub sysadmin_username: String,

    /// Secret to sign access tokens with.
    #[config(default = "changeme")]
    pub token_secret: String,
}

impl Settings {
    /// The compiled defaults, with no flag or environment input applied.
    pub fn defaults() -> Self {
        Self::builder()
            .load()
            .expect("boilerplate: every settings field carries a default")
    }

    /// Load from the process command line and environment.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::builder::<Self>()
            .bin_name("boilerplate")
            .load()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::defaults();
        assert_eq!(s.app_name, "boilerplate");
        assert_eq!(s.address, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(s.port, 1323);
        assert_eq!(s.log_file, "stdout");
        assert_eq!(s.log_format, "text");
        assert_eq!(s.log_level, "info");
        assert!(!s.log_requests_disabled);
        assert_eq!(s.mongodb_uri, "mongodb://");
        assert_eq!(s.sysadmin_email, "admin@example.com");
        assert_eq!(s.sysadmin_password, "");
        assert_eq!(s.sysadmin_username, "admin");
        assert_eq!(s.token_secret, "changeme");
    }

    #[test]
    fn default_trait_matches_defaults() {
        assert_eq!(Settings::default(), Settings::defaults());
    }

    #[test]
    fn secret_and_app_name_keys_are_fields() {
        let table = toml::Value::try_from(Settings::defaults()).unwrap();
        let table = table.as_table().unwrap();
        for key in SECRET_KEYS {
            assert!(table.contains_key(*key), "{key} is not a settings field");
        }
        assert!(table.contains_key(APP_NAME_KEY));
    }
}
