//! Command-line and environment configuration for the boilerplate service.
//!
//! Every field of [`Settings`] is a `--kebab-case` flag and an
//! `{APP_NAME}_{FLAG}` environment variable. A single call resolves them:
//!
//! ```ignore
//! let settings: Settings = ConfigLoader::builder()
//!     .bin_name("boilerplate")
//!     .load()?;
//! ```
//!
//! That call registers the flags, parses the process arguments, checks the
//! application name and reads `BOILERPLATE_*` variables, handing back a
//! typed, immutable record.
//!
//! # Layer precedence
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Environment vars      BOILERPLATE_LOG_FILE
//!        ↑ overridden by
//! Flags                 --log-file
//! ```
//!
//! Every layer is sparse: a flag or variable only overrides the key it names.
//!
//! # Flags
//!
//! Flag names are the field names with `_` (and, for nested sections, `.`)
//! replaced by `-`. Users may type either separator: `--log_file` is
//! normalized to `--log-file` before parsing. Boolean flags accept a bare
//! `--flag` as `true` and `--flag=false`. `--help` lists every flag with its
//! doc comment and default.
//!
//! # Environment variables
//!
//! The prefix is the application name as given by `--app-name` (or its
//! default), upper-cased. Variable names are `{PREFIX}_{FLAG}` upper-cased
//! with every `-` replaced by `_`:
//!
//! | Env var | Flag |
//! |---------|------|
//! | `BOILERPLATE_PORT` | `--port` |
//! | `BOILERPLATE_LOG_REQUESTS_DISABLED` | `--log-requests-disabled` |
//!
//! Values are parsed with the type of the flag's default, so
//! `BOILERPLATE_SYSADMIN_PASSWORD=12345` stays text while
//! `BOILERPLATE_PORT=8080` is a number.
//!
//! # Errors
//!
//! Loading never panics or exits. [`ConfigError::FlagBinding`] reports a
//! flag set that cannot be registered (a programming error),
//! [`ConfigError::EmptyAppName`] an application name that resolved to the
//! empty string. The caller decides how to report them; the `boilerplate`
//! binary logs and exits.

pub mod error;
pub mod flags;
pub mod logging;
pub mod types;

mod builder;
mod env;
mod ops;
mod resolve;
mod settings;

#[cfg(test)]
mod fixtures;

pub use builder::{ConfigLoader, ConfigLoaderBuilder};
pub use env::{EnvOverride, env_overrides, env_var_name};
pub use error::ConfigError;
pub use flags::{FlagDef, FlagRegistry, ValueKind, normalize_flag_name};
pub use ops::{Listing, ListingEntry, list_values};
pub use settings::{APP_NAME_KEY, SECRET_KEYS, Settings};
pub use types::{Loaded, ValueSource};
