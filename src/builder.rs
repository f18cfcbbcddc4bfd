use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flags::{FlagRegistry, ValueKind, flag_name_for_key};
use crate::resolve::{self, ResolveInput};
use crate::settings::APP_NAME_KEY;
use crate::types::Loaded;

/// Entry point for loading flag and environment configuration.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn builder<C: Config>() -> ConfigLoaderBuilder<C> {
        ConfigLoaderBuilder::new()
    }
}

/// Builder that registers `C`'s fields as flags, parses argv and layers
/// environment overrides on top of the compiled defaults.
///
/// Without [`args()`](Self::args) or [`env_vars()`](Self::env_vars), the
/// process command line and environment are read at load time.
pub struct ConfigLoaderBuilder<C: Config> {
    bin_name: Option<String>,
    app_name_key: String,
    args: Option<Vec<OsString>>,
    env_vars: Option<Vec<(String, String)>>,
    env_enabled: bool,
    _phantom: PhantomData<C>,
}

impl<C: Config> ConfigLoaderBuilder<C> {
    fn new() -> Self {
        Self {
            bin_name: None,
            app_name_key: APP_NAME_KEY.to_string(),
            args: None,
            env_vars: None,
            env_enabled: true,
            _phantom: PhantomData,
        }
    }

    /// Program name shown in usage and help (default: file name of argv[0]).
    pub fn bin_name(mut self, name: &str) -> Self {
        self.bin_name = Some(name.to_string());
        self
    }

    /// Dotted key of the field naming the application (default: `app_name`).
    /// Its resolved value must be non-empty and becomes the env prefix.
    pub fn app_name_key(mut self, key: &str) -> Self {
        self.app_name_key = key.to_string();
        self
    }

    /// Parse these arguments instead of the process command line. The first
    /// element is the binary name, as with `std::env::args_os()`.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Read overrides from these pairs instead of the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Disable environment variable overrides entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Check the registry can carry the application name.
    fn bind(&self, registry: &FlagRegistry) -> Result<(), ConfigError> {
        match registry.by_key(&self.app_name_key) {
            Some(flag) if flag.kind == ValueKind::Text => Ok(()),
            Some(flag) => Err(ConfigError::FlagBinding {
                flag: flag.name.clone(),
                reason: "must be a text flag to name the application".into(),
            }),
            None => Err(ConfigError::FlagBinding {
                flag: flag_name_for_key(&self.app_name_key),
                reason: "is not registered, so the application name cannot be resolved".into(),
            }),
        }
    }

    fn effective_bin_name(&self, args: &[OsString]) -> String {
        if let Some(name) = &self.bin_name {
            return name.clone();
        }
        args.first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| C::META.name.to_lowercase())
    }

    /// Load and resolve the configuration, keeping track of where each
    /// overridden value came from.
    pub fn load_with_sources(self) -> Result<Loaded<C>, ConfigError>
    where
        C: Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        let defaults: C = C::builder().load()?;
        let registry = FlagRegistry::register(&defaults)?;
        self.bind(&registry)?;

        let args = match &self.args {
            Some(args) => args.clone(),
            None => std::env::args_os().collect(),
        };
        let bin_name = self.effective_bin_name(&args);
        let flag_values = registry.parse(&bin_name, args)?;

        let env_vars = match (self.env_enabled, self.env_vars) {
            (false, _) => Vec::new(),
            (true, Some(vars)) => vars,
            (true, None) => process_env(),
        };

        resolve::resolve(
            &registry,
            ResolveInput {
                flag_values,
                env_vars,
                env_enabled: self.env_enabled,
                app_name_key: self.app_name_key,
            },
        )
    }

    /// Load and resolve the configuration: flag > env > default.
    pub fn load(self) -> Result<C, ConfigError>
    where
        C: Serialize,
        C::Layer: for<'de> Deserialize<'de>,
    {
        self.load_with_sources().map(Loaded::into_inner)
    }
}

/// Process environment, skipping entries that are not valid Unicode.
fn process_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
