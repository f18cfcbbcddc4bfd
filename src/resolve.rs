//! Core resolution pipeline: layer env and flag values over the compiled
//! defaults and produce a typed config.
//!
//! Operates on pre-parsed data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Resolve the application name from flags and defaults; reject empty
//! 2. Read env overrides under the prefix derived from that name
//! 3. Layer env values, then flag values (highest priority), into one table
//! 4. Reject an application name the env emptied
//! 5. Deserialize the table into `C::Layer`
//! 6. Let confique fill defaults and validate required fields

use std::collections::BTreeMap;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::env;
use crate::error::ConfigError;
use crate::flags::{FlagRegistry, flag_name_for_key};
use crate::ops::table_get;
use crate::types::{Loaded, ValueSource};

/// All pre-parsed data needed to resolve a config. No I/O happens here.
pub struct ResolveInput {
    /// Values given on the command line, as `(dotted_key, value)` pairs.
    pub flag_values: Vec<(String, Value)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// `false` skips the env layer entirely.
    pub env_enabled: bool,
    /// Dotted key of the application name.
    pub app_name_key: String,
}

/// Resolve configuration from pre-parsed inputs. Precedence is
/// flag > env > default.
pub fn resolve<C: Config>(
    registry: &FlagRegistry,
    input: ResolveInput,
) -> Result<Loaded<C>, ConfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    // 1: The env prefix can only come from flags or the default
    let app_name = input
        .flag_values
        .iter()
        .rev()
        .find(|(key, _)| *key == input.app_name_key)
        .map(|(_, value)| value)
        .or_else(|| {
            registry
                .by_key(&input.app_name_key)
                .and_then(|flag| flag.default.as_ref())
        });
    let prefix = match app_name.and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ConfigError::EmptyAppName),
    };

    // 2
    let env_values = if input.env_enabled {
        env::env_overrides(prefix, registry, input.env_vars)?
    } else {
        Vec::new()
    };

    // 3: Env first, flags on top
    let mut table = Table::new();
    let mut sources = BTreeMap::new();
    for o in env_values {
        insert_dotted(&mut table, &o.key, o.value);
        sources.insert(o.key, ValueSource::Env(o.var));
    }
    for (key, value) in input.flag_values {
        let name = registry
            .by_key(&key)
            .map(|flag| flag.name.clone())
            .unwrap_or_else(|| flag_name_for_key(&key));
        insert_dotted(&mut table, &key, value);
        sources.insert(key, ValueSource::Flag(name));
    }

    // 4
    if let Some(Value::String(name)) = table_get(&table, &input.app_name_key)
        && name.is_empty()
    {
        return Err(ConfigError::EmptyAppName);
    }

    // 5
    let layer: C::Layer = Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::InvalidValue {
            key: "<flags and environment>".into(),
            reason: e.to_string(),
        })?;

    // 6
    let config = C::builder().preloaded(layer).load()?;
    Ok(Loaded { config, sources })
}

/// Insert `value` at a dotted key, creating sections on the way.
/// Later inserts for the same key win.
pub(crate) fn insert_dotted(table: &mut Table, key: &str, value: Value) {
    match key.split_once('.') {
        Some((section, rest)) => {
            let entry = table
                .entry(section)
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            if let Value::Table(sub) = entry {
                insert_dotted(sub, rest, value);
            }
        }
        None => {
            table.insert(key.to_string(), value);
        }
    }
}
