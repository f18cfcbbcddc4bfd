//! Resolved-config inspection: dotted key lookup and listing with provenance.

use std::fmt;

use serde::Serialize;
use toml::{Table, Value};

use crate::error::ConfigError;
use crate::flags::flag_name_for_key;
use crate::types::{Loaded, ValueSource};

const MASK: &str = "********";

/// One line of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    /// Flag name of the key (without `--`).
    pub flag: String,
    pub value: String,
    pub source: ValueSource,
}

/// All resolved configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} = {} ({})", entry.flag, entry.value, entry.source)?;
        }
        Ok(())
    }
}

/// List every resolved value with the layer it came from.
///
/// Values under `secret_keys` are masked unless empty.
pub fn list_values<C: Serialize>(
    loaded: &Loaded<C>,
    secret_keys: &[&str],
) -> Result<Listing, ConfigError> {
    let table = match Value::try_from(&loaded.config) {
        Ok(Value::Table(table)) => table,
        Ok(_) => {
            return Err(ConfigError::InvalidValue {
                key: "<list>".into(),
                reason: "config did not serialize to a table".into(),
            });
        }
        Err(e) => {
            return Err(ConfigError::InvalidValue {
                key: "<list>".into(),
                reason: e.to_string(),
            });
        }
    };

    let mut pairs = Vec::new();
    collect_leaves(&table, "", &mut pairs);

    let entries = pairs
        .into_iter()
        .map(|(key, value)| {
            let mut display = format_value(value);
            if secret_keys.contains(&key.as_str()) && !display.is_empty() {
                display = MASK.to_string();
            }
            ListingEntry {
                flag: flag_name_for_key(&key),
                value: display,
                source: loaded.source_of(&key),
            }
        })
        .collect();

    Ok(Listing { entries })
}

fn collect_leaves<'a>(table: &'a Table, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in table {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(sub) => collect_leaves(sub, &dotted, out),
            leaf => out.push((dotted, leaf)),
        }
    }
}

/// Navigate a `toml::Table` by dotted key path (e.g. `"database.url"`).
pub fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a Value> {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let tbl = match path {
        Some(path) => {
            let mut current = table;
            for segment in path.split('.') {
                current = current.get(segment)?.as_table()?;
            }
            current
        }
        None => table,
    };

    tbl.get(leaf)
}

/// Format a TOML value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}
