//! Flag registry: one `--long` flag per leaf field of a confique schema.
//!
//! Flags are derived from the config struct the same way every other layer
//! is: the field name is the key, the doc comment is the help text, and the
//! record's current value is the flag default. Nested sections become
//! `section-field` flags, so `database.url` is set with `--database-url`.
//!
//! Parsing goes through a clap [`Command`] built at runtime from the
//! registry. Before clap sees argv, every long flag name has its `_`
//! separators rewritten to `-` (see [`normalize_flag_name`]), so
//! `--log_file` and `--log-file` are the same flag. Values are checked
//! against the field's type as they are parsed, so `--port=70000` is a
//! usage error naming `--port`.

use std::borrow::Cow;
use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, Command};
use confique::Config;
use confique::meta::{FieldKind, Meta};
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::ConfigError;
use crate::resolve::insert_dotted;

/// Flag names clap registers on its own.
const RESERVED_FLAGS: &[&str] = &["help"];

/// Canonical spelling of a flag name: every `_` becomes `-`.
pub fn normalize_flag_name(name: &str) -> Cow<'_, str> {
    if name.contains('_') {
        Cow::Owned(name.replace('_', "-"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Checks one value against the type of the schema field at a dotted key.
type CheckFn = fn(&str, &Value) -> Result<(), String>;

fn check_value<C: Config>(key: &str, value: &Value) -> Result<(), String>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut table = Table::new();
    insert_dotted(&mut table, key, value.clone());
    Value::Table(table)
        .try_into::<C::Layer>()
        .map(|_| ())
        .map_err(|e: toml::de::Error| e.message().to_string())
}

fn parse_checked(
    kind: ValueKind,
    key: &str,
    check: Option<CheckFn>,
    raw: &str,
) -> Result<Value, String> {
    let value = kind.parse(raw)?;
    let Some(check) = check else {
        return Ok(value);
    };
    match check(key, &value) {
        Ok(()) => Ok(value),
        // A guessed number or bool the field rejects may still be valid text.
        Err(_) if kind == ValueKind::Inferred && !value.is_str() => {
            let text = Value::String(raw.to_string());
            check(key, &text)?;
            Ok(text)
        }
        Err(reason) => Err(reason),
    }
}

/// Flag name for a dotted config key: `log_file` → `log-file`,
/// `database.url` → `database-url`.
pub fn flag_name_for_key(key: &str) -> String {
    key.replace(['_', '.'], "-")
}

/// Scalar type a flag accepts, inferred from its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// No default to infer from (an unset `Option` field). Values are guessed:
    /// bool, then integer, then float, then text.
    Inferred,
}

impl ValueKind {
    fn of(default: Option<&Value>) -> Result<Self, String> {
        match default {
            None => Ok(ValueKind::Inferred),
            Some(Value::String(_)) => Ok(ValueKind::Text),
            Some(Value::Integer(_)) => Ok(ValueKind::Integer),
            Some(Value::Float(_)) => Ok(ValueKind::Float),
            Some(Value::Boolean(_)) => Ok(ValueKind::Boolean),
            Some(other) => Err(format!(
                "has a default of type {}, which a single flag cannot carry",
                other.type_str()
            )),
        }
    }

    /// Parse a raw flag or env value into a typed TOML value.
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        match self {
            ValueKind::Text => Ok(Value::String(raw.to_string())),
            ValueKind::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("'{raw}' is not an integer: {e}")),
            ValueKind::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("'{raw}' is not a number: {e}")),
            ValueKind::Boolean => parse_bool(raw)
                .map(Value::Boolean)
                .ok_or_else(|| format!("'{raw}' is not a boolean")),
            ValueKind::Inferred => Ok(infer_value(raw)),
        }
    }

    fn value_name(self) -> &'static str {
        match self {
            ValueKind::Text => "string",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::Boolean => "bool",
            ValueKind::Inferred => "value",
        }
    }
}

/// The spellings Go's `strconv.ParseBool` accepts.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn infer_value(raw: &str) -> Value {
    if let Some(b) = parse_bool(raw).filter(|_| raw.len() > 1) {
        return Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    // Require a dot so "inf" and "NaN" stay text.
    if raw.contains('.')
        && let Ok(f) = raw.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(raw.to_string())
}

/// A single registered flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagDef {
    /// Canonical flag name, without the leading `--`.
    pub name: String,
    /// Dotted config key the flag writes to.
    pub key: String,
    pub help: String,
    pub kind: ValueKind,
    /// The record's value at registration time. `None` for unset options.
    pub default: Option<Value>,
}

impl FlagDef {
    fn default_display(&self) -> Option<String> {
        match self.default.as_ref()? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn arg(&self, check: Option<CheckFn>) -> Arg {
        let kind = self.kind;
        let key = self.key.clone();
        let mut arg = Arg::new(self.key.clone())
            .long(self.name.clone())
            .help(self.help.clone())
            .value_name(kind.value_name())
            .value_parser(move |raw: &str| parse_checked(kind, &key, check, raw));

        if kind == ValueKind::Boolean {
            // pflag semantics: a bare `--flag` means true, `--flag=false` is allowed.
            arg = arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true");
        } else {
            // `--token-secret -s3cret` takes the next argument whatever it looks like.
            arg = arg.allow_hyphen_values(true);
        }
        if let Some(default) = self.default_display() {
            arg = arg.default_value(default);
        }
        arg
    }
}

/// All flags derived from one config record, in schema order.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: Vec<FlagDef>,
    check: Option<CheckFn>,
}

impl FlagRegistry {
    /// Register one flag per leaf field of `C`, using `record`'s current
    /// values as the flag defaults.
    ///
    /// Fails if two fields map to the same flag name, if a field collides
    /// with a flag clap provides itself, or if a field's value cannot be
    /// expressed as a single scalar flag.
    pub fn register<C: Config + Serialize>(record: &C) -> Result<Self, ConfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let current = match Value::try_from(record) {
            Ok(Value::Table(table)) => table,
            Ok(_) => Table::new(),
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    key: "<record>".into(),
                    reason: e.to_string(),
                });
            }
        };

        let mut registry = FlagRegistry {
            flags: Vec::new(),
            check: Some(check_value::<C> as CheckFn),
        };
        registry.collect(&C::META, "", &current)?;
        Ok(registry)
    }

    fn collect(&mut self, meta: &Meta, prefix: &str, current: &Table) -> Result<(), ConfigError> {
        for field in meta.fields {
            let key = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{prefix}.{}", field.name)
            };
            match &field.kind {
                FieldKind::Leaf { .. } => {
                    let name = flag_name_for_key(&key);
                    let default = current.get(field.name).cloned();
                    let kind = ValueKind::of(default.as_ref()).map_err(|reason| {
                        ConfigError::FlagBinding {
                            flag: name.clone(),
                            reason,
                        }
                    })?;
                    self.insert(FlagDef {
                        name,
                        key,
                        help: help_text(field.doc),
                        kind,
                        default,
                    })?;
                }
                FieldKind::Nested { meta, .. } => {
                    let section = current
                        .get(field.name)
                        .and_then(Value::as_table)
                        .cloned()
                        .unwrap_or_default();
                    self.collect(meta, &key, &section)?;
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, flag: FlagDef) -> Result<(), ConfigError> {
        if RESERVED_FLAGS.contains(&flag.name.as_str()) {
            return Err(ConfigError::FlagBinding {
                flag: flag.name,
                reason: "clashes with a built-in flag".into(),
            });
        }
        if let Some(existing) = self.get(&flag.name) {
            return Err(ConfigError::FlagBinding {
                reason: format!(
                    "is registered twice (by '{}' and '{}')",
                    existing.key, flag.key
                ),
                flag: flag.name,
            });
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Look up a flag by name. Either separator spelling is accepted.
    pub fn get(&self, name: &str) -> Option<&FlagDef> {
        let name = normalize_flag_name(name);
        self.flags.iter().find(|f| f.name == name)
    }

    /// Look up a flag by the dotted config key it writes to.
    pub fn by_key(&self, key: &str) -> Option<&FlagDef> {
        self.flags.iter().find(|f| f.key == key)
    }

    /// Parse a raw flag or env value for `flag`, checked against the type of
    /// the field it writes to.
    pub fn parse_value(&self, flag: &FlagDef, raw: &str) -> Result<Value, String> {
        parse_checked(flag.kind, &flag.key, self.check, raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDef> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Build the clap command that parses these flags.
    pub fn command(&self, bin_name: &str) -> Command {
        self.flags
            .iter()
            .fold(Command::new(bin_name.to_string()), |cmd, flag| {
                cmd.arg(flag.arg(self.check))
            })
            .args_override_self(true)
    }

    /// Rewrite the name part of every `--long[=value]` argument to its
    /// canonical spelling.
    ///
    /// The first element (the binary name), short flags and everything after
    /// a bare `--` are passed through untouched, as is the argument following
    /// a registered non-boolean `--flag` given without `=`: that is its value.
    pub fn normalize_args<I, T>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut out = Vec::new();
        let mut positional_only = false;
        let mut value_next = false;

        for (i, arg) in args.into_iter().enumerate() {
            let arg: OsString = arg.into();
            if i == 0 || positional_only || value_next {
                value_next = false;
                out.push(arg);
                continue;
            }
            match arg.to_str() {
                Some("--") => {
                    positional_only = true;
                    out.push(arg);
                }
                Some(s) if s.starts_with("--") => match s[2..].split_once('=') {
                    Some((name, value)) => {
                        out.push(format!("--{}={value}", normalize_flag_name(name)).into());
                    }
                    None => {
                        let name = normalize_flag_name(&s[2..]);
                        value_next = self
                            .get(&name)
                            .is_some_and(|flag| flag.kind != ValueKind::Boolean);
                        out.push(format!("--{name}").into());
                    }
                },
                _ => out.push(arg),
            }
        }
        out
    }

    /// Normalize and parse `args` (binary name first).
    ///
    /// Returns `(key, value)` pairs only for flags actually given on the
    /// command line; defaults are left to the lower layers.
    pub fn parse<I, T>(&self, bin_name: &str, args: I) -> Result<Vec<(String, Value)>, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let matches = self
            .command(bin_name)
            .try_get_matches_from(self.normalize_args(args))?;

        let values = self
            .flags
            .iter()
            .filter(|flag| matches.value_source(&flag.key) == Some(ValueSource::CommandLine))
            .filter_map(|flag| {
                matches
                    .get_one::<Value>(&flag.key)
                    .map(|v| (flag.key.clone(), v.clone()))
            })
            .collect();
        Ok(values)
    }
}

fn help_text(doc: &[&str]) -> String {
    doc.iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
