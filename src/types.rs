use std::collections::BTreeMap;
use std::fmt;

/// Which layer supplied a resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// The compiled default.
    Default,
    /// An environment variable, by name.
    Env(String),
    /// A command-line flag, by canonical name (without `--`).
    Flag(String),
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Default => write!(f, "default"),
            ValueSource::Env(var) => write!(f, "env {var}"),
            ValueSource::Flag(name) => write!(f, "flag --{name}"),
        }
    }
}

/// A loaded config together with the provenance of every overridden key.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<C> {
    pub config: C,
    /// Dotted key → source, for keys set by the env or a flag. Keys that are
    /// absent kept their default.
    pub sources: BTreeMap<String, ValueSource>,
}

impl<C> Loaded<C> {
    pub fn source_of(&self, key: &str) -> ValueSource {
        self.sources
            .get(key)
            .cloned()
            .unwrap_or(ValueSource::Default)
    }

    pub fn into_inner(self) -> C {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_display() {
        assert_eq!(ValueSource::Default.to_string(), "default");
        assert_eq!(
            ValueSource::Env("BOILERPLATE_PORT".into()).to_string(),
            "env BOILERPLATE_PORT"
        );
        assert_eq!(ValueSource::Flag("port".into()).to_string(), "flag --port");
    }

    #[test]
    fn missing_keys_report_default() {
        let loaded = Loaded {
            config: (),
            sources: BTreeMap::from([("port".to_string(), ValueSource::Flag("port".into()))]),
        };
        assert_eq!(loaded.source_of("port"), ValueSource::Flag("port".into()));
        assert_eq!(loaded.source_of("address"), ValueSource::Default);
    }
}
