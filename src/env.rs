use std::collections::HashMap;

use toml::Value;

use crate::error::ConfigError;
use crate::flags::FlagRegistry;

/// A value one environment variable supplies for a registered flag.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvOverride {
    /// Dotted config key.
    pub key: String,
    /// The variable the value was read from.
    pub var: String,
    pub value: Value,
}

/// Environment variable consulted for a flag: `{PREFIX}_{FLAG}`, upper-cased,
/// with every `-` replaced by `_`.
///
/// `env_var_name("boilerplate", "log-file")` is `BOILERPLATE_LOG_FILE`.
pub fn env_var_name(prefix: &str, flag_name: &str) -> String {
    format!("{prefix}_{flag_name}")
        .to_uppercase()
        .replace('-', "_")
}

/// Look up every registered flag in `vars` under `prefix`.
///
/// Only variables that name a registered flag are consulted; everything else
/// in the environment is ignored. A variable that is set but empty counts as
/// set. Values are parsed with the flag's [`ValueKind`](crate::flags::ValueKind)
/// and checked against the field's type, so `BOILERPLATE_PORT=70000` fails
/// here, naming the variable.
///
/// Takes an iterator so tests can pass synthetic data instead of the process
/// environment.
pub fn env_overrides(
    prefix: &str,
    registry: &FlagRegistry,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<Vec<EnvOverride>, ConfigError> {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let mut out = Vec::new();

    for flag in registry.iter() {
        let var = env_var_name(prefix, &flag.name);
        let Some(raw) = vars.get(&var) else {
            continue;
        };
        let value = registry
            .parse_value(flag, raw)
            .map_err(|reason| ConfigError::InvalidValue {
                key: var.clone(),
                reason,
            })?;
        out.push(EnvOverride {
            key: flag.key.clone(),
            var,
            value,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;
    use crate::settings::Settings;
    use confique::Config;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn settings_registry() -> FlagRegistry {
        FlagRegistry::register(&Settings::defaults()).unwrap()
    }

    fn value_of<'a>(overrides: &'a [EnvOverride], key: &str) -> Option<&'a Value> {
        overrides.iter().find(|o| o.key == key).map(|o| &o.value)
    }

    #[test]
    fn var_name_uppercases_and_swaps_separators() {
        assert_eq!(env_var_name("boilerplate", "log-file"), "BOILERPLATE_LOG_FILE");
        assert_eq!(env_var_name("my-app", "port"), "MY_APP_PORT");
        assert_eq!(
            env_var_name("BOILERPLATE", "log-requests-disabled"),
            "BOILERPLATE_LOG_REQUESTS_DISABLED"
        );
    }

    #[test]
    fn text_value_for_known_flag() {
        let overrides = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[("BOILERPLATE_SYSADMIN_USERNAME", "alice")]),
        )
        .unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].key, "sysadmin_username");
        assert_eq!(overrides[0].var, "BOILERPLATE_SYSADMIN_USERNAME");
        assert_eq!(overrides[0].value, Value::String("alice".into()));
    }

    #[test]
    fn values_are_typed_by_flag_kind() {
        let overrides = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[
                ("BOILERPLATE_PORT", "8080"),
                ("BOILERPLATE_LOG_REQUESTS_DISABLED", "true"),
                ("BOILERPLATE_SYSADMIN_PASSWORD", "12345"),
            ]),
        )
        .unwrap();
        assert_eq!(value_of(&overrides, "port"), Some(&Value::Integer(8080)));
        assert_eq!(
            value_of(&overrides, "log_requests_disabled"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(
            value_of(&overrides, "sysadmin_password"),
            Some(&Value::String("12345".into()))
        );
    }

    #[test]
    fn empty_value_counts_as_set() {
        let overrides = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[("BOILERPLATE_APP_NAME", "")]),
        )
        .unwrap();
        assert_eq!(
            value_of(&overrides, "app_name"),
            Some(&Value::String(String::new()))
        );
    }

    #[test]
    fn unparseable_value_names_the_variable() {
        let err = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[("BOILERPLATE_PORT", "eighty")]),
        )
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "BOILERPLATE_PORT"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn values_the_field_type_rejects_name_the_variable() {
        for (var, raw) in [("BOILERPLATE_PORT", "70000"), ("BOILERPLATE_ADDRESS", "not-an-ip")] {
            let err = env_overrides("boilerplate", &settings_registry(), vars(&[(var, raw)]))
                .unwrap_err();
            match err {
                ConfigError::InvalidValue { key, .. } => assert_eq!(key, var),
                other => panic!("Expected InvalidValue, got {other:?}"),
            }
        }
    }

    #[test]
    fn optional_text_field_keeps_numeric_looking_value() {
        let registry = FlagRegistry::register(&TestConfig::builder().load().unwrap()).unwrap();
        let overrides = env_overrides("myapp", &registry, vars(&[("MYAPP_DATABASE_URL", "5")]))
            .unwrap();
        assert_eq!(
            value_of(&overrides, "database.url"),
            Some(&Value::String("5".into()))
        );
    }

    #[test]
    fn other_prefixes_and_unknown_keys_ignored() {
        let overrides = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[
                ("OTHER_PORT", "1"),
                ("BOILERPLATE_NOT_A_FLAG", "x"),
                ("BOILERPLATE", "x"),
                ("boilerplate_port", "1"),
            ]),
        )
        .unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn nested_keys_use_section_prefixed_names() {
        let registry = FlagRegistry::register(&TestConfig::builder().load().unwrap()).unwrap();
        let overrides = env_overrides(
            "myapp",
            &registry,
            vars(&[
                ("MYAPP_DATABASE_POOL_SIZE", "20"),
                ("MYAPP_DATABASE_URL", "pg://db"),
            ]),
        )
        .unwrap();
        assert_eq!(
            value_of(&overrides, "database.pool_size"),
            Some(&Value::Integer(20))
        );
        assert_eq!(
            value_of(&overrides, "database.url"),
            Some(&Value::String("pg://db".into()))
        );
    }

    #[test]
    fn overrides_follow_registry_order() {
        let overrides = env_overrides(
            "boilerplate",
            &settings_registry(),
            vars(&[
                ("BOILERPLATE_TOKEN_SECRET", "s"),
                ("BOILERPLATE_APP_NAME", "a"),
            ]),
        )
        .unwrap();
        let keys: Vec<&str> = overrides.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["app_name", "token_secret"]);
    }
}
