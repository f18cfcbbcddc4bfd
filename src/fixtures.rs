#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestConfig {
        /// Name used as the env prefix.
        #[config(default = "myapp")]
        pub name: String,

        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Sampling ratio.
        #[config(default = 0.5)]
        pub ratio: f64,

        /// Database settings.
        #[config(nested)]
        pub database: TestDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestDbConfig {
        /// Connection string URL.
        pub url: Option<String>,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: usize,
    }

    #[test]
    fn test_config_loads_defaults() {
        let config = TestConfig::builder().load().unwrap();
        assert_eq!(config.name, "myapp");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }

    // -- Fixtures for flag binding failures -------------------------------------

    /// `database_url` and `database.url` both want `--database-url`.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct DuplicateConfig {
        #[config(default = "pg://top")]
        pub database_url: String,

        #[config(nested)]
        pub database: DuplicateDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct DuplicateDbConfig {
        #[config(default = "pg://nested")]
        pub url: String,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct ReservedConfig {
        #[config(default = false)]
        pub help: bool,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct ArrayConfig {
        #[config(default = [])]
        pub tags: Vec<String>,
    }
}
