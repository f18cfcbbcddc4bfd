//! boilerplate: load the service configuration from flags and environment,
//! set up logging from it and report what was resolved.
//!
//! ```sh
//! boilerplate --port 8080 --log_level=debug
//! BOILERPLATE_SYSADMIN_USERNAME=alice boilerplate --log-format json
//! ```

use boilerplate::logging::init_logging;
use boilerplate::{ConfigError, ConfigLoader, SECRET_KEYS, Settings, list_values};

fn fail(err: ConfigError) -> ! {
    if let ConfigError::Args(e) = err {
        e.exit();
    }
    // Logging is configured from the settings that just failed to load, so
    // fall back to stderr for the fatal message.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();
    tracing::error!(error = %err, "Configuration failed");
    std::process::exit(1);
}

fn main() {
    let loaded = ConfigLoader::builder::<Settings>()
        .bin_name("boilerplate")
        .load_with_sources()
        .unwrap_or_else(|e| fail(e));

    if let Err(e) = init_logging(&loaded.config) {
        fail(e);
    }

    let config = &loaded.config;
    tracing::info!(
        app_name = %config.app_name,
        address = %config.address,
        port = config.port,
        "Configuration loaded"
    );
    if config.sysadmin_password.is_empty() {
        tracing::info!("No sysadmin password set; one will be generated");
    }

    match list_values(&loaded, SECRET_KEYS) {
        Ok(listing) => {
            for entry in &listing.entries {
                tracing::debug!(
                    flag = %entry.flag,
                    value = %entry.value,
                    source = %entry.source,
                    "Resolved setting"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not list resolved settings"),
    }
}
