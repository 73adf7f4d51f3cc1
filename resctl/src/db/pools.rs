//! Connection pool construction.
//!
//! One [`PgPool`] serves the whole process. Handlers borrow a connection per request with
//! `pool.acquire()` (reads) or `pool.begin()` (a write plus its audit row), and the connection
//! returns to the pool when the guard is dropped.

use crate::config::{DatabaseConfig, PoolSettings};
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Build connect options from the database config, with slow statement logging applied.
pub fn connect_options(config: &DatabaseConfig) -> anyhow::Result<PgConnectOptions> {
    let url = config.connection_url()?;
    let options = PgConnectOptions::from_str(&url)
        .map_err(|e| anyhow::anyhow!("Invalid database URL: {}", e))?
        .log_statements(log::LevelFilter::Debug)
        .log_slow_statements(log::LevelFilter::Warn, config.slow_statement_threshold);

    Ok(options)
}

/// Pool options from configuration. Zero timeouts mean "never".
pub fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero(settings.idle_timeout_secs))
        .max_lifetime(non_zero(settings.max_lifetime_secs))
}

/// Connect the shared pool.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = connect_options(config)?;
    info!(
        host = options.get_host(),
        database = options.get_database().unwrap_or_default(),
        max_connections = config.pool.max_connections,
        "Connecting to database"
    );

    let pool = pool_options(&config.pool).connect_with(options).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeouts_disable_expiry() {
        let settings = PoolSettings {
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 0,
            max_lifetime_secs: 60,
        };
        let options = pool_options(&settings);

        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_connect_options_from_components() {
        let config = DatabaseConfig {
            url: None,
            host: "db.internal".to_string(),
            port: 6543,
            user: "staff".to_string(),
            password: Some("secret".to_string()),
            name: "restaurant".to_string(),
            ..Default::default()
        };
        let options = connect_options(&config).unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "staff");
        assert_eq!(options.get_database(), Some("restaurant"));
    }
}
