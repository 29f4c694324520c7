use crate::catalog::MigrationTable;
use crate::storage::StorageConfig;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://certgen.db?mode=rwc";

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub migrations: MigrationTable,
    pub public_host: String,
    pub url_timeout: Duration,
    pub workers: usize,
    pub default_jurisdiction: String,
    pub kitten_url: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            storage: StorageConfig::new(
                get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            ),
            migrations: get("CERTGEN_MIGRATIONS")
                .map(|raw| MigrationTable::parse(&raw))
                .unwrap_or_default(),
            public_host: get("CERTGEN_PUBLIC_HOST").unwrap_or_default(),
            url_timeout: Duration::from_secs(
                get("CERTGEN_URL_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            workers: get("CERTGEN_WORKERS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            default_jurisdiction: get("CERTGEN_DEFAULT_JURISDICTION")
                .unwrap_or_else(|| "gb".to_string()),
            kitten_url: get("CERTGEN_KITTEN_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = EngineConfig::from_lookup(|_| None);
        assert_eq!(cfg.storage.url, DEFAULT_DATABASE_URL);
        assert!(cfg.migrations.is_empty());
        assert_eq!(cfg.url_timeout, Duration::from_secs(10));
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.default_jurisdiction, "gb");
        assert!(cfg.kitten_url.is_none());
    }

    #[test]
    fn values_are_read_and_bad_numbers_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("CERTGEN_MIGRATIONS", "gb=gb-2024, us=us-2024"),
            ("CERTGEN_WORKERS", "many"),
            ("CERTGEN_URL_TIMEOUT_SECS", "3"),
            ("CERTGEN_KITTEN_URL", "  "),
        ]);
        let cfg = EngineConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.storage.url, "sqlite::memory:");
        assert_eq!(cfg.migrations.migrate("gb"), "gb-2024");
        assert_eq!(cfg.migrations.migrate("us"), "us-2024");
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.url_timeout, Duration::from_secs(3));
        assert!(cfg.kitten_url.is_none());
    }
}
