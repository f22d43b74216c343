use serde::Deserialize;

use crate::eligibility::EligibilityRules;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub eligibility: EligibilityRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Config {
    /// Load configuration from an optional TOML file layered under `RAKT_*`
    /// environment variables (e.g. `RAKT_DATABASE__PATH`).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .set_default("database.path", "raktsarthi.db")?
            .set_default("eligibility.min_weight_kg", 50.0)?
            .set_default("eligibility.min_days_between_donations", 56)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("RAKT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("database.path must not be empty");
        }
        if !self.eligibility.min_weight_kg.is_finite() || self.eligibility.min_weight_kg < 0.0 {
            anyhow::bail!(
                "eligibility.min_weight_kg must be a non-negative number, got {}",
                self.eligibility.min_weight_kg
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Tests below read the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_without_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = Config::load("does/not/exist").unwrap();
        assert_eq!(config.eligibility.min_days_between_donations, 56);
        assert_eq!(config.eligibility.min_weight_kg, 50.0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rakt.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[database]\npath = \"camps.db\"\n\n[eligibility]\nmin_weight_kg = 45.0").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.database.path, "camps.db");
        assert_eq!(config.eligibility.min_weight_kg, 45.0);
        assert_eq!(config.eligibility.min_days_between_donations, 56);
    }

    #[test]
    fn test_env_overrides_database_path() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("RAKT_DATABASE__PATH", "from_env.db");
        let loaded = Config::load("does/not/exist");
        std::env::remove_var("RAKT_DATABASE__PATH");

        let config = loaded.unwrap();
        assert_eq!(config.database.path, "from_env.db");
        assert_eq!(config.eligibility.min_days_between_donations, 56);
    }
}
