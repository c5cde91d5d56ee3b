use dotenvy::dotenv;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;
use std::env;

/// Full configuration for the quota service process.
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub common: CommonConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub quota: QuotaSettings,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Free-tier settings consumed (not owned) by the ledger core: they are
/// passed into every relevant operation, never read inside it.
#[derive(Debug, Clone, Copy)]
pub struct QuotaSettings {
    pub free_limit: i32,
    pub bonus_amount: i32,
}

impl QuotaConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let port = env::var("QUOTA_SERVICE_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid QUOTA_SERVICE_PORT: {}", e))
            })?;

        let url = env::var("QUOTA_DATABASE_URL").map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("QUOTA_DATABASE_URL must be set"))
        })?;
        let max_connections = parse_env("QUOTA_DB_MAX_CONNECTIONS", 5)?;
        let min_connections = parse_env("QUOTA_DB_MIN_CONNECTIONS", 1)?;

        let free_limit: i32 = parse_env("FREE_LIMIT", 3)?;
        // The bonus restores a full free tier unless configured otherwise.
        let bonus_amount: i32 = parse_env("BONUS_AMOUNT", free_limit)?;
        if free_limit < 1 || bonus_amount < 1 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "FREE_LIMIT and BONUS_AMOUNT must be positive integers"
            )));
        }

        Ok(Self {
            common: CommonConfig { port },
            service_name: "quota-service".to_string(),
            log_level: env::var("QUOTA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url,
                max_connections,
                min_connections,
            },
            quota: QuotaSettings {
                free_limit,
                bonus_amount,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
