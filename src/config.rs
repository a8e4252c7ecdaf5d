use std::env;

use crate::error::AppError;

/// Largest symmetric window (in days) scanned for alternative dates.
const MAX_ALTERNATIVE_WINDOW: u32 = 14;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub job_queue_size: usize,
    pub event_buffer_size: usize,
    /// JSON document loaded into the in-memory store at startup.
    pub seed_file: Option<String>,
    pub alternative_date_window: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            job_queue_size: parse_or_default("JOB_QUEUE_SIZE", 256)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            seed_file: env::var("SEED_FILE").ok().filter(|path| !path.trim().is_empty()),
            alternative_date_window: parse_or_default("ALTERNATIVE_DATE_WINDOW", 3)?,
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.job_queue_size == 0 || self.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "JOB_QUEUE_SIZE and EVENT_BUFFER_SIZE must be > 0".to_string(),
            ));
        }
        if self.alternative_date_window > MAX_ALTERNATIVE_WINDOW {
            return Err(AppError::Internal(format!(
                "ALTERNATIVE_DATE_WINDOW must be at most {MAX_ALTERNATIVE_WINDOW}"
            )));
        }
        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
