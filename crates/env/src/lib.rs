use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{ensure, Context, Error};

const DEFAULT_SWEEP_INTERVAL_MIN: u64 = 5;

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    rust_log: String,
    sweep_interval_min: u64,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    pub fn sweep_interval_min(&self) -> u64 {
        self.0.sweep_interval_min
    }

    pub fn load() -> Result<Env, Error> {
        let _ = dotenv();

        Ok(Env(Arc::new(EnvInner {
            mongo_url: var("MONGO_URL").context("MONGO_URL is not set")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            sweep_interval_min: parse_sweep_interval(var("SWEEP_INTERVAL_MIN").ok())?,
        })))
    }
}

/// A zero interval would panic the background loop, so it is rejected at
/// startup instead of taking the sweeper down silently.
fn parse_sweep_interval(value: Option<String>) -> Result<u64, Error> {
    let minutes = match value {
        Some(value) => value
            .parse()
            .context("SWEEP_INTERVAL_MIN must be a number of minutes")?,
        None => DEFAULT_SWEEP_INTERVAL_MIN,
    };
    ensure!(minutes > 0, "SWEEP_INTERVAL_MIN must be at least 1 minute");
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_interval_defaults() {
        assert_eq!(
            parse_sweep_interval(None).unwrap(),
            DEFAULT_SWEEP_INTERVAL_MIN
        );
        assert_eq!(parse_sweep_interval(Some("15".to_string())).unwrap(), 15);
    }

    #[test]
    fn test_sweep_interval_rejects_zero_and_garbage() {
        assert!(parse_sweep_interval(Some("0".to_string())).is_err());
        assert!(parse_sweep_interval(Some("soon".to_string())).is_err());
    }
}
