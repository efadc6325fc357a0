//! Deployment settings, read from the process environment.

use anyhow::{anyhow, Context, Result};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.sportsdata.io/v3/nfl/scores";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the settings from an arbitrary variable source.
    ///
    /// `SPORTSDATA_API_KEY` wins over the older `API_KEY` name when both are
    /// set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = ["SPORTSDATA_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| lookup(name))
            .map(|v| v.trim().to_owned())
            .find(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("SPORTSDATA_API_KEY must be set to the statistics API key"))?;

        let base_url = lookup("SPORTSDATA_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        let timeout_secs = match lookup("SPORTSDATA_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(text) => {
                let secs: u64 = text
                    .trim()
                    .parse()
                    .with_context(|| format!("SPORTSDATA_TIMEOUT_SECS `{text}` is not an integer"))?;

                if secs == 0 {
                    return Err(anyhow!("SPORTSDATA_TIMEOUT_SECS must be positive"));
                }

                secs
            }
        };

        Ok(Config {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}
