// src/config.rs
use std::fmt;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::{Error, Result};

pub const DEFAULT_DB_PORT: u16 = 8086;
pub const DEFAULT_DB_NAME: &str = "spaceengineers";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 3000;

#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    /// `None` trusts the host clock's own offset.
    pub assumed_local_timezone: Option<Tz>,
    pub http_timeout: Duration,
    /// Repeat collection on this interval instead of running once.
    pub interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| get(k).ok_or_else(|| Error::config(format!("{k} is required")));

        let db_port = match get("INFLUX_PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| Error::config(format!("INFLUX_PORT `{v}` is not a port number")))?,
            None => DEFAULT_DB_PORT,
        };

        let assumed_local_timezone = match get("ASSUMED_LOCAL_TZ") {
            Some(v) if v.eq_ignore_ascii_case("local") => None,
            Some(v) => Some(
                v.parse::<Tz>()
                    .map_err(|_| Error::config(format!("'{v}' is not a valid IANA timezone")))?,
            ),
            None => Some(DEFAULT_TIMEZONE),
        };

        let http_timeout_ms = match get("HTTP_TIMEOUT_MS") {
            Some(v) => v
                .parse()
                .map_err(|_| Error::config(format!("HTTP_TIMEOUT_MS `{v}` is not a number")))?,
            None => DEFAULT_HTTP_TIMEOUT_MS,
        };

        let interval = match get("COLLECT_INTERVAL_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(Error::config(format!(
                        "COLLECT_INTERVAL_SECS `{v}` must be a positive number"
                    )))
                }
                Ok(secs) => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        Ok(Self {
            api_url: required("VRAGE_URL")?,
            api_key: required("VRAGE_KEY")?,
            db_host: required("INFLUX_HOST")?,
            db_port,
            db_name: get("INFLUX_DB").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            assumed_local_timezone,
            http_timeout: Duration::from_millis(http_timeout_ms),
            interval,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("assumed_local_timezone", &self.assumed_local_timezone)
            .field("http_timeout", &self.http_timeout)
            .field("interval", &self.interval)
            .finish()
    }
}
