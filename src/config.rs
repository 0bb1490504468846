use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use url::Url;

pub const DEFAULT_ENDPOINT: &str =
    "https://metromap.cityofmadison.com/bustime/api/v3/getpredictions";

// Paterson SOUTHBOUND
pub const DEFAULT_STOP_ID: &str = "10089";

const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration: {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Builder(#[from] ConfigBuilderError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything the poller needs, built once at startup
#[derive(Builder, Clone)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Config {
    pub api_key: String,

    #[builder(default = "DEFAULT_STOP_ID.to_string()")]
    pub stop_id: String,

    /// Passed upstream as `top`
    #[builder(default = "3")]
    pub prediction_count: u32,

    #[builder(default = "PathBuf::from(\".\")")]
    pub output_dir: PathBuf,

    #[builder(default = "Duration::from_secs(60)")]
    pub tick_interval: Duration,

    /// Line ticks up with wall clock multiples of `tick_interval`
    #[builder(default = "true")]
    pub align_to_minute: bool,

    pub endpoint: Url,

    #[builder(default = "Duration::from_secs(15)")]
    pub request_timeout: Duration,

    #[builder(default = "1024 * 1024")]
    pub max_body_bytes: usize,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err("api_key must not be empty".to_string());
            }
        }
        if self.prediction_count == Some(0) {
            return Err("prediction_count must be at least 1".to_string());
        }
        if let Some(interval) = self.tick_interval {
            if interval < Duration::from_secs(1) || interval > MAX_TICK_INTERVAL {
                return Err("tick_interval must be between one second and one day".to_string());
            }
        }
        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() || timeout > MAX_REQUEST_TIMEOUT {
                return Err("request_timeout must be between zero and one hour".to_string());
            }
        }
        if self.max_body_bytes == Some(0) {
            return Err("max_body_bytes must be positive".to_string());
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> ConfigResult<Config> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings by environment variable name from `lookup`
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("API_KEY"))?;

        let mut builder = ConfigBuilder::default();
        builder.api_key(api_key);

        if let Some(stop_id) = lookup("STOP_ID") {
            builder.stop_id(stop_id);
        }
        if let Some(count) = parse_var::<u32, _>(&lookup, "PREDICTION_COUNT")? {
            builder.prediction_count(count);
        }
        if let Some(dir) = lookup("OUTPUT_DIR") {
            builder.output_dir(dir);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TICK_INTERVAL_SECS")? {
            builder.tick_interval(Duration::from_secs(secs));
        }
        if let Some(align) = lookup("ALIGN_TO_MINUTE") {
            builder.align_to_minute(parse_flag("ALIGN_TO_MINUTE", &align)?);
        }
        let endpoint = lookup("BUSTIME_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint).map_err(|e| ConfigError::Invalid {
            var: "BUSTIME_URL",
            reason: e.to_string(),
        })?;
        builder.endpoint(endpoint);
        if let Some(secs) = parse_var::<u64, _>(&lookup, "REQUEST_TIMEOUT_SECS")? {
            builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(bytes) = parse_var::<usize, _>(&lookup, "MAX_BODY_BYTES")? {
            builder.max_body_bytes(bytes);
        }

        Ok(builder.build()?)
    }
}

// Keeps the key out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("stop_id", &self.stop_id)
            .field("prediction_count", &self.prediction_count)
            .field("output_dir", &self.output_dir)
            .field("tick_interval", &self.tick_interval)
            .field("align_to_minute", &self.align_to_minute)
            .field("endpoint", &self.endpoint.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: format!("{:?}: {}", value, e),
            })
        })
        .transpose()
}

fn parse_flag(var: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("{:?} is not a boolean", other),
        }),
    }
}
