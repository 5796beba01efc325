use std::{env::var, num::ParseIntError, str::FromStr};

use thiserror::Error;

pub const DEFAULT_DOMAIN_SUFFIX: &str = "abhilash.com";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_API_PATH: &str = "/api/v1/books";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

const DOMAIN_SUFFIX_ENV: &str = "EKSPOSE_DOMAIN_SUFFIX";
const DEFAULT_PORT_ENV: &str = "EKSPOSE_DEFAULT_PORT";
const API_PORT_ENV: &str = "EKSPOSE_API_PORT";
const API_PATH_ENV: &str = "EKSPOSE_API_PATH";
const WATCH_NAMESPACE_ENV: &str = "EKSPOSE_WATCH_NAMESPACE";
const MAX_RETRIES_ENV: &str = "EKSPOSE_MAX_RETRIES";

/// Values shaping the generated services and ingresses, plus the agent's
/// retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeConfig {
    /// Ingress hosts are generated as `{name}.{domain_suffix}`.
    pub domain_suffix: String,
    /// Port used when a workload carries no `port` label, and by recreated
    /// ingresses.
    pub default_port: u16,
    /// Workloads exposed on this port are routed under `api_path`.
    pub api_port: u16,
    pub api_path: String,
    /// `None` watches every namespace.
    pub watch_namespace: Option<String>,
    pub max_retries: u32,
}

#[derive(Debug, Error)]
pub enum FromError {
    #[error("Env var {} couldn't be parsed as a number: {}", .0, .1)]
    InvalidNumber(&'static str, ParseIntError),
    #[error("Env var {} contains an invalid value: {}", .0, .1)]
    InvalidValue(&'static str, &'static str),
}

impl Default for ExposeConfig {
    fn default() -> Self {
        Self {
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_owned(),
            default_port: DEFAULT_PORT,
            api_port: DEFAULT_API_PORT,
            api_path: DEFAULT_API_PATH.to_owned(),
            watch_namespace: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ExposeConfig {
    pub fn from_env() -> Result<Self, FromError> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FromError> {
        let defaults = Self::default();

        let domain_suffix = lookup(DOMAIN_SUFFIX_ENV).unwrap_or(defaults.domain_suffix);
        if domain_suffix.is_empty() || domain_suffix.starts_with('.') {
            return Err(FromError::InvalidValue(
                DOMAIN_SUFFIX_ENV,
                "expected a domain without a leading dot",
            ));
        }

        let api_path = lookup(API_PATH_ENV).unwrap_or(defaults.api_path);
        if !api_path.starts_with('/') {
            return Err(FromError::InvalidValue(API_PATH_ENV, "expected an absolute path"));
        }

        Ok(Self {
            domain_suffix,
            default_port: parse_port(&lookup, DEFAULT_PORT_ENV)?.unwrap_or(defaults.default_port),
            api_port: parse_port(&lookup, API_PORT_ENV)?.unwrap_or(defaults.api_port),
            api_path,
            watch_namespace: lookup(WATCH_NAMESPACE_ENV).filter(|namespace| !namespace.is_empty()),
            max_retries: parse_number(&lookup, MAX_RETRIES_ENV)?.unwrap_or(defaults.max_retries),
        })
    }
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, FromError>
where
    T: FromStr<Err = ParseIntError>,
{
    lookup(key)
        .map(|raw| raw.parse().map_err(|err| FromError::InvalidNumber(key, err)))
        .transpose()
}

fn parse_port(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u16>, FromError> {
    match parse_number(lookup, key)? {
        Some(0) => Err(FromError::InvalidValue(key, "port 0 can't be exposed")),
        port => Ok(port),
    }
}
