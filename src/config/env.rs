use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const PREFIX: &str = "HEADSUP_";

/// Flat `HEADSUP_*` overrides applied after the layered sources.
pub(super) struct EnvOverrides {
    lookup: fn(&str) -> Option<String>,
}

impl EnvOverrides {
    pub(super) fn from_process() -> Self {
        Self {
            lookup: |name| std::env::var(name).ok(),
        }
    }

    #[cfg(test)]
    pub(super) const fn with_lookup(lookup: fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{PREFIX}{name}"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub(super) fn string(&self, name: &str) -> Option<String> {
        self.raw(name)
    }

    pub(super) fn parse<T>(&self, name: &str, field: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.raw(name)
            .map(|value| {
                value.parse::<T>().map_err(|err| ConfigError::InvalidField {
                    field,
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    pub(super) fn duration(
        &self,
        name: &str,
        field: &'static str,
    ) -> Result<Option<Duration>, ConfigError> {
        self.raw(name)
            .map(|value| {
                value.parse::<u64>().map(Duration::from_millis).or_else(|_| {
                    humantime::parse_duration(&value).map_err(|err| ConfigError::InvalidField {
                        field,
                        message: err.to_string(),
                    })
                })
            })
            .transpose()
    }
}
