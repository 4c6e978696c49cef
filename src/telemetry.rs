use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Picks the first usable filter among the explicit one, `RUST_LOG`, and the
/// built-in default.
fn resolve_filter(explicit: Option<&str>) -> Result<EnvFilter> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(std::env::var("RUST_LOG").ok())
        .chain(std::iter::once(DEFAULT_FILTER.to_string()))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Fails when no filter can be parsed, when JSON output is requested from a
/// build without the `json-logs` feature, or when a global subscriber is
/// already installed.
pub fn init_tracing(explicit_filter: Option<&str>, format: LogFormat) -> Result<()> {
    let filter = resolve_filter(explicit_filter)?;

    match format {
        #[cfg(feature = "json-logs")]
        LogFormat::Json => {
            let subscriber = Registry::default().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| Error::Telemetry(err.to_string()))
        }
        #[cfg(not(feature = "json-logs"))]
        LogFormat::Json => Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        )),
        LogFormat::Text => {
            let subscriber = Registry::default().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| Error::Telemetry(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LogFormat, resolve_filter};

    #[test]
    fn explicit_filter_wins_when_valid() {
        let filter = match resolve_filter(Some("headsup=trace")) {
            Ok(filter) => filter,
            Err(err) => panic!("filter should parse: {err}"),
        };
        assert!(filter.to_string().contains("headsup=trace"));
    }

    #[test]
    fn json_flag_maps_to_format() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Text);
    }
}
