use std::time::Duration;

use humantime::parse_duration;
use serde::Deserialize;
use serde_with::DeserializeAs;

/// Accepts either a bare integer (milliseconds) or a `humantime` string.
pub struct MillisOrHumantime;

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Millis(u64),
    Text(String),
}

impl<'de> DeserializeAs<'de, Duration> for MillisOrHumantime {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Millis(ms) => Ok(Duration::from_millis(ms)),
            Repr::Text(raw) => {
                let raw = raw.trim();
                if let Ok(ms) = raw.parse::<u64>() {
                    return Ok(Duration::from_millis(ms));
                }
                parse_duration(raw).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MillisOrHumantime;
    use serde::Deserialize;
    use serde_with::serde_as;
    use std::time::Duration;

    #[serde_as]
    #[derive(Deserialize)]
    struct Sample {
        #[serde_as(as = "MillisOrHumantime")]
        delay: Duration,
    }

    fn parse(json: &str) -> Duration {
        match serde_json::from_str::<Sample>(json) {
            Ok(sample) => sample.delay,
            Err(err) => panic!("failed to parse sample json: {err}"),
        }
    }

    #[test]
    fn accepts_integer_milliseconds() {
        assert_eq!(parse(r#"{"delay":2500}"#), Duration::from_millis(2500));
        assert_eq!(parse(r#"{"delay":"750"}"#), Duration::from_millis(750));
    }

    #[test]
    fn accepts_humantime_strings() {
        assert_eq!(parse(r#"{"delay":"5s"}"#), Duration::from_secs(5));
        assert!(serde_json::from_str::<Sample>(r#"{"delay":"soon"}"#).is_err());
    }
}
