use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a scripted notification feed through the heads-up overlay", long_about = None)]
pub struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON-lines replay script. Reads standard input when omitted.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Overrides the base decay time (e.g. "5s", "0" disables decay).
    #[arg(long, value_parser = parse_decay)]
    pub decay_time: Option<Duration>,

    /// Divides every script delay; 2.0 replays twice as fast.
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Emit JSON logs (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "headsup=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

fn parse_decay(raw: &str) -> Result<Duration, humantime::DurationError> {
    if raw.trim() == "0" {
        return Ok(Duration::ZERO);
    }
    parse_duration(raw)
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn parses_overrides() {
        let cli = match Cli::try_parse_from(["headsup", "--decay-time", "1500ms", "--speed", "4"]) {
            Ok(cli) => cli,
            Err(err) => panic!("arguments rejected: {err}"),
        };
        assert_eq!(cli.decay_time, Some(Duration::from_millis(1500)));
        assert!((cli.speed - 4.0).abs() < f64::EPSILON);
        assert!(cli.script.is_none());
    }

    #[test]
    fn zero_decay_disables_decay() {
        let cli = match Cli::try_parse_from(["headsup", "--decay-time", "0"]) {
            Ok(cli) => cli,
            Err(err) => panic!("arguments rejected: {err}"),
        };
        assert_eq!(cli.decay_time, Some(Duration::ZERO));
    }
}
