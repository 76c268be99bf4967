//! Run configuration.
//!
//! Built once at startup from the command line and the process environment, then passed down read-only.

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

pub const DEFAULT_INPUT: &str = "https://storage.googleapis.com/onna-exercise-data/records_1.json";
pub const DEFAULT_OUTPUT: &str = "output.json";

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct Config {
    /// Address of the resource list (`http(s)://` or `file://`).
    #[arg(long, env = "INPUT", default_value = DEFAULT_INPUT)]
    pub input: Url,

    /// Path of the output file.
    #[arg(long, env = "OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Number of concurrent workers.
    #[arg(long, env = "WORKERS", default_value = "10")]
    pub workers: NonZeroUsize,

    /// Upper bound, in seconds, of the simulated processing time of an attempt.
    #[arg(long, env = "PROCESSING_TIME", default_value = "5.0", value_parser = parse_seconds)]
    pub processing_time: Duration,

    /// Upper bound, in seconds, of the dispatch delay preceding an attempt.
    #[arg(long, env = "DELAY_TIME", default_value = "5.0", value_parser = parse_seconds)]
    pub delay_time: Duration,

    /// Percentage of failed attempts.
    #[arg(long, env = "FAILURE_RATE", default_value = "25.0", value_parser = parse_percent)]
    pub failure_rate: f64,

    /// Maximum number of attempts per resource, the first one included.
    #[arg(long, env = "MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: NonZeroU32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: Url::parse(DEFAULT_INPUT).expect("default input is a valid URL"),
            output: PathBuf::from(DEFAULT_OUTPUT),
            workers: NonZeroUsize::MIN.saturating_add(9),
            processing_time: Duration::from_secs(5),
            delay_time: Duration::from_secs(5),
            failure_rate: 25.0,
            max_attempts: NonZeroU32::MIN.saturating_add(2),
        }
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|err| format!("`{s}` is not a number of seconds: {err}"))?;
    Duration::try_from_secs_f64(secs).map_err(|err| format!("`{s}` is not a valid duration: {err}"))
}

fn parse_percent(s: &str) -> Result<f64, String> {
    let percent: f64 = s.parse().map_err(|err| format!("`{s}` is not a percentage: {err}"))?;

    if (0.0..=100.0).contains(&percent) {
        Ok(percent)
    } else {
        Err(format!("`{s}` is not within [0, 100]"))
    }
}
