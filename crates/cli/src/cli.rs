use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lakesync_catalog::{Invocation, PollSettings};
use lakesync_core::CrawlConfig;

/// Keep the data catalog in step with the lake.
///
/// Compares each table's latest partition schema with an earlier one, picks
/// an incremental or full crawl accordingly, starts the crawlers and waits
/// for them to finish.
#[derive(Parser, Debug, Default)]
#[command(name = "lakesync", version, about)]
pub struct CliArgs {
    /// Execution mode: prevdif, specdif or fulscan
    #[arg(long)]
    pub mode: Option<String>,

    /// Target table (specdif, fulscan)
    #[arg(long)]
    pub table: Option<String>,

    /// Day to compare against, YYYYMMDD (specdif)
    #[arg(long)]
    pub target_day: Option<String>,

    /// Catalog group whose table list is maintained (overrides GROUP)
    #[arg(long)]
    pub group: Option<String>,

    /// Invocation as a JSON event, e.g. '{"exec_type":"prevdif"}'.
    /// Explicit flags take precedence over event fields.
    #[arg(long)]
    pub event: Option<String>,

    /// Seconds between crawl status rounds (fractions allowed)
    #[arg(long)]
    pub poll_interval_secs: Option<f64>,

    /// Seconds to wait for crawlers before giving up (fractions allowed)
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// Read partitions from a local directory (one sub-directory per bucket)
    /// instead of S3
    #[arg(long)]
    pub local_root: Option<PathBuf>,

    /// Exit with code 3 when any crawler did not end READY
    #[arg(long)]
    pub require_ready: bool,
}

impl CliArgs {
    /// Merge the event payload (if any) with explicit flags.
    pub fn invocation(&self) -> Result<Invocation> {
        let mut inv = match &self.event {
            Some(raw) => serde_json::from_str::<Invocation>(raw).context("--event is not a valid invocation")?,
            None => Invocation::default(),
        };
        if self.mode.is_some() {
            inv.mode = self.mode.clone();
        }
        if self.table.is_some() {
            inv.table = self.table.clone();
        }
        if self.target_day.is_some() {
            inv.target_day = self.target_day.clone();
        }
        Ok(inv)
    }

    pub fn poll_settings(&self, crawl: &CrawlConfig) -> Result<PollSettings> {
        let interval = seconds("--poll-interval-secs", self.poll_interval_secs)?.unwrap_or(crawl.poll_interval());
        let timeout = seconds("--timeout-secs", self.timeout_secs)?.unwrap_or(crawl.timeout());
        Ok(PollSettings::new(interval, timeout))
    }
}

fn seconds(flag: &str, value: Option<f64>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(Some(Duration::from_secs_f64(v))),
        Some(v) => bail!("{flag} must be a non-negative number, got {v}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = CliArgs::try_parse_from([
            "lakesync",
            "--mode",
            "specdif",
            "--table",
            "users",
            "--target-day",
            "20250115",
            "--poll-interval-secs",
            "0.5",
            "--require-ready",
        ])
        .unwrap();
        assert_eq!(args.mode.as_deref(), Some("specdif"));
        assert!(args.require_ready);

        let settings = args.poll_settings(&CrawlConfig::default()).unwrap();
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.timeout, Duration::from_secs(10_800));
    }

    #[test]
    fn event_fields_are_overridden_by_flags() {
        let args = CliArgs {
            event: Some(r#"{"exec_type":"specdif","targettable":"users","specdif_targetday":"20250101"}"#.into()),
            target_day: Some("20250115".into()),
            ..CliArgs::default()
        };
        let inv = args.invocation().unwrap();
        assert_eq!(inv.mode.as_deref(), Some("specdif"));
        assert_eq!(inv.table.as_deref(), Some("users"));
        assert_eq!(inv.target_day.as_deref(), Some("20250115"));
    }

    #[test]
    fn bad_event_json_is_rejected() {
        let args = CliArgs {
            event: Some("{not json".into()),
            ..CliArgs::default()
        };
        assert!(args.invocation().is_err());
    }

    #[test]
    fn negative_durations_are_rejected() {
        let args = CliArgs {
            timeout_secs: Some(-1.0),
            ..CliArgs::default()
        };
        assert!(args.poll_settings(&CrawlConfig::default()).is_err());
    }
}
