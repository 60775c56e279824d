//! Engine wiring over the crate's in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use lakesync_catalog::testing::{FakeCrawler, FakeParams, FakeSnapshots, FixedDay};
use lakesync_catalog::*;
use lakesync_core::{Day, ParameterNames};

pub const PREFIX: &str = "/it";
pub const REFERENCE: &str = "20250121";
pub const PREVIOUS: &str = "20250120";

pub fn day(s: &str) -> Day {
    Day::parse_canonical(s).unwrap()
}

pub fn key(table: &str, day: &str) -> String {
    format!("hr/convert/{table}/date={day}/{table}.parquet")
}

/// A fully wired engine over the fakes, with group `hr`.
pub struct Lake {
    pub lake: Arc<FakeSnapshots>,
    pub crawler: Arc<FakeCrawler>,
    pub params: Arc<FakeParams>,
    pub dates: Arc<FixedDay>,
}

impl Lake {
    pub fn new(tables: &str) -> Self {
        let params = Arc::new(FakeParams::default());
        params.set("/it/common/hr/targettable", tables);
        params.set("/it/common/s3bucket", "lake");
        params.set("/it/common/pipelineconv", "convert");
        Self {
            lake: Arc::new(FakeSnapshots::default()),
            crawler: Arc::new(FakeCrawler::default()),
            params,
            dates: Arc::new(FixedDay::new(Some(day(REFERENCE)))),
        }
    }

    /// Register a crawl job for `table` that stays RUNNING for `running_reads` reads.
    pub fn register(&self, table: &str, running_reads: usize) -> String {
        let job = format!("crawler-{table}");
        self.params.set(&format!("/it/updatecatalog/crawler/{table}"), &job);
        self.crawler.job(&job, running_reads);
        job
    }

    pub fn driver(&self) -> MaintenanceDriver {
        let names = ParameterNames::new(PREFIX);
        let context = ParameterContext::new(
            "hr",
            names.clone(),
            "basedatetime/basedatetime.csv",
            self.params.clone(),
            self.dates.clone(),
        );
        let launcher = CrawlJobLauncher::new(self.params.clone(), self.crawler.clone(), names);
        MaintenanceDriver::new(
            Arc::new(context),
            self.lake.clone(),
            launcher,
            CompletionPoller::new(self.crawler.clone()),
        )
        .with_poll_settings(fast())
    }
}

pub fn fast() -> PollSettings {
    PollSettings::new(Duration::from_millis(10), Duration::from_secs(5))
}
