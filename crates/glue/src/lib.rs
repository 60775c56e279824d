//! AWS adapters for the catalog engine: Glue crawlers, Glue data-quality
//! runs and SSM parameters.

pub mod client;
pub mod crawler;
pub mod quality;
pub mod ssm;

pub use client::{load_sdk_config, AwsClients, GlueError};
pub use crawler::GlueCrawlService;
pub use quality::{wait_for_runs, DataQualityRun, GlueDataQualityRuns, RunState};
pub use ssm::SsmParameterStore;
