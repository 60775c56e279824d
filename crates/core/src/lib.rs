pub mod config;
pub mod day;
pub mod model;

pub use config::{load_dotenv, AwsConfig, CrawlConfig, EngineConfig, ParameterNames, SnapshotConfig};
pub use day::{Day, DayError};
pub use model::*;
