pub mod completion;
pub mod context;
pub mod diff;
pub mod driver;
pub mod error;
pub mod invocation;
pub mod launcher;
pub mod poll;
pub mod policy;
pub mod report;
pub mod snapshot;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use completion::{CompletionPoller, CompletionReport};
pub use context::{ContextSource, ParameterContext, RunContext};
pub use diff::{DiffResult, SchemaDiffVerifier};
pub use driver::MaintenanceDriver;
pub use error::{CatalogError, ServiceError};
pub use invocation::{Invocation, Mode};
pub use launcher::CrawlJobLauncher;
pub use poll::{wait_all, PollOutcome, PollSettings, Progress, StatusProbe};
pub use policy::select_policy;
pub use report::{MaintenanceReport, RunStatus, TableOutcome};
pub use snapshot::{ObjectLocation, Snapshot, SnapshotColumnReader, SnapshotLayout};
pub use traits::{CrawlService, ParameterStore, ReferenceDateSource, SnapshotStore};
