use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default poll interval between crawl status rounds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default completion timeout (3 hours).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10_800;

const DEFAULT_PARAM_PREFIX: &str = "/lakesync";
const DEFAULT_REFERENCE_DATE_KEY: &str = "basedatetime/basedatetime.csv";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Catalog group whose table list is maintained (`GROUP`).
    pub group: Option<String>,
    pub aws: AwsConfig,
    pub params: ParameterNames,
    pub crawl: CrawlConfig,
    pub snapshot: SnapshotConfig,
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LAKESYNC_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("LAKESYNC_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            group: profiled_env_opt(p, "GROUP"),
            aws: AwsConfig::from_env_profiled(p),
            params: ParameterNames::from_env_profiled(p),
            crawl: CrawlConfig::from_env_profiled(p),
            snapshot: SnapshotConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  group:       {}", self.group.as_deref().unwrap_or("(none)"));
        tracing::info!("  aws:         region={}, endpoint={}", self.aws.region, self.aws.endpoint_url.as_deref().unwrap_or("(default)"));
        tracing::info!("  params:      prefix={}", self.params.prefix);
        tracing::info!("  crawl:       poll={}s, timeout={}s", self.crawl.poll_interval_secs, self.crawl.timeout_secs);
        tracing::info!("  snapshot:    format={}, reference={}", self.snapshot.format, self.snapshot.reference_date_key);
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "ap-northeast-1"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "ap-northeast-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint_url: None,
        }
    }
}

// ── Parameter store names ─────────────────────────────────────

/// Parameter-store paths, all rooted at one prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterNames {
    pub prefix: String,
}

impl ParameterNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    fn from_env_profiled(p: &str) -> Self {
        Self::new(profiled_env_or(p, "LAKESYNC_PARAM_PREFIX", DEFAULT_PARAM_PREFIX))
    }

    /// Crawl job name registered for a table.
    pub fn crawler(&self, table: &str) -> String {
        format!("{}/updatecatalog/crawler/{}", self.prefix, table)
    }

    /// Comma separated table list of a group.
    pub fn table_list(&self, group: &str) -> String {
        format!("{}/common/{}/targettable", self.prefix, group)
    }

    pub fn bucket(&self) -> String {
        format!("{}/common/s3bucket", self.prefix)
    }

    /// Key segment under which converted parquet partitions live.
    pub fn conversion_key(&self) -> String {
        format!("{}/common/pipelineconv", self.prefix)
    }
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self::new(DEFAULT_PARAM_PREFIX)
    }
}

// ── Crawl polling ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl CrawlConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            poll_interval_secs: profiled_env_u64(p, "CRAWL_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            timeout_secs: profiled_env_u64(p, "CRAWL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ── Snapshots ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// File extension of partition objects (`<table>.<format>`).
    pub format: String,
    /// Object key of the reference-date CSV inside the lake bucket.
    pub reference_date_key: String,
}

impl SnapshotConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            format: profiled_env_or(p, "SNAPSHOT_FORMAT", "parquet"),
            reference_date_key: profiled_env_or(p, "REFERENCE_DATE_KEY", DEFAULT_REFERENCE_DATE_KEY),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            format: "parquet".to_string(),
            reference_date_key: DEFAULT_REFERENCE_DATE_KEY.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-based tests must run serially to avoid interfering with each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        let keys = [
            "LAKESYNC_PROFILE",
            "GROUP",
            "AWS_REGION",
            "AWS_ENDPOINT_URL",
            "LAKESYNC_PARAM_PREFIX",
            "CRAWL_POLL_INTERVAL_SECS",
            "CRAWL_TIMEOUT_SECS",
            "SNAPSHOT_FORMAT",
            "REFERENCE_DATE_KEY",
            "PROD_GROUP",
            "PROD_CRAWL_TIMEOUT_SECS",
        ];
        for k in keys {
            env::remove_var(k);
        }
    }

    #[test]
    fn defaults_when_no_env_vars() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = EngineConfig::for_profile("");
        assert_eq!(cfg.profile_label(), "default");
        assert!(cfg.group.is_none());
        assert_eq!(cfg.params.prefix, "/lakesync");
        assert_eq!(cfg.crawl.poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.crawl.timeout(), Duration::from_secs(10_800));
        assert_eq!(cfg.snapshot.format, "parquet");
        assert_eq!(cfg.snapshot.reference_date_key, "basedatetime/basedatetime.csv");
    }

    #[test]
    fn profiled_env_takes_precedence() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("GROUP", "base");
        env::set_var("PROD_GROUP", "prod-group");
        env::set_var("CRAWL_TIMEOUT_SECS", "60");
        env::set_var("PROD_CRAWL_TIMEOUT_SECS", "120");

        let cfg = EngineConfig::for_profile("prod");
        assert_eq!(cfg.profile, "PROD");
        assert_eq!(cfg.group.as_deref(), Some("prod-group"));
        assert_eq!(cfg.crawl.timeout_secs, 120);

        let base = EngineConfig::for_profile("");
        assert_eq!(base.group.as_deref(), Some("base"));
        assert_eq!(base.crawl.timeout_secs, 60);

        clear_env();
    }

    #[test]
    fn invalid_number_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("CRAWL_POLL_INTERVAL_SECS", "soon");
        let cfg = EngineConfig::for_profile("");
        assert_eq!(cfg.crawl.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);

        clear_env();
    }

    #[test]
    fn parameter_paths() {
        let names = ParameterNames::new("/m365/");
        assert_eq!(names.crawler("users"), "/m365/updatecatalog/crawler/users");
        assert_eq!(names.table_list("hr"), "/m365/common/hr/targettable");
        assert_eq!(names.bucket(), "/m365/common/s3bucket");
        assert_eq!(names.conversion_key(), "/m365/common/pipelineconv");
    }
}
