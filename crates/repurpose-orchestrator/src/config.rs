//! Process-level configuration the core itself owns (§6 "Environment").
//!
//! Credentials and endpoints for the graph store, wide-column store,
//! literature API, synthesizer, NER extractor, and scorer are driver
//! concerns and live outside the core (§1 "Out of scope"). The one piece of
//! environment-driven configuration the core is responsible for is the
//! fallback audit log directory (§4.C) and the tunables that bound a
//! request's resource usage (§5) when an operator wants to override the
//! spec's defaults for a deployment.
//!
//! Read once at process startup and passed into [`crate::Orchestrator::new`]
//! by explicit dependency injection, matching the rest of the core's
//! no-globals posture (§9).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use repurpose_domain::error::{RepurposeError, RepurposeResult};

const AUDIT_FALLBACK_DIR_VAR: &str = "REPURPOSE_AUDIT_FALLBACK_DIR";
const REQUEST_TIMEOUT_SECS_VAR: &str = "REPURPOSE_REQUEST_TIMEOUT_SECS";
const STAGE_TIMEOUT_SECS_VAR: &str = "REPURPOSE_STAGE_TIMEOUT_SECS";

const DEFAULT_AUDIT_FALLBACK_DIR: &str = "./audit-fallback";
/// §5 "Per request: 300s".
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
/// §5 "Per stage: total wall time 120s".
const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;

/// Core-owned configuration, loaded from the environment with the spec's
/// defaults (§5 timeouts, §4.C fallback path) when a variable is unset.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub audit_fallback_dir: PathBuf,
    pub request_timeout: Duration,
    pub stage_timeout: Duration,
}

impl CoreConfig {
    /// Load configuration from the process environment. Fails with
    /// `ConfigError` if a present variable cannot be parsed, rather than
    /// silently falling back to the default (§2 "Domain model ... No silent
    /// coercion" applies here too: a malformed override is a configuration
    /// mistake, not a hint to guess).
    pub fn from_env() -> RepurposeResult<CoreConfig> {
        let audit_fallback_dir = env::var(AUDIT_FALLBACK_DIR_VAR).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_AUDIT_FALLBACK_DIR));

        let request_timeout = read_duration_secs(REQUEST_TIMEOUT_SECS_VAR, DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let stage_timeout = read_duration_secs(STAGE_TIMEOUT_SECS_VAR, DEFAULT_STAGE_TIMEOUT_SECS)?;

        if stage_timeout > request_timeout {
            return Err(RepurposeError::ConfigError {
                reason: format!("{STAGE_TIMEOUT_SECS_VAR} ({stage_timeout:?}) exceeds {REQUEST_TIMEOUT_SECS_VAR} ({request_timeout:?})"),
            });
        }

        Ok(CoreConfig { audit_fallback_dir, request_timeout, stage_timeout })
    }

    /// The defaults this spec fixes (§5), with no environment overrides.
    pub fn defaults() -> CoreConfig {
        CoreConfig {
            audit_fallback_dir: PathBuf::from(DEFAULT_AUDIT_FALLBACK_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
        }
    }
}

fn read_duration_secs(var: &str, default_secs: u64) -> RepurposeResult<Duration> {
    match env::var(var) {
        Err(_) => Ok(Duration::from_secs(default_secs)),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| RepurposeError::ConfigError { reason: format!("{var} must be a positive integer number of seconds, got {raw:?}") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable tests must not run concurrently with each other —
    // serialize them with a process-wide lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec_timeouts() {
        let config = CoreConfig::defaults();
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert_eq!(config.stage_timeout, Duration::from_secs(120));
        assert_eq!(config.audit_fallback_dir, PathBuf::from("./audit-fallback"));
    }

    #[test]
    fn rejects_malformed_timeout_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(STAGE_TIMEOUT_SECS_VAR, "not-a-number");
        let result = CoreConfig::from_env();
        env::remove_var(STAGE_TIMEOUT_SECS_VAR);
        assert!(matches!(result, Err(RepurposeError::ConfigError { .. })));
    }

    #[test]
    fn rejects_stage_timeout_exceeding_request_timeout() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(STAGE_TIMEOUT_SECS_VAR, "400");
        env::set_var(REQUEST_TIMEOUT_SECS_VAR, "300");
        let result = CoreConfig::from_env();
        env::remove_var(STAGE_TIMEOUT_SECS_VAR);
        env::remove_var(REQUEST_TIMEOUT_SECS_VAR);
        assert!(matches!(result, Err(RepurposeError::ConfigError { .. })));
    }

    #[test]
    fn accepts_a_valid_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(AUDIT_FALLBACK_DIR_VAR, "/tmp/repurpose-audit");
        let config = CoreConfig::from_env().unwrap();
        env::remove_var(AUDIT_FALLBACK_DIR_VAR);
        assert_eq!(config.audit_fallback_dir, PathBuf::from("/tmp/repurpose-audit"));
    }
}
