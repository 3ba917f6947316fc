//! Intentionally minimal configuration: no TOML/YAML parsing dependency,
//! construct directly or via `WorkbenchConfig::from_env` reading a handful
//! of environment variables with sane defaults.

use std::time::Duration;

/// Top-level knobs for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    /// Directory execution traces and artifacts are written under.
    pub data_dir: std::path::PathBuf,
    /// Hard cap on master-graph iterations before the decision gate forces
    /// synthesis. Fixed per orchestrator instance, no per-query override.
    pub max_iterations: usize,
    /// Per-tool-call timeout before the tool executor records a failure.
    pub tool_timeout: Duration,
    /// Per-sub-agent-call timeout, longer than a bare tool call since a
    /// sub-agent may fan out into several of its own LLM/search calls.
    pub subagent_timeout: Duration,
    /// Whole-session deadline; exceeding it short-circuits to synthesis with
    /// whatever citations have been gathered so far.
    pub session_timeout: Duration,
    /// Whether the fingerprint cache is consulted before a fresh run.
    pub cache_enabled: bool,
    /// TTL applied to cache entries when `cache_enabled` is true.
    pub cache_ttl: Duration,
    /// Max characters accepted in a single user query.
    pub max_query_len: usize,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            data_dir: std::path::PathBuf::from("workbench_data"),
            max_iterations: crate::model::DEFAULT_MAX_ITERATIONS,
            tool_timeout: Duration::from_secs(60),
            subagent_timeout: Duration::from_secs(180),
            session_timeout: Duration::from_secs(90),
            cache_enabled: false,
            cache_ttl: Duration::from_secs(15 * 60),
            max_query_len: 2000,
        }
    }
}

impl WorkbenchConfig {
    /// Populate from environment variables, falling back to `Default` for
    /// anything unset or unparsable. Explicit construction, no config-file
    /// parsing layer.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = std::env::var("WORKBENCH_DATA_DIR") {
            cfg.data_dir = std::path::PathBuf::from(dir);
        }
        if let Ok(v) = std::env::var("WORKBENCH_MAX_ITERATIONS") {
            if let Ok(parsed) = v.parse() {
                cfg.max_iterations = parsed;
            }
        }
        if let Ok(v) = std::env::var("WORKBENCH_TOOL_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.tool_timeout = Duration::from_secs(parsed);
            }
        }
        if let Ok(v) = std::env::var("WORKBENCH_SUBAGENT_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.subagent_timeout = Duration::from_secs(parsed);
            }
        }
        if let Ok(v) = std::env::var("WORKBENCH_SESSION_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.session_timeout = Duration::from_secs(parsed);
            }
        }
        if let Ok(v) = std::env::var("WORKBENCH_CACHE_ENABLED") {
            cfg.cache_enabled = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("WORKBENCH_CACHE_TTL_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                cfg.cache_ttl = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_cache_disabled() {
        let cfg = WorkbenchConfig::default();
        assert!(!cfg.cache_enabled);
        assert_eq!(cfg.max_iterations, crate::model::DEFAULT_MAX_ITERATIONS);
    }
}
