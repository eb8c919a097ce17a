//! Configuration: where the booking backend lives, and per-widget tuning.
//!
//! Host settings are looked up in a secrets-store directory first (one file per key, named
//! after the upper-cased key) and then in the environment. Widget tuning comes from an
//! optional `.roompick.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::DropdownConfig;

/// Name of the widget tuning file.
pub const CONFIG_FILE_NAME: &str = ".roompick.toml";

/// Read one setting: secrets-store file first, then the environment, else empty.
pub fn get_configuration(name: &str, secrets_dir: Option<&Path>) -> String {
    let name = name.trim().to_uppercase();
    if let Some(dir) = secrets_dir {
        let path = dir.join(&name);
        if path.is_file() {
            match std::fs::read_to_string(&path) {
                Ok(value) => return value.trim().to_string(),
                Err(e) => warn!(key = name.as_str(), error = %e, "Could not read secrets-store entry"),
            }
        }
    }
    std::env::var(&name).unwrap_or_default()
}

fn sanitize_base_url(value: &str) -> &str {
    value.strip_suffix('/').unwrap_or(value)
}

/// Settings the host page provides to the widgets on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostConfig {
    api_baseurl: String,
}

impl HostConfig {
    pub fn new(api_baseurl: impl Into<String>) -> Self {
        Self { api_baseurl: api_baseurl.into() }
    }

    /// Resolve from `secrets_dir` (if any) and the environment.
    pub fn load(secrets_dir: Option<&Path>) -> Self {
        Self { api_baseurl: get_configuration("API_BASEURL", secrets_dir) }
    }

    /// Base URL of the booking REST API, without a trailing slash.
    pub fn api_baseurl(&self) -> &str {
        sanitize_base_url(&self.api_baseurl)
    }

    pub fn has_api(&self) -> bool {
        !self.api_baseurl.trim().is_empty()
    }
}

/// Join a base URL and an absolute path the way the host page does.
pub fn url_for(base: &str, path: &str) -> String {
    let path = if path.starts_with('/') { path.to_string() } else { format!("/{path}") };
    format!("{}{}", sanitize_base_url(base), path)
}

// ---------------------------------------------------------------------------
// Widget tuning file
// ---------------------------------------------------------------------------

const KNOWN_CONFIG_KEYS: &[&str] = &[
    "limit",
    "search_delay_ms",
    "blur_grace_ms",
    "viewport_margin",
    "min_max_height",
    "inline_max_height",
    "discard_stale_responses",
];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Default location of the tuning file for a working directory.
pub fn default_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load widget tuning from `path`.
///
/// Missing file → defaults. Unparseable file → defaults with a warning. Unknown keys trigger a
/// warning with a typo suggestion; values of the wrong type are ignored with a warning.
pub fn load_dropdown_config(path: &Path) -> DropdownConfig {
    let mut config = DropdownConfig::default();
    if !path.exists() {
        return config;
    }

    debug!(path = %path.display(), "Loading widget config");
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read widget config");
            return config;
        }
    };
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse widget config");
            return config;
        }
    };

    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS
            .iter()
            .min_by_key(|k| edit_distance(key, k))
            .copied()
            .unwrap_or_default();
        if edit_distance(key, suggestion) <= 3 {
            warn!(
                key = key.as_str(),
                suggestion,
                "Unknown key in {CONFIG_FILE_NAME}; did you mean '{suggestion}'?"
            );
        } else {
            warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE_NAME} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            );
        }
    }

    let int = |key: &str| -> Option<u64> {
        let value = table.get(key)?;
        match value.as_integer().and_then(|i| u64::try_from(i).ok()) {
            Some(i) => Some(i),
            None => {
                warn!(key, value = %value, "Expected a non-negative integer");
                None
            }
        }
    };
    let float = |key: &str| -> Option<f64> {
        let value = table.get(key)?;
        match value.as_float().or_else(|| value.as_integer().map(|i| i as f64)) {
            Some(f) => Some(f),
            None => {
                warn!(key, value = %value, "Expected a number");
                None
            }
        }
    };

    if let Some(limit) = int("limit") {
        config.limit = usize::try_from(limit).unwrap_or(usize::MAX);
    }
    if let Some(ms) = int("search_delay_ms") {
        config.search_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = int("blur_grace_ms") {
        config.blur_grace = Duration::from_millis(ms);
    }
    if let Some(px) = float("viewport_margin") {
        config.viewport_margin = px;
    }
    if let Some(px) = float("min_max_height") {
        config.min_max_height = px;
    }
    if let Some(px) = float("inline_max_height") {
        config.inline_max_height = px;
    }
    if let Some(value) = table.get("discard_stale_responses") {
        match value.as_bool() {
            Some(b) => config.discard_stale_responses = b,
            None => warn!(key = "discard_stale_responses", value = %value, "Expected a boolean"),
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_strips_trailing_slash() {
        assert_eq!(url_for("http://api:8000/", "/api/hotels"), "http://api:8000/api/hotels");
        assert_eq!(url_for("http://api:8000", "api/hotels"), "http://api:8000/api/hotels");
        assert_eq!(url_for("", "/api/hotels"), "/api/hotels");
    }

    #[test]
    fn secrets_store_wins_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ROOMPICK_TEST_SECRET"), "  from-file\n").unwrap();
        std::env::set_var("ROOMPICK_TEST_SECRET", "from-env");
        assert_eq!(get_configuration("roompick_test_secret", Some(dir.path())), "from-file");
        assert_eq!(get_configuration("roompick_test_secret", None), "from-env");
        std::env::remove_var("ROOMPICK_TEST_SECRET");
    }

    #[test]
    fn host_config_sanitizes_base_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("API_BASEURL"), "http://backend:5000/").unwrap();
        let config = HostConfig::load(Some(dir.path()));
        assert_eq!(config.api_baseurl(), "http://backend:5000");
        assert!(config.has_api());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_dropdown_config(&default_config_path(dir.path()));
        assert_eq!(config, DropdownConfig::default());
    }

    #[test]
    fn tuning_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_config_path(dir.path());
        std::fs::write(
            &path,
            "limit = 10\nsearch_delay_ms = 120\nviewport_margin = 20\ndiscard_stale_responses = false\nlimt = 3\n",
        )
        .unwrap();
        let config = load_dropdown_config(&path);
        assert_eq!(config.limit, 10);
        assert_eq!(config.search_delay, Duration::from_millis(120));
        assert_eq!(config.viewport_margin, 20.0);
        assert!(!config.discard_stale_responses);
        assert_eq!(config.blur_grace, Duration::from_millis(200));
    }

    #[test]
    fn bad_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_config_path(dir.path());
        std::fs::write(&path, "limit = -4\ndiscard_stale_responses = \"yes\"\n").unwrap();
        let config = load_dropdown_config(&path);
        assert_eq!(config.limit, DropdownConfig::default().limit);
        assert!(config.discard_stale_responses);
    }

    #[test]
    fn unparseable_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_config_path(dir.path());
        std::fs::write(&path, "limit = = 3").unwrap();
        assert_eq!(load_dropdown_config(&path), DropdownConfig::default());
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("limt", "limit"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }
}
