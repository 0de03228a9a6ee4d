use crate::infrastructure::error::InfraError;
use chrono::NaiveTime;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

const TIMELINE_JSON: &str = "timeline.json";
const API_JSON: &str = "api.json";

const DEFAULT_AXIS_START: &str = "09:00";
const DEFAULT_AXIS_END: &str = "22:00";
const DEFAULT_AXIS_INTERVAL_MINUTES: u32 = 60;

/// Display axis settings for the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSettings {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub interval_minutes: u32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            start: parse_hhmm(DEFAULT_AXIS_START).expect("valid fixed time"),
            end: parse_hhmm(DEFAULT_AXIS_END).expect("valid fixed time"),
            interval_minutes: DEFAULT_AXIS_INTERVAL_MINUTES,
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            TIMELINE_JSON,
            serde_json::json!({
                "schema": 1,
                "startTime": DEFAULT_AXIS_START,
                "endTime": DEFAULT_AXIS_END,
                "intervalMinutes": DEFAULT_AXIS_INTERVAL_MINUTES
            }),
        ),
        (
            API_JSON,
            serde_json::json!({
                "schema": 1,
                "baseUrl": "http://127.0.0.1:8000",
                "bearerToken": null
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

/// Loads the timeline axis settings, falling back to the defaults for any
/// missing or unparsable field.
pub fn read_timeline_settings(config_dir: &Path) -> Result<TimelineSettings, InfraError> {
    let parsed = read_config(&config_dir.join(TIMELINE_JSON))?;
    let mut settings = TimelineSettings::default();

    if let Some(start) = parsed
        .get("startTime")
        .and_then(serde_json::Value::as_str)
        .and_then(|value| parse_hhmm(value.trim()))
    {
        settings.start = start;
    }
    if let Some(end) = parsed
        .get("endTime")
        .and_then(serde_json::Value::as_str)
        .and_then(|value| parse_hhmm(value.trim()))
    {
        settings.end = end;
    }
    if let Some(interval) = parsed
        .get("intervalMinutes")
        .and_then(serde_json::Value::as_u64)
        .filter(|value| *value > 0)
    {
        settings.interval_minutes = interval as u32;
    }

    if settings.end <= settings.start {
        return Err(InfraError::InvalidConfig(format!(
            "timeline endTime must be after startTime in {}",
            config_dir.join(TIMELINE_JSON).display()
        )));
    }
    Ok(settings)
}

pub fn read_api_base_url(config_dir: &Path) -> Result<Url, InfraError> {
    let path = config_dir.join(API_JSON);
    let parsed = read_config(&path)?;
    let raw = parsed
        .get("baseUrl")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            InfraError::InvalidConfig(format!("missing baseUrl in {}", path.display()))
        })?;
    Url::parse(raw)
        .map_err(|error| InfraError::InvalidConfig(format!("invalid baseUrl '{raw}': {error}")))
}

pub fn read_api_bearer_token(config_dir: &Path) -> Result<Option<String>, InfraError> {
    let parsed = read_config(&config_dir.join(API_JSON))?;
    Ok(parsed
        .get("bearerToken")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned))
}

fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "weekplan-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp config dir");
            Self { path }
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn ensure_default_configs_writes_missing_files() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");

        let settings = read_timeline_settings(&dir.path).expect("read settings");
        assert_eq!(settings, TimelineSettings::default());
        assert_eq!(settings.interval_minutes, 60);

        let base_url = read_api_base_url(&dir.path).expect("read base url");
        assert_eq!(base_url.as_str(), "http://127.0.0.1:8000/");
        assert!(read_api_bearer_token(&dir.path).expect("read token").is_none());
    }

    #[test]
    fn read_timeline_settings_uses_overrides() {
        let dir = TempConfigDir::new();
        let raw = serde_json::json!({
            "schema": 1,
            "startTime": "08:00",
            "endTime": "20:00",
            "intervalMinutes": 30
        });
        fs::write(
            dir.path.join(TIMELINE_JSON),
            serde_json::to_string_pretty(&raw).expect("encode"),
        )
        .expect("write timeline config");

        let settings = read_timeline_settings(&dir.path).expect("read settings");
        assert_eq!(settings.start, parse_hhmm("08:00").expect("time"));
        assert_eq!(settings.end, parse_hhmm("20:00").expect("time"));
        assert_eq!(settings.interval_minutes, 30);
    }

    #[test]
    fn read_timeline_settings_rejects_inverted_window() {
        let dir = TempConfigDir::new();
        let raw = serde_json::json!({
            "schema": 1,
            "startTime": "22:00",
            "endTime": "09:00"
        });
        fs::write(
            dir.path.join(TIMELINE_JSON),
            serde_json::to_string(&raw).expect("encode"),
        )
        .expect("write timeline config");

        assert!(read_timeline_settings(&dir.path).is_err());
    }

    #[test]
    fn read_config_rejects_unknown_schema() {
        let dir = TempConfigDir::new();
        let raw = serde_json::json!({ "schema": 2, "baseUrl": "http://localhost" });
        fs::write(
            dir.path.join(API_JSON),
            serde_json::to_string(&raw).expect("encode"),
        )
        .expect("write api config");

        assert!(read_api_base_url(&dir.path).is_err());
    }

    #[test]
    fn read_api_bearer_token_trims_blank_values() {
        let dir = TempConfigDir::new();
        let raw = serde_json::json!({ "schema": 1, "baseUrl": "http://localhost", "bearerToken": "  " });
        fs::write(
            dir.path.join(API_JSON),
            serde_json::to_string(&raw).expect("encode"),
        )
        .expect("write api config");

        assert!(read_api_bearer_token(&dir.path).expect("read token").is_none());
    }
}
