use crate::domain::models::{GridSettings, DEFAULT_SLEEP_HOUR, DEFAULT_WAKE_HOUR};
use crate::infrastructure::error::CoreError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const SETTINGS_JSON: &str = "settings.json";

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        SETTINGS_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": "StudyGrid",
            "wakeTime": DEFAULT_WAKE_HOUR,
            "sleepTime": DEFAULT_SLEEP_HOUR,
            "defaultView": "week"
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), CoreError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, CoreError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidInput(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(CoreError::InvalidInput(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

/// Wake/sleep bounds for the day window. A missing or unreadable settings
/// file falls back to the defaults without surfacing an error; the grid must
/// always be renderable.
pub fn load_grid_settings(config_dir: &Path) -> GridSettings {
    let mut settings = GridSettings::default();
    let Ok(parsed) = read_config(&config_dir.join(SETTINGS_JSON)) else {
        return settings;
    };

    if let Some(wake) = parsed.get("wakeTime").and_then(serde_json::Value::as_u64) {
        if wake <= 23 {
            settings.wake_hour = wake as u32;
        }
    }
    if let Some(sleep) = parsed.get("sleepTime").and_then(serde_json::Value::as_u64) {
        if sleep <= 23 {
            settings.sleep_hour = sleep as u32;
        }
    }
    settings
}

pub fn save_grid_settings(config_dir: &Path, settings: &GridSettings) -> Result<(), CoreError> {
    let path = config_dir.join(SETTINGS_JSON);
    let mut parsed = read_config(&path)?;
    let object = parsed.as_object_mut().ok_or_else(|| {
        CoreError::InvalidInput(format!("invalid object structure in {}", path.display()))
    })?;
    object.insert(
        "wakeTime".to_string(),
        serde_json::Value::from(settings.wake_hour),
    );
    object.insert(
        "sleepTime".to_string(),
        serde_json::Value::from(settings.sleep_hour),
    );

    let formatted = serde_json::to_string_pretty(&parsed)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: std::path::PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "studygrid-config-tests-{}-{}",
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
    fn defaults_are_written_once_and_loadable() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        let settings = load_grid_settings(&dir.path);
        assert_eq!(settings.wake_hour, 7);
        assert_eq!(settings.sleep_hour, 23);
    }

    #[test]
    fn missing_settings_file_falls_back_silently() {
        let dir = TempConfigDir::new();
        let settings = load_grid_settings(&dir.path);
        assert_eq!(settings, GridSettings::default());
    }

    #[test]
    fn malformed_settings_file_falls_back_silently() {
        let dir = TempConfigDir::new();
        fs::write(dir.path.join(SETTINGS_JSON), "{not json").expect("write");
        let settings = load_grid_settings(&dir.path);
        assert_eq!(settings, GridSettings::default());
    }

    #[test]
    fn out_of_range_hours_are_ignored() {
        let dir = TempConfigDir::new();
        fs::write(
            dir.path.join(SETTINGS_JSON),
            r#"{"schema": 1, "wakeTime": 99, "sleepTime": 22}"#,
        )
        .expect("write");
        let settings = load_grid_settings(&dir.path);
        assert_eq!(settings.wake_hour, 7);
        assert_eq!(settings.sleep_hour, 22);
    }

    #[test]
    fn saved_settings_survive_a_reload() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        save_grid_settings(
            &dir.path,
            &GridSettings {
                wake_hour: 22,
                sleep_hour: 6,
            },
        )
        .expect("save settings");
        let settings = load_grid_settings(&dir.path);
        assert_eq!(settings.wake_hour, 22);
        assert_eq!(settings.sleep_hour, 6);
    }
}
