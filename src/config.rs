use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub templates_file: String,
    pub archive_dir: String,
    pub report_path: String,
    pub history_window: usize,
    pub default_pieces: usize,
    pub check_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    /// Sent with every catalog request.
    pub headers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let headers = [
            ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:107.0) Gecko/20100101 Firefox/107.0"),
            ("Accept", "application/json"),
            ("Accept-Language", "en"),
            ("Content-Type", "application/json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            templates_file: "Templates.txt".into(),
            archive_dir: "requests_data_archive".into(),
            report_path: "report.db".into(),
            history_window: 30,
            default_pieces: 20,
            check_interval_seconds: 24 * 60 * 60,
            request_timeout_seconds: 30,
            headers,
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        tracing::info!("Config {} not found, using defaults", path);
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Reads the template list: one URL template per line, blank lines skipped.
pub fn load_templates(path: &str) -> Result<Vec<String>, std::io::Error> {
    let content = fs::read_to_string(path)?;
    Ok(crate::utils::non_blank_lines(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "history_window": 7, "archive_dir": "snapshots" }"#).unwrap();

        let cfg = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.history_window, 7);
        assert_eq!(cfg.archive_dir, "snapshots");
        assert_eq!(cfg.default_pieces, 20);
        assert_eq!(cfg.templates_file, "Templates.txt");
        assert_eq!(cfg.headers.get("Accept").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let cfg = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.history_window, 30);
        assert_eq!(cfg.report_path, "report.db");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_load_templates_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://api.example.com/layout?page=*").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  https://api.example.com/layout?category=milk&page=*  ").unwrap();

        let templates = load_templates(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            templates,
            vec![
                "https://api.example.com/layout?page=*",
                "https://api.example.com/layout?category=milk&page=*",
            ]
        );
    }
}
