pub mod cost;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use cost::{format_money, CostEstimate, CostItem};

// --- Types (matching the backend wire format) ---

/// Parameters for one generation action. Field names match the backend's
/// JSON bodies (snake_case).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        GenerationRequest {
            app_name: default_app_name(),
            prompt: None,
            region: None,
        }
    }
}

/// The backend's fixed placeholder when the user supplies no app name.
pub fn default_app_name() -> String {
    "3-tier web app".to_string()
}

/// One generation result as the backend returns it. Every field may be
/// missing or empty; normalization fills in what it can.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationResult {
    #[serde(default)]
    pub diagram: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_svg: Option<String>,
    #[serde(default)]
    pub terraform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostEstimate>,
}

impl GenerationResult {
    pub fn is_empty(&self) -> bool {
        self.diagram.trim().is_empty()
            && self.diagram_svg.is_none()
            && self.terraform.trim().is_empty()
    }
}

/// The last rendered artifact. Exactly one is current at a time; a new
/// generation replaces it wholesale. `generation` is the sequence token
/// handed out when the request started, so late completions of superseded
/// requests can be told apart from the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub diagram_source: String,
    pub svg: Option<String>,
    pub terraform: String,
    pub cost: Option<CostEstimate>,
    pub generation: u64,
}

// --- Settings ---

/// Client settings persisted between runs. The API key lives here as a
/// development convenience, not secure storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: String::new(),
            base_url: default_base_url(),
            region: None,
        }
    }
}

impl Settings {
    /// Generation is blocked (before any network call) when this is false.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

/// Resolve the global config directory (~/.archgenie/). `ARCHGENIE_HOME`
/// overrides it, which is how tests point it at a temp dir.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ARCHGENIE_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".archgenie")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn read_settings() -> Settings {
    read_settings_from(&settings_path())
}

pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Write settings. The API key is trimmed before saving so a stray
/// newline from a paste never ends up in the `x-api-key` header.
pub fn write_settings(settings: &Settings) -> Result<(), String> {
    write_settings_to(&settings_path(), settings)
}

/// Atomic write (temp file + rename) so a crash mid-write never leaves a
/// truncated settings file behind.
pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), String> {
    let dir = path.parent().ok_or("settings path has no parent")?;
    fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    let mut saved = settings.clone();
    saved.api_key = saved.api_key.trim().to_string();
    let json = serde_json::to_string_pretty(&saved).map_err(|e| e.to_string())?;
    let tmp = dir.join(".settings.json.tmp");
    fs::write(&tmp, json).map_err(|e| e.to_string())?;
    fs::rename(&tmp, path).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_trims_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            api_key: "  super-secret-key \n".to_string(),
            base_url: "http://backend:9000".to_string(),
            region: Some("eastus".to_string()),
        };
        write_settings_to(&path, &settings).unwrap();
        let loaded = read_settings_from(&path);
        assert_eq!(loaded.api_key, "super-secret-key");
        assert_eq!(loaded.base_url, "http://backend:9000");
        assert_eq!(loaded.region.as_deref(), Some("eastus"));
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = read_settings_from(&dir.path().join("settings.json"));
        assert_eq!(loaded, Settings::default());
        assert_eq!(loaded.base_url, "http://127.0.0.1:8000");
        assert!(!loaded.has_api_key());
    }

    #[test]
    fn corrupt_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_settings_from(&path), Settings::default());
    }

    #[test]
    fn whitespace_key_does_not_count_as_credential() {
        let settings = Settings {
            api_key: "   ".to_string(),
            ..Settings::default()
        };
        assert!(!settings.has_api_key());
    }

    #[test]
    fn generation_request_defaults_to_placeholder_app_name() {
        let req = GenerationRequest::default();
        assert_eq!(req.app_name, "3-tier web app");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["app_name"], "3-tier web app");
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn generation_result_tolerates_missing_fields() {
        let result: GenerationResult = serde_json::from_str("{}").unwrap();
        assert!(result.is_empty());
        let result: GenerationResult =
            serde_json::from_str(r#"{"diagram":"graph TD\nA-->B"}"#).unwrap();
        assert!(!result.is_empty());
        assert_eq!(result.terraform, "");
    }
}
