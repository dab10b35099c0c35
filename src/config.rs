use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for Asset Studio
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Focal-point analysis settings
    pub analysis: AnalysisConfig,

    /// Rendering settings
    pub render: RenderConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Upload limits
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            }
            .into()
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.render.validate()?;
        self.export.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}

/// Which focal-point analyzer to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Gemini vision model over HTTP
    Gemini,
    /// No network: every image is focused on its centre
    Center,
}

/// Focal-point analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub provider: AnalyzerKind,

    /// Base URL of the models endpoint
    pub endpoint: String,

    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature sent with each request
    pub temperature: f32,

    /// Natural-language instruction sent alongside each image
    pub instruction: String,
}

pub const DEFAULT_INSTRUCTION: &str = "You are looking at a screenshot of a browser extension. \
Identify the primary UI focal region: the part of the interface a viewer should see first \
(the popup, the main panel, or the key control). Respond with JSON only, in the form \
{\"focalPoint\": {\"x\": <0-100>, \"y\": <0-100>}, \"description\": \"<one sentence>\"}, \
where x and y are percentages of the image width and height.";

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: AnalyzerKind::Gemini,
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.1,
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.provider == AnalyzerKind::Gemini {
            if self.endpoint.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "analysis.endpoint".to_string(),
                    value: self.endpoint.clone(),
                }
                .into());
            }

            if self.model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "analysis.model".to_string(),
                    value: self.model.clone(),
                }
                .into());
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "analysis.timeout_secs".to_string(),
                value: self.timeout_secs.to_string(),
            }
            .into());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "analysis.temperature".to_string(),
                value: self.temperature.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Default brightness in percent (100 = unchanged)
    pub brightness: f32,

    /// Default contrast in percent (100 = unchanged)
    pub contrast: f32,

    /// Bold TTF/OTF used for headlines instead of the bundled DejaVu Sans Bold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline_font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            brightness: 100.0,
            contrast: 100.0,
            headline_font: None,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "render.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string(),
            }
            .into());
        }

        for (key, value) in [("render.brightness", self.brightness), ("render.contrast", self.contrast)] {
            if !(0.0..=300.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory artifacts are written to
    pub output_dir: PathBuf,

    /// Leading part of every artifact file name
    pub file_prefix: String,

    /// Pause between consecutive artifacts, in milliseconds
    pub pacing_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            file_prefix: "extension_asset".to_string(),
            pacing_ms: 300,
        }
    }
}

impl ExportConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    fn validate(&self) -> Result<()> {
        let prefix_ok = !self.file_prefix.is_empty()
            && !self.file_prefix.contains(['/', '\\'])
            && self.file_prefix != "."
            && self.file_prefix != "..";

        if !prefix_ok {
            return Err(ConfigError::InvalidValue {
                key: "export.file_prefix".to_string(),
                value: self.file_prefix.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of files accepted per upload
    pub max_upload: usize,

    /// Maximum size of a single file in bytes
    pub max_file_bytes: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_upload: 10,
            max_file_bytes: 20 * 1024 * 1024,
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<()> {
        if self.max_upload == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.max_upload".to_string(),
                value: self.max_upload.to_string(),
            }
            .into());
        }

        if self.max_file_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.max_file_bytes".to_string(),
                value: self.max_file_bytes.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
