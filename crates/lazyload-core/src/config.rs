use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Engine tunables
///
/// Every numeric value defaults to zero: no margin, no stagger, no minimum
/// transition time and no throttling.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Pixels ahead of the visible boundary that still count as visible
    #[serde(default)]
    pub pre_load_margin: f64,
    /// Pause between successive loads within one drain
    #[serde(default)]
    pub inter_item_delay_ms: u64,
    /// Minimum time a load transition should stay on screen
    #[serde(default)]
    pub min_animation_duration_ms: u64,
    /// Cooldown between scroll-driven re-scans
    #[serde(default)]
    pub throttle_delay_ms: u64,
    /// Replacement shown when an image fails (opaque to the engine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_placeholder: Option<serde_json::Value>,
    /// Replacement shown while an image loads (opaque to the engine)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_placeholder: Option<serde_json::Value>,
}

impl LoaderConfig {
    #[inline]
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }

    #[inline]
    pub fn min_animation_duration(&self) -> Duration {
        Duration::from_millis(self.min_animation_duration_ms)
    }

    #[inline]
    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }

    /// Shallow merge: only keys present in the patch are replaced
    pub fn merge(&mut self, patch: ConfigPatch) {
        if patch.error_placeholder.is_some() {
            self.error_placeholder = patch.error_placeholder;
        }
        if patch.loading_placeholder.is_some() {
            self.loading_placeholder = patch.loading_placeholder;
        }
        if let Some(v) = patch.pre_load_margin {
            self.pre_load_margin = v;
        }
        if let Some(v) = patch.inter_item_delay_ms {
            self.inter_item_delay_ms = v;
        }
        if let Some(v) = patch.min_animation_duration_ms {
            self.min_animation_duration_ms = v;
        }
        if let Some(v) = patch.throttle_delay_ms {
            self.throttle_delay_ms = v;
        }
    }
}

/// Partial update for [`LoaderConfig`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_placeholder: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_placeholder: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_load_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter_item_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_animation_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_delay_ms: Option<u64>,
}

impl ConfigPatch {
    pub fn pre_load_margin(mut self, margin: f64) -> Self {
        self.pre_load_margin = Some(margin);
        self
    }

    pub fn inter_item_delay_ms(mut self, ms: u64) -> Self {
        self.inter_item_delay_ms = Some(ms);
        self
    }

    pub fn min_animation_duration_ms(mut self, ms: u64) -> Self {
        self.min_animation_duration_ms = Some(ms);
        self
    }

    pub fn throttle_delay_ms(mut self, ms: u64) -> Self {
        self.throttle_delay_ms = Some(ms);
        self
    }

    /// Parse a patch from a JSON object, e.g. one received from a host bridge
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path or return defaults
    pub fn load_from(config_path: &std::path::Path) -> crate::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/lazyload/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("lazyload")
            .join("config.toml")
    }
}
