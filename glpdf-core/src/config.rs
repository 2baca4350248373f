use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Color;

pub mod keys {
    pub const BACKGROUND_COLOR: &str = "background_color";
    pub const LINK_HIGHLIGHT_COLOR: &str = "link_highlight_color";
    pub const SEARCH_HIGHLIGHT_COLOR: &str = "search_highlight_color";
    pub const TEXT_HIGHLIGHT_COLOR: &str = "text_highlight_color";
}

pub const CONFIG_FILE_NAME: &str = "glpdf.toml";

/// Read-only colour lookup by configuration key.
pub trait ConfigSource {
    fn color(&self, key: &str) -> Option<Color>;
}

/// Looks `key` up in `source`, falling back to the built-in default.
pub fn color_or_default(source: &dyn ConfigSource, key: &str) -> Color {
    source
        .color(key)
        .or_else(|| ViewerConfig::default().color(key))
        .unwrap_or(Color::BLACK)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("`{key}` must have components in [0, 1], got {value:?}")]
    InvalidColor { key: &'static str, value: [f32; 3] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub background_color: Color,
    pub link_highlight_color: Color,
    pub search_highlight_color: Color,
    pub text_highlight_color: Color,
    /// Directory holding shader overrides; the bundled shaders are used when unset.
    pub shader_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background_color: Color::rgb(0.97, 0.97, 0.97),
            link_highlight_color: Color::rgb(0.0, 0.0, 1.0),
            search_highlight_color: Color::rgb(0.0, 1.0, 0.0),
            text_highlight_color: Color::rgb(1.0, 1.0, 0.0),
            shader_dir: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw, path)?;
        if let (Some(shader_dir), Some(parent)) = (config.shader_dir.as_ref(), path.parent()) {
            if shader_dir.is_relative() {
                config.shader_dir = Some(parent.join(shader_dir));
            }
        }
        Ok(config)
    }

    /// Loads `glpdf.toml` from `dir`, or the defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let colors = [
            (keys::BACKGROUND_COLOR, self.background_color),
            (keys::LINK_HIGHLIGHT_COLOR, self.link_highlight_color),
            (keys::SEARCH_HIGHLIGHT_COLOR, self.search_highlight_color),
            (keys::TEXT_HIGHLIGHT_COLOR, self.text_highlight_color),
        ];
        for (key, color) in colors {
            if !color.is_normalized() {
                return Err(ConfigError::InvalidColor {
                    key,
                    value: color.0,
                });
            }
        }
        Ok(())
    }
}

impl ConfigSource for ViewerConfig {
    fn color(&self, key: &str) -> Option<Color> {
        match key {
            keys::BACKGROUND_COLOR => Some(self.background_color),
            keys::LINK_HIGHLIGHT_COLOR => Some(self.link_highlight_color),
            keys::SEARCH_HIGHLIGHT_COLOR => Some(self.search_highlight_color),
            keys::TEXT_HIGHLIGHT_COLOR => Some(self.text_highlight_color),
            _ => None,
        }
    }
}
