use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Unsigned image upload endpoint; image rows fall back to raw URLs when unset
  pub upload: Option<UploadConfig>,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the portfolio backend, e.g. "https://api.example.com/api/v1"
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
  /// Full upload endpoint, e.g. "https://api.cloudinary.com/v1_1/<cloud>/image/upload"
  pub url: String,
  /// Unsigned upload preset name
  pub preset: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./folio.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/folio/config.yaml
  /// 4. ~/.config/folio/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/folio/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("folio.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("folio").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Header title, falling back to the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.api.base_url)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.api.base_url.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_full_config() {
    let yaml = r#"
api:
  base_url: https://api.example.com/api/v1
upload:
  url: https://api.cloudinary.com/v1_1/demo/image/upload
  preset: unsigned
title: My Portfolio
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.api.base_url, "https://api.example.com/api/v1");
    assert_eq!(config.upload.as_ref().unwrap().preset, "unsigned");
    assert_eq!(config.display_title(), "My Portfolio");
  }

  #[test]
  fn test_upload_section_is_optional() {
    let yaml = "api:\n  base_url: https://api.example.com/api/v1\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.upload.is_none());
    assert_eq!(config.display_title(), "api.example.com");
  }
}
