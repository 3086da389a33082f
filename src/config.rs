use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
pub const DEFAULT_CHUNK_SIZE: usize = 3000;
pub const DEFAULT_OUTPUT_LANGUAGE: &str = "Korean";

pub fn default_languages() -> Vec<String> {
    vec!["ko".to_string(), "en".to_string()]
}

pub fn default_fixed_hashtags() -> Vec<String> {
    ["#SK텔레콤", "#SKtelecom", "#SKT", "#AI"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: Option<String>,
    pub languages: Option<Vec<String>>,
    pub chunk_size: Option<usize>,
    pub channel_id: Option<String>,
    pub fixed_hashtags: Option<Vec<String>>,
    pub output_language: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytpub/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(default_languages)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.filter(|&n| n > 0).unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn fixed_hashtags(&self) -> Vec<String> {
        self.fixed_hashtags.clone().unwrap_or_else(default_fixed_hashtags)
    }

    pub fn output_language(&self) -> String {
        self.output_language
            .clone()
            .unwrap_or_else(|| DEFAULT_OUTPUT_LANGUAGE.to_string())
    }

    /// Resolve API keys, environment first, then this file
    pub fn credentials(&self) -> Credentials {
        Credentials::resolve(self, |name| std::env::var(name).ok())
    }
}

/// API keys for one session
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl Credentials {
    fn resolve(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let present = |k: &String| !k.trim().is_empty();
        let pick = |names: &[&str], fallback: &Option<String>| {
            names
                .iter()
                .filter_map(|n| env(*n))
                .find(present)
                .or_else(|| fallback.clone().filter(present))
        };
        Self {
            anthropic_api_key: pick(&["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"], &config.anthropic_api_key),
            openai_api_key: pick(&["OPENAI_API_KEY"], &config.openai_api_key),
            youtube_api_key: pick(&["YOUTUBE_API_KEY"], &config.youtube_api_key),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &mask(&self.anthropic_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("youtube_api_key", &mask(&self.youtube_api_key))
            .finish()
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytpub")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r##"
model = "gpt-4o"
languages = ["en"]
chunk_size = 1500
channel_id = "UC123"
fixed_hashtags = ["#Rust"]
"##;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.languages(), vec!["en".to_string()]);
        assert_eq!(config.chunk_size(), 1500);
        assert_eq!(config.channel_id.as_deref(), Some("UC123"));
        assert_eq!(config.fixed_hashtags(), vec!["#Rust".to_string()]);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.languages(), default_languages());
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.fixed_hashtags().len(), 4);
        assert_eq!(config.output_language(), "Korean");
    }

    #[test]
    fn test_zero_chunk_size_falls_back() {
        let config: Config = toml::from_str("chunk_size = 0").unwrap();
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_credentials_env_over_file() {
        let config: Config = toml::from_str(
            r#"
anthropic_api_key = "file-anthropic"
youtube_api_key = "file-youtube"
"#,
        )
        .unwrap();
        let creds = Credentials::resolve(&config, |name| match name {
            "CLAUDE_API_KEY" => Some("env-claude".to_string()),
            _ => None,
        });
        assert_eq!(creds.anthropic_api_key.as_deref(), Some("env-claude"));
        assert_eq!(creds.youtube_api_key.as_deref(), Some("file-youtube"));
        assert!(creds.openai_api_key.is_none());
    }

    #[test]
    fn test_credentials_skip_empty_env() {
        let config: Config = toml::from_str(r#"anthropic_api_key = "file-anthropic""#).unwrap();
        let creds = Credentials::resolve(&config, |name| match name {
            "ANTHROPIC_API_KEY" => Some(String::new()),
            "CLAUDE_API_KEY" => Some("env-claude".to_string()),
            _ => None,
        });
        assert_eq!(creds.anthropic_api_key.as_deref(), Some("env-claude"));

        let creds = Credentials::resolve(&config, |name| match name {
            "ANTHROPIC_API_KEY" | "CLAUDE_API_KEY" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(creds.anthropic_api_key.as_deref(), Some("file-anthropic"));
    }

    #[test]
    fn test_credentials_debug_masks_keys() {
        let creds = Credentials {
            anthropic_api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<set>"));
    }
}
