use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Lifetime of the merged feed cache, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub sources: Vec<SourceConfig>,
}

fn default_cache_ttl() -> u64 {
    900
}

fn default_page_size() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

/// One entry of the source registry. `id` is the position of the source
/// in the configured `sources` array and is stable for the process
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: usize,
    pub name: String,
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        Ok(config)
    }

    /// Build the ordered source registry from the configured sources.
    pub fn registry(&self) -> Vec<Source> {
        self.sources
            .iter()
            .enumerate()
            .map(|(id, s)| Source {
                id,
                name: s.name.clone(),
                url: s.url.clone(),
            })
            .collect()
    }
}
