//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    /// Language tag driving date formatting and UI strings (e.g. "pt-br")
    pub language: String,
    /// IANA timezone name used when displaying publication timestamps
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content API
    #[serde(default)]
    pub api: ApiConfig,

    // Feed
    pub feed_limit: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Voyager".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "pt-br".to_string(),
            timezone: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            api: ApiConfig::default(),

            feed_limit: 20,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the content repository API
    pub url: String,
    /// Number of posts fetched per list query
    pub page_size: usize,
    /// Optional access token appended to API requests
    pub access_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/api/v2".to_string(),
            page_size: 2,
            access_token: None,
        }
    }
}
