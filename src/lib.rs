//! voyager-rs: A fast static blog generator for headless CMS content
//!
//! This crate fetches posts from a headless content API, computes
//! presentation metadata (localized dates, estimated reading time) and
//! renders a static site through embedded Tera templates.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The main Voyager application
#[derive(Debug, Clone)]
pub struct Voyager {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Local static assets directory
    pub static_dir: std::path::PathBuf,
}

impl Voyager {
    /// Create a new Voyager instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        })
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
