//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    let config_content = r#"# Voyager Configuration

# Site
title: Voyager
subtitle: ''
description: ''
author: John Doe
language: pt-br
timezone: ''

# URL
url: http://example.com
root: /

# Directory
public_dir: public
static_dir: static

# Content API
api:
  url: http://localhost:8080/api/v2
  page_size: 2
  access_token:

# Feed
feed_limit: 20
"#;

    fs::write(target_dir.join("_config.yml"), config_content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.title, "Voyager");
        assert_eq!(config.language, "pt-br");
        assert!(dir.path().join("static/images").is_dir());
    }
}
