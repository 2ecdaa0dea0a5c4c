//! Built-in orbit theme templates using the Tera template engine
//!
//! All templates are embedded in the binary; a site needs no theme
//! directory on disk.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Stylesheet written to `css/style.css` at generation time
pub const STYLESHEET: &str = include_str!("orbit/css/style.css");

/// Template renderer with the embedded orbit theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all orbit templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Section bodies arrive pre-rendered as HTML; autoescaping would
        // double-escape them.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("orbit/layout.html")),
            ("index.html", include_str!("orbit/index.html")),
            ("post.html", include_str!("orbit/post.html")),
            ("loading.html", include_str!("orbit/loading.html")),
            (
                "partials/header.html",
                include_str!("orbit/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("orbit/partials/footer.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub root: String,
}

/// Localized UI strings
#[derive(Debug, Clone, Serialize)]
pub struct UiData {
    pub load_more: String,
    pub loading: String,
    pub minutes_suffix: String,
}

/// One post entry on a list page
#[derive(Debug, Clone, Serialize)]
pub struct PostItemData {
    pub slug: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub date_attr: String,
}

/// One rendered content section of a post page
#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub body_html: String,
}

/// Full data of a post detail page
#[derive(Debug, Clone, Serialize)]
pub struct PostDetailData {
    pub title: String,
    pub author: String,
    pub date: String,
    pub date_attr: String,
    pub banner_url: String,
    pub read_time: usize,
    pub sections: Vec<SectionData>,
}
