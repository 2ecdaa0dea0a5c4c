//! Generator module - the build phase
//!
//! Drives the post feed over the content source, fetches every post,
//! then renders the accumulated page data to static HTML, JSON and an
//! Atom feed. Fetching happens up front; rendering is a pure function
//! of the fetched data.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;
use tera::Context;
use walkdir::WalkDir;

use crate::cms::{CmsError, ContentSource};
use crate::content::{Feed, Post, PostSummary};
use crate::helpers::{date_attr, date_xml, estimate_minutes, format_short_date};
use crate::i18n::Locale;
use crate::templates::{
    PostDetailData, PostItemData, SectionData, SiteData, TemplateRenderer, UiData, STYLESHEET,
};
use crate::Voyager;

/// Static site generator over a content source
pub struct Generator {
    app: Voyager,
    renderer: TemplateRenderer,
    locale: Locale,
    timezone: Tz,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &Voyager) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let locale = Locale::from_tag(&app.config.language);
        let timezone = parse_timezone(&app.config.timezone);

        Ok(Self {
            app: app.clone(),
            renderer,
            locale,
            timezone,
        })
    }

    /// Generate the entire site
    pub async fn generate<S>(&self, source: &S) -> Result<()>
    where
        S: ContentSource + ?Sized,
    {
        fs::create_dir_all(&self.app.public_dir)?;

        self.write_stylesheet()?;
        self.copy_static_assets()?;

        // Fetch phase: drive the feed until the source is exhausted,
        // remembering where each fetched page ended.
        let page_size = self.app.config.api.page_size;
        let first = source.query(page_size, None).await?;
        let mut feed = Feed::from_page(first);

        let mut page_breaks = vec![feed.posts().len()];
        let mut page_has_next = vec![feed.has_more()];
        while feed.has_more() {
            if !feed.load_more(source, page_size).await? {
                break;
            }
            page_breaks.push(feed.posts().len());
            page_has_next.push(feed.has_more());
        }

        tracing::info!(
            "Fetched {} posts over {} pages",
            feed.posts().len(),
            page_breaks.len()
        );

        // A summary whose record vanished between list and fetch is
        // skipped; any other fetch failure aborts the build.
        let mut posts = Vec::new();
        for summary in feed.posts() {
            match source.get_by_slug(&summary.slug).await {
                Ok(post) => posts.push(post),
                Err(CmsError::NotFound(slug)) => {
                    tracing::warn!("Post `{}` disappeared between list and fetch", slug);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Render phase
        self.generate_feed_pages(feed.posts(), &page_breaks, &page_has_next)?;
        self.generate_feed_json(feed.posts(), &page_breaks, &page_has_next)?;
        self.generate_post_pages(&posts)?;
        self.generate_atom_feed(&posts)?;

        Ok(())
    }

    /// Create a base context with common variables
    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: self.app.config.title.clone(),
                subtitle: self.app.config.subtitle.clone(),
                description: self.app.config.description.clone(),
                author: self.app.config.author.clone(),
                language: self.app.config.language.clone(),
                root: self.app.config.root.clone(),
            },
        );
        context.insert(
            "ui",
            &UiData {
                load_more: self.locale.load_more().to_string(),
                loading: self.locale.loading().to_string(),
                minutes_suffix: self.locale.minutes_suffix().to_string(),
            },
        );
        context.insert("current_year", &Utc::now().year().to_string());
        context.insert("page_title", "");
        context
    }

    /// Display and `datetime`-attribute forms of a publication date
    fn display_date(&self, date: Option<&DateTime<Utc>>) -> (String, String) {
        match date {
            Some(date) => {
                let local = date.with_timezone(&self.timezone);
                (format_short_date(&local, self.locale), date_attr(&local))
            }
            None => (String::new(), String::new()),
        }
    }

    fn post_item(&self, summary: &PostSummary) -> PostItemData {
        let (date, date_attr) = self.display_date(summary.first_publication_date.as_ref());
        PostItemData {
            slug: summary.slug.clone(),
            path: format!("{}post/{}/", self.app.config.root, summary.slug),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date,
            date_attr,
        }
    }

    /// Generate the list pages
    ///
    /// Page N shows everything loaded after N-1 "load more" steps, so
    /// following the load-more link only ever appends posts below the
    /// ones already read.
    fn generate_feed_pages(
        &self,
        posts: &[PostSummary],
        page_breaks: &[usize],
        page_has_next: &[bool],
    ) -> Result<()> {
        for (index, &brk) in page_breaks.iter().enumerate() {
            let items: Vec<PostItemData> =
                posts[..brk].iter().map(|s| self.post_item(s)).collect();

            let next_page_path = if page_has_next[index] {
                Some(format!("{}page/{}/", self.app.config.root, index + 2))
            } else {
                None
            };

            let mut context = self.base_context();
            context.insert("posts", &items);
            context.insert("next_page_path", &next_page_path);

            let html = self.renderer.render("index.html", &context)?;

            let output_path = if index == 0 {
                self.app.public_dir.join("index.html")
            } else {
                self.app
                    .public_dir
                    .join(format!("page/{}/index.html", index + 1))
            };

            write_file(&output_path, &html)?;
            tracing::debug!("Generated: {:?}", output_path);
        }

        Ok(())
    }

    /// Generate the per-page JSON mirrors of the list query
    ///
    /// `/api/page/N.json` holds exactly the Nth fetched page plus the
    /// reference to the next one, for programmatic consumers.
    fn generate_feed_json(
        &self,
        posts: &[PostSummary],
        page_breaks: &[usize],
        page_has_next: &[bool],
    ) -> Result<()> {
        let mut start = 0;
        for (index, &brk) in page_breaks.iter().enumerate() {
            let results: Vec<_> = posts[start..brk].iter().collect();
            let next_page = if page_has_next[index] {
                Some(format!("{}api/page/{}.json", self.app.config.root, index + 2))
            } else {
                None
            };

            let body = serde_json::to_string_pretty(&serde_json::json!({
                "results": results,
                "next_page": next_page,
            }))?;

            let output_path = self
                .app
                .public_dir
                .join(format!("api/page/{}.json", index + 1));
            write_file(&output_path, &body)?;

            start = brk;
        }

        Ok(())
    }

    /// Generate individual post pages
    fn generate_post_pages(&self, posts: &[Post]) -> Result<()> {
        for post in posts {
            self.generate_post_page(post)?;
        }
        tracing::info!("Generated {} post pages", posts.len());
        Ok(())
    }

    /// Generate one post page
    ///
    /// Also used by the serve phase to resolve a slug on demand.
    pub fn generate_post_page(&self, post: &Post) -> Result<()> {
        let (date, date_attr) = self.display_date(post.first_publication_date.as_ref());

        let sections: Vec<SectionData> = post
            .content
            .iter()
            .map(|section| SectionData {
                heading: section.heading.clone(),
                body_html: section.body_html(),
            })
            .collect();

        let detail = PostDetailData {
            title: post.title.clone(),
            author: post.author.clone(),
            date,
            date_attr,
            banner_url: post.banner.clone().unwrap_or_default(),
            read_time: estimate_minutes(&post.content),
            sections,
        };

        let mut context = self.base_context();
        context.insert("page_title", &post.title);
        context.insert("post", &detail);

        let html = self.renderer.render("post.html", &context)?;

        let output_path = self
            .app
            .public_dir
            .join("post")
            .join(&post.slug)
            .join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(())
    }

    /// Render the transient loading page served for unresolved slugs
    pub fn render_loading_page(&self) -> Result<String> {
        let context = self.base_context();
        self.renderer.render("loading.html", &context)
    }

    /// Generate the Atom feed
    fn generate_atom_feed(&self, posts: &[Post]) -> Result<()> {
        let config = &self.app.config;
        let base_url = config.url.trim_end_matches('/');

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}/atom.xml\" rel=\"self\"/>\n",
            base_url
        ));
        feed.push_str(&format!("  <link href=\"{}/\"/>\n", base_url));
        feed.push_str(&format!(
            "  <updated>{}</updated>\n",
            Utc::now().to_rfc3339()
        ));
        feed.push_str(&format!("  <id>{}/</id>\n", base_url));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in posts.iter().take(config.feed_limit) {
            let link = format!("{}{}post/{}/", base_url, config.root, post.slug);
            let stamp = post
                .first_publication_date
                .map(|d| date_xml(&d))
                .unwrap_or_else(|| Utc::now().to_rfc3339());

            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!("    <published>{}</published>\n", stamp));
            feed.push_str(&format!("    <updated>{}</updated>\n", stamp));
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(&post.subtitle)
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        let output_path = self.app.public_dir.join("atom.xml");
        fs::write(&output_path, feed)?;
        tracing::info!("Generated atom.xml");

        Ok(())
    }

    /// Write the embedded stylesheet
    fn write_stylesheet(&self) -> Result<()> {
        let output_path = self.app.public_dir.join("css/style.css");
        write_file(&output_path, STYLESHEET)
    }

    /// Copy local static assets (images, etc.) to the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.app.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                let relative = path.strip_prefix(static_dir)?;
                let dest = self.app.public_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(path, &dest)?;
            }
        }

        Ok(())
    }
}

/// Write a file, creating parent directories as needed
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, content).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))?;
    Ok(())
}

/// Resolve the configured timezone, falling back to UTC
fn parse_timezone(name: &str) -> Tz {
    if name.trim().is_empty() {
        return Tz::UTC;
    }
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!("Unknown timezone `{}`, falling back to UTC", name);
            Tz::UTC
        }
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use crate::config::SiteConfig;
    use crate::content::{Block, Cursor, PostPage, Section};

    fn test_app(base_dir: &Path) -> Voyager {
        let config = SiteConfig {
            title: "Test Blog".to_string(),
            ..SiteConfig::default()
        };
        Voyager {
            public_dir: base_dir.join(&config.public_dir),
            static_dir: base_dir.join(&config.static_dir),
            base_dir: base_dir.to_path_buf(),
            config,
        }
    }

    fn post(slug: &str, title: &str, body_words: &str) -> Post {
        Post {
            slug: slug.to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()),
            title: title.to_string(),
            subtitle: format!("About {}", title),
            author: "Jane Doe".to_string(),
            banner: None,
            content: vec![Section {
                heading: "Body".to_string(),
                body: vec![Block {
                    text: body_words.to_string(),
                }],
            }],
        }
    }

    struct StubSource {
        pages: Mutex<VecDeque<PostPage>>,
        posts: HashMap<String, Post>,
    }

    impl StubSource {
        fn new(posts: Vec<Post>, pages: Vec<PostPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                posts: posts.into_iter().map(|p| (p.slug.clone(), p)).collect(),
            }
        }
    }

    #[async_trait]
    impl ContentSource for StubSource {
        async fn query(
            &self,
            _page_size: usize,
            _cursor: Option<&Cursor>,
        ) -> Result<PostPage, CmsError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CmsError::InvalidRecord("no more pages queued".to_string()))
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Post, CmsError> {
            self.posts
                .get(slug)
                .cloned()
                .ok_or_else(|| CmsError::NotFound(slug.to_string()))
        }
    }

    fn two_page_source() -> StubSource {
        let posts = vec![
            post("first-post", "First Post", "some words here"),
            post("second-post", "Second Post", "more words here"),
            post("third-post", "Third Post", "still more words"),
            post("fourth-post", "Fourth Post", "final words"),
        ];
        let pages = vec![
            PostPage {
                results: posts[..2].iter().map(|p| p.summary()).collect(),
                next_page: Some(Cursor::new("https://api.example.com/page/2")),
            },
            PostPage {
                results: posts[2..].iter().map(|p| p.summary()).collect(),
                next_page: None,
            },
        ];
        StubSource::new(posts, pages)
    }

    #[tokio::test]
    async fn test_generate_writes_feed_pages() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let generator = Generator::new(&app).unwrap();

        generator.generate(&two_page_source()).await.unwrap();

        let index = fs::read_to_string(app.public_dir.join("index.html")).unwrap();
        assert!(index.contains("First Post"));
        assert!(index.contains("Second Post"));
        assert!(!index.contains("Third Post"));
        assert!(index.contains(r#"href="/page/2/""#));
        assert!(index.contains("Carregar mais posts"));

        let page2 = fs::read_to_string(app.public_dir.join("page/2/index.html")).unwrap();
        assert!(page2.contains("First Post"));
        assert!(page2.contains("Fourth Post"));
        assert!(!page2.contains("load-more"));
    }

    #[tokio::test]
    async fn test_generate_writes_post_pages() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let generator = Generator::new(&app).unwrap();

        generator.generate(&two_page_source()).await.unwrap();

        let page = fs::read_to_string(
            app.public_dir.join("post/first-post/index.html"),
        )
        .unwrap();
        assert!(page.contains("First Post"));
        assert!(page.contains("15 mar 2021"));
        assert!(page.contains("1 min"));
        assert!(page.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_generate_writes_page_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let generator = Generator::new(&app).unwrap();

        generator.generate(&two_page_source()).await.unwrap();

        let raw = fs::read_to_string(app.public_dir.join("api/page/1.json")).unwrap();
        let page: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(page["results"].as_array().unwrap().len(), 2);
        assert_eq!(page["next_page"], "/api/page/2.json");
        assert_eq!(page["results"][0]["slug"], "first-post");

        let raw = fs::read_to_string(app.public_dir.join("api/page/2.json")).unwrap();
        let page: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(page["results"].as_array().unwrap().len(), 2);
        assert!(page["next_page"].is_null());
    }

    #[tokio::test]
    async fn test_generate_writes_feed_and_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let generator = Generator::new(&app).unwrap();

        generator.generate(&two_page_source()).await.unwrap();

        let atom = fs::read_to_string(app.public_dir.join("atom.xml")).unwrap();
        assert!(atom.contains("<title>Test Blog</title>"));
        assert!(atom.contains("First Post"));
        assert!(app.public_dir.join("css/style.css").exists());
    }

    #[tokio::test]
    async fn test_vanished_post_is_skipped() {
        let posts = vec![post("kept", "Kept", "words")];
        let pages = vec![PostPage {
            results: vec![
                posts[0].summary(),
                post("gone", "Gone", "words").summary(),
            ],
            next_page: None,
        }];
        let source = StubSource::new(posts, pages);

        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let generator = Generator::new(&app).unwrap();
        generator.generate(&source).await.unwrap();

        assert!(app.public_dir.join("post/kept/index.html").exists());
        assert!(!app.public_dir.join("post/gone/index.html").exists());
        // The vanished post still appears on the list page it was part of
        let index = fs::read_to_string(app.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Gone"));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone(""), Tz::UTC);
        assert_eq!(parse_timezone("America/Sao_Paulo"), Tz::America__Sao_Paulo);
        assert_eq!(parse_timezone("Not/AZone"), Tz::UTC);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & <b>"), "a &amp; &lt;b&gt;");
    }
}
