//! Post models

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Section;

/// A full blog post as validated at the ingestion boundary
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// URL-safe identifier
    pub slug: String,

    /// First publication timestamp; `None` for never-published records
    pub first_publication_date: Option<DateTime<Utc>>,

    /// Post title
    pub title: String,

    /// Post subtitle
    pub subtitle: String,

    /// Author display name
    pub author: String,

    /// Banner image URL
    pub banner: Option<String>,

    /// Ordered content sections, in display order
    pub content: Vec<Section>,
}

impl Post {
    /// The list-page projection of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

/// The subset of a post shown on list pages
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_projection() {
        let post = Post {
            slug: "hello-world".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()),
            title: "Hello World".to_string(),
            subtitle: "A first post".to_string(),
            author: "Jane Doe".to_string(),
            banner: Some("https://images.example.com/banner.png".to_string()),
            content: Vec::new(),
        };

        let summary = post.summary();
        assert_eq!(summary.slug, "hello-world");
        assert_eq!(summary.title, "Hello World");
        assert_eq!(summary.author, "Jane Doe");
        assert_eq!(
            summary.first_publication_date,
            post.first_publication_date
        );
    }
}
