//! Wire records and the ingestion boundary
//!
//! The content API is loosely typed; these records mirror its JSON shape
//! and are validated into domain types before anything else touches them.
//! A malformed record is rejected here rather than propagated inward.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::CmsError;
use crate::content::{Block, Cursor, Post, PostPage, PostSummary, Section};

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Whether a string is acceptable as a post slug
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Response of a paginated list query
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<PostRecord>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl QueryResponse {
    /// Validate the whole page into domain types
    pub fn into_page(self) -> Result<PostPage, CmsError> {
        let results = self
            .results
            .into_iter()
            .map(PostRecord::into_summary)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PostPage {
            results,
            next_page: self.next_page.map(Cursor::new),
        })
    }
}

/// One post document as delivered by the API
#[derive(Debug, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    pub data: DataRecord,
}

/// The data payload of a post document
#[derive(Debug, Deserialize)]
pub struct DataRecord {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub author: String,
    #[serde(default)]
    pub banner: Option<BannerRecord>,
    #[serde(default)]
    pub content: Vec<SectionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BannerRecord {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionRecord {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: Vec<BlockRecord>,
}

#[derive(Debug, Deserialize)]
pub struct BlockRecord {
    pub text: String,
}

impl PostRecord {
    /// Validate into a full domain post
    pub fn into_post(self) -> Result<Post, CmsError> {
        let title = require(&self.data.title, "title")?;
        let author = require(&self.data.author, "author")?;
        let slug = resolve_slug(self.uid, &title)?;
        let first_publication_date = parse_publication_date(self.first_publication_date)?;

        let content = self
            .data
            .content
            .into_iter()
            .map(|s| Section {
                heading: s.heading,
                body: s.body.into_iter().map(|b| Block { text: b.text }).collect(),
            })
            .collect();

        Ok(Post {
            slug,
            first_publication_date,
            title,
            subtitle: self.data.subtitle,
            author,
            banner: self.data.banner.and_then(|b| b.url),
            content,
        })
    }

    /// Validate into a list-page summary
    pub fn into_summary(self) -> Result<PostSummary, CmsError> {
        let title = require(&self.data.title, "title")?;
        let author = require(&self.data.author, "author")?;
        let slug = resolve_slug(self.uid, &title)?;
        let first_publication_date = parse_publication_date(self.first_publication_date)?;

        Ok(PostSummary {
            slug,
            first_publication_date,
            title,
            subtitle: self.data.subtitle,
            author,
        })
    }
}

fn require(value: &str, field: &str) -> Result<String, CmsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CmsError::InvalidRecord(format!("missing {}", field)));
    }
    Ok(value.to_string())
}

/// Take the document uid as slug, or derive one from the title
fn resolve_slug(uid: Option<String>, title: &str) -> Result<String, CmsError> {
    let slug = match uid {
        Some(uid) if !uid.trim().is_empty() => uid.trim().to_string(),
        _ => slug::slugify(title),
    };

    if !is_valid_slug(&slug) {
        return Err(CmsError::InvalidRecord(format!("invalid slug `{}`", slug)));
    }
    Ok(slug)
}

/// Parse the publication timestamp, if present
///
/// Accepts RFC 3339 as well as the compact `+0000` offset form the API
/// uses. A record without a date is valid; a record with a date it
/// cannot parse is not.
fn parse_publication_date(raw: Option<String>) -> Result<Option<DateTime<Utc>>, CmsError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(&raw)
        .or_else(|_| DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z"));

    match parsed {
        Ok(date) => Ok(Some(date.with_timezone(&Utc))),
        Err(e) => Err(CmsError::InvalidRecord(format!(
            "unparseable publication date `{}`: {}",
            raw, e
        ))),
    }
}
