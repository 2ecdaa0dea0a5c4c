//! Content source client
//!
//! The query/fetch interface to the headless CMS. The rest of the crate
//! only sees validated domain types; everything the API hands back goes
//! through the ingestion boundary in [`record`].

mod client;
pub mod record;

pub use client::CmsClient;
pub use record::is_valid_slug;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::{Cursor, Post, PostPage};

/// Errors surfaced by the content source
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("content API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content API returned status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("failed to decode content API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed post record: {0}")]
    InvalidRecord(String),

    #[error("no post found for slug `{0}`")]
    NotFound(String),
}

/// Paginated list queries and single-record lookups against the CMS
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one page of post summaries
    ///
    /// Without a cursor this is the first page; with a cursor it is the
    /// page the cursor points at. The returned cursor is `None` once the
    /// result set is exhausted.
    async fn query(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<PostPage, CmsError>;

    /// Fetch one full post record by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Post, CmsError>;
}
