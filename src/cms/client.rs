//! HTTP client for the content API

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::StatusCode;

use super::record::{PostRecord, QueryResponse};
use super::{CmsError, ContentSource};
use crate::config::ApiConfig;
use crate::content::{Cursor, Post, PostPage};

/// Characters escaped when a slug is placed in a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Content source client backed by the repository's HTTP API
///
/// One fetch per operation, no retries, no timeouts; errors propagate
/// to the caller untouched.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    api_url: String,
    access_token: Option<String>,
}

impl CmsClient {
    /// Create a client for the configured API endpoint
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    /// URL of the first list page
    fn list_url(&self, page_size: usize) -> String {
        let mut url = format!("{}/documents?page_size={}", self.api_url, page_size);
        if let Some(token) = &self.access_token {
            url.push_str("&access_token=");
            url.push_str(&utf8_percent_encode(token, NON_ALPHANUMERIC).to_string());
        }
        url
    }

    /// URL of a single document
    fn document_url(&self, slug: &str) -> String {
        let mut url = format!(
            "{}/documents/{}",
            self.api_url,
            utf8_percent_encode(slug, PATH_SEGMENT)
        );
        if let Some(token) = &self.access_token {
            url.push_str("?access_token=");
            url.push_str(&utf8_percent_encode(token, NON_ALPHANUMERIC).to_string());
        }
        url
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, CmsError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn query(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> Result<PostPage, CmsError> {
        // A cursor is the full URL of the next page; follow it verbatim.
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => self.list_url(page_size),
        };

        tracing::debug!("Querying content API: {}", url);
        let body = self.fetch(&url).await?.text().await?;
        let response: QueryResponse = serde_json::from_str(&body)?;
        response.into_page()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post, CmsError> {
        let url = self.document_url(slug);

        tracing::debug!("Fetching post `{}`", slug);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CmsError::NotFound(slug.to_string()));
        }
        if !status.is_success() {
            return Err(CmsError::Status { status, url });
        }

        let body = response.text().await?;
        let record: PostRecord = serde_json::from_str(&body)?;
        record.into_post()
    }
}
