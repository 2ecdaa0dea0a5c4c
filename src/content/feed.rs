//! Post feed - the append-only pagination state machine
//!
//! A [`Feed`] holds the ordered sequence of posts displayed so far plus
//! the continuation cursor of the last fetched page. Loading more never
//! removes or reorders earlier entries; it appends one fetched page and
//! replaces the cursor.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PostSummary;
use crate::cms::{CmsError, ContentSource};

/// Opaque continuation reference for a paginated list query
///
/// The content API hands back the URL of the next page; it is followed
/// verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a paginated list query
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    /// Posts of this page, in source order
    pub results: Vec<PostSummary>,
    /// Continuation cursor; `None` when the result set is exhausted
    pub next_page: Option<Cursor>,
}

/// The growing sequence of displayed posts
#[derive(Debug, Clone)]
pub struct Feed {
    posts: Vec<PostSummary>,
    next_page: Option<Cursor>,
}

impl Feed {
    /// Seed a feed from the first fetched page
    pub fn from_page(page: PostPage) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page,
        }
    }

    /// All posts displayed so far, in load order
    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    /// The current continuation cursor
    pub fn next_page(&self) -> Option<&Cursor> {
        self.next_page.as_ref()
    }

    /// Whether a further page can be loaded
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Load one more page from the content source
    ///
    /// Issues exactly one query with the held cursor, appends the results
    /// and replaces the cursor with the fetched page's cursor. Returns
    /// `false` without querying when no cursor is held. On error the feed
    /// is left untouched, so the caller may retry.
    pub async fn load_more<S>(&mut self, source: &S, page_size: usize) -> Result<bool, CmsError>
    where
        S: ContentSource + ?Sized,
    {
        let Some(cursor) = self.next_page.clone() else {
            return Ok(false);
        };

        let page = source.query(page_size, Some(&cursor)).await?;
        self.posts.extend(page.results);
        self.next_page = page.next_page;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::content::Post;

    fn summary(slug: &str) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            first_publication_date: None,
            title: slug.to_uppercase(),
            subtitle: String::new(),
            author: "author".to_string(),
        }
    }

    fn page(slugs: &[&str], next: Option<&str>) -> PostPage {
        PostPage {
            results: slugs.iter().map(|s| summary(s)).collect(),
            next_page: next.map(Cursor::new),
        }
    }

    /// Queue-backed content source recording every query it receives
    struct StubSource {
        pages: Mutex<VecDeque<PostPage>>,
        queries: Mutex<Vec<Option<String>>>,
    }

    impl StubSource {
        fn new(pages: Vec<PostPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<Option<String>> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentSource for StubSource {
        async fn query(
            &self,
            _page_size: usize,
            cursor: Option<&Cursor>,
        ) -> Result<PostPage, CmsError> {
            self.queries
                .lock()
                .unwrap()
                .push(cursor.map(|c| c.as_str().to_string()));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CmsError::InvalidRecord("no more pages queued".to_string()))
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Post, CmsError> {
            Err(CmsError::NotFound(slug.to_string()))
        }
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let source = StubSource::new(vec![page(&["p3", "p4"], None)]);
        let mut feed = Feed::from_page(page(&["p1", "p2"], Some("cursor-2")));

        let loaded = feed.load_more(&source, 2).await.unwrap();
        assert!(loaded);

        let slugs: Vec<_> = feed.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["p1", "p2", "p3", "p4"]);
        assert!(feed.next_page().is_none());
    }

    #[tokio::test]
    async fn test_load_more_replaces_cursor() {
        let source = StubSource::new(vec![page(&["p3"], Some("cursor-3"))]);
        let mut feed = Feed::from_page(page(&["p1", "p2"], Some("cursor-2")));

        feed.load_more(&source, 2).await.unwrap();
        assert_eq!(feed.next_page().unwrap().as_str(), "cursor-3");
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_is_a_no_op() {
        let source = StubSource::new(vec![]);
        let mut feed = Feed::from_page(page(&["p1"], None));

        let loaded = feed.load_more(&source, 2).await.unwrap();
        assert!(!loaded);
        assert!(source.queries().is_empty());
        assert_eq!(feed.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_load_more_issues_one_query_with_held_cursor() {
        let source = StubSource::new(vec![page(&["p3", "p4"], Some("cursor-3"))]);
        let mut feed = Feed::from_page(page(&["p1", "p2"], Some("cursor-2")));

        feed.load_more(&source, 2).await.unwrap();

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].as_deref(), Some("cursor-2"));
        assert_eq!(feed.posts().len(), 4);
        assert_eq!(feed.next_page().unwrap().as_str(), "cursor-3");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_feed_intact() {
        // Queue is empty, so the query fails
        let source = StubSource::new(vec![]);
        let mut feed = Feed::from_page(page(&["p1"], Some("cursor-2")));

        let result = feed.load_more(&source, 2).await;
        assert!(result.is_err());
        assert_eq!(feed.posts().len(), 1);
        assert_eq!(feed.next_page().unwrap().as_str(), "cursor-2");
    }
}
