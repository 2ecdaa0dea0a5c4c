//! List posts known to the content source

use anyhow::Result;

use crate::cms::{CmsClient, ContentSource};
use crate::content::Feed;
use crate::helpers::format_short_date;
use crate::i18n::Locale;
use crate::Voyager;

/// Fetch the full post list and print it
pub async fn run(app: &Voyager) -> Result<()> {
    let source = CmsClient::new(&app.config.api);
    let page_size = app.config.api.page_size;

    let first = source.query(page_size, None).await?;
    let mut feed = Feed::from_page(first);
    while feed.has_more() {
        if !feed.load_more(&source, page_size).await? {
            break;
        }
    }

    let locale = Locale::from_tag(&app.config.language);

    println!("Posts ({}):", feed.posts().len());
    for post in feed.posts() {
        let date = post
            .first_publication_date
            .map(|d| format_short_date(&d, locale))
            .unwrap_or_else(|| "unpublished".to_string());
        println!("  {} - {} [{}]", date, post.title, post.slug);
    }

    Ok(())
}
