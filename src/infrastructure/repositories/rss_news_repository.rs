use crate::domain::news::{NewsError, NewsItem, NewsSource};
use async_trait::async_trait;
use html2text::from_read;
use std::sync::LazyLock;

/// Characters kept from a cleaned summary before it is cut with an ellipsis
const SUMMARY_MAX_CHARS: usize = 200;

static WHITESPACE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").unwrap());

/// News source backed by an RSS or Atom feed
pub struct RssNewsRepository {
    http: reqwest::Client,
}

impl RssNewsRepository {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn to_item(entry: feed_rs::model::Entry) -> Option<NewsItem> {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();
        let url = entry
            .links
            .iter()
            .map(|link| link.href.trim())
            .find(|href| !href.is_empty())
            .unwrap_or_default()
            .to_string();

        if title.is_empty() || url.is_empty() {
            return None;
        }

        let raw_summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();

        Some(NewsItem {
            title,
            url,
            summary: clean_summary(&raw_summary),
            published_at: entry.published.or(entry.updated),
        })
    }
}

#[async_trait]
impl NewsSource for RssNewsRepository {
    async fn fetch(&self, feed_url: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
        tracing::info!(feed_url = feed_url, limit = limit, "Fetching news feed");

        let response = self
            .http
            .get(feed_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(feed_url = feed_url, error = %e, "Feed request failed");
                NewsError::Fetch(e.to_string())
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|e| NewsError::Fetch(e.to_string()))?;

        let feed = feed_rs::parser::parse(&body[..]).map_err(|e| NewsError::Parse(e.to_string()))?;

        let items: Vec<NewsItem> = feed
            .entries
            .into_iter()
            .filter_map(Self::to_item)
            .take(limit)
            .collect();

        tracing::info!(items = items.len(), "Parsed news feed");
        Ok(items)
    }
}

/// Plain text, single-spaced, at most `SUMMARY_MAX_CHARS` characters plus `...`
pub fn clean_summary(html: &str) -> String {
    let plain_text = from_read(html.as_bytes(), usize::MAX);
    let normalized = WHITESPACE.replace_all(&plain_text, " ");
    let text = normalized.trim();

    if text.chars().count() > SUMMARY_MAX_CHARS {
        let truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
