pub mod document;
pub mod prompt;

pub use document::{parse_news, render_news, render_show_notes};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("failed to fetch feed: {0}")]
    Fetch(String),
    #[error("failed to parse feed: {0}")]
    Parse(String),
    #[error("script generation failed: {0}")]
    Generation(String),
    #[error("script generation returned no text")]
    EmptyScript,
}

/// Producer of news items for an episode
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, feed_url: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError>;
}

/// Producer of the two-host dialogue script for a set of news items
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(&self, items: &[NewsItem]) -> Result<String, NewsError>;
}
