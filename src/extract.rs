//! Article extraction collaborator
//!
//! The server treats extraction as an opaque service behind the
//! [`Extractor`] trait: `/api/extract` validates the caller's session
//! secret and delegates. `PageExtractor` is the built-in implementation,
//! a thin fetch-and-skim; swap in a richer engine by implementing the
//! trait.

use crate::error::{PressroomError, PressroomResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static DROP_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>").unwrap()
});

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// An extracted article
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Content-extraction service consumed by the `/api/extract` route.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> PressroomResult<Article>;
}

/// Default extractor: fetches the page and skims title and visible text.
pub struct PageExtractor;

#[async_trait]
impl Extractor for PageExtractor {
    async fn extract(&self, url: &str) -> PressroomResult<Article> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PressroomError::Fetch {
                url: url.to_string(),
                reason: "only http(s) URLs are supported".to_string(),
            });
        }

        let url = url.to_string();
        let fetch_url = url.clone();
        // ureq is synchronous; keep the reactor free while it blocks
        let html = tokio::task::spawn_blocking(move || -> PressroomResult<String> {
            let mut response = ureq::get(&fetch_url).call().map_err(|e| PressroomError::Fetch {
                url: fetch_url.clone(),
                reason: e.to_string(),
            })?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| PressroomError::Fetch {
                    url: fetch_url.clone(),
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| PressroomError::Internal(format!("fetch task panicked: {e}")))??;

        Ok(skim_article(&url, &html))
    }
}

/// Reduce a fetched page to title and visible text.
fn skim_article(url: &str, html: &str) -> Article {
    let title = TITLE
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    let without_blocks = DROP_BLOCKS.replace_all(html, " ");
    let text = TAGS.replace_all(&without_blocks, " ");
    let content = text.split_whitespace().collect::<Vec<_>>().join(" ");

    Article {
        url: url.to_string(),
        title,
        content,
    }
}
