//! Burn ban bulletin client.
//!
//! The bulletin is an RSS document whose first item's `description` holds a
//! comma separated list of county names.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use super::{BanFeed, FeedError};
use crate::store::normalize_county_name;

/// Fetches the bulletin over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBanFeed {
    http: reqwest::Client,
    url: String,
}

impl HttpBanFeed {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[async_trait]
impl BanFeed for HttpBanFeed {
    async fn fetch(&self) -> Result<Vec<String>, FeedError> {
        debug!("fetching burn ban bulletin from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let counties = parse_bulletin(&body)?;
        debug!("bulletin lists {} counties: {:?}", counties.len(), counties);
        Ok(counties)
    }
}

/// Extracts normalized county names from `rss/channel/item/description`.
///
/// Entries are trimmed, blanks dropped and duplicates removed, keeping feed
/// order. An empty description means no county is banned.
pub fn parse_bulletin(xml: &str) -> Result<Vec<String>, FeedError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| FeedError::Parse(e.to_string()))?;

    let channel = child(doc.root_element(), "channel")?;
    let item = child(channel, "item")?;
    let description = child(item, "description")?;

    let text: String = description
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();

    let mut seen = HashSet::new();
    Ok(text
        .split(',')
        .map(normalize_county_name)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect())
}

fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Result<roxmltree::Node<'a, 'input>, FeedError> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .ok_or_else(|| FeedError::Parse(format!("missing <{}> element", name)))
}
