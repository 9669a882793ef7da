use std::time::Duration;

use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::FeedSource;

/// Number of entries kept from the top of each feed.
pub const MAX_ENTRIES: usize = 5;

/// Placeholder for entries that carry no publish date.
pub const MISSING_DATE: &str = "N/A";

/// Any reason a feed could not be turned into entries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, or timeout failure
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("parse error: {0}")]
    Parse(#[from] parser::ParseFeedError),
    /// One of the kept entries lacks a title or a link
    #[error("entry {index} has no {field}")]
    MissingField { field: &'static str, index: usize },
}

/// One normalized entry as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub source: String,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("SocDashboard/1.0 (Feed Reader)")
            .build()?;

        Ok(Self { client })
    }

    /// Fetch and parse a feed, keeping the first `MAX_ENTRIES` entries.
    pub async fn fetch(&self, url: &str, label: &str) -> Result<Vec<FeedEntry>, FetchError> {
        info!("Fetching feed: {} ({})", label, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        // feed_rs only exposes parsed dates, so keep the upstream text separately
        let raw_dates = Self::extract_published_dates(&bytes);

        let parsed = parser::parse(&bytes[..])?;
        normalize_entries(parsed.entries, &raw_dates, label)
    }

    /// Best-effort variant of [`Fetcher::fetch`]: failures are logged and
    /// yield an empty list so one broken feed never breaks the dashboard.
    pub async fn fetch_or_empty(&self, source: &FeedSource) -> Vec<FeedEntry> {
        match self.fetch(&source.url, &source.label).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error fetching {} ({}): {}", source.label, source.url, e);
                Vec::new()
            }
        }
    }

    /// Raw publish date text of every RSS `<item>` or Atom `<entry>`, in
    /// document order. `None` where the element is absent or empty.
    pub fn extract_published_dates(xml_bytes: &[u8]) -> Vec<Option<String>> {
        let xml_str = match std::str::from_utf8(xml_bytes) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let items = Self::element_blocks(xml_str, "item");
        let (blocks, date_tag) = if items.is_empty() {
            (Self::element_blocks(xml_str, "entry"), "published")
        } else {
            (items, "pubDate")
        };

        blocks
            .into_iter()
            .map(|block| {
                Self::extract_xml_element(block, date_tag)
                    .map(|text| strip_cdata(&text).to_string())
                    .filter(|text| !text.is_empty())
            })
            .collect()
    }

    /// Inner text of every `<tag ...>...</tag>` block, skipping tags that only
    /// share a prefix (`<items>` is not an `<item>`).
    pub fn element_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
        let start_tag = format!("<{}", tag);
        let end_tag = format!("</{}>", tag);
        let mut blocks = Vec::new();
        let mut rest = xml;

        while let Some(pos) = rest.find(&start_tag) {
            let after = &rest[pos + start_tag.len()..];
            let is_tag = after
                .chars()
                .next()
                .map_or(false, |c| c == '>' || c.is_whitespace());
            if !is_tag {
                rest = after;
                continue;
            }

            let body_start = match after.find('>') {
                Some(i) => i + 1,
                None => break,
            };
            let body = &after[body_start..];
            match body.find(&end_tag) {
                Some(end) => {
                    blocks.push(&body[..end]);
                    rest = &body[end + end_tag.len()..];
                }
                None => break,
            }
        }

        blocks
    }

    pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);

        let start = xml.find(&start_tag)? + start_tag.len();
        let end = xml[start..].find(&end_tag)? + start;

        Some(xml[start..end].trim().to_string())
    }
}

fn strip_cdata(text: &str) -> &str {
    text.strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(text)
}

/// Keep the first `MAX_ENTRIES` entries and map them to [`FeedEntry`].
///
/// `raw_dates` holds the upstream publish date text per entry; it is only
/// trusted when it lines up one-to-one with `entries`. A kept entry without a
/// title or link fails the whole feed.
pub fn normalize_entries(
    entries: Vec<Entry>,
    raw_dates: &[Option<String>],
    label: &str,
) -> Result<Vec<FeedEntry>, FetchError> {
    let raw_dates: &[Option<String>] = if raw_dates.len() == entries.len() {
        raw_dates
    } else {
        debug!(
            "Raw date count {} does not match {} entries for '{}'",
            raw_dates.len(),
            entries.len(),
            label
        );
        &[]
    };

    entries
        .into_iter()
        .take(MAX_ENTRIES)
        .enumerate()
        .map(|(index, entry)| {
            let raw = raw_dates.get(index).cloned().flatten();
            normalize_entry(entry, raw, index, label)
        })
        .collect()
}

fn normalize_entry(
    entry: Entry,
    raw_date: Option<String>,
    index: usize,
    label: &str,
) -> Result<FeedEntry, FetchError> {
    let link = primary_link(&entry).ok_or(FetchError::MissingField {
        field: "link",
        index,
    })?;

    let title = entry
        .title
        .map(|t| t.content)
        .ok_or(FetchError::MissingField {
            field: "title",
            index,
        })?;

    // Only the publish date counts; `updated` is not a substitute.
    let published = raw_date
        .or_else(|| entry.published.map(|dt| dt.to_rfc2822()))
        .unwrap_or_else(|| MISSING_DATE.to_string());

    Ok(FeedEntry {
        title,
        link,
        published,
        source: label.to_string(),
    })
}

/// The alternate link if one is marked, else the first link.
fn primary_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| {
            l.rel
                .as_deref()
                .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
}
