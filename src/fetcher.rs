use std::collections::HashMap;

use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Sent with every feed request.
pub const USER_AGENT: &str = "gator";

/// Longest entity name (between `&` and `;`) that is considered for decoding.
const MAX_ENTITY_LEN: usize = 10;

/// chrono pattern for `Mon, 02 Jan 2006 15:04:05 -0700`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssFeed {
    pub channel: RssChannel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// The `<pubDate>` text as it appeared in the document.
    pub pub_date: Option<String>,
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET `url` and parse the body as a feed.
    pub async fn fetch(&self, url: &str) -> Result<RssFeed> {
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Fetch(format!("HTTP error: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read response: {}", e)))?;

        parse_feed(&bytes)
    }
}

/// Parse an RSS document into a channel with its items.
///
/// Titles and descriptions are HTML-unescaped. Items without a link are
/// dropped, since a post cannot be stored without one.
pub fn parse_feed(bytes: &[u8]) -> Result<RssFeed> {
    // feed_rs normalises dates, so the raw <pubDate> text is read separately
    let pub_dates = extract_pub_dates_from_xml(bytes);

    let parsed = parser::parse(bytes).map_err(|e| Error::Parse(e.to_string()))?;

    let mut items = Vec::with_capacity(parsed.entries.len());
    for entry in parsed.entries {
        let title = entry
            .title
            .map(|t| unescape_html(&t.content))
            .unwrap_or_default();

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        if link.is_empty() {
            warn!("Skipping item with no link: {}", title);
            continue;
        }

        let description = entry
            .summary
            .map(|s| unescape_html(&s.content))
            .unwrap_or_default();

        // feed_rs's own date only stands in for items the raw scan never saw
        let pub_date = match pub_dates.get(&link) {
            Some(raw) => raw.clone(),
            None => entry
                .published
                .map(|dt| dt.format(PUB_DATE_FORMAT).to_string()),
        };

        items.push(RssItem {
            title,
            link,
            description,
            pub_date,
        });
    }

    Ok(RssFeed {
        channel: RssChannel {
            title: parsed
                .title
                .map(|t| unescape_html(&t.content))
                .unwrap_or_default(),
            link: parsed
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            description: parsed
                .description
                .map(|d| unescape_html(&d.content))
                .unwrap_or_default(),
            items,
        },
    })
}

/// Map each item's `<link>` to its raw `<pubDate>` text, `None` when the
/// item has no `<pubDate>` element.
pub fn extract_pub_dates_from_xml(xml_bytes: &[u8]) -> HashMap<String, Option<String>> {
    let mut pub_dates = HashMap::new();
    let xml_str = match std::str::from_utf8(xml_bytes) {
        Ok(s) => s,
        Err(_) => return pub_dates,
    };

    for item in item_blocks(xml_str) {
        if let Some(link) = extract_xml_element(item, "link") {
            // The parsed link has its XML entities decoded; match that.
            pub_dates.insert(unescape_html(&link), extract_xml_element(item, "pubDate"));
        }
    }

    pub_dates
}

/// Bodies of every `<item>` element, including ones whose opening tag
/// carries attributes.
fn item_blocks(xml: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = xml;

    while let Some(pos) = rest.find("<item") {
        let after = &rest[pos + "<item".len()..];
        let opens_item = after
            .chars()
            .next()
            .map_or(false, |c| c == '>' || c.is_whitespace());
        if !opens_item {
            rest = after;
            continue;
        }

        let tag_end = match after.find('>') {
            Some(end) => end,
            None => break,
        };
        let body = &after[tag_end + 1..];
        let body_end = body.find("</item>").unwrap_or(body.len());
        blocks.push(&body[..body_end]);
        rest = &body[body_end..];
    }

    blocks
}

/// Text of the first `<tag>...</tag>` in `xml`, trimmed, with any CDATA
/// wrapper removed.
pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    let start = xml.find(&start_tag)? + start_tag.len();
    let end = xml[start..].find(&end_tag)? + start;

    let text = xml[start..end].trim();
    let text = text
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text);

    Some(text.trim().to_string())
}

/// Decode HTML character references. Unknown or malformed entities are kept
/// as written.
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let decoded = after
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&after[..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                result.push(ch);
                rest = &after[end + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => parse_numeric_entity(entity).and_then(char::from_u32),
    }
}

/// Parse a numeric entity body (e.g. "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    let digits = entity.strip_prefix('#')?;
    match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}
