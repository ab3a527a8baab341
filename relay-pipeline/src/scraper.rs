//! Plain HTTP page scraper implementing [`Scraper`].
//!
//! Takes the first link to an installer or archive as the download, the
//! tag-stripped page text as the version source, and the first MD5/SHA-256
//! digest labelled as such as the checksum.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use relay_core::PageInfo;
use url::Url;

use crate::collaborators::Scraper;
use crate::error::ToolError;

const USER_AGENT: &str = concat!("relay/", env!("CARGO_PKG_VERSION"));

pub struct HttpScraper {
    agent: ureq::Agent,
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpScraper {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(60))
                .user_agent(USER_AGENT)
                .build(),
        }
    }
}

impl Scraper for HttpScraper {
    fn fetch_page(&self, url: &str) -> Result<PageInfo, ToolError> {
        let base = Url::parse(url).map_err(|e| ToolError::Http(format!("invalid url {url}: {e}")))?;
        let body = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ToolError::Http(format!("GET {url}: {e}")))?
            .into_string()
            .map_err(|e| ToolError::Http(format!("reading {url}: {e}")))?;
        tracing::debug!(url, bytes = body.len(), "fetched task page");
        parse_page(&base, &body)
    }
}

struct Patterns {
    link: Regex,
    tag: Regex,
    digest: Regex,
}

fn patterns() -> Result<&'static Patterns, ToolError> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                link: Regex::new(r#"(?i)href\s*=\s*["']([^"']+\.(?:exe|msi|7z|zip))["']"#).ok()?,
                tag: Regex::new(r"(?s)<script.*?</script>|<style.*?</style>|<[^>]+>").ok()?,
                digest: Regex::new(
                    r"(?i)\b(?:md5|sha-?256)\b[^0-9a-f]{0,40}\b([0-9a-f]{64}|[0-9a-f]{32})\b",
                )
                .ok()?,
            })
        })
        .as_ref()
        .ok_or_else(|| ToolError::Http("scraper patterns failed to compile".to_string()))
}

/// Extract [`PageInfo`] from an already downloaded page.
pub fn parse_page(base: &Url, html: &str) -> Result<PageInfo, ToolError> {
    let p = patterns()?;
    let raw_href = p
        .link
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ToolError::Http(format!("no download link found on {base}")))?;
    let href = base
        .join(raw_href)
        .map_err(|e| ToolError::Http(format!("bad download link {raw_href}: {e}")))?;

    let text = p.tag.replace_all(html, " ").into_owned();
    let checksum = p
        .digest
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase());

    Ok(PageInfo {
        href: href.into(),
        text,
        checksum,
    })
}
