use url::Url;

use crate::{error::Error, title::TitleList, util::default_ureq_agent_builder};

const TRENDS_RSS_URL: &str = "https://trends.google.com/trends/trendingsearches/daily/rss";
const BOILERPLATE_TITLE: &str = "Daily Search Trends";
const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";
const USER_AGENT: &str = concat!("searchbar/", env!("CARGO_PKG_VERSION"));

/// Daily trending searches of a region, read from the public RSS feed.
pub struct TrendingSearches {
    agent: ureq::Agent,
}

impl TrendingSearches {
    pub fn new(proxy_url: Option<&str>) -> Self {
        Self {
            agent: default_ureq_agent_builder(proxy_url).build().into(),
        }
    }

    pub fn feed_url(region_code: &str) -> Result<Url, Error> {
        Url::parse_with_params(TRENDS_RSS_URL, &[("geo", region_code)])
            .map_err(|err| Error::ConfigError(err.to_string()))
    }

    pub fn fetch(&self, region_code: &str, limit: usize) -> Result<TitleList, Error> {
        let url = Self::feed_url(region_code)?;
        log::debug!("fetching trends from {}", url);
        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()?;
        let body = response.body_mut().read_to_string()?;
        Ok(extract_titles(&body, limit))
    }
}

/// Scan `body` for consecutive `<title>` elements, in document order.  The
/// feed's own title is skipped and duplicates are kept.
pub fn extract_titles(body: &str, limit: usize) -> TitleList {
    let mut titles = Vec::new();
    let mut rest = body;
    while titles.len() < limit {
        let Some(start) = rest.find(TITLE_OPEN) else {
            break;
        };
        rest = &rest[start + TITLE_OPEN.len()..];
        let Some(end) = rest.find(TITLE_CLOSE) else {
            break;
        };
        let title = &rest[..end];
        if title != BOILERPLATE_TITLE {
            titles.push(title.to_owned());
        }
        rest = &rest[end + TITLE_CLOSE.len()..];
    }
    TitleList::from(titles)
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::NetworkError(Box::new(err))
    }
}
