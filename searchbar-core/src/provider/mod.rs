pub mod history;
pub mod trends;

use std::panic::{self, AssertUnwindSafe};

use crate::{
    config::{SlotConfig, SourceKind},
    error::Error,
    title::TitleList,
};

pub use self::{history::LocalHistory, trends::TrendingSearches};

/// Produces the titles of one source.  Implementations read nothing but
/// `config` and never touch slot state.
pub trait TitleProvider: Send + Sync {
    fn fetch(&self, config: &SlotConfig) -> Result<TitleList, Error>;
}

impl<F> TitleProvider for F
where
    F: Fn(&SlotConfig) -> Result<TitleList, Error> + Send + Sync,
{
    fn fetch(&self, config: &SlotConfig) -> Result<TitleList, Error> {
        self(config)
    }
}

/// Dispatches to the concrete provider named by `SlotConfig::source`.
pub struct SourceProvider {
    history: LocalHistory,
    trends: TrendingSearches,
}

impl SourceProvider {
    pub fn new(proxy_url: Option<&str>) -> Self {
        Self {
            history: LocalHistory::new(),
            trends: TrendingSearches::new(proxy_url),
        }
    }

    pub fn with_providers(history: LocalHistory, trends: TrendingSearches) -> Self {
        Self { history, trends }
    }
}

impl TitleProvider for SourceProvider {
    fn fetch(&self, config: &SlotConfig) -> Result<TitleList, Error> {
        match config.source {
            Some(SourceKind::LocalHistory) => {
                self.history.fetch(&config.profile, config.item_limit)
            }
            Some(SourceKind::TrendingSearches) => {
                self.trends.fetch(&config.region_code, config.item_limit)
            }
            None => Ok(TitleList::new()),
        }
    }
}

/// Run `provider`, degrading any failure (including a panic) to an empty
/// list.  Exactly one diagnostic is logged per failed fetch.
pub fn fetch_or_empty(provider: &dyn TitleProvider, config: &SlotConfig) -> TitleList {
    let result = panic::catch_unwind(AssertUnwindSafe(|| provider.fetch(config)))
        .unwrap_or(Err(Error::ProviderPanicked));
    match result {
        Ok(titles) => {
            log::debug!("fetched {} titles from {:?}", titles.len(), config.source);
            titles
        }
        Err(err) => {
            log::error!("failed to fetch titles from {:?}: {}", config.source, err);
            TitleList::new()
        }
    }
}
