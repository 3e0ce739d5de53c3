use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_ITEM_LIMIT: usize = 5;
pub const DEFAULT_REGION_CODE: &str = "US";
pub const DEFAULT_PROFILE: &str = "Default";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SourceKind {
    LocalHistory,
    TrendingSearches,
}

impl SourceKind {
    /// Parse the host's source name.  Empty or `None` means no active source,
    /// which is not an error.
    pub fn parse(name: &str) -> Result<Option<Self>, Error> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        name.parse().map(Some)
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const HISTORY: &[&str] = &["LocalHistory", "RecentHistory", "Chrome_History"];
        const TRENDS: &[&str] = &["TrendingSearches", "TopTrends", "Top_Trends"];

        let matches = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(s));
        if matches(HISTORY) {
            Ok(Self::LocalHistory)
        } else if matches(TRENDS) {
            Ok(Self::TrendingSearches)
        } else {
            Err(Error::UnknownSourceKind(s.to_owned()))
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalHistory => f.write_str("LocalHistory"),
            Self::TrendingSearches => f.write_str("TrendingSearches"),
        }
    }
}

/// Parameters of one refreshable source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotConfig {
    pub source: Option<SourceKind>,
    pub item_limit: usize,
    pub region_code: String,
    pub profile: String,
}

impl SlotConfig {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn with_item_limit(mut self, item_limit: usize) -> Self {
        self.item_limit = item_limit;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            source: None,
            item_limit: DEFAULT_ITEM_LIMIT,
            region_code: DEFAULT_REGION_CODE.to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
        }
    }
}

/// Options of a single view, as supplied by the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ViewOptions {
    pub name: String,
    pub scope: String,
    pub source_kind: String,
    pub item_limit: usize,
    pub region_code: String,
    pub profile_selector: String,
    pub owner_name: Option<String>,
    pub selector_index: Option<usize>,
    pub completion_action_text: String,
}

impl ViewOptions {
    /// Views naming an owner are passive readers of that owner's slot.
    pub fn reader_of(&self) -> Option<&str> {
        self.owner_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Owners show the joined list unless told otherwise, readers the first
    /// item.
    pub fn selector_index(&self) -> usize {
        match (self.selector_index, self.reader_of()) {
            (Some(index), _) => index,
            (None, Some(_)) => 1,
            (None, None) => 0,
        }
    }

    pub fn slot_config(&self) -> Result<SlotConfig, Error> {
        let source = SourceKind::parse(&self.source_kind)?;
        let item_limit = if self.item_limit == 0 {
            log::warn!(
                "{}: item limit must be positive, using {}",
                self.name,
                DEFAULT_ITEM_LIMIT
            );
            DEFAULT_ITEM_LIMIT
        } else {
            self.item_limit
        };
        Ok(SlotConfig {
            source,
            item_limit,
            region_code: non_empty_or(&self.region_code, DEFAULT_REGION_CODE),
            profile: non_empty_or(&self.profile_selector, DEFAULT_PROFILE),
        })
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            scope: String::new(),
            source_kind: String::new(),
            item_limit: DEFAULT_ITEM_LIMIT,
            region_code: DEFAULT_REGION_CODE.to_owned(),
            profile_selector: DEFAULT_PROFILE.to_owned(),
            owner_name: None,
            selector_index: None,
            completion_action_text: String::new(),
        }
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_owned()
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_accepts_host_spellings() {
        assert_eq!(
            SourceKind::parse("chrome_history").unwrap(),
            Some(SourceKind::LocalHistory)
        );
        assert_eq!(
            SourceKind::parse("TopTrends").unwrap(),
            Some(SourceKind::TrendingSearches)
        );
        assert_eq!(SourceKind::parse("  ").unwrap(), None);
        assert_eq!(SourceKind::parse("None").unwrap(), None);
        assert!(matches!(
            SourceKind::parse("Weather"),
            Err(Error::UnknownSourceKind(kind)) if kind == "Weather"
        ));
    }

    #[test]
    fn view_options_fill_defaults() {
        let options: ViewOptions =
            serde_json::from_str(r#"{ "Name": "History", "SourceKind": "LocalHistory" }"#)
                .unwrap();
        let config = options.slot_config().unwrap();
        assert_eq!(config, SlotConfig::new(SourceKind::LocalHistory));
        assert_eq!(options.selector_index(), 0);
        assert_eq!(options.reader_of(), None);
    }

    #[test]
    fn reader_defaults_to_first_item() {
        let options: ViewOptions =
            serde_json::from_str(r#"{ "Name": "Item", "OwnerName": "History" }"#).unwrap();
        assert_eq!(options.reader_of(), Some("History"));
        assert_eq!(options.selector_index(), 1);
    }

    #[test]
    fn zero_item_limit_falls_back_to_default() {
        let options = ViewOptions {
            source_kind: "TrendingSearches".into(),
            item_limit: 0,
            region_code: "".into(),
            ..ViewOptions::default()
        };
        let config = options.slot_config().unwrap();
        assert_eq!(config.item_limit, DEFAULT_ITEM_LIMIT);
        assert_eq!(config.region_code, DEFAULT_REGION_CODE);
    }
}
