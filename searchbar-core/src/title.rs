use std::{collections::HashSet, fmt, slice, sync::Arc};

/// Separator used when a view shows the whole list as one string.
pub const JOIN_SEPARATOR: &str = " | ";

/// Ordered list of titles produced by one fetch.  An empty list is a valid
/// "nothing found" result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TitleList(Vec<String>);

impl TitleList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Collect titles in order, dropping exact duplicates (first occurrence
    /// wins) and stopping once `limit` distinct titles are collected.
    pub fn unique<I, S>(titles: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut list = Vec::new();
        for title in titles {
            if list.len() >= limit {
                break;
            }
            let title = title.into();
            if seen.insert(title.clone()) {
                list.push(title);
            }
        }
        Self(list)
    }

    /// Collect up to `limit` titles in order, keeping duplicates.
    pub fn capped<I, S>(titles: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(titles.into_iter().take(limit).map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 1-based lookup, index 0 is never an item.
    pub fn nth(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn join(&self) -> String {
        self.0.join(JOIN_SEPARATOR)
    }

    pub fn into_shared(self) -> Arc<TitleList> {
        Arc::new(self)
    }
}

impl From<Vec<String>> for TitleList {
    fn from(titles: Vec<String>) -> Self {
        Self(titles)
    }
}

impl<'a> IntoIterator for &'a TitleList {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for TitleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keeps_first_occurrence_and_caps_after_dedup() {
        let list = TitleList::unique(["A", "B", "A", "C"], 3);
        assert_eq!(list, TitleList::capped(["A", "B", "C"], 3));
    }

    #[test]
    fn unique_is_case_sensitive() {
        let list = TitleList::unique(["a", "A", "a"], 10);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn capped_keeps_duplicates() {
        let list = TitleList::capped(["X", "X", "Y"], 2);
        assert_eq!(list.iter().collect::<Vec<_>>(), ["X", "X"]);
    }

    #[test]
    fn nth_is_one_based() {
        let list = TitleList::capped(["first", "second"], 5);
        assert_eq!(list.nth(0), None);
        assert_eq!(list.nth(1), Some("first"));
        assert_eq!(list.nth(2), Some("second"));
        assert_eq!(list.nth(3), None);
    }

    #[test]
    fn join_uses_pipe_separator() {
        let list = TitleList::capped(["a", "b", "c"], 5);
        assert_eq!(list.join(), "a | b | c");
        assert_eq!(TitleList::new().join(), "");
    }
}
