use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use rusqlite::{types::ValueRef, Connection, OpenFlags};

use crate::{error::Error, title::TitleList};

const HISTORY_QUERY: &str = "SELECT title FROM urls ORDER BY last_visit_time DESC";
const HISTORY_FILENAME: &str = "History";
const NO_TITLE: &str = "(No Title)";

/// Most recently visited page titles of a local Chrome profile.
///
/// The browser keeps its history database locked, so every fetch copies it
/// into a private temporary directory first and queries the copy.
pub struct LocalHistory {
    source_path: Option<PathBuf>,
}

impl LocalHistory {
    /// Locate the history file from the profile selector on every fetch.
    pub fn new() -> Self {
        Self { source_path: None }
    }

    /// Always read from `path`, ignoring the profile selector.
    pub fn with_source_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(path.into()),
        }
    }

    pub fn source_path(&self, profile: &str) -> Result<PathBuf, Error> {
        match &self.source_path {
            Some(path) => Ok(path.clone()),
            None => default_history_path(profile)
                .ok_or_else(|| Error::ConfigError("cannot resolve home directory".into())),
        }
    }

    pub fn fetch(&self, profile: &str, limit: usize) -> Result<TitleList, Error> {
        let source = self.source_path(profile)?;
        if !source.is_file() {
            return Err(Error::HistoryNotFound(source));
        }

        // Snapshot the locked database.  The directory is removed on drop, after
        // the connection is closed.
        let snapshot_dir = tempfile::Builder::new()
            .prefix("searchbar-history")
            .tempdir()?;
        let snapshot = snapshot_dir.path().join(HISTORY_FILENAME);
        fs::copy(&source, &snapshot)?;
        log::debug!("copied history {:?} to {:?}", source, snapshot);

        read_titles(&snapshot, limit)
    }
}

/// Query a history database for distinct titles, most recent first.
pub fn read_titles(db_path: &Path, limit: usize) -> Result<TitleList, Error> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare(HISTORY_QUERY)?;
    let rows = stmt.query_map([], |row| row.get_ref(0).map(title_from_value))?;

    let mut row_error = None;
    let titles = TitleList::unique(
        rows.map_while(|row| row.map_err(|err| row_error = Some(err)).ok()),
        limit,
    );
    if let Some(err) = row_error {
        log::warn!("history query stopped after {} titles: {}", titles.len(), err);
    }
    Ok(titles)
}

fn title_from_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Text(text) if !text.is_empty() => String::from_utf8_lossy(text).into_owned(),
        _ => NO_TITLE.to_owned(),
    }
}

fn default_history_path(profile: &str) -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    let user_data = if cfg!(target_os = "windows") {
        dirs.data_local_dir()
            .join("Google")
            .join("Chrome")
            .join("User Data")
    } else if cfg!(target_os = "macos") {
        dirs.data_dir().join("Google").join("Chrome")
    } else {
        dirs.config_dir().join("google-chrome")
    };
    Some(user_data.join(profile).join(HISTORY_FILENAME))
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::HistoryError(Box::new(err))
    }
}
