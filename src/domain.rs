use std::collections::BTreeMap;
use std::fmt;
use std::io::Error;
use std::path::{Path, PathBuf};

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use serde::Deserialize;

use crate::record::{Column, SortOrder};

#[derive(Debug)]
pub enum MenagerieError {
    IoError(Error),
    JsonError(serde_json::Error),
    LoadingFailed(PathBuf, Box<MenagerieError>),
    InvalidLayout(String),
    InvalidPath(String),
}

impl fmt::Display for MenagerieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenagerieError::IoError(e) => write!(f, "io error: {e}"),
            MenagerieError::JsonError(e) => write!(f, "json error: {e}"),
            MenagerieError::LoadingFailed(path, e) => {
                write!(f, "failed to load {}: {e}", path.display())
            }
            MenagerieError::InvalidLayout(reason) => write!(f, "invalid layout: {reason}"),
            MenagerieError::InvalidPath(reason) => write!(f, "invalid path: {reason}"),
        }
    }
}

impl std::error::Error for MenagerieError {}

impl From<Error> for MenagerieError {
    fn from(err: Error) -> Self {
        MenagerieError::IoError(err)
    }
}

impl From<serde_json::Error> for MenagerieError {
    fn from(err: serde_json::Error) -> Self {
        MenagerieError::JsonError(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    NextTable,
    PreviousTable,
    Sort,
    Add,
    Edit,
    Delete,
    Help,
    Exit,
    RawKey(KeyEvent),
}

/// Extra style applied to the non-image cells of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStyle {
    Bold,
    ItalicBlue,
}

/// Describes one table: where its records come from and how it is shown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableSpec {
    pub title: String,
    pub file: PathBuf,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub sort: BTreeMap<Column, SortOrder>,
    #[serde(default)]
    pub style: Option<DisplayStyle>,
}

impl TableSpec {
    pub fn defaults() -> Vec<TableSpec> {
        let columns = vec![Column::Image, Column::Name, Column::Size, Column::Location];
        vec![
            TableSpec {
                title: "Big Cats".to_string(),
                file: "bigCats.json".into(),
                columns: columns.clone(),
                sort: BTreeMap::from([
                    (Column::Name, SortOrder::Asc),
                    (Column::Size, SortOrder::Asc),
                    (Column::Location, SortOrder::Asc),
                ]),
                style: None,
            },
            TableSpec {
                title: "Dogs".to_string(),
                file: "dogs.json".into(),
                columns: columns.clone(),
                sort: BTreeMap::from([
                    (Column::Name, SortOrder::Asc),
                    (Column::Location, SortOrder::Asc),
                ]),
                style: Some(DisplayStyle::Bold),
            },
            TableSpec {
                title: "Big Fish".to_string(),
                file: "bigFish.json".into(),
                columns,
                sort: BTreeMap::from([(Column::Size, SortOrder::Asc)]),
                style: Some(DisplayStyle::ItalicBlue),
            },
        ]
    }

    /// Reads a JSON array of table specs, used to replace the built-in tables.
    pub fn load_layout(path: &Path) -> Result<Vec<TableSpec>, MenagerieError> {
        let contents = std::fs::read_to_string(path)?;
        let specs: Vec<TableSpec> = serde_json::from_str(&contents)?;
        if specs.is_empty() {
            return Err(MenagerieError::InvalidLayout(format!(
                "{} does not define any table",
                path.display()
            )));
        }
        for spec in specs.iter() {
            if spec.columns.is_empty() {
                return Err(MenagerieError::InvalidLayout(format!(
                    "table \"{}\" has no columns",
                    spec.title
                )));
            }
        }
        Ok(specs)
    }
}

#[derive(Debug, Clone, Setters)]
pub struct Config {
    pub event_poll_time: u64,
    pub status_message_timeout: u64,
    pub data_dir: PathBuf,
    pub tables: Vec<TableSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            status_message_timeout: 5,
            data_dir: PathBuf::from("data"),
            tables: TableSpec::defaults(),
        }
    }
}

impl Config {
    pub fn fixture_path(&self, spec: &TableSpec) -> PathBuf {
        self.data_dir.join(&spec.file)
    }
}

pub const HELP_TEXT: &str = "\
Tables
  Tab / Shift-Tab    next / previous table
  Up, k / Down, j    select row
  Left, h / Right, l select column
  g / G              first / last row
  s                  sort by selected column
  a                  add animal
  e, Enter           edit selected animal
  d                  delete selected animal
  ?                  this help
  q                  quit

Form
  Tab / Down         next field
  Shift-Tab / Up     previous field
  Enter              save
  Esc                cancel";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_tables_match_layout() {
        let specs = TableSpec::defaults();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].sort.len(), 3);
        assert!(!specs[1].sort.contains_key(&Column::Size));
        assert_eq!(specs[2].style, Some(DisplayStyle::ItalicBlue));
        assert!(specs.iter().all(|s| s.columns[0] == Column::Image));
    }

    #[test]
    fn loads_layout_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Birds", "file": "birds.json", "columns": ["name", "size"],
                "sort": {{"size": "desc"}}, "style": "bold"}}]"#
        )
        .unwrap();
        let specs = TableSpec::load_layout(file.path()).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].columns, vec![Column::Name, Column::Size]);
        assert_eq!(specs[0].sort.get(&Column::Size), Some(&SortOrder::Desc));
        assert_eq!(specs[0].style, Some(DisplayStyle::Bold));
    }

    #[test]
    fn rejects_empty_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let err = TableSpec::load_layout(file.path()).unwrap_err();
        assert!(matches!(err, MenagerieError::InvalidLayout(_)));
    }

    #[test]
    fn fixture_paths_are_relative_to_data_dir() {
        let config = Config::default().data_dir(PathBuf::from("/tmp/zoo"));
        let path = config.fixture_path(&config.tables[1]);
        assert_eq!(path, PathBuf::from("/tmp/zoo/dogs.json"));
    }
}
