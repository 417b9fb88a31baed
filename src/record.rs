use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer};

pub type RecordId = i64;

/// One animal entry as loaded from a fixture or created through the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub size: f64,
    pub location: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub image: Option<String>,
}

impl Record {
    /// Text shown in a table cell for the given column.
    pub fn cell_text(&self, column: Column) -> String {
        match column {
            Column::Id => self.id.to_string(),
            Column::Name => self.name.clone(),
            Column::Size => self.size.to_string(),
            Column::Location => self.location.clone(),
            Column::Image => self.image.clone().unwrap_or_default(),
        }
    }

    /// Ascending comparison of two records on a column.
    ///
    /// Numeric columns compare by value, so 9 sorts before 10. Values that do
    /// not compare (NaN sizes) are treated as equal. Text columns compare
    /// ordinally, a missing image counts as the empty string.
    pub fn compare(&self, other: &Record, column: Column) -> Ordering {
        match column {
            Column::Id => self.id.cmp(&other.id),
            Column::Size => self.size.partial_cmp(&other.size).unwrap_or(Ordering::Equal),
            Column::Name => self.name.cmp(&other.name),
            Column::Location => self.location.cmp(&other.location),
            Column::Image => self
                .image
                .as_deref()
                .unwrap_or("")
                .cmp(other.image.as_deref().unwrap_or("")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Number(f64),
    Text(String),
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawSize::deserialize(deserializer)? {
        RawSize::Number(n) => Ok(n),
        RawSize::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            Ok(_) => Err(serde::de::Error::custom(format!("invalid size \"{s}\": not finite"))),
            Err(e) => Err(serde::de::Error::custom(format!("invalid size \"{s}\": {e}"))),
        },
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Id,
    Name,
    Size,
    Location,
    Image,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Size => "size",
            Column::Location => "location",
            Column::Image => "image",
        }
    }

    /// Column name with the first letter upper-cased, as used in headers.
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Id | Column::Size)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}
