use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::domain::{DisplayStyle, TableSpec};
use crate::record::{Column, Record, RecordId, SortOrder};

/// Raw field values as typed into the add/edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordInput {
    pub name: String,
    pub size: String,
    pub location: String,
    pub image: String,
}

impl RecordInput {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            size: record.size.to_string(),
            location: record.location.clone(),
            image: record.image.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingFields,
    InvalidSize,
    DuplicateName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationError::MissingFields => "All fields are required!",
            ValidationError::InvalidSize => "Size must be a valid positive number!",
            ValidationError::DuplicateName => "Duplicate animal name is not allowed!",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ValidationError {}

/// Trimmed and parsed form input that passed validation.
#[derive(Debug, Clone, PartialEq)]
struct ValidInput {
    name: String,
    size: f64,
    location: String,
    image: Option<String>,
}

/// One table: its records, visible columns, sort state and cell style.
#[derive(Debug)]
pub struct TableController {
    title: String,
    records: Vec<Record>,
    columns: Vec<Column>,
    sort_config: BTreeMap<Column, SortOrder>,
    style: Option<DisplayStyle>,
}

impl TableController {
    pub fn new(
        title: impl Into<String>,
        records: Vec<Record>,
        columns: Vec<Column>,
        sort_config: BTreeMap<Column, SortOrder>,
        style: Option<DisplayStyle>,
    ) -> Self {
        Self {
            title: title.into(),
            records,
            columns,
            sort_config,
            style,
        }
    }

    pub fn from_spec(spec: &TableSpec, records: Vec<Record>) -> Self {
        Self::new(
            spec.title.clone(),
            records,
            spec.columns.clone(),
            spec.sort.clone(),
            spec.style,
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn style(&self) -> Option<DisplayStyle> {
        self.style
    }

    /// Stored order of a sortable column, None if the column is not sortable.
    pub fn sort_order(&self, column: Column) -> Option<SortOrder> {
        self.sort_config.get(&column).copied()
    }

    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Sorts the records by a sortable column.
    ///
    /// The stored order is flipped first, the records are then sorted with
    /// the order that was stored before the flip. The header therefore shows
    /// the order the next sort on this column will apply. Returns the order
    /// that was applied, or None for a column without sort configuration.
    pub fn sort_by(&mut self, column: Column) -> Option<SortOrder> {
        let setting = self.sort_config.get_mut(&column)?;
        let applied = *setting;
        *setting = applied.flipped();

        self.records
            .sort_by(|a, b| applied.apply(a.compare(b, column)));
        debug!(
            "[{}] Sorted {} records by {column} {:?}, next {:?}",
            self.title,
            self.records.len(),
            applied,
            applied.flipped()
        );
        Some(applied)
    }

    /// Removes the record with the given id. Unknown ids are ignored.
    pub fn delete(&mut self, id: RecordId) -> Option<Record> {
        match self.records.iter().position(|r| r.id == id) {
            Some(idx) => {
                let removed = self.records.remove(idx);
                debug!("[{}] Deleted record {} \"{}\"", self.title, id, removed.name);
                Some(removed)
            }
            None => {
                warn!("[{}] Delete of unknown record {}", self.title, id);
                None
            }
        }
    }

    /// Validates the input and appends it as a new record with a fresh id.
    pub fn add(&mut self, input: &RecordInput) -> Result<RecordId, ValidationError> {
        let valid = self.validate(input, None)?;
        let id = self.next_id(now_millis());
        self.records.push(Record {
            id,
            name: valid.name,
            size: valid.size,
            location: valid.location,
            image: valid.image,
        });
        debug!("[{}] Added record {}", self.title, id);
        Ok(id)
    }

    /// Validates the input and updates the record in place.
    ///
    /// The record's own name does not count as a duplicate. An unknown id
    /// leaves the table untouched.
    pub fn edit(&mut self, id: RecordId, input: &RecordInput) -> Result<(), ValidationError> {
        let valid = self.validate(input, Some(id))?;
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.name = valid.name;
                record.size = valid.size;
                record.location = valid.location;
                record.image = valid.image;
                debug!("[{}] Updated record {}", self.title, id);
            }
            None => warn!("[{}] Edit of unknown record {}", self.title, id),
        }
        Ok(())
    }

    fn validate(
        &self,
        input: &RecordInput,
        editing: Option<RecordId>,
    ) -> Result<ValidInput, ValidationError> {
        let name = input.name.trim();
        let size = input.size.trim();
        let location = input.location.trim();
        let image = input.image.trim();
        trace!("Validate name: {name:?}, size: {size:?}, location: {location:?}");

        if name.is_empty() || size.is_empty() || location.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let size = match size.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => value,
            _ => return Err(ValidationError::InvalidSize),
        };

        let lowered = name.to_lowercase();
        let duplicate = self
            .records
            .iter()
            .filter(|r| Some(r.id) != editing)
            .any(|r| r.name.to_lowercase() == lowered);
        if duplicate {
            return Err(ValidationError::DuplicateName);
        }

        Ok(ValidInput {
            name: name.to_string(),
            size,
            location: location.to_string(),
            image: (!image.is_empty()).then(|| image.to_string()),
        })
    }

    /// Creation timestamp as id, bumped past the largest id in use if needed.
    ///
    /// When the largest id is `RecordId::MAX` the closest free id below `now`
    /// is used instead.
    fn next_id(&self, now: RecordId) -> RecordId {
        let max = match self.records.iter().map(|r| r.id).max() {
            Some(max) if max >= now => max,
            _ => return now,
        };
        if let Some(id) = max.checked_add(1) {
            return id;
        }
        let in_use: HashSet<RecordId> = self.records.iter().map(|r| r.id).collect();
        let id = (RecordId::MIN..=now)
            .rev()
            .find(|id| !in_use.contains(id))
            .unwrap_or(now);
        warn!("[{}] Id space exhausted above {}, using {}", self.title, max, id);
        id
    }
}

fn now_millis() -> RecordId {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as RecordId)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: RecordId, name: &str, size: f64) -> Record {
        Record {
            id,
            name: name.to_string(),
            size,
            location: "Savanna".to_string(),
            image: None,
        }
    }

    fn input(name: &str, size: &str, location: &str) -> RecordInput {
        RecordInput {
            name: name.to_string(),
            size: size.to_string(),
            location: location.to_string(),
            image: String::new(),
        }
    }

    fn big_cats() -> TableController {
        TableController::new(
            "Big Cats",
            vec![record(1, "Lion", 190.0), record(2, "Tiger", 90.0)],
            vec![Column::Image, Column::Name, Column::Size, Column::Location],
            BTreeMap::from([
                (Column::Name, SortOrder::Asc),
                (Column::Size, SortOrder::Asc),
            ]),
            None,
        )
    }

    fn names(table: &TableController) -> Vec<&str> {
        table.records().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sort_by_size_ascending_first() {
        let mut table = big_cats();
        assert_eq!(table.sort_by(Column::Size), Some(SortOrder::Asc));
        assert_eq!(names(&table), vec!["Tiger", "Lion"]);
        // Indicator now shows the flipped order
        assert_eq!(table.sort_order(Column::Size), Some(SortOrder::Desc));
    }

    #[test]
    fn second_sort_reverses_order() {
        let mut table = big_cats();
        table.sort_by(Column::Size);
        assert_eq!(table.sort_by(Column::Size), Some(SortOrder::Desc));
        assert_eq!(names(&table), vec!["Lion", "Tiger"]);
        assert_eq!(table.sort_order(Column::Size), Some(SortOrder::Asc));
    }

    #[test]
    fn numeric_sort_is_not_lexical() {
        let mut table = TableController::new(
            "Fish",
            vec![record(1, "Ten", 10.0), record(2, "Nine", 9.0), record(3, "Hundred", 100.0)],
            vec![Column::Name, Column::Size],
            BTreeMap::from([(Column::Size, SortOrder::Asc)]),
            None,
        );
        table.sort_by(Column::Size);
        assert_eq!(names(&table), vec!["Nine", "Ten", "Hundred"]);
    }

    #[test]
    fn equal_values_keep_relative_order() {
        let mut table = TableController::new(
            "Dogs",
            vec![
                record(1, "Rex", 30.0),
                record(2, "Ace", 30.0),
                record(3, "Bo", 10.0),
            ],
            vec![Column::Name, Column::Size],
            BTreeMap::from([(Column::Size, SortOrder::Asc)]),
            None,
        );
        table.sort_by(Column::Size);
        assert_eq!(names(&table), vec!["Bo", "Rex", "Ace"]);
        table.sort_by(Column::Size);
        assert_eq!(names(&table), vec!["Rex", "Ace", "Bo"]);
    }

    #[test]
    fn unsortable_column_is_ignored() {
        let mut table = big_cats();
        assert_eq!(table.sort_by(Column::Location), None);
        assert_eq!(names(&table), vec!["Lion", "Tiger"]);
        assert_eq!(table.sort_order(Column::Location), None);
    }

    #[test]
    fn text_sort_is_ordinal() {
        let mut table = big_cats();
        table.add(&input("cheetah", "50", "Africa")).unwrap();
        table.sort_by(Column::Name);
        assert_eq!(names(&table), vec!["Lion", "Tiger", "cheetah"]);
    }

    #[test]
    fn delete_removes_only_matching_record() {
        let mut table = big_cats();
        let removed = table.delete(1).unwrap();
        assert_eq!(removed.name, "Lion");
        assert_eq!(names(&table), vec!["Tiger"]);
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let mut table = big_cats();
        assert!(table.delete(42).is_none());
        assert_eq!(table.records().len(), 2);
    }

    #[test]
    fn add_appends_trimmed_record() {
        let mut table = big_cats();
        let mut new = input("  Jaguar ", " 96.5", " Amazon  ");
        new.image = " jaguar.jpg ".to_string();
        let id = table.add(&new).unwrap();

        assert_eq!(table.records().len(), 3);
        let added = table.find(id).unwrap();
        assert_eq!(added.name, "Jaguar");
        assert_eq!(added.size, 96.5);
        assert_eq!(added.location, "Amazon");
        assert_eq!(added.image.as_deref(), Some("jaguar.jpg"));
        assert_eq!(table.records().last().unwrap().id, id);
    }

    #[test]
    fn add_rejects_missing_fields() {
        let mut table = big_cats();
        assert_eq!(
            table.add(&input("", "5", "Zoo")),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            table.add(&input("Puma", "   ", "Zoo")),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(table.records().len(), 2);
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "All fields are required!"
        );
    }

    #[test]
    fn add_rejects_invalid_size() {
        let mut table = big_cats();
        for size in ["abc", "0", "-3", "inf", "NaN"] {
            assert_eq!(
                table.add(&input("Puma", size, "Zoo")),
                Err(ValidationError::InvalidSize),
                "size {size}"
            );
        }
        assert_eq!(
            ValidationError::InvalidSize.to_string(),
            "Size must be a valid positive number!"
        );
    }

    #[test]
    fn add_rejects_duplicate_name_case_insensitive() {
        let mut table = big_cats();
        assert_eq!(
            table.add(&input("Lion", "5", "Zoo")),
            Err(ValidationError::DuplicateName)
        );
        assert_eq!(
            table.add(&input("tIGER", "5", "Zoo")),
            Err(ValidationError::DuplicateName)
        );
        assert_eq!(table.records().len(), 2);
        assert_eq!(
            ValidationError::DuplicateName.to_string(),
            "Duplicate animal name is not allowed!"
        );
    }

    #[test]
    fn required_fields_checked_before_size() {
        let mut table = big_cats();
        assert_eq!(
            table.add(&input("Lion", "abc", "")),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            table.add(&input("Lion", "abc", "Zoo")),
            Err(ValidationError::InvalidSize)
        );
    }

    #[test]
    fn edit_may_keep_own_name() {
        let mut table = big_cats();
        table.edit(1, &input("LION", "200", "Kenya")).unwrap();
        let lion = table.find(1).unwrap();
        assert_eq!(lion.name, "LION");
        assert_eq!(lion.size, 200.0);
        assert_eq!(lion.location, "Kenya");
        assert_eq!(table.records().len(), 2);
    }

    #[test]
    fn edit_rejects_other_records_name() {
        let mut table = big_cats();
        assert_eq!(
            table.edit(1, &input("tiger", "200", "Kenya")),
            Err(ValidationError::DuplicateName)
        );
        assert_eq!(table.find(1).unwrap().name, "Lion");
    }

    #[test]
    fn edit_clears_image() {
        let mut table = big_cats();
        let mut with_image = RecordInput::from_record(table.find(2).unwrap());
        with_image.image = "tiger.png".to_string();
        table.edit(2, &with_image).unwrap();
        assert_eq!(table.find(2).unwrap().image.as_deref(), Some("tiger.png"));

        with_image.image = "  ".to_string();
        table.edit(2, &with_image).unwrap();
        assert_eq!(table.find(2).unwrap().image, None);
    }

    #[test]
    fn form_input_round_trips_record() {
        let table = big_cats();
        let lion = table.find(1).unwrap();
        let input = RecordInput::from_record(lion);
        assert_eq!(input.size, "190");
        assert_eq!(input.image, "");
    }

    #[test]
    fn new_ids_are_unique() {
        let mut table = big_cats();
        assert_eq!(table.next_id(1_000), 1_000);
        table.add(&input("Puma", "60", "Andes")).unwrap();
        table.add(&input("Lynx", "20", "Alps")).unwrap();
        let mut ids: Vec<RecordId> = table.records().iter().map(|r| r.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        let max = *ids.iter().max().unwrap();
        assert_eq!(table.next_id(max), max + 1);
    }

    #[test]
    fn new_id_below_largest_possible_id() {
        let mut table = big_cats();
        table.records.push(record(RecordId::MAX, "Ghost", 1.0));
        table.records.push(record(1_000, "Ocelot", 12.0));
        assert_eq!(table.next_id(1_000), 999);
        assert_eq!(table.next_id(5), 5);

        let id = table.add(&input("Puma", "5", "Zoo")).unwrap();
        assert_ne!(id, RecordId::MAX);
        let ids: HashSet<RecordId> = table.records().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), table.records().len());
        assert_eq!(table.find(id).unwrap().name, "Puma");
    }
}
