use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::trace;

use crate::inputter::Inputter;
use crate::record::{Record, RecordId};
use crate::table::{RecordInput, ValidationError};

pub const FIELD_LABELS: [&str; 4] = ["Name", "Size", "Location", "Image"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(RecordId),
}

/// What the model should do after a key was handled by the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    Submit(RecordInput),
    Cancel,
}

/// Popup form used by the add and edit flows.
#[derive(Debug, Clone)]
pub struct Form {
    mode: FormMode,
    fields: [Inputter; 4],
    focus: usize,
    error: Option<ValidationError>,
}

impl Form {
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            fields: Default::default(),
            focus: 0,
            error: None,
        }
    }

    pub fn edit(record: &Record) -> Self {
        let input = RecordInput::from_record(record);
        Self {
            mode: FormMode::Edit(record.id),
            fields: [
                Inputter::with_value(&input.name),
                Inputter::with_value(&input.size),
                Inputter::with_value(&input.location),
                Inputter::with_value(&input.image),
            ],
            focus: 0,
            error: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add => " Add Animal ",
            FormMode::Edit(_) => " Edit Animal ",
        }
    }

    pub fn fields(&self) -> &[Inputter] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn error(&self) -> Option<ValidationError> {
        self.error
    }

    pub fn set_error(&mut self, error: ValidationError) {
        self.error = Some(error);
    }

    pub fn input(&self) -> RecordInput {
        RecordInput {
            name: self.fields[0].value().to_string(),
            size: self.fields[1].value().to_string(),
            location: self.fields[2].value().to_string(),
            image: self.fields[3].value().to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Enter => return FormAction::Submit(self.input()),
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len()
            }
            _ => {
                if !self.fields[self.focus].read(key) {
                    trace!("Form ignored key {:?}", key.code);
                }
            }
        }
        FormAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            assert_eq!(form.handle_key(key(KeyCode::Char(c))), FormAction::None);
        }
    }

    #[test]
    fn fills_fields_in_order() {
        let mut form = Form::add();
        type_str(&mut form, "Puma");
        form.handle_key(key(KeyCode::Tab));
        type_str(&mut form, "60");
        form.handle_key(key(KeyCode::Down));
        type_str(&mut form, "Andes");

        let expected = RecordInput {
            name: "Puma".to_string(),
            size: "60".to_string(),
            location: "Andes".to_string(),
            image: String::new(),
        };
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit(expected));
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = Form::add();
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus(), 3);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus(), 0);
    }

    #[test]
    fn edit_is_prefilled() {
        let record = Record {
            id: 7,
            name: "Lion".to_string(),
            size: 190.0,
            location: "Africa".to_string(),
            image: Some("lion.jpg".to_string()),
        };
        let form = Form::edit(&record);
        assert_eq!(form.mode(), FormMode::Edit(7));
        assert_eq!(form.fields()[1].value(), "190");
        assert_eq!(form.fields()[3].value(), "lion.jpg");
        assert_eq!(form.title(), " Edit Animal ");
    }

    #[test]
    fn non_editing_keys_leave_fields_untouched() {
        let mut form = Form::add();
        type_str(&mut form, "Puma");
        assert_eq!(form.handle_key(key(KeyCode::F(2))), FormAction::None);
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(form.handle_key(ctrl_a), FormAction::None);
        assert_eq!(form.fields()[0].value(), "Puma");
        assert_eq!(form.focus(), 0);
    }

    #[test]
    fn escape_cancels() {
        let mut form = Form::add();
        type_str(&mut form, "x");
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }
}
