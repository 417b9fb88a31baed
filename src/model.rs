use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::domain::{Config, Message, MenagerieError, TableSpec};
use crate::form::{Form, FormAction, FormMode};
use crate::loader::{self, LoadOutcome};
use crate::record::{Column, Record};
use crate::table::TableController;

#[derive(Debug, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    FORM,
    POPUP,
}

/// One tab of the UI. `table` stays None until its fixture is loaded.
#[derive(Debug)]
pub struct TableSlot {
    pub spec: TableSpec,
    pub table: Option<TableController>,
    pub selected_row: usize,
    pub selected_column: usize,
}

impl TableSlot {
    fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            table: None,
            selected_row: 0,
            selected_column: 0,
        }
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.table
            .as_ref()
            .and_then(|t| t.records().get(self.selected_row))
    }

    pub fn selected_column(&self) -> Option<Column> {
        self.table
            .as_ref()
            .and_then(|t| t.columns().get(self.selected_column).copied())
    }

    fn clamp_selection(&mut self) {
        if let Some(table) = &self.table {
            let nrows = table.records().len();
            self.selected_row = self.selected_row.min(nrows.saturating_sub(1));
            let ncols = table.columns().len();
            self.selected_column = self.selected_column.min(ncols.saturating_sub(1));
        }
    }
}

pub struct Model {
    config: Config,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    slots: Vec<TableSlot>,
    active: usize,
    loads: Option<Receiver<LoadOutcome>>,
    form: Option<Form>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    /// Creates the model and starts loading all configured tables.
    pub fn init(config: &Config) -> Self {
        let loads = loader::spawn_loads(config);
        Self::with_loads(config, loads)
    }

    pub fn with_loads(config: &Config, loads: Receiver<LoadOutcome>) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::LOADING,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            slots: config.tables.iter().cloned().map(TableSlot::new).collect(),
            active: 0,
            loads: Some(loads),
            form: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.set_status_message("Loading ...");
        model
    }

    pub fn slots(&self) -> &[TableSlot] {
        &self.slots
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_slot(&self) -> Option<&TableSlot> {
        self.slots.get(self.active)
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.modus == Modus::POPUP
    }

    /// While the form is open every key goes to it unmapped.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::FORM
    }

    /// The last status message, None once it is older than the configured timeout.
    pub fn status_message(&self) -> Option<&str> {
        let timeout = Duration::from_secs(self.config.status_message_timeout);
        if self.last_status_message_update.elapsed() < timeout {
            Some(&self.status_message)
        } else {
            None
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        trace!("Status: {}", self.status_message);
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), MenagerieError> {
        self.receive_loads()?;

        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_selection(-1, 0),
                    Message::MoveDown => self.move_selection(1, 0),
                    Message::MoveLeft => self.move_selection(0, -1),
                    Message::MoveRight => self.move_selection(0, 1),
                    Message::MoveBeginning => self.move_selection(isize::MIN, 0),
                    Message::MoveEnd => self.move_selection(isize::MAX, 0),
                    Message::NextTable => self.switch_table(1),
                    Message::PreviousTable => self.switch_table(-1),
                    Message::Sort => self.sort_selected_column(),
                    Message::Add => self.open_add_form(),
                    Message::Edit => self.open_edit_form(),
                    Message::Delete => self.delete_selected_record(),
                    Message::Help => self.enter_modus(Modus::POPUP),
                    _ => (),
                },
                Modus::FORM => {
                    if let Message::RawKey(key) = msg {
                        self.form_input(key)
                    } else if msg == Message::Quit {
                        self.quit()
                    }
                }
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.exit(),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    fn receive_loads(&mut self) -> Result<(), MenagerieError> {
        let Some(loads) = &self.loads else {
            return Ok(());
        };

        let mut outcomes = Vec::new();
        let mut disconnected = false;
        loop {
            match loads.try_recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            self.loads = None;
        }

        for LoadOutcome { slot, result } in outcomes {
            let records = result?;
            if let Some(entry) = self.slots.get_mut(slot) {
                info!("Table \"{}\" ready with {} records", entry.spec.title, records.len());
                entry.table = Some(TableController::from_spec(&entry.spec, records));
                entry.clamp_selection();
            }
        }

        if self.status == Status::LOADING && self.slots.iter().all(|s| s.table.is_some()) {
            self.status = Status::READY;
            self.set_status_message("All tables loaded");
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn enter_modus(&mut self, modus: Modus) {
        self.previous_modus = self.modus;
        self.modus = modus;
        trace!("Modus {:?} -> {:?}", self.previous_modus, self.modus);
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::TABLE => {}
            Modus::FORM => {
                self.form = None;
                self.enter_modus(Modus::TABLE);
            }
            Modus::POPUP => {
                let back = self.previous_modus;
                self.enter_modus(back);
            }
        }
    }

    fn switch_table(&mut self, step: isize) {
        let n = self.slots.len() as isize;
        if n == 0 {
            return;
        }
        self.active = (self.active as isize + step).rem_euclid(n) as usize;
        debug!("Switched to table {}", self.active);
    }

    fn move_selection(&mut self, rows: isize, columns: isize) {
        let Some(slot) = self.slots.get_mut(self.active) else {
            return;
        };
        slot.selected_row = slot.selected_row.saturating_add_signed(rows);
        slot.selected_column = slot.selected_column.saturating_add_signed(columns);
        slot.clamp_selection();
    }

    fn sort_selected_column(&mut self) {
        let Some(slot) = self.slots.get_mut(self.active) else {
            return;
        };
        let Some(column) = slot.selected_column() else {
            return;
        };
        let Some(table) = slot.table.as_mut() else {
            return;
        };
        let message = match table.sort_by(column) {
            Some(order) => format!("Sorted by {} {}", column.title(), order.indicator()),
            None => format!("{} is not sortable", column.title()),
        };
        self.set_status_message(message);
    }

    fn delete_selected_record(&mut self) {
        let Some(slot) = self.slots.get_mut(self.active) else {
            return;
        };
        let Some(id) = slot.selected_record().map(|r| r.id) else {
            return;
        };
        let Some(table) = slot.table.as_mut() else {
            return;
        };
        let removed = table.delete(id);
        slot.clamp_selection();
        if let Some(record) = removed {
            self.set_status_message(format!("Deleted '{}'", record.name));
        }
    }

    fn open_add_form(&mut self) {
        if self.active_slot().is_some_and(|s| s.table.is_some()) {
            self.form = Some(Form::add());
            self.enter_modus(Modus::FORM);
        }
    }

    fn open_edit_form(&mut self) {
        let form = self
            .active_slot()
            .and_then(|s| s.selected_record())
            .map(Form::edit);
        if form.is_some() {
            self.form = form;
            self.enter_modus(Modus::FORM);
        }
    }

    fn form_input(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.handle_key(key) {
            FormAction::None => {}
            FormAction::Cancel => self.exit(),
            FormAction::Submit(input) => {
                let mode = form.mode();
                let Some(slot) = self.slots.get_mut(self.active) else {
                    return;
                };
                let Some(table) = slot.table.as_mut() else {
                    return;
                };
                let result = match mode {
                    FormMode::Add => table.add(&input).map(|id| ("Added", id)),
                    FormMode::Edit(id) => table.edit(id, &input).map(|_| ("Updated", id)),
                };
                match result {
                    Ok((verb, id)) => {
                        let name = table.find(id).map(|r| r.name.clone()).unwrap_or_default();
                        if mode == FormMode::Add {
                            // Follow the appended record
                            slot.selected_row = table.records().len().saturating_sub(1);
                        }
                        self.exit();
                        self.set_status_message(format!("{verb} '{name}'"));
                    }
                    Err(e) => {
                        debug!("Form rejected: {e}");
                        form.set_error(e);
                    }
                }
            }
        }
    }
}
