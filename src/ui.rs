use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::domain::{DisplayStyle, HELP_TEXT};
use crate::form::{FIELD_LABELS, Form};
use crate::model::{Model, TableSlot};
use crate::record::{Column, Record};
use crate::table::TableController;

const ACTIONS_WIDTH: u16 = 18;
const FORM_WIDTH: u16 = 60;
const HELP_WIDTH: u16 = 50;

/// Draws the model. Holds the scroll state of every table between frames.
#[derive(Debug, Default)]
pub struct TableUI {
    table_states: Vec<TableState>,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [tabs_area, table_area, detail_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.table_states
            .resize_with(model.slots().len(), TableState::default);

        Self::draw_tabs(model, frame, tabs_area);
        if let Some(slot) = model.active_slot() {
            let state = &mut self.table_states[model.active()];
            Self::draw_slot(slot, frame, table_area, state);
            Self::draw_detail(slot, frame, detail_area);
        }
        Self::draw_status(model, frame, status_area);

        if let Some(form) = model.form() {
            Self::draw_form(form, frame);
        } else if model.show_help() {
            Self::draw_help(frame);
        }
    }

    fn draw_tabs(model: &Model, frame: &mut Frame, area: Rect) {
        let titles = model.slots().iter().map(|slot| match &slot.table {
            Some(table) => format!(" {} ({}) ", table.title(), table.records().len()),
            None => format!(" {} (loading) ", slot.spec.title),
        });
        let tabs = Tabs::new(titles)
            .select(model.active())
            .highlight_style(Style::new().yellow().bold())
            .block(
                Block::bordered()
                    .title(Line::from(" menagerie ".bold()).centered())
                    .border_set(border::THICK),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_slot(slot: &TableSlot, frame: &mut Frame, area: Rect, state: &mut TableState) {
        let Some(table) = &slot.table else {
            let loading = Paragraph::new(format!("Loading {} ...", slot.spec.file.display()))
                .centered()
                .block(Block::bordered());
            frame.render_widget(loading, area);
            return;
        };

        state.select((!table.records().is_empty()).then_some(slot.selected_row));
        let widget = Self::build_table(table, slot.selected_column);
        frame.render_stateful_widget(widget, area, state);
    }

    fn build_table(table: &TableController, selected_column: usize) -> Table<'static> {
        let header_cells = table
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, &column)| {
                let mut title = column.title();
                if let Some(order) = table.sort_order(column) {
                    title = format!("{title} {}", order.indicator());
                }
                let mut style = Style::new().add_modifier(Modifier::BOLD);
                if idx == selected_column {
                    style = style.bg(Color::Blue);
                }
                Cell::from(title).style(style)
            })
            .chain(std::iter::once(Cell::from("Actions").bold()));
        let header = Row::new(header_cells).style(Style::new().bg(Color::DarkGray));

        let cell_style = display_style(table.style());
        let rows = table.records().iter().map(|record| {
            let cells = table
                .columns()
                .iter()
                .map(|&column| Self::record_cell(record, column, cell_style))
                .chain(std::iter::once(Cell::from("[e]dit [d]elete").dark_gray()));
            Row::new(cells)
        });

        let widths = table
            .columns()
            .iter()
            .map(|_| Constraint::Fill(1))
            .chain(std::iter::once(Constraint::Length(ACTIONS_WIDTH)));

        Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(format!(" {} ", table.title())))
            .row_highlight_style(Style::new().reversed())
            .highlight_symbol("> ")
    }

    fn record_cell(record: &Record, column: Column, style: Style) -> Cell<'static> {
        match column {
            // Preview cell: image marker and the animal's name
            Column::Image => {
                let marker = if record.image.is_some() { "▣" } else { "□" };
                Cell::from(Line::from(vec![
                    Span::raw(format!("{marker} ")).cyan(),
                    Span::raw(record.name.clone()),
                ]))
            }
            column if column.is_numeric() => {
                Cell::from(Line::from(record.cell_text(column)).right_aligned()).style(style)
            }
            column => Cell::from(record.cell_text(column)).style(style),
        }
    }

    fn draw_detail(slot: &TableSlot, frame: &mut Frame, area: Rect) {
        let line = match slot.selected_record() {
            Some(record) => Line::from(vec![
                Span::raw(format!(" {} ", record.name)).bold(),
                Span::raw("image: "),
                Span::raw(record.image.clone().unwrap_or_else(|| "none".to_string())).yellow(),
            ]),
            None => Line::from(" No animals"),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_status(model: &Model, frame: &mut Frame, area: Rect) {
        let line = match model.status_message() {
            Some(message) => Line::from(format!(" {message}")),
            None => Line::from(vec![
                " Sort ".into(),
                "<s>".blue().bold(),
                " Add ".into(),
                "<a>".blue().bold(),
                " Edit ".into(),
                "<e>".blue().bold(),
                " Delete ".into(),
                "<d>".blue().bold(),
                " Help ".into(),
                "<?>".blue().bold(),
                " Quit ".into(),
                "<q>".blue().bold(),
            ]),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_form(form: &Form, frame: &mut Frame) {
        let label_width = FIELD_LABELS.iter().map(|l| l.len()).max().unwrap_or(0) + 2;
        let mut lines: Vec<Line> = form
            .fields()
            .iter()
            .zip(FIELD_LABELS)
            .enumerate()
            .map(|(idx, (field, label))| {
                let label = format!("{label:<label_width$}");
                let value_style = if idx == form.focus() {
                    Style::new().underlined()
                } else {
                    Style::new()
                };
                Line::from(vec![
                    Span::raw(label).bold(),
                    Span::styled(field.value().to_string(), value_style),
                ])
            })
            .collect();
        lines.push(Line::default());
        match form.error() {
            Some(error) => lines.push(Line::from(error.to_string()).red().bold()),
            None => lines.push(Line::from("<Enter> save  <Esc> cancel").dark_gray()),
        }

        let height = lines.len() as u16 + 2;
        let area = centered_rect(frame.area(), FORM_WIDTH, height);
        let block = Block::bordered()
            .title(Line::from(form.title().bold()).centered())
            .border_set(border::ROUNDED);
        let inner = block.inner(area);

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);

        let field = &form.fields()[form.focus()];
        let x = inner.x + label_width as u16 + field.cursor() as u16;
        let y = inner.y + form.focus() as u16;
        frame.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), y));
    }

    fn draw_help(frame: &mut Frame) {
        let height = HELP_TEXT.lines().count() as u16 + 2;
        let area = centered_rect(frame.area(), HELP_WIDTH, height);
        let help = Paragraph::new(HELP_TEXT)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(Line::from(" Help ".bold()).centered()));
        frame.render_widget(Clear, area);
        frame.render_widget(help, area);
    }
}

fn display_style(style: Option<DisplayStyle>) -> Style {
    match style {
        Some(DisplayStyle::Bold) => Style::new().add_modifier(Modifier::BOLD),
        Some(DisplayStyle::ItalicBlue) => Style::new().add_modifier(Modifier::ITALIC).fg(Color::Blue),
        None => Style::new(),
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}
