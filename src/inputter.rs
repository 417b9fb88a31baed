use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Single line text editor backing one form field.
#[derive(Debug, Default, Clone)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize, // In chars, not bytes
}

impl Inputter {
    pub fn with_value(value: &str) -> Self {
        let mut inputter = Self::default();
        inputter.set(value);
        inputter
    }

    /// Applies an editing key. Returns false if the key is not an editing key.
    pub fn read(&mut self, key: event::KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.char_count(),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(c),
            _ => return false,
        }
        true
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor_pos = self.char_count();
    }

    pub fn value(&self) -> &str {
        &self.current_input
    }

    pub fn cursor(&self) -> usize {
        self.cursor_pos
    }

    fn insert(&mut self, chr: char) {
        let at = self.byte_pos(self.cursor_pos);
        self.current_input.insert(at, chr);
        self.cursor_pos += 1;
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos(self.cursor_pos);
            self.current_input.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.char_count() {
            let at = self.byte_pos(self.cursor_pos);
            self.current_input.remove(at);
        }
    }

    fn left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    fn right(&mut self) {
        if self.cursor_pos < self.char_count() {
            self.cursor_pos += 1;
        }
    }

    fn char_count(&self) -> usize {
        self.current_input.chars().count()
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
