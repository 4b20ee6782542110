use zeroize::Zeroize;

/// How typed characters are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    #[default]
    Normal,
    Password,
}

const MASK_CHAR: char = '•';

/// Single-line text input with char-based cursor tracking.
#[derive(Debug, Default)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
    placeholder: String,
    char_limit: Option<usize>,
    echo_mode: EchoMode,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe the buffer and apply a fresh configuration.
    pub fn configure(&mut self, placeholder: &str, char_limit: Option<usize>, echo_mode: EchoMode) {
        self.clear();
        self.placeholder = placeholder.to_string();
        self.char_limit = char_limit;
        self.echo_mode = echo_mode;
    }

    pub fn insert(&mut self, c: char) {
        if let Some(limit) = self.char_limit {
            if self.buffer.chars().count() >= limit {
                return;
            }
        }
        let byte_pos = self.byte_offset();
        self.buffer.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = self.byte_offset();
            self.buffer.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let byte_pos = self.byte_offset();
        if byte_pos < self.buffer.len() {
            self.buffer.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.buffer.chars().count();
        if self.cursor < char_count {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    /// Empty the buffer, zeroing the old contents.
    pub fn clear(&mut self) {
        self.buffer.zeroize();
        self.cursor = 0;
    }

    pub fn set(&mut self, value: &str) {
        self.clear();
        self.buffer.push_str(value);
        self.cursor = value.chars().count();
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn char_limit(&self) -> Option<usize> {
        self.char_limit
    }

    pub fn echo_mode(&self) -> EchoMode {
        self.echo_mode
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Value as shown on screen: masked in password mode.
    pub fn display_value(&self) -> String {
        match self.echo_mode {
            EchoMode::Normal => self.buffer.clone(),
            EchoMode::Password => MASK_CHAR.to_string().repeat(self.buffer.chars().count()),
        }
    }

    /// One-line rendering with a block cursor, or the placeholder when empty.
    pub fn render(&self) -> String {
        if self.buffer.is_empty() {
            let cursor = if self.focused { "█" } else { "" };
            return format!("› {cursor}{}", self.placeholder);
        }

        let shown: Vec<char> = self.display_value().chars().collect();
        let cursor = self.cursor.min(shown.len());
        let before: String = shown[..cursor].iter().collect();
        let after: String = shown[cursor..].iter().collect();
        if self.focused {
            format!("› {before}█{after}")
        } else {
            format!("› {before}{after}")
        }
    }

    /// Convert char-based cursor position to byte offset.
    fn byte_offset(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }
}

impl Drop for TextInput {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}
