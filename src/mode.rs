use crate::domain::Key;

pub const PROMPT: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Command(CommandLine),
}

impl Mode {
    pub fn command() -> Self {
        Self::Command(CommandLine::new(PROMPT.chars().count()))
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command(_))
    }
}

/// Result of feeding one key to the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    Editing,
    Submitted(String),
    Cancelled,
}

/// Single-line editor. Offsets are screen columns: the buffer starts at
/// `left_limit` and ends at `right_limit`, with
/// `left_limit <= cursor <= right_limit` at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    buffer: String,
    cursor: usize,
    left_limit: usize,
    right_limit: usize,
}

impl CommandLine {
    pub fn new(left_limit: usize) -> Self {
        Self {
            buffer: String::new(),
            cursor: left_limit,
            left_limit,
            right_limit: left_limit,
        }
    }

    pub fn apply(&mut self, key: Key) -> LineEdit {
        match key {
            Key::Escape => return LineEdit::Cancelled,
            Key::Enter => {
                if self.buffer.is_empty() {
                    return LineEdit::Cancelled;
                }
                return LineEdit::Submitted(std::mem::take(&mut self.buffer));
            }
            Key::Backspace => {
                self.backspace();
            }
            Key::Left => {
                self.move_left();
            }
            Key::Right => {
                self.move_right();
            }
            Key::Char(ch) => self.insert(ch),
            Key::Up | Key::Down => {}
        }
        LineEdit::Editing
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, ch);
        self.cursor += 1;
        self.right_limit += 1;
    }

    pub fn backspace(&mut self) -> bool {
        if self.buffer.is_empty() || self.cursor == self.left_limit {
            return false;
        }
        let at = self.byte_index(self.cursor - 1);
        self.buffer.remove(at);
        self.cursor -= 1;
        self.right_limit -= 1;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == self.left_limit {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor == self.right_limit {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn left_limit(&self) -> usize {
        self.left_limit
    }

    #[cfg(test)]
    pub fn right_limit(&self) -> usize {
        self.right_limit
    }

    fn byte_index(&self, column: usize) -> usize {
        let chars = column - self.left_limit;
        self.buffer
            .char_indices()
            .nth(chars)
            .map_or(self.buffer.len(), |(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn typed(text: &str) -> CommandLine {
        let mut line = CommandLine::new(1);
        for ch in text.chars() {
            line.insert(ch);
        }
        line
    }

    fn assert_limits(line: &CommandLine) {
        assert!(line.left_limit() <= line.cursor());
        assert!(line.cursor() <= line.right_limit());
        assert_eq!(
            line.right_limit() - line.left_limit(),
            line.buffer().chars().count()
        );
    }

    #[test]
    fn insertion_happens_at_cursor() {
        let mut line = typed("cpy");
        line.move_left();
        line.move_left();
        line.insert('o');
        assert_eq!(line.buffer(), "copy");
        assert_eq!(line.cursor(), 3);
        assert_eq!(line.right_limit(), 5);
        assert_limits(&line);
    }

    #[test]
    fn backspace_removes_character_before_cursor() {
        let mut line = typed("goto");
        line.move_left();
        assert!(line.backspace());
        assert_eq!(line.buffer(), "goo");
        assert_eq!(line.cursor(), 3);
        assert_limits(&line);
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_no_op() {
        let mut line = CommandLine::new(1);
        assert!(!line.backspace());
        assert_eq!(line.cursor(), 1);
        assert_eq!(line.right_limit(), 1);
    }

    #[test]
    fn backspace_at_left_limit_is_a_no_op() {
        let mut line = typed("ab");
        line.move_left();
        line.move_left();
        assert!(!line.backspace());
        assert_eq!(line.buffer(), "ab");
    }

    #[test]
    fn arrows_stay_within_limits() {
        let mut line = typed("ab");
        assert!(!line.move_right());
        assert!(line.move_left());
        assert!(line.move_left());
        assert!(!line.move_left());
        assert_eq!(line.buffer(), "ab");
        assert_limits(&line);
    }

    #[test]
    fn multibyte_characters_are_edited_whole() {
        let mut line = typed("héllo");
        line.move_left();
        line.move_left();
        line.move_left();
        assert!(line.backspace());
        assert_eq!(line.buffer(), "hllo");
        line.insert('ë');
        assert_eq!(line.buffer(), "hëllo");
        assert_limits(&line);
    }

    #[test]
    fn enter_submits_and_escape_cancels() {
        let mut line = typed("search x");
        assert_eq!(
            line.apply(Key::Enter),
            LineEdit::Submitted("search x".to_string())
        );

        let mut line = typed("search x");
        assert_eq!(line.apply(Key::Escape), LineEdit::Cancelled);

        let mut line = CommandLine::new(1);
        assert_eq!(line.apply(Key::Enter), LineEdit::Cancelled);
    }

    #[test]
    fn vertical_arrows_do_not_edit() {
        let mut line = typed("ab");
        assert_eq!(line.apply(Key::Up), LineEdit::Editing);
        assert_eq!(line.apply(Key::Down), LineEdit::Editing);
        assert_eq!(line.buffer(), "ab");
    }
}
