use std::ops::Range;

/// Rows kept between the selection and the window edges before scrolling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMargins {
    pub top: usize,
    pub bottom: usize,
}

/// Windows a content list of `len` entries onto `visible_rows` display rows.
///
/// `selection == start + screen_row` holds after every transition, so the
/// selection always lies in `[start, start + visible_rows)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    start: usize,
    selection: usize,
    screen_row: usize,
    visible_rows: usize,
    len: usize,
    margins: ScrollMargins,
}

impl Viewport {
    pub fn new(len: usize, visible_rows: usize, margins: ScrollMargins) -> Self {
        Self {
            start: 0,
            selection: 0,
            screen_row: 0,
            visible_rows: visible_rows.max(1),
            len,
            margins,
        }
    }

    /// Rebuilds the cursors for a freshly scanned list.
    pub fn reset(&mut self, len: usize) {
        self.start = 0;
        self.selection = 0;
        self.screen_row = 0;
        self.len = len;
    }

    pub fn move_down(&mut self) -> bool {
        if self.selection + 1 >= self.len {
            return false;
        }

        self.selection += 1;
        if self.screen_row + 1 > self.bottom_row() {
            self.start += 1;
        } else {
            self.screen_row += 1;
        }
        true
    }

    pub fn move_up(&mut self) -> bool {
        if self.selection == 0 || self.len == 0 {
            return false;
        }

        self.selection -= 1;
        if self.screen_row <= self.top_row() && self.start > 0 {
            self.start -= 1;
        } else {
            self.screen_row -= 1;
        }
        true
    }

    /// Applies a new row count. The selection stays put; if it sits below the
    /// middle of the new window it is re-centred there.
    pub fn resize(&mut self, visible_rows: usize) {
        self.visible_rows = visible_rows.max(1);
        let half = self.visible_rows / 2;
        if self.screen_row > half {
            self.start = self.selection - half;
            self.screen_row = half;
        }
    }

    /// Index range of the entries currently on screen.
    pub fn window(&self) -> Range<usize> {
        let end = (self.start + self.visible_rows).min(self.len);
        self.start.min(end)..end
    }

    #[cfg(test)]
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn screen_row(&self) -> usize {
        self.screen_row
    }

    #[cfg(test)]
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    fn margin_cap(&self) -> usize {
        self.visible_rows.saturating_sub(1) / 2
    }

    fn top_row(&self) -> usize {
        self.margins.top.min(self.margin_cap())
    }

    fn bottom_row(&self) -> usize {
        self.visible_rows - 1 - self.margins.bottom.min(self.margin_cap())
    }
}
