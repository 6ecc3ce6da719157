use std::fmt;
use std::path::{Path, PathBuf};

/// Logical key events produced by the terminal adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub display_line: String,
    pub path: PathBuf,
    /// Whether `path` was a directory (following symlinks) when listed.
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    Directory(PathBuf),
    Search { term: String },
}

/// The entries backing the display. Always replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentList {
    source: ListSource,
    entries: Vec<DirectoryEntry>,
}

impl ContentList {
    pub fn directory(dir: PathBuf, entries: Vec<DirectoryEntry>) -> Self {
        Self {
            source: ListSource::Directory(dir),
            entries,
        }
    }

    pub fn search(term: String, entries: Vec<DirectoryEntry>) -> Self {
        Self {
            source: ListSource::Search { term },
            entries,
        }
    }

    pub fn empty(dir: &Path) -> Self {
        Self::directory(dir.to_path_buf(), Vec::new())
    }

    pub fn is_search(&self) -> bool {
        matches!(self.source, ListSource::Search { .. })
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn title(&self) -> String {
        match &self.source {
            ListSource::Directory(dir) => dir.display().to_string(),
            ListSource::Search { term } => {
                format!("search \"{term}\": {} result(s)", self.entries.len())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub severity: Severity,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => f.write_str(&self.text),
            Severity::Error => write!(f, "error: {}", self.text),
        }
    }
}
