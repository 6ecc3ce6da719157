use crate::command::{Command, CommandContext, CommandOutcome, Effect};
use crate::config::AppConfig;
use crate::domain::{ContentList, DirectoryEntry, StatusLine};
use crate::history::Navigator;
use crate::listing;
use crate::mode::{CommandLine, Mode};
use crate::viewport::Viewport;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAX_LOG_LINES: usize = 500;

/// Header row plus status/command row.
const CHROME_ROWS: u16 = 2;

#[derive(Debug, Clone)]
pub enum BackendTask {
    Run {
        command: Command,
        context: CommandContext,
    },
}

#[derive(Debug)]
pub enum BackendEvent {
    Finished(CommandOutcome),
    Error { context: String, message: String },
}

/// The whole browsing session. Only the main loop mutates it.
pub struct App {
    pub config: AppConfig,
    nav: Navigator,
    content: ContentList,
    viewport: Viewport,
    pub mode: Mode,
    pub logs: Vec<String>,
    pub status: Option<StatusLine>,
    pub busy: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig, root: PathBuf, terminal_rows: u16) -> Self {
        let nav = Navigator::new(root);
        let viewport = Viewport::new(0, list_rows(&config, terminal_rows), config.margins());
        let mut app = Self {
            content: ContentList::empty(nav.root()),
            nav,
            viewport,
            config,
            mode: Mode::Normal,
            logs: Vec::new(),
            status: None,
            busy: false,
            should_quit: false,
        };
        app.refresh();
        app
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn working_dir(&self) -> &Path {
        self.nav.working_dir()
    }

    pub fn content(&self) -> &ContentList {
        &self.content
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Entries inside the viewport window, top row first.
    pub fn visible_entries(&self) -> &[DirectoryEntry] {
        &self.content.entries()[self.viewport.window()]
    }

    pub fn selected_entry(&self) -> Option<&DirectoryEntry> {
        self.content.get(self.viewport.selection())
    }

    pub fn resize(&mut self, terminal_rows: u16) {
        self.viewport.resize(list_rows(&self.config, terminal_rows));
    }

    /// Rescans the working directory. On failure the current list stays.
    pub fn refresh(&mut self) -> bool {
        match listing::scan(self.working_dir()) {
            Ok(list) => {
                self.set_content(list);
                true
            }
            Err(err) => {
                self.report_error(err.to_string());
                false
            }
        }
    }

    fn set_content(&mut self, list: ContentList) {
        self.viewport.reset(list.len());
        self.content = list;
    }

    /// Applies a history step and rescans. If the new directory cannot be
    /// listed the history step is undone.
    fn navigate_with(&mut self, step: impl FnOnce(&mut Navigator) -> bool) -> bool {
        let saved = self.nav.clone();
        if !step(&mut self.nav) {
            return false;
        }
        match listing::scan(self.working_dir()) {
            Ok(list) => {
                self.set_content(list);
                true
            }
            Err(err) => {
                self.nav = saved;
                self.report_error(err.to_string());
                false
            }
        }
    }

    pub fn move_up(&mut self) -> bool {
        self.viewport.move_up()
    }

    pub fn move_down(&mut self) -> bool {
        self.viewport.move_down()
    }

    pub fn open_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };

        if self.content.is_search() {
            let target = if entry.is_dir {
                entry.path
            } else {
                entry
                    .path
                    .parent()
                    .map_or_else(|| self.nav.root().to_path_buf(), Path::to_path_buf)
            };
            self.navigate_with(|nav| {
                nav.navigate_to(target);
                true
            });
            return;
        }

        match entry.name.as_str() {
            "." => {}
            ".." => self.go_up(),
            _ if entry.is_dir => {
                self.navigate_with(|nav| {
                    nav.navigate_to(entry.path);
                    true
                });
            }
            name => self.report_info(format!("{name} is not a directory")),
        }
    }

    /// Leaves search results if they are showing, otherwise steps back.
    pub fn go_back(&mut self) {
        if self.content.is_search() {
            self.refresh();
            return;
        }
        self.navigate_with(Navigator::go_back);
    }

    pub fn go_forward(&mut self) {
        self.navigate_with(Navigator::go_forward);
    }

    pub fn go_home(&mut self) {
        self.navigate_with(|nav| {
            nav.go_home();
            true
        });
    }

    pub fn go_up(&mut self) {
        self.navigate_with(Navigator::go_up);
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::command();
    }

    pub fn leave_command_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn command_line(&self) -> Option<&CommandLine> {
        match &self.mode {
            Mode::Command(line) => Some(line),
            Mode::Normal => None,
        }
    }

    pub fn command_context(&self) -> CommandContext {
        CommandContext {
            working_dir: self.working_dir().to_path_buf(),
            root: self.nav.root().to_path_buf(),
            limits: self.config.limits(),
        }
    }

    pub fn apply_outcome(&mut self, outcome: CommandOutcome) {
        let summary = outcome.summary();
        for failure in &outcome.report.failures {
            self.log(format!("{}: {failure}", outcome.command));
        }
        if let Some(err) = &outcome.report.aborted {
            self.log(format!("{}: {err}", outcome.command));
        }
        self.status = Some(if outcome.report.is_clean() {
            StatusLine::info(summary)
        } else {
            StatusLine::error(summary)
        });

        match outcome.effect {
            Effect::Rescan => {
                self.refresh();
            }
            Effect::Navigate(path) => {
                self.navigate_with(|nav| {
                    nav.navigate_to(path);
                    true
                });
            }
            Effect::ShowSearch { term, entries } => self.show_search_results(term, entries),
            Effect::Nothing => {}
        }
    }

    pub fn show_search_results(&mut self, term: String, entries: Vec<DirectoryEntry>) {
        debug!(term = %term, results = entries.len(), "showing search results");
        self.nav.clear_forward();
        self.set_content(ContentList::search(term, entries));
    }

    pub fn log(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOG_LINES {
            let to_trim = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..to_trim);
        }
    }

    pub fn report_info(&mut self, text: String) {
        self.log(text.clone());
        self.status = Some(StatusLine::info(text));
    }

    pub fn report_error(&mut self, text: String) {
        self.log(format!("error: {text}"));
        self.status = Some(StatusLine::error(text));
    }
}

fn list_rows(config: &AppConfig, terminal_rows: u16) -> usize {
    usize::from(
        terminal_rows
            .saturating_sub(CHROME_ROWS)
            .saturating_sub(config.log_rows)
            .max(1),
    )
}
