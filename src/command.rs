use crate::domain::DirectoryEntry;
use crate::engine::{self, OpReport, WalkLimits};
use crate::error::{CommandError, FsError};
use crate::resolve::resolve;
use std::path::{Path, PathBuf};
use tracing::info;

/// Splits a command line on spaces. `\ ` puts a literal space into the
/// current token; runs of spaces never produce empty tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&' ') => {
                chars.next();
                current.push(' ');
            }
            ' ' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// A parsed command line. Path arguments are kept as typed and resolved
/// against the session only when the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Copy { sources: Vec<String>, dest: String },
    Move { sources: Vec<String>, dest: String },
    Rename { from: String, to: String },
    CreateFile { name: String, dir: String },
    CreateDir { name: String, dir: String },
    DeleteFile { path: String },
    DeleteDir { path: String },
    Goto { path: String },
    Search { term: String },
    Snapshot { source: String, dump: String },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = tokenize(line);
        if tokens.is_empty() {
            return Err(CommandError::Empty);
        }
        let name = tokens.remove(0);
        let args = tokens;

        match name.as_str() {
            "copy" | "move" => {
                let usage = usage_for(&name);
                let mut sources = args;
                if sources.len() < 2 {
                    return Err(CommandError::Usage(usage));
                }
                let dest = sources.pop().ok_or(CommandError::Usage(usage))?;
                Ok(if name == "copy" {
                    Self::Copy { sources, dest }
                } else {
                    Self::Move { sources, dest }
                })
            }
            "rename" => {
                let [from, to] = exact::<2>(args, "rename OLD NEW")?;
                Ok(Self::Rename { from, to })
            }
            "create_file" => {
                let [name, dir] = exact::<2>(args, "create_file NAME DIR")?;
                Ok(Self::CreateFile { name, dir })
            }
            "create_dir" => {
                let [name, dir] = exact::<2>(args, "create_dir NAME DIR")?;
                Ok(Self::CreateDir { name, dir })
            }
            "delete_file" => {
                let [path] = exact::<1>(args, "delete_file PATH")?;
                Ok(Self::DeleteFile { path })
            }
            "delete_dir" => {
                let [path] = exact::<1>(args, "delete_dir PATH")?;
                Ok(Self::DeleteDir { path })
            }
            "goto" => {
                let [path] = exact::<1>(args, "goto PATH")?;
                Ok(Self::Goto { path })
            }
            "search" => {
                let [term] = exact::<1>(args, "search TERM")?;
                Ok(Self::Search { term })
            }
            "snapshot" => {
                let [source, dump] = exact::<2>(args, "snapshot SRC DUMP")?;
                Ok(Self::Snapshot { source, dump })
            }
            _ => Err(CommandError::Unknown(name)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Move { .. } => "move",
            Self::Rename { .. } => "rename",
            Self::CreateFile { .. } => "create_file",
            Self::CreateDir { .. } => "create_dir",
            Self::DeleteFile { .. } => "delete_file",
            Self::DeleteDir { .. } => "delete_dir",
            Self::Goto { .. } => "goto",
            Self::Search { .. } => "search",
            Self::Snapshot { .. } => "snapshot",
        }
    }
}

fn usage_for(name: &str) -> &'static str {
    if name == "move" {
        "move SRC... DEST"
    } else {
        "copy SRC... DEST"
    }
}

fn exact<const N: usize>(
    args: Vec<String>,
    usage: &'static str,
) -> Result<[String; N], CommandError> {
    <[String; N]>::try_from(args).map_err(|_| CommandError::Usage(usage))
}

/// Session values a command needs, captured when it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub working_dir: PathBuf,
    pub root: PathBuf,
    pub limits: WalkLimits,
}

impl CommandContext {
    fn resolve(&self, expression: &str) -> PathBuf {
        resolve(expression, &self.working_dir, &self.root)
    }

    /// `NAME` resolved under the already-resolved `DIR`.
    fn resolve_under(&self, name: &str, dir: &str) -> PathBuf {
        resolve(name, &self.resolve(dir), &self.root)
    }
}

/// What the session should do with the display once a command finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Rescan,
    Navigate(PathBuf),
    ShowSearch {
        term: String,
        entries: Vec<DirectoryEntry>,
    },
    Nothing,
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub command: &'static str,
    pub effect: Effect,
    pub report: OpReport,
}

impl CommandOutcome {
    pub fn summary(&self) -> String {
        self.report.summary(self.command)
    }
}

/// Runs a command to completion. Blocking: tree walks finish before this returns.
pub fn execute(command: &Command, context: &CommandContext) -> CommandOutcome {
    info!(command = command.name(), working_dir = %context.working_dir.display(), "executing command");
    let limits = context.limits;
    let (effect, report) = match command {
        Command::Copy { sources, dest } => {
            let sources = resolve_all(context, sources);
            (Effect::Rescan, engine::copy(&sources, &context.resolve(dest), limits))
        }
        Command::Move { sources, dest } => {
            let sources = resolve_all(context, sources);
            (Effect::Rescan, engine::move_paths(&sources, &context.resolve(dest), limits))
        }
        Command::Rename { from, to } => (
            Effect::Rescan,
            engine::rename(&context.resolve(from), &context.resolve(to)),
        ),
        Command::CreateFile { name, dir } => (
            Effect::Rescan,
            engine::create_file(&context.resolve_under(name, dir)),
        ),
        Command::CreateDir { name, dir } => (
            Effect::Rescan,
            engine::create_dir(&context.resolve_under(name, dir)),
        ),
        Command::DeleteFile { path } => {
            (Effect::Rescan, engine::delete_file(&context.resolve(path)))
        }
        Command::DeleteDir { path } => (
            Effect::Rescan,
            engine::delete_tree(&context.resolve(path), limits),
        ),
        Command::Goto { path } => goto(&context.resolve(path)),
        Command::Search { term } => {
            let (entries, report) =
                engine::search(term, &context.working_dir, &context.root, limits);
            (
                Effect::ShowSearch {
                    term: term.clone(),
                    entries,
                },
                report,
            )
        }
        Command::Snapshot { source, dump } => (
            Effect::Nothing,
            engine::snapshot(&context.resolve(source), &context.resolve(dump), limits),
        ),
    };

    CommandOutcome {
        command: command.name(),
        effect,
        report,
    }
}

fn resolve_all(context: &CommandContext, expressions: &[String]) -> Vec<PathBuf> {
    expressions.iter().map(|e| context.resolve(e)).collect()
}

fn goto(target: &Path) -> (Effect, OpReport) {
    let mut report = OpReport::default();
    if target.is_dir() {
        report.done = 1;
        (Effect::Navigate(target.to_path_buf()), report)
    } else {
        report.fail(FsError::NotADirectory {
            path: target.to_path_buf(),
        });
        (Effect::Nothing, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Scratch;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn context(scratch: &Scratch) -> CommandContext {
        CommandContext {
            working_dir: scratch.path().to_path_buf(),
            root: scratch.path().to_path_buf(),
            limits: WalkLimits::default(),
        }
    }

    #[test]
    fn tokenizer_handles_escaped_and_repeated_spaces() {
        assert_eq!(
            tokenize("copy  my\\ file.txt   dest "),
            vec!["copy", "my file.txt", "dest"]
        );
        assert_eq!(tokenize("   "), Vec::<String>::new());
        assert_eq!(tokenize("a\\b"), vec!["a\\b"]);
        assert_eq!(tokenize("trailing\\ "), vec!["trailing "]);
    }

    #[test]
    fn copy_takes_many_sources_and_one_destination() {
        assert_eq!(
            Command::parse("copy a b c/d out").expect("parse"),
            Command::Copy {
                sources: vec!["a".into(), "b".into(), "c/d".into()],
                dest: "out".into(),
            }
        );
        assert_eq!(
            Command::parse("move only"),
            Err(CommandError::Usage("move SRC... DEST"))
        );
    }

    #[test]
    fn fixed_arity_is_enforced() {
        assert_eq!(
            Command::parse("rename a"),
            Err(CommandError::Usage("rename OLD NEW"))
        );
        assert_eq!(
            Command::parse("goto a b"),
            Err(CommandError::Usage("goto PATH"))
        );
        assert_eq!(
            Command::parse("snapshot . out.txt").expect("parse"),
            Command::Snapshot {
                source: ".".into(),
                dump: "out.txt".into(),
            }
        );
    }

    #[test]
    fn unknown_and_empty_lines_are_rejected() {
        assert_eq!(
            Command::parse("frobnicate x"),
            Err(CommandError::Unknown("frobnicate".into()))
        );
        assert_eq!(Command::parse("  "), Err(CommandError::Empty));
    }

    #[test]
    fn create_file_resolves_name_under_directory() {
        let scratch = Scratch::new("cmd_create");
        scratch.mkdir("docs");
        let ctx = context(&scratch);

        let outcome = execute(
            &Command::parse("create_file notes\\ v1.txt docs").expect("parse"),
            &ctx,
        );
        assert!(outcome.report.is_clean());
        assert_eq!(outcome.effect, Effect::Rescan);
        assert!(scratch.path().join("docs/notes v1.txt").is_file());
    }

    #[test]
    fn goto_navigates_only_into_directories() {
        let scratch = Scratch::new("cmd_goto");
        let sub = scratch.mkdir("sub");
        scratch.write("file.txt", "x");
        let ctx = context(&scratch);

        let outcome = execute(&Command::Goto { path: "sub".into() }, &ctx);
        assert_eq!(outcome.effect, Effect::Navigate(sub));

        let outcome = execute(&Command::Goto { path: "file.txt".into() }, &ctx);
        assert_eq!(outcome.effect, Effect::Nothing);
        assert!(outcome.summary().starts_with("goto: not a directory"));
    }

    #[test]
    fn paths_cannot_escape_root() {
        let scratch = Scratch::new("cmd_escape");
        let ctx = context(&scratch);
        let outcome = execute(&Command::Goto { path: "../../..".into() }, &ctx);
        assert_eq!(outcome.effect, Effect::Navigate(scratch.path().to_path_buf()));
    }

    #[test]
    fn search_produces_result_list() {
        let scratch = Scratch::new("cmd_search");
        scratch.write("a/target", "x");
        let ctx = context(&scratch);

        let outcome = execute(&Command::Search { term: "target".into() }, &ctx);
        match outcome.effect {
            Effect::ShowSearch { term, entries } => {
                assert_eq!(term, "target");
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].display_line, "~/a/target");
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn snapshot_writes_manifest_without_rescan() {
        let scratch = Scratch::new("cmd_snapshot");
        scratch.write("src/main.rs", "fn main() {}");
        let ctx = context(&scratch);

        let outcome = execute(&Command::parse("snapshot src manifest").expect("parse"), &ctx);
        assert_eq!(outcome.effect, Effect::Nothing);
        assert_eq!(
            fs::read_to_string(scratch.path().join("manifest")).expect("read"),
            ".:\nmain.rs\n\n"
        );
    }
}
