use crate::domain::DirectoryEntry;
use crate::error::FsError;
use crate::listing::is_hidden;
use std::fs::{self, DirBuilder, File, Metadata, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::os::unix::fs::{DirBuilderExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_MAX_OPEN_DIRS: usize = 100;

const NEW_FILE_MODE: u32 = 0o664;
const NEW_DIR_MODE: u32 = 0o775;

/// Ceiling on directory handles a single walk may hold open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    pub max_open_dirs: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_open_dirs: DEFAULT_MAX_OPEN_DIRS,
        }
    }
}

impl WalkLimits {
    fn walker(&self, root: &Path) -> WalkDir {
        WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .max_open(self.max_open_dirs.max(1))
    }

    /// A walk holds one handle per ancestor of the entry it is visiting.
    pub fn check(&self, entry: &DirEntry) -> Result<(), FsError> {
        if entry.depth() > self.max_open_dirs {
            return Err(FsError::DescriptorLimit {
                path: entry.path().to_path_buf(),
                limit: self.max_open_dirs,
            });
        }
        Ok(())
    }
}

/// Outcome of one engine operation. Individual failures never stop a walk;
/// only `aborted` does.
#[derive(Debug, Default)]
pub struct OpReport {
    pub done: usize,
    pub failures: Vec<FsError>,
    pub aborted: Option<FsError>,
}

impl OpReport {
    pub fn record(&mut self, result: Result<(), FsError>) {
        match result {
            Ok(()) => self.done += 1,
            Err(err) => self.fail(err),
        }
    }

    pub fn fail(&mut self, err: FsError) {
        warn!(error = %err, "filesystem step failed");
        self.failures.push(err);
    }

    pub fn abort(&mut self, err: FsError) {
        warn!(error = %err, "walk aborted");
        self.aborted = Some(err);
    }

    pub fn merge(&mut self, other: OpReport) {
        self.done += other.done;
        self.failures.extend(other.failures);
        if self.aborted.is_none() {
            self.aborted = other.aborted;
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    pub fn summary(&self, op: &str) -> String {
        if let Some(err) = &self.aborted {
            return format!("{op} aborted: {err}");
        }
        match self.failures.as_slice() {
            [] => format!("{op}: {} done", self.done),
            [only] => format!("{op}: {only}"),
            [first, rest @ ..] => format!(
                "{op}: {} done, {} failed (first: {first})",
                self.done,
                rest.len() + 1
            ),
        }
    }
}

/// Maps paths under a copied directory onto the destination by replacing
/// the source's parent prefix with `dest`.
struct CopyContext<'a> {
    source_parent: &'a Path,
    dest: &'a Path,
}

impl CopyContext<'_> {
    fn destination_for(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(self.source_parent) {
            Ok(relative) => self.dest.join(relative),
            Err(_) => self.dest.join(path.file_name().unwrap_or(path.as_os_str())),
        }
    }
}

pub fn copy(sources: &[PathBuf], dest: &Path, limits: WalkLimits) -> OpReport {
    let mut report = OpReport::default();
    for source in sources {
        copy_source(source, dest, limits, &mut report);
        if report.aborted.is_some() {
            break;
        }
    }
    info!(dest = %dest.display(), done = report.done, failed = report.failures.len(), "copy finished");
    report
}

/// Copies every source, then deletes each source whose copy was attempted,
/// whether or not every step of that copy succeeded.
pub fn move_paths(sources: &[PathBuf], dest: &Path, limits: WalkLimits) -> OpReport {
    let mut report = OpReport::default();
    let mut copied = Vec::with_capacity(sources.len());
    for source in sources {
        if copy_source(source, dest, limits, &mut report) {
            copied.push(source);
        }
        if report.aborted.is_some() {
            return report;
        }
    }

    for source in copied {
        let removal = match fs::symlink_metadata(source) {
            Ok(metadata) if metadata.is_dir() => delete_tree(source, limits),
            _ => delete_file(source),
        };
        report.merge(removal);
        if report.aborted.is_some() {
            break;
        }
    }
    report
}

/// Returns false when the source was refused outright and must not be
/// removed by a move.
fn copy_source(source: &Path, dest: &Path, limits: WalkLimits, report: &mut OpReport) -> bool {
    let metadata = match fs::symlink_metadata(source) {
        Ok(metadata) => metadata,
        Err(err) => {
            report.fail(FsError::io("stat", source, err));
            return false;
        }
    };
    let Some(name) = source.file_name() else {
        report.fail(FsError::io(
            "copy",
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
        ));
        return false;
    };

    let target = dest.join(name);
    let into_itself = if metadata.is_dir() {
        target.starts_with(source)
    } else {
        target == source
    };
    if into_itself {
        report.fail(FsError::SelfCopy {
            path: source.to_path_buf(),
        });
        return false;
    }

    if !metadata.is_dir() {
        report.record(copy_node(source, &target, &metadata));
        return true;
    }

    let context = CopyContext {
        source_parent: source.parent().unwrap_or(source),
        dest,
    };
    let mut created_dirs: Vec<(PathBuf, Metadata)> = Vec::new();
    for entry in limits.walker(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.fail(err.into());
                continue;
            }
        };
        if let Err(err) = limits.check(&entry) {
            report.abort(err);
            break;
        }

        let target = context.destination_for(entry.path());
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                report.fail(err.into());
                continue;
            }
        };

        if entry.file_type().is_dir() {
            match fs::create_dir(&target) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists && target.is_dir() => {}
                Err(err) => {
                    report.fail(FsError::io("mkdir", &target, err));
                    continue;
                }
            }
            report.done += 1;
            created_dirs.push((target, metadata));
        } else {
            report.record(copy_node(entry.path(), &target, &metadata));
        }
    }

    // Modes go on last so a read-only source directory can still be filled.
    for (dir, metadata) in created_dirs.iter().rev() {
        copy_owner(dir, metadata, false);
        if let Err(err) = fs::set_permissions(dir, fs::Permissions::from_mode(metadata.mode())) {
            report.fail(FsError::io("chmod", dir, err));
        }
    }
    true
}

fn copy_node(source: &Path, target: &Path, metadata: &Metadata) -> Result<(), FsError> {
    if metadata.file_type().is_symlink() {
        let link = fs::read_link(source).map_err(|err| FsError::io("readlink", source, err))?;
        if fs::symlink_metadata(target).is_ok() {
            fs::remove_file(target).map_err(|err| FsError::io("unlink", target, err))?;
        }
        std::os::unix::fs::symlink(&link, target)
            .map_err(|err| FsError::io("symlink", target, err))?;
        copy_owner(target, metadata, true);
        return Ok(());
    }

    fs::copy(source, target).map_err(|err| FsError::io("copy", target, err))?;
    copy_owner(target, metadata, false);
    fs::set_permissions(target, fs::Permissions::from_mode(metadata.mode()))
        .map_err(|err| FsError::io("chmod", target, err))
}

/// Ownership is best effort: unprivileged users can only keep their own ids.
fn copy_owner(target: &Path, metadata: &Metadata, is_link: bool) {
    let result = if is_link {
        std::os::unix::fs::lchown(target, Some(metadata.uid()), Some(metadata.gid()))
    } else {
        std::os::unix::fs::chown(target, Some(metadata.uid()), Some(metadata.gid()))
    };
    if let Err(err) = result {
        debug!(path = %target.display(), error = %err, "chown skipped");
    }
}

/// Post-order removal: children before parents, symlinks removed as links.
pub fn delete_tree(path: &Path, limits: WalkLimits) -> OpReport {
    delete_tree_with(path, limits, remove_node)
}

/// Post-order walk that hands every node to `remove`. A failed removal is
/// recorded and the walk goes on with the next node.
fn delete_tree_with(
    path: &Path,
    limits: WalkLimits,
    mut remove: impl FnMut(&Path, bool) -> Result<(), FsError>,
) -> OpReport {
    let mut report = OpReport::default();
    for entry in limits.walker(path).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.fail(err.into());
                continue;
            }
        };
        if let Err(err) = limits.check(&entry) {
            report.abort(err);
            break;
        }

        report.record(remove(entry.path(), entry.file_type().is_dir()));
    }
    info!(path = %path.display(), done = report.done, failed = report.failures.len(), "delete finished");
    report
}

fn remove_node(path: &Path, is_dir: bool) -> Result<(), FsError> {
    if is_dir {
        fs::remove_dir(path).map_err(|err| FsError::io("rmdir", path, err))
    } else {
        fs::remove_file(path).map_err(|err| FsError::io("unlink", path, err))
    }
}

pub fn delete_file(path: &Path) -> OpReport {
    let mut report = OpReport::default();
    report.record(fs::remove_file(path).map_err(|err| FsError::io("unlink", path, err)));
    report
}

pub fn rename(from: &Path, to: &Path) -> OpReport {
    let mut report = OpReport::default();
    report.record(fs::rename(from, to).map_err(|err| FsError::io("rename", from, err)));
    report
}

/// Creates an empty file, leaving an existing one untouched.
pub fn create_file(path: &Path) -> OpReport {
    let mut report = OpReport::default();
    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(NEW_FILE_MODE)
        .open(path)
        .map(drop)
        .map_err(|err| FsError::io("create", path, err));
    report.record(result);
    report
}

pub fn create_dir(path: &Path) -> OpReport {
    let mut report = OpReport::default();
    let result = DirBuilder::new()
        .mode(NEW_DIR_MODE)
        .create(path)
        .map_err(|err| FsError::io("mkdir", path, err));
    report.record(result);
    report
}

/// Every node below `from` whose basename is exactly `term`, displayed
/// relative to `root`. `from` itself is never a match.
pub fn search(
    term: &str,
    from: &Path,
    root: &Path,
    limits: WalkLimits,
) -> (Vec<DirectoryEntry>, OpReport) {
    let mut report = OpReport::default();
    let mut matches = Vec::new();
    for entry in limits.walker(from).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.fail(err.into());
                continue;
            }
        };
        if let Err(err) = limits.check(&entry) {
            report.abort(err);
            break;
        }
        if entry.file_name() != term {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        matches.push(DirectoryEntry {
            name: term.to_string(),
            display_line: format!("~/{}", relative.display()),
            path: entry.path().to_path_buf(),
            is_dir: entry.path().is_dir(),
        });
        report.done += 1;
    }
    debug!(term, from = %from.display(), matches = matches.len(), "search finished");
    (matches, report)
}

/// Writes a manifest of every non-hidden directory under `source`: a
/// `./relative:` header, the sorted non-hidden child names, a blank line.
pub fn snapshot(source: &Path, dump: &Path, limits: WalkLimits) -> OpReport {
    let mut report = OpReport::default();
    if !source.is_dir() {
        report.fail(FsError::NotADirectory {
            path: source.to_path_buf(),
        });
        return report;
    }
    let file = match File::create(dump) {
        Ok(file) => file,
        Err(err) => {
            report.fail(FsError::io("create", dump, err));
            return report;
        }
    };
    let mut out = BufWriter::new(file);

    let walk = limits
        .walker(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(&entry.file_name().to_string_lossy()));
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.fail(err.into());
                continue;
            }
        };
        if let Err(err) = limits.check(&entry) {
            report.abort(err);
            break;
        }
        if !entry.file_type().is_dir() {
            continue;
        }

        let children = match visible_children(entry.path()) {
            Ok(children) => children,
            Err(err) => {
                report.fail(err);
                continue;
            }
        };
        let header = match entry.path().strip_prefix(source) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => format!("./{}", relative.display()),
            Err(_) => entry.path().display().to_string(),
        };
        if let Err(err) = write_block(&mut out, &header, &children) {
            report.abort(FsError::io("write", dump, err));
            return report;
        }
        report.done += 1;
    }

    if let Err(err) = out.flush() {
        report.fail(FsError::io("write", dump, err));
    }
    report
}

fn visible_children(dir: &Path) -> Result<Vec<String>, FsError> {
    let mut names = Vec::new();
    for child in fs::read_dir(dir).map_err(|err| FsError::io("opendir", dir, err))? {
        let child = child.map_err(|err| FsError::io("readdir", dir, err))?;
        let name = child.file_name().to_string_lossy().into_owned();
        if !is_hidden(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn write_block(out: &mut impl Write, header: &str, children: &[String]) -> io::Result<()> {
    writeln!(out, "{header}:")?;
    for name in children {
        writeln!(out, "{name}")?;
    }
    writeln!(out)
}
