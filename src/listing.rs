use crate::domain::{ContentList, DirectoryEntry};
use crate::error::FsError;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::debug;

const PERMISSION_BITS: [(u32, char); 9] = [
    (0o400, 'r'),
    (0o200, 'w'),
    (0o100, 'x'),
    (0o040, 'r'),
    (0o020, 'w'),
    (0o010, 'x'),
    (0o004, 'r'),
    (0o002, 'w'),
    (0o001, 'x'),
];

/// Dot-prefixed names other than `.` and `..`.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}

/// Lists one directory: `.` and `..` plus every non-hidden entry, byte-wise sorted.
pub fn scan(dir: &Path) -> Result<ContentList, FsError> {
    let read_dir = fs::read_dir(dir).map_err(|source| FsError::io("scan", dir, source))?;

    let mut names = vec![".".to_string(), "..".to_string()];
    for entry in read_dir {
        let entry = entry.map_err(|source| FsError::io("scan", dir, source))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_hidden(&name) {
            names.push(name);
        }
    }
    names.sort();

    let owners = OwnerNames::load();
    let entries: Vec<DirectoryEntry> = names
        .into_iter()
        .map(|name| entry_for(dir, name, &owners))
        .collect();

    debug!(dir = %dir.display(), entries = entries.len(), "scanned directory");
    Ok(ContentList::directory(dir.to_path_buf(), entries))
}

fn entry_for(dir: &Path, name: String, owners: &OwnerNames) -> DirectoryEntry {
    let path = dir.join(&name);
    let metadata = fs::metadata(&path)
        .or_else(|_| fs::symlink_metadata(&path))
        .ok();
    DirectoryEntry {
        display_line: describe(metadata.as_ref(), &name, owners),
        is_dir: metadata.as_ref().is_some_and(Metadata::is_dir),
        name,
        path,
    }
}

/// Formats one listing line: type and permissions, owner, group, size, mtime, name.
pub fn describe(metadata: Option<&Metadata>, name: &str, owners: &OwnerNames) -> String {
    let Some(metadata) = metadata else {
        return format!("?????????? {:<8} {:<8} {:>10} {:>24} {name}", "?", "?", "?", "?");
    };

    let modified = metadata
        .modified()
        .map(|time| {
            DateTime::<Local>::from(time)
                .format("%a %b %e %H:%M:%S %Y")
                .to_string()
        })
        .unwrap_or_else(|_| "?".to_string());

    format!(
        "{} {:<8} {:<8} {:>10} {:>24} {name}",
        mode_string(metadata),
        owners.user(metadata.uid()),
        owners.group(metadata.gid()),
        metadata.len(),
        modified,
    )
}

/// Owner and group names from the local account files. Ids without an
/// entry are shown as numbers.
#[derive(Debug, Default)]
pub struct OwnerNames {
    users: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl OwnerNames {
    pub fn load() -> Self {
        Self {
            users: read_id_table(Path::new("/etc/passwd")),
            groups: read_id_table(Path::new("/etc/group")),
        }
    }

    pub fn user(&self, uid: u32) -> String {
        self.users.get(&uid).cloned().unwrap_or_else(|| uid.to_string())
    }

    pub fn group(&self, gid: u32) -> String {
        self.groups.get(&gid).cloned().unwrap_or_else(|| gid.to_string())
    }
}

fn read_id_table(path: &Path) -> HashMap<u32, String> {
    match fs::read_to_string(path) {
        Ok(raw) => parse_id_table(&raw),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "account file unavailable");
            HashMap::new()
        }
    }
}

/// `name:password:id:...` lines, as in passwd(5) and group(5). The first
/// name listed for an id wins.
fn parse_id_table(raw: &str) -> HashMap<u32, String> {
    let mut table = HashMap::new();
    for line in raw.lines().filter(|line| !line.starts_with('#')) {
        let mut fields = line.split(':');
        let (Some(name), Some(id)) = (fields.next(), fields.nth(1)) else {
            continue;
        };
        if let Ok(id) = id.parse::<u32>() {
            table.entry(id).or_insert_with(|| name.to_string());
        }
    }
    table
}

fn mode_string(metadata: &Metadata) -> String {
    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else {
        '-'
    };

    let mode = metadata.mode();
    std::iter::once(kind)
        .chain(
            PERMISSION_BITS
                .iter()
                .map(|&(bit, ch)| if mode & bit != 0 { ch } else { '-' }),
        )
        .collect()
}
