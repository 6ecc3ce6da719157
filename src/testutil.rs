use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Scratch directory under the system temp dir, removed on drop.
pub(crate) struct Scratch {
    root: PathBuf,
}

impl Scratch {
    pub(crate) fn new(label: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "treenav_{label}_{}_{}",
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ));
        fs::create_dir_all(&root).expect("create scratch root");
        Self { root }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.root
    }

    pub(crate) fn mkdir(&self, relative: &str) -> PathBuf {
        let dir = self.root.join(relative);
        fs::create_dir_all(&dir).expect("create dir");
        dir
    }

    pub(crate) fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let file = self.root.join(relative);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&file, contents).expect("write file");
        file
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
