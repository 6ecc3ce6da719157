use std::path::{Path, PathBuf};
use tracing::debug;

/// Working directory plus back/forward stacks, bounded by a root directory.
///
/// Only `go_back` ever fills `forward`; every other navigation clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    root: PathBuf,
    working_dir: PathBuf,
    back: Vec<PathBuf>,
    forward: Vec<PathBuf>,
}

impl Navigator {
    pub fn new(root: PathBuf) -> Self {
        Self {
            working_dir: root.clone(),
            root,
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn navigate_to(&mut self, path: PathBuf) {
        debug!(from = %self.working_dir.display(), to = %path.display(), "navigate");
        let previous = std::mem::replace(&mut self.working_dir, path);
        self.back.push(previous);
        self.forward.clear();
    }

    pub fn go_back(&mut self) -> bool {
        let Some(target) = self.back.pop() else {
            return false;
        };
        let previous = std::mem::replace(&mut self.working_dir, target);
        self.forward.push(previous);
        true
    }

    pub fn go_forward(&mut self) -> bool {
        let Some(target) = self.forward.pop() else {
            return false;
        };
        let previous = std::mem::replace(&mut self.working_dir, target);
        self.back.push(previous);
        true
    }

    pub fn go_up(&mut self) -> bool {
        if self.working_dir == self.root {
            return false;
        }
        let Some(parent) = self.working_dir.parent().map(Path::to_path_buf) else {
            return false;
        };
        self.navigate_to(parent);
        true
    }

    pub fn go_home(&mut self) {
        self.navigate_to(self.root.clone());
    }

    pub fn clear_forward(&mut self) {
        self.forward.clear();
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}
