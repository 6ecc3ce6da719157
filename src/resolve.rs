use std::path::{Path, PathBuf};

/// Resolves a user-typed path expression against the working directory,
/// never producing a path above `root`.
///
/// Tokens are split on `/`. `.` is skipped, `..` pops one segment unless the
/// path is already `root`, and `~` restarts from `root`. A leading slash
/// restarts from `root`, as does an empty token that directly follows a
/// named segment (`a//b` resolves to `root/b`). A trailing slash is ignored.
///
/// Resolution is purely lexical and cannot fail; whether the result exists
/// is decided by whichever filesystem call consumes it.
pub fn resolve(expression: &str, working_dir: &Path, root: &Path) -> PathBuf {
    let mut resolved = if working_dir.starts_with(root) {
        working_dir.to_path_buf()
    } else {
        root.to_path_buf()
    };

    let tokens: Vec<&str> = expression.split('/').collect();
    let last = tokens.len() - 1;
    let mut previous: Option<&str> = None;

    for (index, token) in tokens.iter().copied().enumerate() {
        match token {
            "" => {
                let after_segment = previous.is_some_and(|prev| !prev.is_empty());
                if index == 0 || (index != last && after_segment) {
                    resolved = root.to_path_buf();
                }
            }
            "." => {}
            ".." => {
                if resolved != root {
                    resolved.pop();
                }
            }
            "~" => resolved = root.to_path_buf(),
            segment => resolved.push(segment),
        }
        previous = Some(token);
    }

    resolved
}
