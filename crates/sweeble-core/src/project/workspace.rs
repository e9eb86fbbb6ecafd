use std::path::{Path, PathBuf};

/// Walk up from `start` to the nearest directory that owns ignore rules:
/// a git checkout, or failing that, the nearest directory holding a `.gitignore`.
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_file() || !start.exists() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    let mut nearest_ignore = None;
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        if nearest_ignore.is_none() && current.join(".gitignore").is_file() {
            nearest_ignore = Some(current.clone());
        }
        if !current.pop() {
            break;
        }
    }

    nearest_ignore
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_git_root_from_nested_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let sub = tmp.path().join("src").join("main");
        std::fs::create_dir_all(&sub).unwrap();
        let file = sub.join("Main.java");
        std::fs::write(&file, "class Main {}").unwrap();

        assert_eq!(find_repository_root(&file).unwrap(), tmp.path());
    }

    #[test]
    fn test_falls_back_to_gitignore_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "target/\n").unwrap();
        let file = tmp.path().join("lib.rs");

        assert_eq!(find_repository_root(&file).unwrap(), tmp.path());
    }
}
