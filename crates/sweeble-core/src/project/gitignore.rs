use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::project::workspace::find_repository_root;

/// `.gitignore` rules for one repository. Ignored files never trigger requests.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    root: PathBuf,
    rules: Gitignore,
}

impl IgnoreFilter {
    /// Rules from every `.gitignore` between the repository root and `file`'s directory.
    /// `None` when the file is not inside a repository.
    pub fn for_file(file: &Path) -> Option<Self> {
        let root = find_repository_root(file)?;
        let mut builder = GitignoreBuilder::new(&root);

        let dir = file.parent().unwrap_or(&root);
        let mut dirs: Vec<&Path> = dir.ancestors().take_while(|d| d.starts_with(&root)).collect();
        dirs.reverse();
        for d in dirs {
            let candidate = d.join(".gitignore");
            if candidate.is_file() {
                if let Some(e) = builder.add(&candidate) {
                    warn!("Partially parsed {}: {}", candidate.display(), e);
                }
            }
        }

        match builder.build() {
            Ok(rules) => Some(Self { root, rules }),
            Err(e) => {
                warn!("Ignoring unusable .gitignore rules under {}: {}", root.display(), e);
                None
            }
        }
    }

    /// Build from literal patterns rooted at `root`.
    pub fn from_patterns(root: impl Into<PathBuf>, patterns: &[&str]) -> Option<Self> {
        let root = root.into();
        let mut builder = GitignoreBuilder::new(&root);
        for pattern in patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                warn!("Skipping ignore pattern {:?}: {}", pattern, e);
            }
        }
        builder.build().ok().map(|rules| Self { root, rules })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if !path.starts_with(&self.root) {
            return false;
        }
        let ignored = self
            .rules
            .matched_path_or_any_parents(path, path.is_dir())
            .is_ignore();
        if ignored {
            debug!("{} is git-ignored", path.display());
        }
        ignored
    }
}
