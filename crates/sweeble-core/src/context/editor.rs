use std::path::{Path, PathBuf};

/// What the editor shell exposes about the focused document.
pub trait EditorContext: Send + Sync {
    fn text(&self) -> String;
    /// Cursor position as a character offset.
    fn cursor_offset(&self) -> usize;
    /// Human-readable language label used in prompts, e.g. "Java".
    fn language(&self) -> String;
    fn file_path(&self) -> Option<&Path> {
        None
    }
}

/// An owned, immutable copy of the document state at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub text: String,
    pub cursor: usize,
    pub language: String,
    pub path: Option<PathBuf>,
}

impl DocumentSnapshot {
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        Self {
            text: text.into(),
            cursor,
            language: "code".to_string(),
            path: None,
        }
    }

    /// Attach a file path; the language label follows its extension.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.language = language_for_path(&path).to_string();
        self.path = Some(path);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl EditorContext for DocumentSnapshot {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn cursor_offset(&self) -> usize {
        self.cursor
    }

    fn language(&self) -> String {
        self.language.clone()
    }

    fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

pub fn language_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "java" => "Java",
        "kt" => "Kotlin",
        "py" => "Python",
        "js" | "ts" | "jsx" | "tsx" => "JavaScript/TypeScript",
        "cpp" | "cc" | "cxx" => "C++",
        "c" => "C",
        "cs" => "C#",
        "php" => "PHP",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "swift" => "Swift",
        "scala" => "Scala",
        "sql" => "SQL",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "xml" => "XML",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "md" => "Markdown",
        _ => "code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(language_for_path(Path::new("src/Main.java")), "Java");
        assert_eq!(language_for_path(Path::new("lib.RS")), "Rust");
        assert_eq!(language_for_path(Path::new("app.tsx")), "JavaScript/TypeScript");
        assert_eq!(language_for_path(Path::new("Makefile")), "code");
    }

    #[test]
    fn test_snapshot_with_path_sets_language() {
        let snap = DocumentSnapshot::new("x", 0).with_path("a/b.py");
        assert_eq!(snap.language(), "Python");
        assert_eq!(snap.file_path(), Some(Path::new("a/b.py")));
    }
}
