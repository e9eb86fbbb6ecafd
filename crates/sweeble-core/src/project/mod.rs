mod gitignore;
mod workspace;

pub use gitignore::IgnoreFilter;
pub use workspace::find_repository_root;
