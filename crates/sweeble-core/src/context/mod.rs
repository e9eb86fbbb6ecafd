mod builder;
mod editor;

pub use builder::{ContextBuilder, ContextHash, PromptContext};
pub use editor::{language_for_path, DocumentSnapshot, EditorContext};
