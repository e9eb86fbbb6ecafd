use std::fmt;

use sha2::{Digest, Sha256};

use crate::constants::{limits, CURSOR_MARKER};
use crate::context::editor::EditorContext;

/// SHA-256 of a prompt context, used to skip identical round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHash([u8; 32]);

impl ContextHash {
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Display for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// The text sent to the model: a bounded window around the cursor with the
/// cursor marker spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub text: String,
    pub language: String,
    /// Cursor offset in the full document, in characters.
    pub cursor: usize,
}

impl PromptContext {
    pub fn hash(&self) -> ContextHash {
        ContextHash::of(&self.text)
    }

    /// Capture with a `window_chars` bound on each side of the cursor.
    pub fn capture(ctx: &dyn EditorContext, window_chars: usize) -> Self {
        ContextBuilder::new().with_window(window_chars).capture(ctx)
    }

    /// True when nothing but the marker and whitespace would be sent.
    pub fn is_blank(&self) -> bool {
        self.text.replace(CURSOR_MARKER, "").trim().is_empty()
    }
}

/// Builds [`PromptContext`] values from editor state.
pub struct ContextBuilder {
    window_chars: usize,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            window_chars: limits::CONTEXT_WINDOW_CHARS,
        }
    }

    /// Characters kept on each side of the cursor.
    pub fn with_window(mut self, window_chars: usize) -> Self {
        self.window_chars = window_chars;
        self
    }

    pub fn capture(&self, ctx: &dyn EditorContext) -> PromptContext {
        self.build(&ctx.text(), ctx.cursor_offset(), ctx.language())
    }

    pub fn build(&self, text: &str, cursor: usize, language: impl Into<String>) -> PromptContext {
        let total = text.chars().count();
        let cursor = cursor.min(total);
        let start = byte_offset(text, cursor.saturating_sub(self.window_chars));
        let at = byte_offset(text, cursor);
        let end = byte_offset(text, (cursor + self.window_chars).min(total));

        let mut context = String::with_capacity(end - start + CURSOR_MARKER.len());
        context.push_str(&text[start..at]);
        context.push_str(CURSOR_MARKER);
        context.push_str(&text[at..end]);

        PromptContext {
            text: context,
            language: language.into(),
            cursor,
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}
