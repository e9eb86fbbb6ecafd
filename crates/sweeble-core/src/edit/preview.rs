use similar::TextDiff;

use crate::buffer::TextBuffer;
use crate::edit::applier::{ApplyOrder, EditBatchApplier, NullSink};
use crate::edit::types::ResolvedEdit;
use crate::error::Result;

/// Text the document would hold after `edits` were accepted. `buffer` is untouched.
pub fn preview_text(buffer: &TextBuffer, edits: &[ResolvedEdit]) -> Result<String> {
    let mut scratch = buffer.clone();
    EditBatchApplier::new(ApplyOrder::Descending).apply_batch(&mut scratch, edits, &mut NullSink)?;
    Ok(scratch.text())
}

/// Unified diff between the current text and the preview.
pub fn unified_diff(old: &str, new: &str, label: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(label, label)
        .to_string()
}
