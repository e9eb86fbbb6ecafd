mod types;
pub mod applier;
pub mod preview;
pub mod resolver;

pub use types::*;
pub use applier::{
    drop_overlapping, ApplyOrder, BatchReport, DocumentMutationSink, EditBatchApplier, Mutation, NullSink,
};
pub use preview::{preview_text, unified_diff};
pub use resolver::{strip_cursor_marker, OffsetResolver};
