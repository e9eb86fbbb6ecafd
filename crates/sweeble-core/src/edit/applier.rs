//! Applies a batch of resolved edits to a [`TextBuffer`] as one logical transaction.
//!
//! The whole batch is validated before anything is mutated: bounds, Insert shape and
//! pairwise overlap. Edits are then applied back to front so lower offsets never
//! drift, or front to back with a running drift when textual order matters.
//! A failure after mutation has started aborts the rest of the batch; edits already
//! applied are not rolled back.

use tracing::{debug, info, warn};

use crate::buffer::TextBuffer;
use crate::edit::types::{EditKind, ResolvedEdit};
use crate::error::{Result, SweebleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyOrder {
    /// Highest start offset first. No offset adjustment needed.
    #[default]
    Descending,
    /// Lowest start offset first, shifting later edits by the accumulated drift.
    AscendingWithDrift,
}

/// One primitive change, expressed against the document as it is at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: EditKind,
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// The only channel through which applied edits reach the live document.
/// Each mutation is offered here before the buffer model takes it, so a rejecting
/// sink leaves both sides in step.
pub trait DocumentMutationSink {
    fn apply_mutation(&mut self, mutation: &Mutation) -> Result<()>;
}

/// Records mutations in application order.
impl DocumentMutationSink for Vec<Mutation> {
    fn apply_mutation(&mut self, mutation: &Mutation) -> Result<()> {
        self.push(mutation.clone());
        Ok(())
    }
}

/// Sink for buffers that are not mirrored anywhere, e.g. previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DocumentMutationSink for NullSink {
    fn apply_mutation(&mut self, _mutation: &Mutation) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    /// Net change in buffer length.
    pub delta: isize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EditBatchApplier {
    order: ApplyOrder,
}

impl EditBatchApplier {
    pub fn new(order: ApplyOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ApplyOrder {
        self.order
    }

    pub fn apply_batch(
        &self,
        buffer: &mut TextBuffer,
        edits: &[ResolvedEdit],
        sink: &mut dyn DocumentMutationSink,
    ) -> Result<BatchReport> {
        let mut plan = validate(buffer.len(), edits)?;
        if self.order == ApplyOrder::Descending {
            plan.reverse();
        }

        let mut drift: isize = 0;
        for (step, &index) in plan.iter().enumerate() {
            let edit = &edits[index];
            let (start, end) = match self.order {
                ApplyOrder::Descending => (edit.start, edit.end),
                ApplyOrder::AscendingWithDrift => (shift(edit.start, drift), shift(edit.end, drift)),
            };

            debug!("Applying {} at {}..{}: {:?}", edit.kind, start, end, edit.new_text);
            let len = buffer.len();
            if start > end || end > len {
                warn!("Aborting batch after {} of {} edits", step, plan.len());
                return Err(SweebleError::stale(index, edit.kind, start, end, len));
            }

            let mutation = Mutation {
                kind: edit.kind,
                start,
                end,
                new_text: match edit.kind {
                    EditKind::Delete => String::new(),
                    _ => edit.new_text.clone(),
                },
            };
            if let Err(e) = sink.apply_mutation(&mutation) {
                warn!("Document sink rejected edit #{} after {} applied: {}", index, step, e);
                return Err(e);
            }
            buffer
                .apply(edit.kind, start, end, &edit.new_text)
                .map_err(|_| SweebleError::stale(index, edit.kind, start, end, len))?;
            drift += edit.delta();
        }

        info!("Applied {} edits (delta {})", plan.len(), drift);
        Ok(BatchReport {
            applied: plan.len(),
            delta: drift,
        })
    }
}

/// Check every edit against `len` and against each other.
///
/// Returns edit indices in ascending `(start, end, index)` order. That order (or its
/// reverse) makes an Insert touching a Replace's start land before the replacement
/// text under both strategies.
pub fn validate(len: usize, edits: &[ResolvedEdit]) -> Result<Vec<usize>> {
    for (index, edit) in edits.iter().enumerate() {
        if edit.start > edit.end || edit.end > len {
            return Err(SweebleError::stale(index, edit.kind, edit.start, edit.end, len));
        }
        if edit.kind == EditKind::Insert && edit.start != edit.end {
            return Err(SweebleError::out_of_range(edit.start, edit.end, len));
        }
    }

    let mut plan: Vec<usize> = (0..edits.len()).collect();
    plan.sort_by_key(|&i| (edits[i].start, edits[i].end, i));

    let mut furthest: Option<(usize, usize)> = None;
    for &index in &plan {
        let edit = &edits[index];
        if let Some((owner, end)) = furthest {
            if edit.start < end {
                return Err(SweebleError::OverlappingEdits {
                    first: owner.min(index),
                    second: owner.max(index),
                });
            }
        }
        if furthest.map_or(true, |(_, end)| edit.end >= end) {
            furthest = Some((index, edit.end));
        }
    }
    Ok(plan)
}

/// Whether `validate` would reject `a` and `b` in the same batch. Touching ranges do not
/// overlap, nor do two Inserts at one offset.
fn overlaps(a: &ResolvedEdit, b: &ResolvedEdit) -> bool {
    let (first, second) = if (a.start, a.end) <= (b.start, b.end) { (a, b) } else { (b, a) };
    second.start < first.end
}

/// Thin a proposal so it passes [`validate`]: when two edits overlap, the one with lower
/// confidence goes (the later one on a tie). Survivors keep their original order.
pub fn drop_overlapping(edits: Vec<ResolvedEdit>) -> Vec<ResolvedEdit> {
    let mut by_confidence: Vec<usize> = (0..edits.len()).collect();
    by_confidence.sort_by(|&a, &b| edits[b].confidence.total_cmp(&edits[a].confidence));

    let mut kept: Vec<usize> = Vec::with_capacity(edits.len());
    for index in by_confidence {
        if let Some(&winner) = kept.iter().find(|&&k| overlaps(&edits[k], &edits[index])) {
            warn!(
                "Dropping {} edit #{} overlapping edit #{}",
                edits[index].kind, index, winner
            );
            continue;
        }
        kept.push(index);
    }

    let mut keep = vec![false; edits.len()];
    for index in kept {
        keep[index] = true;
    }
    edits
        .into_iter()
        .zip(keep)
        .filter_map(|(edit, keep)| keep.then_some(edit))
        .collect()
}

fn shift(offset: usize, drift: isize) -> usize {
    (offset as isize + drift).max(0) as usize
}
