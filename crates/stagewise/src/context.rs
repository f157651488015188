//! Offsets shared between the scheduler and the model's incremental state.

/// Caller-owned progress markers for incremental decoding.
///
/// The engine creates one per generation session and threads it through every
/// [`BatchScheduler::run`](crate::scheduler::BatchScheduler::run). Only the
/// scheduler advances it, and only between micro-batches; models read it to
/// index their own caches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceContext {
    sequence_len_offset: usize,
    batch_size_offset: usize,
}

impl InferenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence positions consumed by all completed steps.
    pub fn sequence_len_offset(&self) -> usize {
        self.sequence_len_offset
    }

    /// Rows of the current batch already pushed through this stage.
    /// Always `0` outside a chunked step.
    pub fn batch_size_offset(&self) -> usize {
        self.batch_size_offset
    }

    /// Start a new session.
    pub fn reset(&mut self) {
        self.sequence_len_offset = 0;
        self.batch_size_offset = 0;
    }

    pub(crate) fn advance_batch(&mut self, rows: usize) {
        // not clamped against the batch size, models see the raw running sum
        self.batch_size_offset += rows;
    }

    pub(crate) fn advance_sequence(&mut self, positions: usize) {
        self.sequence_len_offset += positions;
    }

    pub(crate) fn reset_batch_offset(&mut self) {
        self.batch_size_offset = 0;
    }
}
