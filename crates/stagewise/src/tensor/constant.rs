/// # Constants with reserved meanings in stagewise

/// In token, position id and logits tensors, the `0th` dimension is the batch
pub const BATCH_DIM: usize = 0;

/// In token, position id and logits tensors, the `1st` dimension is the sequence
pub const SEQ_DIM: usize = 1;

/// Hand-off buffers are sequence-major: `(seq, batch, hidden)`
pub const HANDOFF_SEQ_DIM: usize = 0;

/// Batch dimension of a hand-off buffer
pub const HANDOFF_BATCH_DIM: usize = 1;

/// Hidden dimension of a hand-off buffer
pub const HANDOFF_HIDDEN_DIM: usize = 2;
