//! # Batch Scheduler
//!
//! Decides, once per step, whether a batch goes through this stage in one
//! forward pass or as a sequence of micro-batches, then drives the
//! [`StepExecutor`] and keeps the [`InferenceContext`] in step with it.
//!
//! Chunking only kicks in on multi-stage pipelines with an enabled
//! [`ChunkThreshold`](crate::config::ChunkThreshold), once
//! `batch_size * seq_len` reaches the threshold. Micro-batches are then
//! `max(1, threshold / seq_len)` rows each and run strictly one after another:
//! the next micro-batch's receive does not start before the previous one has
//! been sent and the batch offset advanced.

use tracing::{debug, warn};
use crate::backend::Backend;
use crate::batch::Batch;
use crate::buffer::BufferAllocator;
use crate::config::PipelineConfig;
use crate::context::InferenceContext;
use crate::error::{PipelineError, Result};
use crate::executor::StepExecutor;
use crate::logits::LogitsBuffer;
use crate::model::StageModel;
use crate::plan::MicroBatchPlan;
use crate::topology::{StagePosition, Topology};
use crate::transport::StageTransport;

/// How a single step will be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPlan {
    /// One forward pass over the whole batch
    Single { seq_len: usize },
    /// Sequential micro-batches of `micro_batch_size` rows
    Chunked { seq_len: usize, micro_batch_size: usize },
}

impl StepPlan {
    pub fn seq_len(&self) -> usize {
        match self {
            StepPlan::Single { seq_len } | StepPlan::Chunked { seq_len, .. } => *seq_len,
        }
    }
}

/// Drives one pipeline rank's forward steps.
pub struct BatchScheduler<B: Backend, M, T> {
    config: PipelineConfig,
    device: B::Device,
    executor: StepExecutor<B, M, T>,
}

impl<B, M, T> BatchScheduler<B, M, T>
where
    B: Backend,
    M: StageModel<B>,
    T: StageTransport<B>,
{
    /// Validate `config` against itself and `topology`, and set up this rank.
    pub fn new<O>(config: PipelineConfig, topology: &O, model: M, transport: T) -> Result<Self>
    where O: Topology + ?Sized
    {
        config.validate()?;
        let position = StagePosition::query(topology)?;
        if position.degree() != config.pipeline_degree {
            return Err(PipelineError::Topology(format!(
                "configured pipeline degree {} disagrees with topology degree {}",
                config.pipeline_degree, position.degree()
            )));
        }
        if config.pipeline_degree == 1 && config.chunk_threshold.is_enabled() {
            warn!(threshold = ?config.chunk_threshold.tokens(), "chunk threshold ignored on a single-stage pipeline");
        }

        let device = B::resolve_device(&config.device)?;
        let allocator = BufferAllocator::new(
            position.is_first(),
            config.hidden_size,
            config.handoff_dtype(),
            device.clone(),
        );
        let executor = StepExecutor::new(model, transport, allocator, position);
        Ok(Self { config, device, executor })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn position(&self) -> StagePosition {
        self.executor.position()
    }

    pub fn model(&self) -> &M {
        self.executor.model()
    }

    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    pub fn into_parts(self) -> (M, T) {
        self.executor.into_parts()
    }

    /// Decide how a batch of `batch_size` rows of `tokens_seq_len` positions
    /// would be executed.
    pub fn plan_step(&self, batch_size: usize, tokens_seq_len: usize, recv_buffer_seq_length: Option<usize>) -> StepPlan {
        let seq_len = recv_buffer_seq_length.unwrap_or(tokens_seq_len);
        if self.config.pipeline_degree > 1 {
            if let Some(threshold) = self.config.chunk_threshold.tokens() {
                if batch_size.saturating_mul(seq_len) >= threshold {
                    // threshold >= 1, so seq_len is non-zero here
                    let micro_batch_size = (threshold / seq_len).max(1);
                    return StepPlan::Chunked { seq_len, micro_batch_size };
                }
            }
        }
        StepPlan::Single { seq_len }
    }

    /// Run one step of `batch` through this stage.
    ///
    /// Returns the `(batch, seq, vocab)` logits on the last stage and `None`
    /// everywhere else. `recv_buffer_seq_length` only shapes the receive
    /// buffers and the logits. On success `context.sequence_len_offset` has
    /// grown by the positions in `batch.tokens()` and
    /// `context.batch_size_offset` is back to 0.
    /// On failure only the micro-batches that completed are reflected in
    /// `context`.
    pub async fn run(
        &mut self,
        context: &mut InferenceContext,
        batch: Batch<B>,
        recv_buffer_seq_length: Option<usize>,
    ) -> Result<Option<B>> {
        let plan = self.plan_step(batch.batch_size(), batch.sequence_length(), recv_buffer_seq_length);
        debug!(
            batch_size = batch.batch_size(),
            sequence_length = batch.sequence_length(),
            ?plan,
            "planned step"
        );
        match plan {
            StepPlan::Single { seq_len } => {
                self.run_single(context, batch, seq_len, recv_buffer_seq_length.is_some()).await
            }
            StepPlan::Chunked { seq_len, micro_batch_size } => {
                self.run_chunked(context, batch, seq_len, micro_batch_size).await
            }
        }
    }

    async fn run_single(
        &mut self,
        context: &mut InferenceContext,
        batch: Batch<B>,
        seq_len: usize,
        preallocate: bool,
    ) -> Result<Option<B>> {
        let mut buffer = if preallocate {
            self.executor.allocator().allocate(batch.batch_size(), seq_len)?
        } else {
            None
        };

        let output = self.executor.execute(context, &batch, buffer.as_mut()).await?;
        context.advance_sequence(batch.sequence_length());

        Ok(self.position().is_last().then_some(output))
    }

    async fn run_chunked(
        &mut self,
        context: &mut InferenceContext,
        batch: Batch<B>,
        seq_len: usize,
        micro_batch_size: usize,
    ) -> Result<Option<B>> {
        let plan = MicroBatchPlan::new(batch.batch_size(), micro_batch_size)?;

        let mut logits = if self.position().is_last() {
            Some(LogitsBuffer::new(batch.batch_size(), seq_len, self.config.vocab_size, &self.device)?)
        } else {
            None
        };
        let mut reusable = self.executor.allocator().allocate(micro_batch_size, seq_len)?;

        for range in plan.ranges() {
            let micro_batch = batch.narrow(&range)?;

            // a short tail leaves allocation to the executor, sized to its own tokens
            let buffer = if plan.is_short(&range) { None } else { reusable.as_mut() };
            let output = self.executor.execute(context, &micro_batch, buffer).await?;

            // the model indexes its state by this offset, so it has to move
            // before the next micro-batch starts
            context.advance_batch(range.len());
            debug!(
                start = range.start,
                end = range.end,
                batch_size_offset = context.batch_size_offset(),
                "finished micro-batch"
            );

            if let Some(logits) = logits.as_mut() {
                logits.write_rows(&range, &output)?;
            }
        }

        context.advance_sequence(batch.sequence_length());
        context.reset_batch_offset();

        Ok(logits.map(LogitsBuffer::into_inner))
    }
}
