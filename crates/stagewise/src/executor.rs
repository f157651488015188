//! One micro-batch through this stage: receive, compute, send.

use tracing::trace;
use crate::backend::Backend;
use crate::batch::Batch;
use crate::buffer::{BufferAllocator, HandoffBuffer};
use crate::context::InferenceContext;
use crate::error::Result;
use crate::model::{StageInput, StageModel};
use crate::topology::StagePosition;
use crate::transport::StageTransport;

/// Runs a single forward step of this stage, including the hand-off with its neighbours.
pub struct StepExecutor<B: Backend, M, T> {
    model: M,
    transport: T,
    allocator: BufferAllocator<B>,
    position: StagePosition,
}

impl<B, M, T> StepExecutor<B, M, T>
where
    B: Backend,
    M: StageModel<B>,
    T: StageTransport<B>,
{
    pub fn new(model: M, transport: T, allocator: BufferAllocator<B>, position: StagePosition) -> Self {
        Self { model, transport, allocator, position }
    }

    pub fn allocator(&self) -> &BufferAllocator<B> {
        &self.allocator
    }

    pub fn position(&self) -> StagePosition {
        self.position
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (M, T) {
        (self.model, self.transport)
    }

    /// Push `batch` through this stage and return the model's activation.
    ///
    /// Without a `buffer` one is allocated for this call. A supplied buffer
    /// must match the batch's row count and the hidden size.
    pub async fn execute(
        &mut self,
        context: &InferenceContext,
        batch: &Batch<B>,
        buffer: Option<&mut HandoffBuffer<B>>,
    ) -> Result<B> {
        let mut fresh = None;
        let mut buffer = match buffer {
            Some(buffer) => {
                buffer.check_fits(batch.batch_size(), self.allocator.hidden_size())?;
                Some(buffer)
            }
            None => {
                fresh = self.allocator.allocate(batch.batch_size(), batch.sequence_length())?;
                fresh.as_mut()
            }
        };

        if self.position.is_first() {
            buffer = None;
        }
        if let Some(buffer) = buffer.as_deref_mut() {
            if !buffer.is_empty() {
                trace!(shape = ?buffer.shape(), "receiving from previous stage");
                self.transport.receive_into(buffer.tensor_mut()).await?;
            }
        }
        let hidden_states = buffer.as_deref().map(HandoffBuffer::tensor);

        let input = StageInput {
            tokens: batch.tokens(),
            position_ids: batch.position_ids(),
            attention_mask: batch.attention_mask().map(|mask| mask.tensor()),
            hidden_states,
        };
        let activation = self.model.forward(input, context).await?.into_activation();

        trace!(shape = ?activation.shape(), "sending to next stage");
        self.transport.send(&activation).await?;

        Ok(activation)
    }
}
