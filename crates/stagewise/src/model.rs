use async_trait::async_trait;
use crate::backend::Backend;
use crate::context::InferenceContext;
use crate::error::Result;

/// Everything a stage's forward pass gets to see for one micro-batch.
#[derive(Debug, Clone)]
pub struct StageInput<'a, B> {
    pub tokens: &'a B,
    pub position_ids: &'a B,
    pub attention_mask: Option<&'a B>,

    /// Activations received from the previous stage, `(seq, batch, hidden)`.
    /// Always `None` on the first stage.
    pub hidden_states: Option<&'a B>,
}

/// What a forward pass produced.
#[derive(Debug, Clone)]
pub enum ForwardOutput<B> {
    /// A bare activation tensor
    Activation(B),
    /// An activation followed by auxiliary outputs the scheduler ignores
    Composite(B, Vec<B>),
}

impl<B> ForwardOutput<B> {
    pub fn into_activation(self) -> B {
        match self {
            ForwardOutput::Activation(activation) | ForwardOutput::Composite(activation, _) => activation,
        }
    }
}

impl<B> From<B> for ForwardOutput<B>
where B: Backend
{
    fn from(activation: B) -> Self {
        ForwardOutput::Activation(activation)
    }
}

/// # StageModel
///
/// The slice of a model owned by one pipeline stage.
///
/// Non-terminal stages return the activation to hand to the next stage,
/// shaped `(seq, batch, hidden)`. The terminal stage returns logits shaped
/// `(batch, seq, vocab)`.
///
/// The context is read-only here: models use `sequence_len_offset` and
/// `batch_size_offset` to locate the rows of their incremental state that the
/// current micro-batch belongs to. The scheduler advances both once the
/// forward pass has returned.
#[async_trait]
pub trait StageModel<B>: Send
where B: Backend
{
    async fn forward(&mut self, input: StageInput<'_, B>, context: &InferenceContext) -> Result<ForwardOutput<B>>;
}
