//! Mock collaborators shared by the executor and scheduler tests.

use std::sync::Mutex;
use async_trait::async_trait;
use crate::backend::Backend;
use crate::backend::mock_tensor::MockTensor;
use crate::context::InferenceContext;
use crate::error::{PipelineError, Result};
use crate::model::{ForwardOutput, StageInput, StageModel};
use crate::tensor::operations::{batch_size, sequence_length};
use crate::transport::StageTransport;

/// What the model saw on one forward call
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub rows: usize,
    pub batch_size_offset: usize,
    pub sequence_len_offset: usize,
    pub hidden_states: Option<Vec<usize>>,
    pub attention_mask: Option<Vec<usize>>,
}

/// Model whose outputs only depend on each row's own tokens.
///
/// Terminal stages emit `(batch, seq, vocab)` logits where entry `v` of
/// position `(b, s)` is `token * 100 + v`. Other stages emit a
/// `(seq, batch, hidden)` activation filled with the token value.
pub struct RecordingModel {
    pub last: bool,
    pub hidden_size: usize,
    pub vocab_size: usize,
    pub composite: bool,
    pub fail_on_call: Option<usize>,
    pub observations: Vec<Observation>,
}

impl RecordingModel {
    pub fn new(last: bool, hidden_size: usize, vocab_size: usize) -> Self {
        Self {
            last,
            hidden_size,
            vocab_size,
            composite: false,
            fail_on_call: None,
            observations: vec![],
        }
    }

    fn logits(&self, tokens: &MockTensor) -> MockTensor {
        let (b, s) = (batch_size(tokens), sequence_length(tokens));
        let mut data = Vec::with_capacity(b * s * self.vocab_size);
        for token in tokens.data.iter() {
            data.extend((0..self.vocab_size).map(|v| token * 100. + v as f32));
        }
        MockTensor::new(vec![b, s, self.vocab_size], data)
    }

    fn activation(&self, tokens: &MockTensor) -> MockTensor {
        let (b, s) = (batch_size(tokens), sequence_length(tokens));
        let mut data = Vec::with_capacity(s * b * self.hidden_size);
        for seq in 0..s {
            for row in 0..b {
                let token = tokens.data[row * s + seq];
                data.extend(std::iter::repeat_n(token, self.hidden_size));
            }
        }
        MockTensor::new(vec![s, b, self.hidden_size], data)
    }
}

#[async_trait]
impl StageModel<MockTensor> for RecordingModel {
    async fn forward(&mut self, input: StageInput<'_, MockTensor>, context: &InferenceContext) -> Result<ForwardOutput<MockTensor>> {
        if self.fail_on_call == Some(self.observations.len()) {
            return Err(PipelineError::Model("injected failure".to_string()));
        }
        self.observations.push(Observation {
            rows: batch_size(input.tokens),
            batch_size_offset: context.batch_size_offset(),
            sequence_len_offset: context.sequence_len_offset(),
            hidden_states: input.hidden_states.map(|h| h.shape()),
            attention_mask: input.attention_mask.map(|m| m.shape()),
        });

        let activation = if self.last {
            self.logits(input.tokens)
        } else {
            self.activation(input.tokens)
        };
        if self.composite {
            Ok(ForwardOutput::Composite(activation, vec![MockTensor::filled(vec![1], -1.)]))
        } else {
            Ok(activation.into())
        }
    }
}

/// Transport that answers every receive with ones and records traffic.
#[derive(Default)]
pub struct RecordingTransport {
    pub received: Mutex<Vec<Vec<usize>>>,
    pub sent: Mutex<Vec<MockTensor>>,
}

impl RecordingTransport {
    pub fn received(&self) -> Vec<Vec<usize>> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<MockTensor> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StageTransport<MockTensor> for RecordingTransport {
    async fn receive_into(&self, buffer: &mut MockTensor) -> Result<()> {
        let shape = buffer.shape();
        let mut filled = MockTensor::filled(shape.clone(), 1.);
        filled.dtype = buffer.dtype;
        *buffer = filled;
        self.received.lock().map_err(|e| PipelineError::Transport(e.to_string()))?.push(shape);
        Ok(())
    }

    async fn send(&self, tensor: &MockTensor) -> Result<()> {
        self.sent.lock().map_err(|e| PipelineError::Transport(e.to_string()))?.push(tensor.clone());
        Ok(())
    }
}
