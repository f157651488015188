use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;
use crate::backend::Backend;
use crate::error::{PipelineError, Result};
use super::StageTransport;

/// In-process transport linking ranks with bounded tokio channels.
///
/// Each link holds at most one activation, so a sender runs at most one
/// micro-batch ahead of its successor.
pub struct ChannelTransport<B> {
    rank: usize,
    prev: Option<Mutex<mpsc::Receiver<B>>>,
    next: Option<mpsc::Sender<B>>,
}

impl<B> ChannelTransport<B>
where B: Backend
{
    /// Build the transports of a `degree`-stage pipeline, indexed by rank.
    pub fn chain(degree: usize) -> Vec<Self> {
        let mut transports: Vec<Self> = (0..degree)
            .map(|rank| Self { rank, prev: None, next: None })
            .collect();
        for rank in 1..degree {
            let (tx, rx) = mpsc::channel(1);
            transports[rank - 1].next = Some(tx);
            transports[rank].prev = Some(Mutex::new(rx));
        }
        transports
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

#[async_trait]
impl<B> StageTransport<B> for ChannelTransport<B>
where B: Backend
{
    async fn receive_into(&self, buffer: &mut B) -> Result<()> {
        let prev = self.prev.as_ref().ok_or_else(|| PipelineError::Transport(
            format!("rank {} has no previous stage to receive from", self.rank)
        ))?;
        let received = prev.lock().await.recv().await.ok_or_else(|| PipelineError::Transport(
            format!("previous stage of rank {} hung up", self.rank)
        ))?;

        let (expected, actual) = (buffer.shape(), received.shape());
        if expected != actual {
            return Err(PipelineError::shape_mismatch("received activation", &expected, &actual));
        }
        if buffer.dtype() != received.dtype() {
            return Err(PipelineError::dtype_mismatch("received activation", buffer.dtype(), received.dtype()));
        }
        trace!(rank = self.rank, shape = ?actual, "received activation");
        *buffer = received;
        Ok(())
    }

    async fn send(&self, tensor: &B) -> Result<()> {
        let Some(next) = &self.next else {
            trace!(rank = self.rank, "last stage, nothing to send");
            return Ok(());
        };
        next.send(tensor.clone()).await.map_err(|_| PipelineError::Transport(
            format!("next stage of rank {} hung up", self.rank)
        ))?;
        trace!(rank = self.rank, shape = ?tensor.shape(), "sent activation");
        Ok(())
    }
}
