//! # Stage Transport
//!
//! Point-to-point hand-off of activations between adjacent pipeline stages.
//!
//! The scheduler only ever calls [`StageTransport::receive_into`] (from the
//! previous stage) and [`StageTransport::send`] (to the next stage). Both are
//! suspension points: implementations may rendezvous with the peer or return
//! as soon as the data is queued, and the scheduler assumes nothing about
//! which. Timeouts and retries, if any, live in the implementation.

mod channel;

use async_trait::async_trait;
use crate::backend::Backend;
use crate::error::Result;

pub use channel::ChannelTransport;

#[async_trait]
pub trait StageTransport<B>: Send + Sync
where B: Backend
{
    /// Wait for the previous stage's activation and store it in `buffer`.
    ///
    /// Must fail if the delivered tensor's shape or dtype differs from `buffer`'s.
    async fn receive_into(&self, buffer: &mut B) -> Result<()>;

    /// Hand `tensor` to the next stage.
    ///
    /// Must be safe to call on the last stage, where it does nothing.
    async fn send(&self, tensor: &B) -> Result<()>;
}
