//! # Stagewise
//!
//! Per-rank step scheduling for **pipeline-parallel** transformer inference.
//!
//! ## Overview
//!
//! A model split across `N` pipeline stages runs every inference step on every
//! rank: each stage receives the previous stage's activations, runs its slice
//! of layers and hands the result to the next stage. Only the last stage
//! produces logits.
//!
//! This library owns that one step on one rank. It decides whether the batch
//! goes through in a single forward pass or as a series of smaller
//! micro-batches, allocates the receive buffers, keeps the inference offsets
//! the model's KV cache relies on up to date, and stitches micro-batch logits
//! back into one tensor.
//!
//! ## Architecture
//!
//! ### Assumptions
//! Regardless of backend used, stagewise reserves dimensions with special meanings:
//!  - Inputs (`tokens`, `position_ids`, logits) are `(batch, seq, ..)`
//!  - Activations handed between stages are `(seq, batch, hidden)`
//!
//! ### Traits at the seams
//!
//! - [`Backend`](backend::Backend) abstracts the tensor library
//! - [`StageModel`](model::StageModel) is this rank's slice of the model
//! - [`StageTransport`](transport::StageTransport) moves activations between neighbouring stages
//! - [`Topology`](topology::Topology) tells a rank where it sits in the pipeline
//!
//! ### Scheduling
//!
//! [`BatchScheduler`](scheduler::BatchScheduler) plans each step and drives a
//! [`StepExecutor`](executor::StepExecutor), which performs the
//! receive, forward and send for one (micro-)batch.
//!
//! ## Features
//!
//! - **candle** - Enables candle backend
//!

mod tensor;

pub mod backend;
pub mod batch;
pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logits;
pub mod model;
pub mod plan;
pub mod scheduler;
pub mod topology;
pub mod transport;

#[cfg(test)]
mod testing;

/// Constants for client reference
pub use tensor::constant;

pub use batch::{AttentionMask, Batch};
pub use config::{ChunkThreshold, PipelineConfig};
pub use context::InferenceContext;
pub use error::{PipelineError, Result};
pub use scheduler::{BatchScheduler, StepPlan};
