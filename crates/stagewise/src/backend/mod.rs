//! # Tensor Backend
//!
//! This module provides a unified interface for different tensor backends,
//! allowing the scheduler to slice batches and move activations around in a
//! backend-agnostic manner.

//! ## Feature Flags
//!
//! - `candle`: Enables support for the Candle tensor library
//!
//! ## Usage
//!
//! 1. Import the [`Backend`] trait
//! 2. Write models and transports against it
//! 3. Enable the feature flag for the desired backend

mod core_trait;

#[cfg_attr(docsrs, doc(cfg(feature = "candle")))]
#[cfg(feature = "candle")]
/// Candle tensor backend implementation.
///
/// This module is only available when the `candle` feature flag is enabled.
/// It implements [`Backend`] for Candle's `Tensor` type.
pub mod candle;

// Re-export the core trait for convenient imports
pub use core_trait::*;


#[cfg(test)]
/// Mock tensor implementation.
///
/// Operates on flat `f32` vectors
pub(crate) mod mock_tensor;
