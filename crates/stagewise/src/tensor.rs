//! Tensor layout constants and the small set of shape helpers built on [`Backend`](crate::backend::Backend).

pub mod constant;
pub(crate) mod operations;
