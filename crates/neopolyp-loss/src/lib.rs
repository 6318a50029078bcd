//! Class-weighted soft Dice loss for multi-class polyp segmentation.
//!
//! This crate provides the training criterion for a NeoPolyp segmentation model,
//! which labels every pixel as background, neoplastic or non-neoplastic tissue.
//! It is written against the Burn deep learning framework and works with any
//! Burn backend.
//!
//! ## Components
//!
//! - **[`one_hot`]**: smoothed one-hot expansion of an integer label map
//! - **[`DiceLoss`]**: softmax + per-class Dice coefficient + class weighting,
//!   returning the training loss and a detached monitoring score
//!
//! ## Usage Example
//!
//! ```rust
//! use burn::{prelude::*, tensor::cast::ToElement};
//! use neopolyp_loss::{DiceLossConfig, DiceLossResult};
//!
//! fn step<B: Backend>(
//!     logits: Tensor<B, 4>,
//!     labels: Tensor<B, 3, Int>,
//!     device: &B::Device,
//! ) -> DiceLossResult<f32> {
//!     let criterion = DiceLossConfig::new().init::<B>(device)?;
//!     let (_loss, score) = criterion.forward(logits, labels)?.into_parts();
//!     // `loss` drives the optimizer, `score` is for reporting only.
//!     Ok(score.into_scalar().to_f32())
//! }
//! ```
//!
//! Every entry point validates its inputs and reports problems through
//! [`DiceLossError`] instead of panicking: mismatched shapes, a class axis
//! that differs from the configured weights, and labels outside
//! `[0, num_classes)` are all rejected before any computation happens.

mod dice;
mod error;
mod one_hot;

pub use dice::{DiceLoss, DiceLossConfig, DiceLossOutput};
pub use error::{DiceLossError, DiceLossResult};
pub use one_hot::one_hot;
