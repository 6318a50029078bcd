//! Error types for Dice loss construction and evaluation.

use thiserror::Error;

/// Errors that can occur while building or evaluating a [`DiceLoss`](crate::DiceLoss).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiceLossError {
    /// The weight vector is empty, which leaves the loss with zero classes.
    #[error("weight vector is empty - at least one class is required")]
    EmptyWeights,

    /// An encoding was requested with zero classes.
    #[error("class count must be at least 1, got 0")]
    ZeroClasses,

    /// A configuration value is outside its valid domain.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The number of class weights does not match the class axis of the predictions.
    #[error("class count mismatch: {weights} weights configured, predictions have {classes} classes")]
    ClassCountMismatch {
        /// Number of configured weights.
        weights: usize,
        /// Size of the class axis of the predictions.
        classes: usize,
    },

    /// Batch or spatial dimensions of predictions and labels disagree.
    #[error(
        "incompatible tensor shapes: predictions shape {pred_shape:?} does not match labels shape {target_shape:?}"
    )]
    IncompatibleShapes {
        /// Shape of the predictions `[N, C, H, W]`.
        pred_shape: Vec<usize>,
        /// Shape of the labels `[N, H, W]`.
        target_shape: Vec<usize>,
    },

    /// A batch or spatial dimension is zero.
    #[error("empty input: shape {shape:?} has a zero-sized dimension")]
    EmptyInput {
        /// Shape of the empty tensor.
        shape: Vec<usize>,
    },

    /// A label lies outside `[0, num_classes)`.
    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange {
        /// The offending label value.
        label: i64,
        /// Number of classes the labels are encoded against.
        num_classes: usize,
    },
}

/// A specialized `Result` type for Dice loss operations.
pub type DiceLossResult<T> = Result<T, DiceLossError>;
