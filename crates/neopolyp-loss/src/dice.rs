//! Class-weighted soft Dice loss.
//!
//! Predictions are normalized with a softmax over the class axis and compared
//! against a smoothed one-hot encoding of the labels. For each sample `n` and
//! class `c`:
//! ```text
//! intersection[n, c] = Σ_hw softmax(pred)[n, c] * one_hot[n, c]
//! cardinality[n, c]  = Σ_hw softmax(pred)[n, c] + one_hot[n, c]
//! dice[n, c]         = 2 * intersection / (cardinality + eps)
//! score[n]           = Σ_c dice[n, c] * weight[c]
//! Loss               = mean_n(1 - score[n])
//! ```

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Module, ModuleDisplay},
    nn::loss::Reduction,
    tensor::{Int, Tensor, activation::softmax, backend::Backend},
};
use derive_new::new;

use crate::{
    error::{DiceLossError, DiceLossResult},
    one_hot::one_hot,
};

/// Configuration for creating a [Dice loss](DiceLoss).
#[derive(Config, Debug)]
pub struct DiceLossConfig {
    /// Per-class weights applied before averaging over classes. Their length
    /// fixes the number of classes. Default: `[0.33, 0.34, 0.33]`
    #[config(default = "vec![0.33, 0.34, 0.33]")]
    pub weights: Vec<f32>,
    /// Smoothing added to every one-hot channel and to the Dice denominator. Default: 1e-6
    #[config(default = 1e-6)]
    pub eps: f64,
}

impl DiceLossConfig {
    /// Configuration with `num_classes` equal weights of `1 / num_classes`.
    pub fn uniform(num_classes: usize) -> Self {
        Self::new().with_weights(vec![1.0 / num_classes as f32; num_classes])
    }

    /// Initialize [Dice loss](DiceLoss) with the class weights placed on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DiceLossError::EmptyWeights`] for an empty weight vector and
    /// [`DiceLossError::InvalidParameter`] for a negative or non-finite `eps`
    /// or weight.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DiceLossResult<DiceLoss<B>> {
        self.validate()?;

        tracing::debug!(
            num_classes = self.weights.len(),
            eps = self.eps,
            "initializing dice loss"
        );

        Ok(DiceLoss {
            weights: Tensor::from_floats(self.weights.as_slice(), device),
            num_classes: self.weights.len(),
            eps: self.eps,
        })
    }

    fn validate(&self) -> DiceLossResult<()> {
        if self.weights.is_empty() {
            return Err(DiceLossError::EmptyWeights);
        }

        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(DiceLossError::InvalidParameter {
                parameter: "eps".to_owned(),
                reason: format!("must be finite and non-negative, got {}", self.eps),
            });
        }

        if let Some((index, weight)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(DiceLossError::InvalidParameter {
                parameter: format!("weights[{index}]"),
                reason: format!("must be finite and non-negative, got {weight}"),
            });
        }

        Ok(())
    }
}

/// The training loss and the detached monitoring score of one evaluation.
#[derive(new, Debug, Clone)]
pub struct DiceLossOutput<B: Backend> {
    /// Mean of `1 - score` over the batch, attached to the autodiff graph. Shape `[1]`.
    pub loss: Tensor<B, 1>,
    /// Mean weighted Dice score over the batch, detached from the graph. Shape `[1]`.
    pub score: Tensor<B, 1>,
}

impl<B: Backend> DiceLossOutput<B> {
    /// Split into `(loss, score)`.
    pub fn into_parts(self) -> (Tensor<B, 1>, Tensor<B, 1>) {
        (self.loss, self.score)
    }
}

/// Class-weighted soft Dice loss for multi-class segmentation.
///
/// Holds only the immutable class weights and smoothing term, so a single
/// instance can evaluate any number of batches.
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct DiceLoss<B: Backend> {
    weights: Tensor<B, 1>,
    num_classes: usize,
    eps: f64,
}

impl<B: Backend> ModuleDisplay for DiceLoss<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("num_classes", &self.num_classes)
            .add("eps", &self.eps)
            .optional()
    }
}

impl<B: Backend> DiceLoss<B> {
    /// Create a Dice loss with the default three-class configuration.
    pub fn new(device: &B::Device) -> DiceLossResult<Self> {
        DiceLossConfig::new().init(device)
    }

    /// Number of classes the loss was configured for.
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Smoothing term used in the one-hot encoding and the Dice denominator.
    pub const fn eps(&self) -> f64 {
        self.eps
    }

    /// Per-class weights with shape `[num_classes]`.
    pub fn weights(&self) -> Tensor<B, 1> {
        self.weights.clone()
    }

    /// Compute the batch-averaged loss together with the detached score.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]` (logits)
    /// - labels: `[batch_size, height, width]`
    /// - loss, score: `[1]`
    ///
    /// # Errors
    ///
    /// Fails on mismatched shapes, a class axis that differs from the
    /// configured weights, or labels outside `[0, num_classes)`.
    pub fn forward(
        &self,
        predictions: Tensor<B, 4>,
        labels: Tensor<B, 3, Int>,
    ) -> DiceLossResult<DiceLossOutput<B>> {
        let score = self.weighted_score(predictions, labels)?;

        let loss = score.clone().neg().add_scalar(1.0).mean();
        let score = score.mean().detach();

        Ok(DiceLossOutput::new(loss, score))
    }

    /// Compute the loss with the given batch reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]`
    /// - labels: `[batch_size, height, width]`
    /// - output: `[1]`
    pub fn forward_with_reduction(
        &self,
        predictions: Tensor<B, 4>,
        labels: Tensor<B, 3, Int>,
        reduction: Reduction,
    ) -> DiceLossResult<Tensor<B, 1>> {
        let loss = self.forward_no_reduction(predictions, labels)?;
        Ok(match reduction {
            Reduction::Mean | Reduction::Auto => loss.mean(),
            Reduction::Sum => loss.sum(),
        })
    }

    /// Compute the per-sample loss `1 - score` without reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]`
    /// - labels: `[batch_size, height, width]`
    /// - output: `[batch_size]`
    pub fn forward_no_reduction(
        &self,
        predictions: Tensor<B, 4>,
        labels: Tensor<B, 3, Int>,
    ) -> DiceLossResult<Tensor<B, 1>> {
        let score = self.weighted_score(predictions, labels)?;
        Ok(score.neg().add_scalar(1.0))
    }

    /// Unweighted soft Dice score of every class in every sample.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]`
    /// - labels: `[batch_size, height, width]`
    /// - output: `[batch_size, num_classes]`
    pub fn dice_per_class(
        &self,
        predictions: Tensor<B, 4>,
        labels: Tensor<B, 3, Int>,
    ) -> DiceLossResult<Tensor<B, 2>> {
        self.assertions(&predictions, &labels)?;

        let [batch_size, num_classes, height, width] = predictions.dims();
        let device = predictions.device();
        tracing::trace!(batch_size, num_classes, height, width, "evaluating dice loss");

        // Class axis last: `[N, H*W, C]`. Softmax backward scatters along its
        // reduction axis, which ndarray only supports on the trailing dimension.
        let target_one_hot = one_hot(labels, num_classes, self.eps)?
            .to_device(&device)
            .reshape([batch_size, num_classes, height * width])
            .swap_dims(1, 2);
        let input_soft = softmax(
            predictions
                .reshape([batch_size, num_classes, height * width])
                .swap_dims(1, 2),
            2,
        );

        let intersection = (input_soft.clone() * target_one_hot.clone()).sum_dim(1);
        let cardinality = (input_soft + target_one_hot).sum_dim(1);

        let dice = intersection.mul_scalar(2.0) / cardinality.add_scalar(self.eps);
        Ok(dice.reshape([batch_size, num_classes]))
    }

    /// Per-sample Dice score weighted over classes, shape `[batch_size]`.
    fn weighted_score(
        &self,
        predictions: Tensor<B, 4>,
        labels: Tensor<B, 3, Int>,
    ) -> DiceLossResult<Tensor<B, 1>> {
        let dice = self.dice_per_class(predictions, labels)?;
        let [batch_size, num_classes] = dice.dims();

        let weights = self
            .weights
            .clone()
            .to_device(&dice.device())
            .reshape([1, num_classes]);

        Ok((dice * weights).sum_dim(1).reshape([batch_size]))
    }

    fn assertions(
        &self,
        predictions: &Tensor<B, 4>,
        labels: &Tensor<B, 3, Int>,
    ) -> DiceLossResult<()> {
        let [pred_batch, num_classes, pred_height, pred_width] = predictions.dims();
        let [label_batch, label_height, label_width] = labels.dims();

        if num_classes != self.num_classes {
            return Err(DiceLossError::ClassCountMismatch {
                weights: self.num_classes,
                classes: num_classes,
            });
        }

        if (pred_batch, pred_height, pred_width) != (label_batch, label_height, label_width) {
            return Err(DiceLossError::IncompatibleShapes {
                pred_shape: predictions.dims().to_vec(),
                target_shape: labels.dims().to_vec(),
            });
        }

        if pred_batch == 0 || pred_height == 0 || pred_width == 0 {
            return Err(DiceLossError::EmptyInput {
                shape: predictions.dims().to_vec(),
            });
        }

        Ok(())
    }
}
