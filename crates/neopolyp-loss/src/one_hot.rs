//! Smoothed one-hot encoding of integer label maps.
//!
//! Expands a label map `[N, H, W]` into a channel-first tensor `[N, C, H, W]`:
//! ```text
//! one_hot[n, c, h, w] = 1 + eps   if labels[n, h, w] == c
//!                       eps       otherwise
//! ```
//! The additive `eps` keeps every channel strictly positive.

use burn::tensor::{Int, Tensor, backend::Backend, cast::ToElement};

use crate::error::{DiceLossError, DiceLossResult};

/// Encode `labels` as a smoothed one-hot tensor with `num_classes` channels.
///
/// Labels are range checked before encoding; any value outside
/// `[0, num_classes)` yields [`DiceLossError::LabelOutOfRange`] carrying the
/// first offending extreme (the minimum if it is negative, else the maximum).
///
/// # Shapes
///
/// - labels: `[batch_size, height, width]`
/// - output: `[batch_size, num_classes, height, width]`
pub fn one_hot<B: Backend>(
    labels: Tensor<B, 3, Int>,
    num_classes: usize,
    eps: f64,
) -> DiceLossResult<Tensor<B, 4>> {
    if num_classes == 0 {
        return Err(DiceLossError::ZeroClasses);
    }

    let [batch_size, height, width] = labels.dims();
    if batch_size == 0 || height == 0 || width == 0 {
        return Err(DiceLossError::EmptyInput {
            shape: labels.dims().to_vec(),
        });
    }

    check_label_range(&labels, num_classes)?;

    let device = labels.device();
    let indices = labels.reshape([batch_size, 1, height, width]);
    let hits = Tensor::<B, 4>::ones([batch_size, 1, height, width], &device);

    let encoded = Tensor::<B, 4>::zeros([batch_size, num_classes, height, width], &device)
        .scatter(1, indices, hits);

    Ok(encoded.add_scalar(eps))
}

fn check_label_range<B: Backend>(
    labels: &Tensor<B, 3, Int>,
    num_classes: usize,
) -> DiceLossResult<()> {
    let min = labels.clone().min().into_scalar().to_i64();
    if min < 0 {
        return Err(DiceLossError::LabelOutOfRange {
            label: min,
            num_classes,
        });
    }

    let max = labels.clone().max().into_scalar().to_i64();
    if max >= num_classes as i64 {
        return Err(DiceLossError::LabelOutOfRange {
            label: max,
            num_classes,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use burn::tensor::{TensorData, Tolerance};

    use super::*;
    use crate::tests::TestBackend;

    const EPS: f64 = 1e-6;

    #[test]
    fn one_hot_places_smoothed_ones_on_label_channel() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_data(
            TensorData::from([[[0, 2], [1, 0]]]),
            &device,
        );

        let encoded = one_hot(labels, 3, EPS).expect("labels are in range");
        assert_eq!(encoded.dims(), [1, 3, 2, 2]);

        let on = 1.0 + EPS as f32;
        let off = EPS as f32;
        let expected = TensorData::from([[
            [[on, off], [off, on]],
            [[off, off], [on, off]],
            [[off, on], [off, off]],
        ]]);
        encoded
            .into_data()
            .assert_approx_eq::<f32>(&expected, Tolerance::absolute(1e-7));
    }

    #[test]
    fn one_hot_argmax_recovers_labels() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_data(
            TensorData::from([
                [[0, 1, 2, 3], [3, 2, 1, 0], [1, 1, 2, 2]],
                [[2, 0, 3, 1], [0, 0, 0, 0], [3, 3, 3, 1]],
            ]),
            &device,
        );

        let encoded = one_hot(labels.clone(), 4, EPS).expect("labels are in range");
        let recovered = encoded.argmax(1).reshape([2, 3, 4]);

        recovered.into_data().assert_eq(&labels.into_data(), false);
    }

    #[test]
    fn one_hot_channels_sum_to_one_plus_smoothing() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_data(
            TensorData::from([[[1, 0, 1], [0, 1, 1]]]),
            &device,
        );

        let encoded = one_hot(labels, 2, EPS).expect("labels are in range");
        let channel_sum = encoded.sum_dim(1).reshape([1, 2, 3]);

        let total = 1.0 + 2.0 * EPS as f32;
        let expected = TensorData::from([[[total, total, total], [total, total, total]]]);
        channel_sum
            .into_data()
            .assert_approx_eq::<f32>(&expected, Tolerance::absolute(1e-6));
    }

    #[test]
    fn one_hot_rejects_label_equal_to_class_count() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_data(
            TensorData::from([[[0, 1], [3, 2]]]),
            &device,
        );

        let err = one_hot(labels, 3, EPS).expect_err("label 3 is out of range");
        assert_eq!(
            err,
            DiceLossError::LabelOutOfRange {
                label: 3,
                num_classes: 3
            }
        );
    }

    #[test]
    fn one_hot_rejects_negative_label() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_data(
            TensorData::from([[[0, -1], [1, 2]]]),
            &device,
        );

        let err = one_hot(labels, 3, EPS).expect_err("negative labels are invalid");
        assert_eq!(
            err,
            DiceLossError::LabelOutOfRange {
                label: -1,
                num_classes: 3
            }
        );
    }

    #[test]
    fn one_hot_rejects_zero_classes() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::zeros([1, 2, 2], &device);

        let err = one_hot(labels, 0, EPS).expect_err("zero classes cannot be encoded");
        assert_eq!(err, DiceLossError::ZeroClasses);
    }

    #[test]
    fn one_hot_rejects_empty_spatial_dimension() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::zeros([1, 0, 4], &device);

        let err = one_hot(labels, 3, EPS).expect_err("zero height is empty");
        assert_eq!(err, DiceLossError::EmptyInput { shape: vec![1, 0, 4] });
    }
}
