use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};

/// Mean squared error, averaged over the batch. The only training signal:
/// no regularisation term is added.
pub fn mse_loss<B: Backend>(predictions: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
    MseLoss::new().forward(predictions, labels, Reduction::Mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_mean_not_sum() {
        let device = Default::default();
        let pred = Tensor::<NdArray, 2>::from_floats([[1.0], [3.0]], &device);
        let labels = Tensor::<NdArray, 2>::zeros([2, 1], &device);

        let loss: f32 = mse_loss(pred, labels).into_scalar().elem();
        // (1 + 9) / 2
        assert!((loss - 5.0).abs() < 1e-6);
    }
}
