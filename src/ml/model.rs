use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
};

use crate::ml::loss::mse_loss;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SteeringModelConfig {
    /// Side length of the square input frame
    #[config(default = 32)]
    pub img_size: usize,
    /// Channels of the input frame
    #[config(default = 3)]
    pub img_depth: usize,
    /// Probability of zeroing a flattened feature during training
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl SteeringModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SteeringModel<B> {
        let conv = |c_in: usize, c_out: usize, k: usize| {
            Conv2dConfig::new([c_in, c_out], [k, k])
                .with_padding(PaddingConfig2d::Same)
                .init(device)
        };

        // Same padding and stride 1 keep the spatial size intact
        let flat_features = 64 * self.img_size * self.img_size;

        SteeringModel {
            conv1: conv(self.img_depth, 24, 5),
            conv2: conv(24, 36, 5),
            conv3: conv(36, 48, 5),
            conv4: conv(48, 64, 3),
            conv5: conv(64, 64, 3),
            dropout: DropoutConfig::new(self.dropout).init(),
            dense1: LinearConfig::new(flat_features, 100).init(device),
            dense2: LinearConfig::new(100, 50).init(device),
            dense3: LinearConfig::new(50, 10).init(device),
            pred_layer: LinearConfig::new(10, 1).init(device),
            img_size: self.img_size,
            img_depth: self.img_depth,
        }
    }

    /// True when a checkpoint written for `other` fits this architecture
    pub fn same_architecture(&self, other: &SteeringModelConfig) -> bool {
        self.img_size == other.img_size && self.img_depth == other.img_depth
    }

    pub fn describe(&self) -> String {
        format!("{}x{}x{}", self.img_size, self.img_size, self.img_depth)
    }
}

/// Five ELU conv stages, dropout, three ELU dense stages, linear output.
#[derive(Module, Debug)]
pub struct SteeringModel<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub conv5: Conv2d<B>,
    pub dropout: Dropout,
    pub dense1: Linear<B>,
    pub dense2: Linear<B>,
    pub dense3: Linear<B>,
    pub pred_layer: Linear<B>,
    pub img_size: usize,
    pub img_depth: usize,
}

impl<B: Backend> SteeringModel<B> {
    /// images: [batch, img_size, img_size, img_depth] (HWC) → [batch, 1]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let batch = images.dims()[0];

        // Conv2d wants NCHW
        let x = images
            .reshape([batch, self.img_size, self.img_size, self.img_depth])
            .permute([0, 3, 1, 2]);

        let x = elu(self.conv1.forward(x));
        let x = elu(self.conv2.forward(x));
        let x = elu(self.conv3.forward(x));
        let x = elu(self.conv4.forward(x));
        let x = elu(self.conv5.forward(x));

        // Dropout is a no-op outside the autodiff backend
        let x = self.dropout.forward(x.flatten::<2>(1, 3));

        let x = elu(self.dense1.forward(x));
        let x = elu(self.dense2.forward(x));
        let x = elu(self.dense3.forward(x));

        // Unbounded regression output, no clamping
        self.pred_layer.forward(x)
    }

    /// Forward pass plus mean squared error against `targets` [batch, 1].
    pub fn forward_loss(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let predictions = self.forward(images);
        let loss = mse_loss(predictions.clone(), targets);
        (loss, predictions)
    }
}

/// Exponential linear unit with alpha = 1: x for x > 0, e^x - 1 otherwise.
pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let positive = x.clone().clamp_min(0.0);
    let negative = x.clamp_max(0.0).exp().sub_scalar(1.0);
    positive + negative
}
