use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// CPU backend used for evaluation passes and graph preprocessing.
pub type CpuBackend = NdArray<f32>;

/// Autodiff-enabled backend used for the training forward/backward pass.
pub type TrainBackend = Autodiff<CpuBackend>;

pub fn init_cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;

    #[test]
    fn test_train_backend_differentiates_on_cpu_device() {
        let device = init_cpu_device();
        let x = Tensor::<TrainBackend, 1>::from_floats([1.0, -2.0, 3.0], &device).require_grad();
        let grads = (x.clone() * x.clone()).sum().backward();
        let grad = x.grad(&grads).map(|g| g.into_data().to_vec::<f32>().unwrap());
        assert_eq!(grad, Some(vec![2.0, -4.0, 6.0]));
    }
}
