//! Dense softmax output layer and cross-entropy loss

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Fully connected layer mapping the final hidden state to class logits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Gradients for one dense layer
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub dw: Array2<f32>,
    pub db: Array1<f32>,
}

impl DenseGradients {
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            dw: Array2::zeros((output_size, input_size)),
            db: Array1::zeros(output_size),
        }
    }

    pub fn norm_sq(&self) -> f32 {
        self.dw.iter().map(|v| v * v).sum::<f32>() + self.db.iter().map(|v| v * v).sum::<f32>()
    }

    pub fn scale(&mut self, factor: f32) {
        self.dw.mapv_inplace(|v| v * factor);
        self.db.mapv_inplace(|v| v * factor);
    }
}

impl Dense {
    /// Xavier-style uniform initialization
    pub fn new(input_size: usize, output_size: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (input_size + output_size) as f32).sqrt();
        Self {
            weights: Array2::random_using((output_size, input_size), Uniform::new(-limit, limit), rng),
            biases: Array1::zeros(output_size),
        }
    }

    /// Class logits for one hidden state
    pub fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        self.weights.dot(input) + &self.biases
    }

    /// Gradients of cross-entropy-after-softmax with respect to this
    /// layer's parameters and its input.
    ///
    /// `probs` is the softmax output, `target` the true class index.
    /// Returns the gradient on the input (to continue into the LSTM) and
    /// accumulates parameter gradients into `grads`.
    pub fn backward(
        &self,
        input: &Array1<f32>,
        probs: &Array1<f32>,
        target: usize,
        grads: &mut DenseGradients,
    ) -> Array1<f32> {
        // d(loss)/d(logits) = probs - onehot(target)
        let mut dlogits = probs.clone();
        dlogits[target] -= 1.0;

        let d2 = dlogits.view().insert_axis(Axis(1));
        let in2 = input.view().insert_axis(Axis(0));
        grads.dw += &d2.dot(&in2);
        grads.db += &dlogits;

        self.weights.t().dot(&dlogits)
    }

    /// SGD update from accumulated gradients
    pub fn apply_gradients(&mut self, grads: &DenseGradients, learning_rate: f32) {
        self.weights.scaled_add(-learning_rate, &grads.dw);
        self.biases.scaled_add(-learning_rate, &grads.db);
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.mapv(|v| (v - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Cross-entropy loss for one prediction
pub fn cross_entropy(probs: &Array1<f32>, target: usize) -> f32 {
    -(probs[target].max(1e-12)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_softmax_sums_to_one() {
        let logits = Array1::from(vec![1.0, 2.0, 3.0]);
        let probs = softmax(&logits);
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_stable_for_large_logits() {
        let logits = Array1::from(vec![1000.0, 1001.0]);
        let probs = softmax(&logits);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_zero_for_confident_correct() {
        let probs = Array1::from(vec![0.0001, 0.9999]);
        assert!(cross_entropy(&probs, 1) < 0.001);
        assert!(cross_entropy(&probs, 0) > 5.0);
    }

    #[test]
    fn test_backward_gradient_direction() {
        let mut rng = StdRng::seed_from_u64(11);
        let layer = Dense::new(4, 2, &mut rng);

        let input = Array1::from(vec![0.5, -0.2, 0.1, 0.9]);
        let probs = softmax(&layer.forward(&input));

        let mut grads = DenseGradients::zeros(4, 2);
        layer.backward(&input, &probs, 0, &mut grads);

        // Bias gradient for the target class is negative (probability
        // should rise), positive for the other class.
        assert!(grads.db[0] < 0.0);
        assert!(grads.db[1] > 0.0);
    }

    #[test]
    fn test_apply_gradients_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = Dense::new(3, 2, &mut rng);
        let input = Array1::from(vec![1.0, 0.5, -0.5]);

        let before = cross_entropy(&softmax(&layer.forward(&input)), 1);

        for _ in 0..20 {
            let probs = softmax(&layer.forward(&input));
            let mut grads = DenseGradients::zeros(3, 2);
            layer.backward(&input, &probs, 1, &mut grads);
            layer.apply_gradients(&grads, 0.5);
        }

        let after = cross_entropy(&softmax(&layer.forward(&input)), 1);
        assert!(after < before);
    }
}
