//! LSTM cell with analytic backpropagation through time

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Single LSTM cell: four gates with separate input/hidden weights.
///
/// Weight shapes are `[hidden_size, input_size]` for input projections and
/// `[hidden_size, hidden_size]` for recurrent projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    pub input_size: usize,
    pub hidden_size: usize,

    // Input gate
    w_ii: Array2<f32>,
    w_hi: Array2<f32>,
    b_i: Array1<f32>,

    // Forget gate
    w_if: Array2<f32>,
    w_hf: Array2<f32>,
    b_f: Array1<f32>,

    // Cell candidate
    w_ig: Array2<f32>,
    w_hg: Array2<f32>,
    b_g: Array1<f32>,

    // Output gate
    w_io: Array2<f32>,
    w_ho: Array2<f32>,
    b_o: Array1<f32>,
}

/// Per-timestep activations cached by the forward pass for BPTT
#[derive(Debug, Clone)]
pub struct StepCache {
    pub x: Array1<f32>,
    pub h_prev: Array1<f32>,
    pub c_prev: Array1<f32>,
    pub i: Array1<f32>,
    pub f: Array1<f32>,
    pub g: Array1<f32>,
    pub o: Array1<f32>,
    pub c: Array1<f32>,
}

/// Accumulated gradients for one cell
#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub dw_ii: Array2<f32>,
    pub dw_hi: Array2<f32>,
    pub db_i: Array1<f32>,
    pub dw_if: Array2<f32>,
    pub dw_hf: Array2<f32>,
    pub db_f: Array1<f32>,
    pub dw_ig: Array2<f32>,
    pub dw_hg: Array2<f32>,
    pub db_g: Array1<f32>,
    pub dw_io: Array2<f32>,
    pub dw_ho: Array2<f32>,
    pub db_o: Array1<f32>,
}

impl LstmGradients {
    pub fn zeros(input_size: usize, hidden_size: usize) -> Self {
        Self {
            dw_ii: Array2::zeros((hidden_size, input_size)),
            dw_hi: Array2::zeros((hidden_size, hidden_size)),
            db_i: Array1::zeros(hidden_size),
            dw_if: Array2::zeros((hidden_size, input_size)),
            dw_hf: Array2::zeros((hidden_size, hidden_size)),
            db_f: Array1::zeros(hidden_size),
            dw_ig: Array2::zeros((hidden_size, input_size)),
            dw_hg: Array2::zeros((hidden_size, hidden_size)),
            db_g: Array1::zeros(hidden_size),
            dw_io: Array2::zeros((hidden_size, input_size)),
            dw_ho: Array2::zeros((hidden_size, hidden_size)),
            db_o: Array1::zeros(hidden_size),
        }
    }

    /// Squared L2 norm over every gradient entry
    pub fn norm_sq(&self) -> f32 {
        let mats = [
            &self.dw_ii, &self.dw_hi, &self.dw_if, &self.dw_hf, &self.dw_ig, &self.dw_hg,
            &self.dw_io, &self.dw_ho,
        ];
        let vecs = [&self.db_i, &self.db_f, &self.db_g, &self.db_o];

        mats.iter().map(|m| m.iter().map(|v| v * v).sum::<f32>()).sum::<f32>()
            + vecs.iter().map(|v| v.iter().map(|v| v * v).sum::<f32>()).sum::<f32>()
    }

    /// Scale every gradient entry in place
    pub fn scale(&mut self, factor: f32) {
        for m in [
            &mut self.dw_ii, &mut self.dw_hi, &mut self.dw_if, &mut self.dw_hf,
            &mut self.dw_ig, &mut self.dw_hg, &mut self.dw_io, &mut self.dw_ho,
        ] {
            m.mapv_inplace(|v| v * factor);
        }
        for v in [&mut self.db_i, &mut self.db_f, &mut self.db_g, &mut self.db_o] {
            v.mapv_inplace(|x| x * factor);
        }
    }
}

impl LstmCell {
    /// Create a cell with uniform ±1/√hidden init and forget bias 1
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f32).sqrt();
        let dist = Uniform::new(-limit, limit);

        Self {
            input_size,
            hidden_size,
            w_ii: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hi: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_i: Array1::zeros(hidden_size),
            w_if: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hf: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig: Array2::random_using((hidden_size, input_size), dist, rng),
            w_hg: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_g: Array1::zeros(hidden_size),
            w_io: Array2::random_using((hidden_size, input_size), dist, rng),
            w_ho: Array2::random_using((hidden_size, hidden_size), dist, rng),
            b_o: Array1::zeros(hidden_size),
        }
    }

    /// Zeroed hidden and cell state
    pub fn init_state(&self) -> (Array1<f32>, Array1<f32>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }

    /// One forward time step, returning the new state and the cache
    /// needed for the backward pass.
    pub fn forward_step(
        &self,
        x: &Array1<f32>,
        h_prev: &Array1<f32>,
        c_prev: &Array1<f32>,
    ) -> (Array1<f32>, Array1<f32>, StepCache) {
        // i = σ(W_ii x + W_hi h + b_i)
        let i = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        // f = σ(W_if x + W_hf h + b_f)
        let f = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        // g = tanh(W_ig x + W_hg h + b_g)
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));
        // o = σ(W_io x + W_ho h + b_o)
        let o = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        // c = f ⊙ c_prev + i ⊙ g
        let c = &f * c_prev + &i * &g;
        // h = o ⊙ tanh(c)
        let h = &o * &tanh(&c);

        let cache = StepCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i,
            f,
            g,
            o,
            c: c.clone(),
        };

        (h, c, cache)
    }

    /// Backpropagate through a cached sequence.
    ///
    /// `dh_last` is the loss gradient on the final hidden state. Gradients
    /// are accumulated into `grads` so one struct can collect a whole
    /// mini-batch.
    pub fn backward(
        &self,
        caches: &[StepCache],
        dh_last: Array1<f32>,
        grads: &mut LstmGradients,
    ) {
        let mut dh_next = dh_last;
        let mut dc_next: Array1<f32> = Array1::zeros(self.hidden_size);

        for cache in caches.iter().rev() {
            let tanh_c = tanh(&cache.c);

            // h = o ⊙ tanh(c)
            let d_o = &dh_next * &tanh_c;
            let dc = &dc_next + &(&dh_next * &cache.o * &tanh_c.mapv(|v| 1.0 - v * v));

            // c = f ⊙ c_prev + i ⊙ g
            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;
            let dc_prev = &dc * &cache.f;

            // Pre-activation gradients
            let da_i = &d_i * &cache.i * &cache.i.mapv(|v| 1.0 - v);
            let da_f = &d_f * &cache.f * &cache.f.mapv(|v| 1.0 - v);
            let da_o = &d_o * &cache.o * &cache.o.mapv(|v| 1.0 - v);
            let da_g = &d_g * &cache.g.mapv(|v| 1.0 - v * v);

            grads.dw_ii += &outer(&da_i, &cache.x);
            grads.dw_hi += &outer(&da_i, &cache.h_prev);
            grads.db_i += &da_i;
            grads.dw_if += &outer(&da_f, &cache.x);
            grads.dw_hf += &outer(&da_f, &cache.h_prev);
            grads.db_f += &da_f;
            grads.dw_ig += &outer(&da_g, &cache.x);
            grads.dw_hg += &outer(&da_g, &cache.h_prev);
            grads.db_g += &da_g;
            grads.dw_io += &outer(&da_o, &cache.x);
            grads.dw_ho += &outer(&da_o, &cache.h_prev);
            grads.db_o += &da_o;

            dh_next = self.w_hi.t().dot(&da_i)
                + self.w_hf.t().dot(&da_f)
                + self.w_hg.t().dot(&da_g)
                + self.w_ho.t().dot(&da_o);
            dc_next = dc_prev;
        }
    }

    /// SGD update from accumulated gradients
    pub fn apply_gradients(&mut self, grads: &LstmGradients, learning_rate: f32) {
        self.w_ii.scaled_add(-learning_rate, &grads.dw_ii);
        self.w_hi.scaled_add(-learning_rate, &grads.dw_hi);
        self.b_i.scaled_add(-learning_rate, &grads.db_i);
        self.w_if.scaled_add(-learning_rate, &grads.dw_if);
        self.w_hf.scaled_add(-learning_rate, &grads.dw_hf);
        self.b_f.scaled_add(-learning_rate, &grads.db_f);
        self.w_ig.scaled_add(-learning_rate, &grads.dw_ig);
        self.w_hg.scaled_add(-learning_rate, &grads.dw_hg);
        self.b_g.scaled_add(-learning_rate, &grads.db_g);
        self.w_io.scaled_add(-learning_rate, &grads.dw_io);
        self.w_ho.scaled_add(-learning_rate, &grads.dw_ho);
        self.b_o.scaled_add(-learning_rate, &grads.db_o);
    }
}

fn sigmoid(x: &Array1<f32>) -> Array1<f32> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f32>) -> Array1<f32> {
    x.mapv(|v| v.tanh())
}

fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    let a2 = a.view().insert_axis(Axis(1));
    let b2 = b.view().insert_axis(Axis(0));
    a2.dot(&b2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_forward_step_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let cell = LstmCell::new(4, 8, &mut rng);

        let x = Array1::zeros(4);
        let (h, c) = cell.init_state();
        let (h_next, c_next, cache) = cell.forward_step(&x, &h, &c);

        assert_eq!(h_next.len(), 8);
        assert_eq!(c_next.len(), 8);
        assert_eq!(cache.i.len(), 8);
    }

    #[test]
    fn test_gate_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        let cell = LstmCell::new(3, 6, &mut rng);

        let x = Array1::from_elem(3, 2.0);
        let (h, c) = cell.init_state();
        let (_, _, cache) = cell.forward_step(&x, &h, &c);

        assert!(cache.i.iter().all(|&v| v > 0.0 && v < 1.0));
        assert!(cache.f.iter().all(|&v| v > 0.0 && v < 1.0));
        assert!(cache.o.iter().all(|&v| v > 0.0 && v < 1.0));
        assert!(cache.g.iter().all(|&v| v > -1.0 && v < 1.0));
    }

    #[test]
    fn test_deterministic_init() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let cell_a = LstmCell::new(2, 4, &mut rng_a);
        let cell_b = LstmCell::new(2, 4, &mut rng_b);

        assert_eq!(cell_a.w_ii, cell_b.w_ii);
        assert_eq!(cell_a.w_ho, cell_b.w_ho);
    }

    /// Finite-difference check of the analytic backward pass on a short
    /// sequence, probing a handful of weights in each gate.
    #[test]
    fn test_backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(3);
        let cell = LstmCell::new(2, 3, &mut rng);

        let inputs = vec![
            Array1::from(vec![0.5, -0.3]),
            Array1::from(vec![-0.1, 0.8]),
            Array1::from(vec![0.2, 0.4]),
        ];
        // Loss = sum of final hidden state, so dh_last = ones
        let loss = |cell: &LstmCell| -> f32 {
            let (mut h, mut c) = cell.init_state();
            for x in &inputs {
                let (h_next, c_next, _) = cell.forward_step(x, &h, &c);
                h = h_next;
                c = c_next;
            }
            h.sum()
        };

        let (mut h, mut c) = cell.init_state();
        let mut caches = Vec::new();
        for x in &inputs {
            let (h_next, c_next, cache) = cell.forward_step(x, &h, &c);
            caches.push(cache);
            h = h_next;
            c = c_next;
        }

        let mut grads = LstmGradients::zeros(2, 3);
        cell.backward(&caches, Array1::ones(3), &mut grads);

        let eps = 1e-3_f32;
        for (row, col) in [(0, 0), (1, 1), (2, 0)] {
            let mut plus = cell.clone();
            plus.w_ii[[row, col]] += eps;
            let mut minus = cell.clone();
            minus.w_ii[[row, col]] -= eps;
            let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
            let analytic = grads.dw_ii[[row, col]];
            assert!(
                (numeric - analytic).abs() < 1e-2,
                "w_ii[{},{}]: numeric {} vs analytic {}",
                row,
                col,
                numeric,
                analytic
            );
        }

        let mut plus = cell.clone();
        plus.b_f[1] += eps;
        let mut minus = cell.clone();
        minus.b_f[1] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
        assert!((numeric - grads.db_f[1]).abs() < 1e-2);
    }

    #[test]
    fn test_gradient_scale_and_norm() {
        let mut grads = LstmGradients::zeros(2, 2);
        grads.db_i[0] = 3.0;
        grads.db_o[1] = 4.0;
        assert!((grads.norm_sq() - 25.0).abs() < 1e-6);

        grads.scale(0.5);
        assert!((grads.db_i[0] - 1.5).abs() < 1e-6);
    }
}
