//! Inference-only neural network layers over `ndarray`.
//!
//! Conventions follow Keras so exported weights drop in unchanged:
//! - Dense kernels are stored `(input_dim, output_dim)`, so `y = x · W + b`
//! - LSTM kernels are `(input_dim, 4 * units)` and recurrent kernels
//!   `(units, 4 * units)`, gate blocks ordered input, forget, cell, output
//!
//! ## Initialisation
//! Matches the Keras layer defaults:
//! - kernels: Glorot uniform, `limit = sqrt(6 / (fan_in + fan_out))`
//! - LSTM recurrent kernels: orthogonal (Gram-Schmidt over Gaussian samples)
//! - embeddings: uniform(-0.05, 0.05)
//! - biases: zero, except the LSTM forget gate which starts at 1

use crate::error::{RankerError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

const EMBEDDING_INIT_LIMIT: f32 = 0.05;

pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax (max-shifted)
pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

fn glorot_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    let limit = (6.0 / (rows + cols) as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
}

/// Box-Muller sample from N(0, 1)
fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.random_range(f32::EPSILON..1.0);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Orthonormal rows when `rows <= cols`, orthonormal columns otherwise
fn orthogonal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    let (count, dim) = if rows <= cols { (rows, cols) } else { (cols, rows) };

    let mut basis: Vec<Array1<f32>> = Vec::with_capacity(count);
    while basis.len() < count {
        let mut v = Array1::from_shape_fn(dim, |_| standard_normal(&mut *rng));
        for b in &basis {
            let proj = v.dot(b);
            v.scaled_add(-proj, b);
        }
        let norm = v.dot(&v).sqrt();
        // Resample the rare near-dependent draw
        if norm > 1e-4 {
            basis.push(v / norm);
        }
    }

    let mut out = Array2::zeros((rows, cols));
    for (k, b) in basis.iter().enumerate() {
        if rows <= cols {
            out.row_mut(k).assign(b);
        } else {
            out.column_mut(k).assign(b);
        }
    }
    out
}

fn check_shape(layer: &str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(RankerError::ShapeMismatch {
            layer: layer.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

/// Fully connected layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub kernel: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Dense {
    pub fn glorot<R: Rng>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        Self {
            kernel: glorot_uniform(input_dim, output_dim, rng),
            bias: Array1::zeros(output_dim),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.kernel.ncols()
    }

    /// `x · W + b`, no activation
    pub fn forward(&self, x: ArrayView1<f32>) -> Array1<f32> {
        x.dot(&self.kernel) + &self.bias
    }

    pub fn forward_relu(&self, x: ArrayView1<f32>) -> Array1<f32> {
        self.forward(x).mapv_into(relu)
    }

    pub fn validate(&self, name: &str, input_dim: usize, output_dim: usize) -> Result<()> {
        check_shape(name, &[input_dim, output_dim], self.kernel.shape())?;
        check_shape(name, &[output_dim], self.bias.shape())
    }
}

/// Token id -> dense vector lookup table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub table: Array2<f32>,
}

impl Embedding {
    pub fn uniform<R: Rng>(vocab_size: usize, dim: usize, rng: &mut R) -> Self {
        Self {
            table: Array2::from_shape_fn((vocab_size, dim), |_| {
                rng.random_range(-EMBEDDING_INIT_LIMIT..EMBEDDING_INIT_LIMIT)
            }),
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.table.nrows()
    }

    pub fn dim(&self) -> usize {
        self.table.ncols()
    }

    /// One row per id, shape `(ids.len(), dim)`
    pub fn lookup(&self, ids: &[u32]) -> Result<Array2<f32>> {
        let mut out = Array2::zeros((ids.len(), self.dim()));
        for (t, &id) in ids.iter().enumerate() {
            let id = id as usize;
            if id >= self.vocab_size() {
                return Err(RankerError::InvalidInput(format!(
                    "token id {} outside embedding table of {} rows",
                    id,
                    self.vocab_size()
                )));
            }
            out.row_mut(t).assign(&self.table.row(id));
        }
        Ok(out)
    }

    pub fn validate(&self, name: &str, vocab_size: usize, dim: usize) -> Result<()> {
        check_shape(name, &[vocab_size, dim], self.table.shape())
    }
}

/// Long short-term memory layer.
///
/// Per step, with `z = x_t · W + h_{t-1} · U + b` split into four blocks:
/// ```text
/// i = σ(z_i)   f = σ(z_f)   g = tanh(z_c)   o = σ(z_o)
/// c_t = f * c_{t-1} + i * g
/// h_t = o * tanh(c_t)
/// ```
/// Padding ids are not masked; every step of the sequence is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lstm {
    pub kernel: Array2<f32>,
    pub recurrent_kernel: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Lstm {
    /// Glorot kernel, orthogonal recurrent kernel, unit forget bias
    pub fn random<R: Rng>(input_dim: usize, units: usize, rng: &mut R) -> Self {
        let mut bias = Array1::zeros(4 * units);
        bias.slice_mut(s![units..2 * units]).fill(1.0);
        Self {
            kernel: glorot_uniform(input_dim, 4 * units, rng),
            recurrent_kernel: orthogonal(units, 4 * units, rng),
            bias,
        }
    }

    pub fn units(&self) -> usize {
        self.recurrent_kernel.nrows()
    }

    pub fn input_dim(&self) -> usize {
        self.kernel.nrows()
    }

    /// Hidden state after every step, shape `(steps, units)`
    pub fn forward_sequence(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let units = self.units();
        let mut outputs = Array2::zeros((inputs.nrows(), units));
        self.run(inputs, |t, h| outputs.row_mut(t).assign(h));
        outputs
    }

    /// Hidden state after the final step
    pub fn forward_last(&self, inputs: ArrayView2<f32>) -> Array1<f32> {
        let mut last = Array1::zeros(self.units());
        self.run(inputs, |_, h| last.assign(h));
        last
    }

    fn run<F: FnMut(usize, &Array1<f32>)>(&self, inputs: ArrayView2<f32>, mut emit: F) {
        let units = self.units();
        // Input projections for all steps at once; only h · U is sequential
        let projected = inputs.dot(&self.kernel) + &self.bias;

        let mut h = Array1::<f32>::zeros(units);
        let mut c = Array1::<f32>::zeros(units);
        for (t, x_proj) in projected.axis_iter(Axis(0)).enumerate() {
            let z = &x_proj + &h.dot(&self.recurrent_kernel);

            let i = z.slice(s![..units]).mapv(sigmoid);
            let f = z.slice(s![units..2 * units]).mapv(sigmoid);
            let g = z.slice(s![2 * units..3 * units]).mapv(f32::tanh);
            let o = z.slice(s![3 * units..]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f32::tanh);
            emit(t, &h);
        }
    }

    pub fn validate(&self, name: &str, input_dim: usize, units: usize) -> Result<()> {
        check_shape(name, &[input_dim, 4 * units], self.kernel.shape())?;
        check_shape(name, &[units, 4 * units], self.recurrent_kernel.shape())?;
        check_shape(name, &[4 * units], self.bias.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&array![1.0, 2.0, 3.0, 1000.0]);
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(p[3] > 0.99);
    }

    #[test]
    fn test_dense_forward() {
        let dense = Dense {
            kernel: array![[1.0, -1.0], [2.0, 0.5]],
            bias: array![0.5, 0.0],
        };
        let y = dense.forward(array![1.0, 1.0].view());
        assert_eq!(y.to_vec(), vec![3.5, -0.5]);
        assert_eq!(dense.forward_relu(array![1.0, 1.0].view()).to_vec(), vec![3.5, 0.0]);
    }

    #[test]
    fn test_glorot_respects_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let dense = Dense::glorot(10, 14, &mut rng);
        let limit = (6.0f32 / 24.0).sqrt();
        assert!(dense.kernel.iter().all(|w| w.abs() <= limit));
        assert!(dense.bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_embedding_rejects_out_of_range_id() {
        let mut rng = StdRng::seed_from_u64(7);
        let embedding = Embedding::uniform(5, 3, &mut rng);
        assert_eq!(embedding.lookup(&[0, 4, 4]).unwrap().shape(), &[3, 3]);
        assert!(matches!(
            embedding.lookup(&[5]),
            Err(RankerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_lstm_forget_bias_and_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let lstm = Lstm::random(4, 3, &mut rng);
        assert_eq!(lstm.bias.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let inputs = Array2::from_elem((5, 4), 0.1f32);
        let all = lstm.forward_sequence(inputs.view());
        let last = lstm.forward_last(inputs.view());
        assert_eq!(all.shape(), &[5, 3]);
        assert_eq!(all.row(4), last);
        // tanh-bounded hidden state
        assert!(all.iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_recurrent_kernel_is_orthogonal() {
        let mut rng = StdRng::seed_from_u64(11);
        let lstm = Lstm::random(5, 16, &mut rng);
        let u = &lstm.recurrent_kernel;
        assert_eq!(u.shape(), &[16, 64]);

        let gram = u.dot(&u.t());
        for i in 0..16 {
            for j in 0..16 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-4, "U·Uᵀ[{}, {}] = {}", i, j, gram[[i, j]]);
            }
        }

        // Tall shapes get orthonormal columns instead
        let tall = orthogonal(6, 3, &mut rng);
        let gram = tall.t().dot(&tall);
        for i in 0..3 {
            assert!((gram[[i, i]] - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_lstm_zero_weights_give_known_state() {
        // With all-zero weights every gate is σ(0) = 0.5 and g = 0, so c and h stay 0
        let lstm = Lstm {
            kernel: Array2::zeros((2, 8)),
            recurrent_kernel: Array2::zeros((2, 8)),
            bias: Array1::zeros(8),
        };
        let h = lstm.forward_last(Array2::ones((3, 2)).view());
        assert_eq!(h.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let mut rng = StdRng::seed_from_u64(7);
        let dense = Dense::glorot(3, 2, &mut rng);
        assert!(dense.validate("fusion", 3, 2).is_ok());
        assert!(matches!(
            dense.validate("fusion", 4, 2),
            Err(RankerError::ShapeMismatch { .. })
        ));
    }
}
