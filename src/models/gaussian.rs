//! Diagonal-covariance Gaussian distribution for HMM emissions

use ndarray::{Array1, ArrayView1};
use rand::Rng;
use std::f64::consts::PI;

/// Gaussian distribution with a diagonal covariance matrix
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalGaussian {
    mean: Array1<f64>,
    /// Per-feature variances (the covariance diagonal)
    variance: Array1<f64>,
    /// Sum of log(2 * pi * variance)
    log_norm: f64,
}

impl DiagonalGaussian {
    /// Create new diagonal Gaussian
    pub fn new(mean: Array1<f64>, variance: Array1<f64>) -> Self {
        let log_norm: f64 = variance.iter().map(|v| (2.0 * PI * v).ln()).sum();
        Self {
            mean,
            variance,
            log_norm,
        }
    }

    /// Dimension of the distribution
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean vector
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-feature variances
    pub fn variance(&self) -> &Array1<f64> {
        &self.variance
    }

    /// Whether every parameter is finite and every variance positive
    pub fn is_valid(&self) -> bool {
        self.mean.iter().all(|m| m.is_finite())
            && self.variance.iter().all(|v| v.is_finite() && *v > 0.0)
    }

    /// Compute log probability density at a point
    pub fn log_pdf(&self, x: ArrayView1<f64>) -> f64 {
        let mut quad_form = 0.0;
        for ((xi, mi), vi) in x.iter().zip(self.mean.iter()).zip(self.variance.iter()) {
            let diff = xi - mi;
            quad_form += diff * diff / vi;
        }

        -0.5 * (self.log_norm + quad_form)
    }

    /// Draw one sample (Box-Muller per feature)
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let mut result = self.mean.clone();
        for i in 0..self.dim() {
            // gen() is in [0, 1); shift away from zero before taking the log
            let u1: f64 = 1.0 - rng.gen::<f64>();
            let u2: f64 = rng.gen();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            result[i] += self.variance[i].sqrt() * z;
        }
        result
    }
}
