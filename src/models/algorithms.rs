//! HMM algorithms: forward, backward and Viterbi, all in log space
//!
//! Every routine works on a single observation sequence. Multi-sequence
//! callers slice the concatenated matrix by `lengths` first.

use super::gaussian::DiagonalGaussian;
use ndarray::{Array1, Array2, ArrayView2};

/// Numerically stable `log(sum(exp(xs)))`.
///
/// Returns negative infinity for an empty slice or when every term is
/// negative infinity.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// Log emission densities for every frame and state (T x N)
pub fn log_emissions(observations: ArrayView2<f64>, emissions: &[DiagonalGaussian]) -> Array2<f64> {
    let t = observations.nrows();
    let n = emissions.len();
    let mut log_b = Array2::zeros((t, n));
    for (t_idx, obs) in observations.rows().into_iter().enumerate() {
        for (j, emission) in emissions.iter().enumerate() {
            log_b[[t_idx, j]] = emission.log_pdf(obs);
        }
    }
    log_b
}

/// Forward pass
///
/// # Arguments
/// * `log_start` - Log initial state probabilities (N)
/// * `log_trans` - Log transition matrix (N x N)
/// * `log_b` - Log emission densities (T x N)
///
/// # Returns
/// Log forward variables (T x N) and log P(observations | model)
pub fn forward(
    log_start: &Array1<f64>,
    log_trans: &Array2<f64>,
    log_b: &Array2<f64>,
) -> (Array2<f64>, f64) {
    let t = log_b.nrows();
    let n = log_start.len();

    let mut alpha = Array2::from_elem((t, n), f64::NEG_INFINITY);
    if t == 0 {
        return (alpha, 0.0);
    }

    for j in 0..n {
        alpha[[0, j]] = log_start[j] + log_b[[0, j]];
    }

    let mut buf = vec![0.0; n];
    for t_idx in 1..t {
        for j in 0..n {
            for i in 0..n {
                buf[i] = alpha[[t_idx - 1, i]] + log_trans[[i, j]];
            }
            alpha[[t_idx, j]] = log_sum_exp(&buf) + log_b[[t_idx, j]];
        }
    }

    let last: Vec<f64> = alpha.row(t - 1).to_vec();
    let log_likelihood = log_sum_exp(&last);
    (alpha, log_likelihood)
}

/// Backward pass, returns log backward variables (T x N)
pub fn backward(log_trans: &Array2<f64>, log_b: &Array2<f64>) -> Array2<f64> {
    let t = log_b.nrows();
    let n = log_trans.nrows();

    let mut beta = Array2::zeros((t, n));
    if t == 0 {
        return beta;
    }

    let mut buf = vec![0.0; n];
    for t_idx in (0..t - 1).rev() {
        for i in 0..n {
            for j in 0..n {
                buf[j] = log_trans[[i, j]] + log_b[[t_idx + 1, j]] + beta[[t_idx + 1, j]];
            }
            beta[[t_idx, i]] = log_sum_exp(&buf);
        }
    }

    beta
}

/// Posterior state probabilities from forward/backward variables (T x N)
pub fn posteriors(alpha: &Array2<f64>, beta: &Array2<f64>, log_likelihood: f64) -> Array2<f64> {
    let mut gamma = alpha + beta;
    gamma.mapv_inplace(|v| (v - log_likelihood).exp());
    gamma
}

/// Viterbi algorithm - finds most likely state sequence
///
/// # Returns
/// Most likely state sequence and its log probability
pub fn viterbi(
    log_start: &Array1<f64>,
    log_trans: &Array2<f64>,
    log_b: &Array2<f64>,
) -> (Vec<usize>, f64) {
    let t = log_b.nrows();
    let n = log_start.len();

    if t == 0 {
        return (vec![], 0.0);
    }

    // Delta: best path log probability ending in state j at time t
    let mut delta = Array2::from_elem((t, n), f64::NEG_INFINITY);
    // Psi: backpointers for path reconstruction
    let mut psi = Array2::<usize>::zeros((t, n));

    for j in 0..n {
        delta[[0, j]] = log_start[j] + log_b[[0, j]];
    }

    for t_idx in 1..t {
        for j in 0..n {
            let mut best_val = f64::NEG_INFINITY;
            let mut best_state = 0;

            for i in 0..n {
                let val = delta[[t_idx - 1, i]] + log_trans[[i, j]];
                if val > best_val {
                    best_val = val;
                    best_state = i;
                }
            }

            delta[[t_idx, j]] = best_val + log_b[[t_idx, j]];
            psi[[t_idx, j]] = best_state;
        }
    }

    let mut best_final_state = 0;
    let mut best_final_prob = f64::NEG_INFINITY;
    for j in 0..n {
        if delta[[t - 1, j]] > best_final_prob {
            best_final_prob = delta[[t - 1, j]];
            best_final_state = j;
        }
    }

    let mut path = vec![0; t];
    path[t - 1] = best_final_state;
    for t_idx in (0..t - 1).rev() {
        path[t_idx] = psi[[t_idx + 1, path[t_idx + 1]]];
    }

    (path, best_final_prob)
}
